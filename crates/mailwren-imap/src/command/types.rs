//! Command parameter types.
//!
//! Descriptor structs and enums used to build commands: fetch item
//! selections, search criteria, store actions, sort keys, and thread
//! algorithms. Each folder operation takes one of these rather than a
//! matrix of near-identical method overloads.

use crate::types::{Flags, Label, ModSeq, SequenceSet, UidSet};

/// Items requested by a FETCH command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchItems {
    /// The ALL macro (FLAGS INTERNALDATE RFC822.SIZE ENVELOPE).
    All,
    /// The FULL macro (ALL plus BODY).
    Full,
    /// The FAST macro (FLAGS INTERNALDATE RFC822.SIZE).
    Fast,
    /// An explicit list of attributes.
    Items(Vec<FetchAttribute>),
}

/// A single FETCH attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchAttribute {
    /// Message flags.
    Flags,
    /// Internal date.
    InternalDate,
    /// Message size.
    Rfc822Size,
    /// Envelope.
    Envelope,
    /// Body structure (extensible form).
    BodyStructure,
    /// UID.
    Uid,
    /// MODSEQ (RFC 7162).
    ModSeq,
    /// Body section content.
    Body {
        /// Section specifier (`None` for the whole message).
        section: Option<String>,
        /// Use BODY.PEEK to avoid setting `\Seen`.
        peek: bool,
        /// Partial fetch `<start.len>`.
        partial: Option<(u32, u32)>,
    },
    /// BINARY section content (RFC 3516).
    Binary {
        /// Section specifier.
        section: String,
        /// Use BINARY.PEEK.
        peek: bool,
        /// Partial fetch `<start.len>`.
        partial: Option<(u32, u32)>,
    },
    /// BINARY.SIZE (RFC 3516).
    BinarySize {
        /// Section specifier.
        section: String,
    },
    /// Gmail message id.
    GmailMsgId,
    /// Gmail thread id.
    GmailThreadId,
    /// Gmail labels.
    GmailLabels,
    /// PREVIEW (RFC 8970).
    Preview,
    /// SAVEDATE (RFC 8514).
    SaveDate,
    /// EMAILID (RFC 8474).
    EmailId,
    /// THREADID (RFC 8474).
    ThreadId,
}

/// STORE verb: what to do with the operand flags or labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreAction {
    /// Replace the flag set.
    SetFlags(Flags),
    /// Add flags.
    AddFlags(Flags),
    /// Remove flags.
    RemoveFlags(Flags),
    /// Replace Gmail labels.
    SetLabels(Vec<Label>),
    /// Add Gmail labels.
    AddLabels(Vec<Label>),
    /// Remove Gmail labels.
    RemoveLabels(Vec<Label>),
}

impl StoreAction {
    /// Returns true if this action operates on Gmail labels.
    #[must_use]
    pub const fn is_labels(&self) -> bool {
        matches!(
            self,
            Self::SetLabels(_) | Self::AddLabels(_) | Self::RemoveLabels(_)
        )
    }
}

/// SEARCH criteria, composed recursively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCriteria {
    /// All messages.
    All,
    /// Messages with `\Answered`.
    Answered,
    /// Messages without `\Answered`.
    Unanswered,
    /// Messages with `\Deleted`.
    Deleted,
    /// Messages without `\Deleted`.
    Undeleted,
    /// Messages with `\Draft`.
    Draft,
    /// Messages without `\Draft`.
    Undraft,
    /// Messages with `\Flagged`.
    Flagged,
    /// Messages without `\Flagged`.
    Unflagged,
    /// Messages with `\Seen`.
    Seen,
    /// Messages without `\Seen`.
    Unseen,
    /// Recent messages not yet seen.
    New,
    /// Messages without `\Recent`.
    Old,
    /// Messages with `\Recent`.
    Recent,
    /// Messages with the given keyword.
    Keyword(String),
    /// Messages without the given keyword.
    Unkeyword(String),
    /// Messages in the sequence set.
    SequenceSet(SequenceSet),
    /// Messages in the UID set.
    Uid(UidSet),
    /// Subject contains.
    Subject(String),
    /// From contains.
    From(String),
    /// To contains.
    To(String),
    /// Cc contains.
    Cc(String),
    /// Bcc contains.
    Bcc(String),
    /// Body contains.
    Body(String),
    /// Header or body contains.
    Text(String),
    /// A named header contains.
    Header(String, String),
    /// Internal date on or after (`dd-Mon-yyyy`).
    Since(String),
    /// Internal date before.
    Before(String),
    /// Internal date on.
    On(String),
    /// Date header on or after.
    SentSince(String),
    /// Date header before.
    SentBefore(String),
    /// Date header on.
    SentOn(String),
    /// Larger than n octets.
    Larger(u64),
    /// Smaller than n octets.
    Smaller(u64),
    /// MODSEQ at least (RFC 7162).
    ModSeq(ModSeq),
    /// Gmail raw search (`X-GM-RAW`).
    GmailRaw(String),
    /// Conjunction.
    And(Vec<SearchCriteria>),
    /// Disjunction of exactly two.
    Or(Box<SearchCriteria>, Box<SearchCriteria>),
    /// Negation.
    Not(Box<SearchCriteria>),
}

impl SearchCriteria {
    /// Returns true if any text operand contains non-ASCII characters,
    /// which requires a CHARSET argument (or UTF8=ACCEPT).
    #[must_use]
    pub fn needs_charset(&self) -> bool {
        match self {
            Self::Subject(s)
            | Self::From(s)
            | Self::To(s)
            | Self::Cc(s)
            | Self::Bcc(s)
            | Self::Body(s)
            | Self::Text(s)
            | Self::GmailRaw(s)
            | Self::Keyword(s)
            | Self::Unkeyword(s) => !s.is_ascii(),
            Self::Header(name, value) => !name.is_ascii() || !value.is_ascii(),
            Self::And(items) => items.iter().any(Self::needs_charset),
            Self::Or(a, b) => a.needs_charset() || b.needs_charset(),
            Self::Not(inner) => inner.needs_charset(),
            _ => false,
        }
    }
}

/// ESEARCH RETURN options (RFC 4731).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchReturn {
    /// Lowest matching number.
    Min,
    /// Highest matching number.
    Max,
    /// All matches as a compact set.
    All,
    /// Match count.
    Count,
}

impl SearchReturn {
    /// Returns the wire keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::All => "ALL",
            Self::Count => "COUNT",
        }
    }
}

/// SORT keys (RFC 5256).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Internal date.
    Arrival,
    /// First Cc address.
    Cc,
    /// Date header.
    Date,
    /// First From address.
    From,
    /// Message size.
    Size,
    /// Base subject.
    Subject,
    /// First To address.
    To,
    /// Reverse the following key.
    Reverse,
}

impl SortKey {
    /// Returns the wire keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Arrival => "ARRIVAL",
            Self::Cc => "CC",
            Self::Date => "DATE",
            Self::From => "FROM",
            Self::Size => "SIZE",
            Self::Subject => "SUBJECT",
            Self::To => "TO",
            Self::Reverse => "REVERSE",
        }
    }
}

/// THREAD algorithms (RFC 5256).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadAlgorithm {
    /// Group by base subject only.
    OrderedSubject,
    /// Full references threading.
    References,
    /// Another algorithm advertised by the server.
    Other(String),
}

impl ThreadAlgorithm {
    /// Returns the wire keyword.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::OrderedSubject => "ORDEREDSUBJECT",
            Self::References => "REFERENCES",
            Self::Other(s) => s,
        }
    }
}

/// STATUS attributes that can be requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAttribute {
    /// Message count.
    Messages,
    /// Recent count.
    Recent,
    /// Next UID.
    UidNext,
    /// UIDVALIDITY.
    UidValidity,
    /// Unseen count.
    Unseen,
    /// Highest mod-sequence (RFC 7162).
    HighestModSeq,
    /// Mailbox size (RFC 8438).
    Size,
}

impl StatusAttribute {
    /// Returns the wire keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Messages => "MESSAGES",
            Self::Recent => "RECENT",
            Self::UidNext => "UIDNEXT",
            Self::UidValidity => "UIDVALIDITY",
            Self::Unseen => "UNSEEN",
            Self::HighestModSeq => "HIGHESTMODSEQ",
            Self::Size => "SIZE",
        }
    }
}

/// One message of an APPEND or MULTIAPPEND.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendMessage {
    /// Flags to set on the appended message.
    pub flags: Option<Flags>,
    /// Internal date (`"dd-Mon-yyyy hh:mm:ss +zzzz"`), if not "now".
    pub internal_date: Option<String>,
    /// The complete RFC 5322 message.
    pub body: Vec<u8>,
}

impl AppendMessage {
    /// Creates an append entry with just a body.
    #[must_use]
    pub fn new(body: Vec<u8>) -> Self {
        Self {
            flags: None,
            internal_date: None,
            body,
        }
    }

    /// Sets flags.
    #[must_use]
    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = Some(flags);
        self
    }

    /// Sets the internal date.
    #[must_use]
    pub fn with_internal_date(mut self, date: impl Into<String>) -> Self {
        self.internal_date = Some(date.into());
        self
    }
}

/// NOTIFY event classes the client can subscribe to (RFC 5465).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyEvent {
    /// New message deliveries.
    MessageNew,
    /// Expunges.
    MessageExpunge,
    /// Flag changes.
    FlagChange,
    /// Mailbox renames/deletes.
    MailboxName,
    /// Subscription changes.
    SubscriptionChange,
}

impl NotifyEvent {
    /// Returns the wire keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MessageNew => "MessageNew",
            Self::MessageExpunge => "MessageExpunge",
            Self::FlagChange => "FlagChange",
            Self::MailboxName => "MailboxName",
            Self::SubscriptionChange => "SubscriptionChange",
        }
    }
}

/// A NOTIFY request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyRequest {
    /// `NOTIFY NONE`: stop all notifications.
    None,
    /// `NOTIFY SET (SELECTED (...))`: events for the selected mailbox.
    Selected(Vec<NotifyEvent>),
}
