//! Response data types.

use crate::types::{
    Acl, Flags, Label, ListEntry, Mailbox, MetadataEntry, ModSeq, Namespaces, Quota, QuotaRoot,
    ResponseCode, SeqNum, StatusItem, Uid, UidSet,
};

/// FETCH response item.
///
/// The FETCH grammar is an open map keyed by atom; servers may return
/// more items than were requested and unknown items are skipped by the
/// parser rather than failing the response.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchItem {
    /// Message flags.
    Flags(Flags),
    /// Internal date.
    InternalDate(String),
    /// RFC822 size in octets.
    Rfc822Size(u64),
    /// Envelope.
    Envelope(Box<Envelope>),
    /// UID.
    Uid(Uid),
    /// BODY section content, possibly partial.
    Body {
        /// Section specifier (`None` for the whole message).
        section: Option<String>,
        /// Origin offset of a partial fetch.
        origin: Option<u32>,
        /// Raw body bytes; `None` when the server answered NIL.
        data: Option<Vec<u8>>,
    },
    /// BINARY section content (RFC 3516).
    Binary {
        /// Section specifier.
        section: Option<String>,
        /// Origin offset of a partial fetch.
        origin: Option<u32>,
        /// Decoded bytes; `None` when the server answered NIL.
        data: Option<Vec<u8>>,
    },
    /// BINARY.SIZE (RFC 3516).
    BinarySize {
        /// Section specifier.
        section: Option<String>,
        /// Decoded size in octets.
        size: u64,
    },
    /// BODYSTRUCTURE.
    BodyStructure(BodyStructure),
    /// MODSEQ (RFC 7162).
    ModSeq(ModSeq),
    /// `X-GM-MSGID` (Gmail message id).
    GmailMsgId(u64),
    /// `X-GM-THRID` (Gmail thread id).
    GmailThreadId(u64),
    /// `X-GM-LABELS` (Gmail labels).
    GmailLabels(Vec<Label>),
    /// PREVIEW (RFC 8970).
    Preview(Option<String>),
    /// SAVEDATE (RFC 8514).
    SaveDate(Option<String>),
    /// EMAILID (RFC 8474).
    EmailId(String),
    /// THREADID (RFC 8474); `None` when the server answered NIL.
    ThreadId(Option<String>),
}

/// Message envelope.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Envelope {
    /// Date header.
    pub date: Option<String>,
    /// Subject header.
    pub subject: Option<String>,
    /// From addresses.
    pub from: Vec<Address>,
    /// Sender addresses.
    pub sender: Vec<Address>,
    /// Reply-To addresses.
    pub reply_to: Vec<Address>,
    /// To addresses.
    pub to: Vec<Address>,
    /// Cc addresses.
    pub cc: Vec<Address>,
    /// Bcc addresses.
    pub bcc: Vec<Address>,
    /// In-Reply-To header.
    pub in_reply_to: Option<String>,
    /// Message-ID header.
    pub message_id: Option<String>,
}

/// Email address from an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    /// Display name.
    pub name: Option<String>,
    /// Source route (obsolete).
    pub adl: Option<String>,
    /// Mailbox name (local part).
    pub mailbox: Option<String>,
    /// Host name (domain part).
    pub host: Option<String>,
}

impl Address {
    /// Returns the full email address.
    #[must_use]
    pub fn email(&self) -> Option<String> {
        match (&self.mailbox, &self.host) {
            (Some(m), Some(h)) => Some(format!("{m}@{h}")),
            _ => None,
        }
    }
}

/// Body structure from BODYSTRUCTURE.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyStructure {
    /// Single-part body.
    Basic {
        /// MIME type.
        media_type: String,
        /// MIME subtype.
        media_subtype: String,
        /// Body parameters.
        params: Vec<(String, String)>,
        /// Content-ID.
        id: Option<String>,
        /// Content-Description.
        description: Option<String>,
        /// Content-Transfer-Encoding.
        encoding: String,
        /// Body size in bytes.
        size: u64,
    },
    /// Nested message/rfc822 body.
    Message {
        /// Envelope of the nested message.
        envelope: Box<Envelope>,
        /// Body structure of the nested message.
        body: Box<Self>,
        /// Size in lines.
        lines: u32,
    },
    /// Text body.
    Text {
        /// Text subtype.
        subtype: String,
        /// Body parameters.
        params: Vec<(String, String)>,
        /// Content-ID.
        id: Option<String>,
        /// Content-Description.
        description: Option<String>,
        /// Content-Transfer-Encoding.
        encoding: String,
        /// Body size in bytes.
        size: u64,
        /// Size in lines.
        lines: u32,
    },
    /// Multipart body.
    Multipart {
        /// Child body parts.
        bodies: Vec<Self>,
        /// Multipart subtype.
        subtype: String,
    },
}

/// ESEARCH result (RFC 4731), keyed rather than enumerated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EsearchResult {
    /// The tag of the originating command, from `(TAG "...")`.
    pub tag: Option<String>,
    /// True if the results are UIDs rather than sequence numbers.
    pub uid: bool,
    /// MIN result.
    pub min: Option<u32>,
    /// MAX result.
    pub max: Option<u32>,
    /// COUNT result.
    pub count: Option<u32>,
    /// ALL result as a compact set.
    pub all: Option<UidSet>,
    /// MODSEQ result (RFC 7162).
    pub modseq: Option<ModSeq>,
}

/// One node of a THREAD response tree (RFC 5256).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadNode {
    /// Message number at this node; `None` for a bare grouping node.
    pub id: Option<u32>,
    /// Child threads.
    pub children: Vec<ThreadNode>,
}

/// STATUS data carried inside a NOTIFY STATUS indication or `* STATUS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusResponse {
    /// Mailbox name.
    pub mailbox: Mailbox,
    /// Status items.
    pub items: Vec<StatusItem>,
}

/// Untagged response data.
#[derive(Debug, Clone, PartialEq)]
pub enum UntaggedResponse {
    /// OK response with optional code.
    Ok {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// NO response.
    No {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// BAD response.
    Bad {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// PREAUTH greeting.
    PreAuth {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// BYE response.
    Bye {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// CAPABILITY response.
    Capability(Vec<crate::types::Capability>),
    /// ENABLED response (RFC 5161).
    Enabled(Vec<crate::types::Capability>),
    /// LIST response (also used for XLIST).
    List(ListEntry),
    /// LSUB response.
    Lsub(ListEntry),
    /// FLAGS response.
    Flags(Flags),
    /// EXISTS response (message count).
    Exists(u32),
    /// RECENT response.
    Recent(u32),
    /// EXPUNGE response (message removed).
    Expunge(SeqNum),
    /// VANISHED response (RFC 7162).
    Vanished {
        /// Expunged UIDs.
        uids: UidSet,
        /// True for `VANISHED (EARLIER)` sent during QRESYNC resync.
        earlier: bool,
    },
    /// FETCH response.
    Fetch {
        /// Message sequence number.
        seq: SeqNum,
        /// Fetch data items.
        items: Vec<FetchItem>,
    },
    /// SEARCH response, with optional trailing `(MODSEQ n)`.
    Search {
        /// Matching message numbers (sequence numbers or UIDs).
        ids: Vec<u32>,
        /// Highest MODSEQ among the matches (RFC 7162).
        modseq: Option<ModSeq>,
    },
    /// ESEARCH response (RFC 4731).
    Esearch(EsearchResult),
    /// SORT response (RFC 5256).
    Sort(Vec<u32>),
    /// THREAD response (RFC 5256).
    Thread(Vec<ThreadNode>),
    /// STATUS response.
    Status(StatusResponse),
    /// NAMESPACE response (RFC 2342).
    Namespace(Namespaces),
    /// ID response (RFC 2971); `None` for `ID NIL`.
    Id(Option<Vec<(String, String)>>),
    /// QUOTA response (RFC 2087).
    Quota(Quota),
    /// QUOTAROOT response (RFC 2087).
    QuotaRoot(QuotaRoot),
    /// ACL response (RFC 4314).
    Acl(Acl),
    /// MYRIGHTS response (RFC 4314).
    MyRights {
        /// The mailbox.
        mailbox: Mailbox,
        /// Rights string.
        rights: String,
    },
    /// LISTRIGHTS response (RFC 4314).
    ListRights {
        /// The mailbox.
        mailbox: Mailbox,
        /// The identifier the rights apply to.
        identifier: String,
        /// Required rights followed by optional right groups.
        rights: Vec<String>,
    },
    /// METADATA response (RFC 5464).
    Metadata {
        /// The mailbox (empty string for server metadata).
        mailbox: Mailbox,
        /// Entries; values present for GETMETADATA results, absent for
        /// unsolicited change notifications.
        entries: Vec<MetadataEntry>,
    },
}
