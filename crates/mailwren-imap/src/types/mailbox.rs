//! Mailbox names, attributes, and per-mailbox metadata types.

use super::{Flags, ModSeq, SeqNum, Uid, UidValidity};

/// Mailbox name.
///
/// Holds the server-canonical full name. The trailing path segment is
/// derived with [`Mailbox::name`] given the hierarchy delimiter from LIST.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mailbox(pub String);

impl Mailbox {
    /// Creates a new mailbox name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The INBOX mailbox (case-insensitive per RFC).
    #[must_use]
    pub fn inbox() -> Self {
        Self("INBOX".to_string())
    }

    /// Returns true if this names the INBOX.
    #[must_use]
    pub fn is_inbox(&self) -> bool {
        self.0.eq_ignore_ascii_case("INBOX")
    }

    /// Returns the full server-canonical name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the trailing path segment given the hierarchy delimiter.
    #[must_use]
    pub fn name(&self, delimiter: Option<char>) -> &str {
        match delimiter {
            Some(sep) => self.0.rsplit(sep).next().unwrap_or(&self.0),
            None => &self.0,
        }
    }

    /// Returns the parent full name, if any, given the hierarchy delimiter.
    #[must_use]
    pub fn parent(&self, delimiter: Option<char>) -> Option<Self> {
        let sep = delimiter?;
        let idx = self.0.rfind(sep)?;
        Some(Self(self.0[..idx].to_string()))
    }

    /// Rewrites this name after a rename of `old` to `new`, covering both
    /// the renamed mailbox itself and its descendants.
    #[must_use]
    pub fn renamed(&self, old: &Self, new: &Self, delimiter: Option<char>) -> Option<Self> {
        if self == old {
            return Some(new.clone());
        }
        let sep = delimiter?;
        let prefix = format!("{}{sep}", old.0);
        self.0
            .strip_prefix(&prefix)
            .map(|rest| Self(format!("{}{sep}{rest}", new.0)))
    }
}

impl std::fmt::Display for Mailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mailbox attributes from LIST/LSUB/XLIST responses.
///
/// Union of the RFC 3501 base attributes, RFC 6154 SPECIAL-USE, and the
/// RFC 5258 LIST-EXTENDED return attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MailboxAttribute {
    /// Mailbox cannot have children.
    NoInferiors,
    /// Mailbox cannot be selected.
    NoSelect,
    /// Mailbox is marked for attention.
    Marked,
    /// Mailbox is not marked.
    Unmarked,
    /// Mailbox has children.
    HasChildren,
    /// Mailbox has no children.
    HasNoChildren,
    /// Mailbox does not exist (LIST-EXTENDED).
    NonExistent,
    /// Mailbox is subscribed (LIST-EXTENDED).
    Subscribed,
    /// Mailbox is on a remote server (LIST-EXTENDED).
    Remote,
    /// Virtual all-mail mailbox (SPECIAL-USE).
    All,
    /// Archive mailbox (SPECIAL-USE).
    Archive,
    /// Drafts mailbox (SPECIAL-USE).
    Drafts,
    /// Flagged-messages mailbox (SPECIAL-USE).
    Flagged,
    /// The INBOX (XLIST).
    Inbox,
    /// Junk mailbox (SPECIAL-USE).
    Junk,
    /// Sent mailbox (SPECIAL-USE).
    Sent,
    /// Trash mailbox (SPECIAL-USE).
    Trash,
    /// Important mailbox (RFC 8457).
    Important,
    /// Unrecognized attribute.
    Unknown(String),
}

impl MailboxAttribute {
    /// Parses an attribute token.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "\\NOINFERIORS" => Self::NoInferiors,
            "\\NOSELECT" => Self::NoSelect,
            "\\MARKED" => Self::Marked,
            "\\UNMARKED" => Self::Unmarked,
            "\\HASCHILDREN" => Self::HasChildren,
            "\\HASNOCHILDREN" => Self::HasNoChildren,
            "\\NONEXISTENT" => Self::NonExistent,
            "\\SUBSCRIBED" => Self::Subscribed,
            "\\REMOTE" => Self::Remote,
            "\\ALL" | "\\ALLMAIL" => Self::All,
            "\\ARCHIVE" => Self::Archive,
            "\\DRAFTS" => Self::Drafts,
            "\\FLAGGED" | "\\STARRED" => Self::Flagged,
            "\\INBOX" => Self::Inbox,
            "\\JUNK" | "\\SPAM" => Self::Junk,
            "\\SENT" => Self::Sent,
            "\\TRASH" => Self::Trash,
            "\\IMPORTANT" => Self::Important,
            _ => Self::Unknown(s.to_string()),
        }
    }
}

/// One LIST/LSUB/XLIST response line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    /// Mailbox attributes.
    pub attributes: Vec<MailboxAttribute>,
    /// Hierarchy delimiter.
    pub delimiter: Option<char>,
    /// Mailbox name.
    pub mailbox: Mailbox,
    /// LIST-EXTENDED child info (`"CHILDINFO" ("SUBSCRIBED")`).
    pub child_info: Vec<String>,
}

/// Access mode granted by SELECT/EXAMINE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FolderAccess {
    /// Mailbox opened read-only (EXAMINE, or `[READ-ONLY]`).
    ReadOnly,
    /// Mailbox opened read-write.
    #[default]
    ReadWrite,
}

/// Snapshot of per-mailbox state gathered from SELECT/EXAMINE responses.
#[derive(Debug, Clone, Default)]
pub struct SelectInfo {
    /// Number of messages in the mailbox.
    pub exists: u32,
    /// Number of recent messages.
    pub recent: u32,
    /// First unseen message sequence number.
    pub unseen: Option<SeqNum>,
    /// Next UID to be assigned.
    pub uid_next: Option<Uid>,
    /// UIDVALIDITY value.
    pub uid_validity: Option<UidValidity>,
    /// Flags defined for this mailbox.
    pub flags: Flags,
    /// Flags that can be permanently stored.
    pub permanent_flags: Flags,
    /// Effective access.
    pub access: FolderAccess,
    /// Highest mod-sequence, if the mailbox supports CONDSTORE.
    pub highest_mod_seq: Option<ModSeq>,
    /// True when the server answered `[NOMODSEQ]`.
    pub no_mod_seq: bool,
}

/// STATUS response item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusItem {
    /// Number of messages.
    Messages(u32),
    /// Number of recent messages.
    Recent(u32),
    /// Next UID.
    UidNext(Uid),
    /// UIDVALIDITY value.
    UidValidity(UidValidity),
    /// Number of unseen messages.
    Unseen(u32),
    /// Highest mod-sequence.
    HighestModSeq(ModSeq),
    /// Mailbox size in octets (RFC 8438).
    Size(u64),
}

/// One namespace entry from a NAMESPACE response (RFC 2342).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    /// Namespace prefix.
    pub prefix: String,
    /// Hierarchy delimiter.
    pub delimiter: Option<char>,
}

/// The three namespace classes of a NAMESPACE response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Namespaces {
    /// Personal namespaces.
    pub personal: Vec<Namespace>,
    /// Other-users namespaces.
    pub other_users: Vec<Namespace>,
    /// Shared namespaces.
    pub shared: Vec<Namespace>,
}

/// A single quota resource (RFC 2087), e.g. `STORAGE` or `MESSAGE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaResource {
    /// Resource name.
    pub name: String,
    /// Current usage.
    pub usage: u64,
    /// Limit.
    pub limit: u64,
}

/// A QUOTA response: a quota root and its resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quota {
    /// Quota root name.
    pub root: String,
    /// Resources under this root.
    pub resources: Vec<QuotaResource>,
}

/// A QUOTAROOT response: the roots governing a mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaRoot {
    /// The mailbox the query was about.
    pub mailbox: Mailbox,
    /// Quota roots that apply to it.
    pub roots: Vec<String>,
}

/// An ACL entry: identifier plus rights string (RFC 4314).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclEntry {
    /// Identifier (usually a user name or `anyone`).
    pub identifier: String,
    /// Rights characters (`lrswipkxtea...`).
    pub rights: String,
}

/// An ACL response: mailbox plus its access list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acl {
    /// The mailbox.
    pub mailbox: Mailbox,
    /// Access entries.
    pub entries: Vec<AclEntry>,
}

/// A METADATA entry (RFC 5464).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataEntry {
    /// Entry name, e.g. `/shared/comment`.
    pub name: String,
    /// Entry value; `None` for NIL (deleted/unset).
    pub value: Option<Vec<u8>>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod mailbox_tests {
        use super::*;

        #[test]
        fn inbox_is_case_insensitive() {
            assert!(Mailbox::new("inbox").is_inbox());
            assert!(Mailbox::new("INBOX").is_inbox());
            assert!(!Mailbox::new("INBOX/child").is_inbox());
        }

        #[test]
        fn name_is_trailing_segment() {
            let mb = Mailbox::new("Projects/2026/Reports");
            assert_eq!(mb.name(Some('/')), "Reports");
            assert_eq!(mb.name(None), "Projects/2026/Reports");
        }

        #[test]
        fn parent() {
            let mb = Mailbox::new("Projects/2026/Reports");
            assert_eq!(mb.parent(Some('/')), Some(Mailbox::new("Projects/2026")));
            assert_eq!(Mailbox::new("INBOX").parent(Some('/')), None);
        }

        #[test]
        fn renamed_rewrites_descendants() {
            let old = Mailbox::new("Work");
            let new = Mailbox::new("Archive/Work");
            let child = Mailbox::new("Work/2025");
            assert_eq!(
                child.renamed(&old, &new, Some('/')),
                Some(Mailbox::new("Archive/Work/2025"))
            );
            assert_eq!(old.renamed(&old, &new, Some('/')), Some(new.clone()));
            assert_eq!(Mailbox::new("Workbench").renamed(&old, &new, Some('/')), None);
        }
    }

    mod attribute_tests {
        use super::*;

        #[test]
        fn parse_base_attributes() {
            assert_eq!(MailboxAttribute::parse("\\Noselect"), MailboxAttribute::NoSelect);
            assert_eq!(
                MailboxAttribute::parse("\\HasChildren"),
                MailboxAttribute::HasChildren
            );
            assert_eq!(
                MailboxAttribute::parse("\\NonExistent"),
                MailboxAttribute::NonExistent
            );
        }

        #[test]
        fn parse_special_use() {
            assert_eq!(MailboxAttribute::parse("\\Sent"), MailboxAttribute::Sent);
            assert_eq!(MailboxAttribute::parse("\\Junk"), MailboxAttribute::Junk);
            assert_eq!(MailboxAttribute::parse("\\Spam"), MailboxAttribute::Junk);
            assert_eq!(MailboxAttribute::parse("\\Starred"), MailboxAttribute::Flagged);
        }

        #[test]
        fn parse_unknown() {
            assert_eq!(
                MailboxAttribute::parse("\\XSpecial"),
                MailboxAttribute::Unknown("\\XSpecial".to_string())
            );
        }
    }

    mod select_info_tests {
        use super::*;

        #[test]
        fn default_access_is_read_write() {
            let info = SelectInfo::default();
            assert_eq!(info.access, FolderAccess::ReadWrite);
            assert_eq!(info.exists, 0);
        }
    }
}
