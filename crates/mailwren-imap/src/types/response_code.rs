//! Response codes.
//!
//! The bracketed machine-readable hints carried in status responses,
//! covering RFC 3501, RFC 4315 (UIDPLUS), RFC 7162 (CONDSTORE), RFC 5530
//! (response codes for NO), and the extension RFCs in the capability
//! matrix.

use super::{Capability, Flags, ModSeq, SeqNum, Uid, UidSet, UidValidity};

/// Response code from a status response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseCode {
    /// ALERT: human-readable message that MUST be shown to the user.
    Alert,
    /// BADCHARSET: the SEARCH charset is not supported; lists alternatives.
    BadCharset(Vec<String>),
    /// CAPABILITY carried inline in a status response.
    Capability(Vec<Capability>),
    /// PARSE: error parsing a message's headers.
    Parse,
    /// PERMANENTFLAGS: flags that can be changed permanently.
    PermanentFlags(Flags),
    /// READ-ONLY: mailbox selected read-only.
    ReadOnly,
    /// READ-WRITE: mailbox selected read-write.
    ReadWrite,
    /// TRYCREATE: target mailbox doesn't exist but can be created.
    TryCreate,
    /// UIDNEXT: next UID to be assigned.
    UidNext(Uid),
    /// UIDVALIDITY: UID epoch of the mailbox.
    UidValidity(UidValidity),
    /// UNSEEN: first unseen message sequence number.
    Unseen(SeqNum),
    /// APPENDUID (RFC 4315): epoch and UID(s) of the appended message(s).
    AppendUid {
        /// UIDVALIDITY of the destination mailbox.
        uidvalidity: UidValidity,
        /// UIDs assigned, one per appended message.
        uids: UidSet,
    },
    /// COPYUID (RFC 4315): source and destination UIDs of a copy.
    CopyUid {
        /// UIDVALIDITY of the destination mailbox.
        uidvalidity: UidValidity,
        /// Source UIDs, in correspondence order.
        source: UidSet,
        /// Destination UIDs, in correspondence order.
        dest: UidSet,
    },
    /// UIDNOTSTICKY (RFC 4315): mailbox does not keep persistent UIDs.
    UidNotSticky,
    /// HIGHESTMODSEQ (RFC 7162).
    HighestModSeq(ModSeq),
    /// NOMODSEQ (RFC 7162): mailbox does not support mod-sequences.
    NoModSeq,
    /// MODIFIED (RFC 7162): messages that failed an UNCHANGEDSINCE store.
    Modified(UidSet),
    /// CLOSED (RFC 7162): previous mailbox is now closed.
    Closed,
    /// MAILBOXID (RFC 8474).
    MailboxId(String),
    /// INUSE (RFC 5530).
    InUse,
    /// OVERQUOTA (RFC 5530).
    OverQuota,
    /// CONTACTADMIN (RFC 5530).
    ContactAdmin,
    /// AUTHENTICATIONFAILED (RFC 5530).
    AuthenticationFailed,
    /// AUTHORIZATIONFAILED (RFC 5530).
    AuthorizationFailed,
    /// EXPIRED (RFC 5530).
    Expired,
    /// PRIVACYREQUIRED (RFC 5530).
    PrivacyRequired,
    /// UNAVAILABLE (RFC 5530).
    Unavailable,
    /// LIMIT (RFC 5530).
    Limit,
    /// NONEXISTENT (RFC 5530).
    NonExistent,
    /// ALREADYEXISTS (RFC 5530).
    AlreadyExists,
    /// SERVERBUG (RFC 5530).
    ServerBug,
    /// CLIENTBUG (RFC 5530).
    ClientBug,
    /// CANNOT (RFC 5530).
    Cannot,
    /// COMPRESSIONACTIVE (RFC 4978).
    CompressionActive,
    /// METADATA sub-codes (RFC 5464), e.g. `METADATA LONGENTRIES 2048`.
    Metadata(String),
    /// REFERRAL (RFC 2193).
    Referral(String),
    /// USEATTR (RFC 6154): the CREATE special-use attribute was refused.
    UseAttr,
    /// HASCHILDREN (RFC 5258): DELETE refused, mailbox has children.
    HasChildren,
    /// UNKNOWN-CTE (RFC 3516): server cannot decode the content encoding.
    UnknownCte,
    /// NOTIFICATIONOVERFLOW (RFC 5465): NOTIFY event queue overflowed.
    NotificationOverflow,
    /// Unrecognized response code, kept verbatim.
    Unknown(String),
}

/// Machine-readable reason derived from a tagged `NO`.
///
/// Callers branch on these rather than scraping human text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The target already exists.
    AlreadyExists,
    /// The target does not exist.
    NonExistent,
    /// Authentication failed.
    AuthenticationFailed,
    /// Authorization failed.
    AuthorizationFailed,
    /// Account or password expired.
    Expired,
    /// Server requires a privacy layer first.
    PrivacyRequired,
    /// The mailbox or resource is in use.
    InUse,
    /// A quota would be exceeded.
    OverQuota,
    /// A server limit was hit.
    Limit,
    /// Mailbox does not keep sticky UIDs.
    UidNotSticky,
    /// Backend temporarily unavailable.
    Unavailable,
    /// Server asked the user to contact the admin.
    ContactAdmin,
    /// Server believes the client misbehaved.
    ClientBug,
    /// Server admitted an internal error.
    ServerBug,
    /// Target can be created first (TRYCREATE).
    TryCreate,
    /// No machine-readable reason was given.
    Unspecified,
}

impl ResponseCode {
    /// Maps a response code attached to a tagged `NO` to a failure reason.
    #[must_use]
    pub fn failure_reason(code: Option<&Self>) -> FailureReason {
        match code {
            Some(Self::AlreadyExists) => FailureReason::AlreadyExists,
            Some(Self::NonExistent) => FailureReason::NonExistent,
            Some(Self::AuthenticationFailed) => FailureReason::AuthenticationFailed,
            Some(Self::AuthorizationFailed) => FailureReason::AuthorizationFailed,
            Some(Self::Expired) => FailureReason::Expired,
            Some(Self::PrivacyRequired) => FailureReason::PrivacyRequired,
            Some(Self::InUse) => FailureReason::InUse,
            Some(Self::OverQuota) => FailureReason::OverQuota,
            Some(Self::Limit) => FailureReason::Limit,
            Some(Self::UidNotSticky) => FailureReason::UidNotSticky,
            Some(Self::Unavailable) => FailureReason::Unavailable,
            Some(Self::ContactAdmin) => FailureReason::ContactAdmin,
            Some(Self::ClientBug) => FailureReason::ClientBug,
            Some(Self::ServerBug) => FailureReason::ServerBug,
            Some(Self::TryCreate) => FailureReason::TryCreate,
            _ => FailureReason::Unspecified,
        }
    }
}
