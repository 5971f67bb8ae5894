//! Server capabilities and response status.

/// Response status from a tagged response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Command completed successfully.
    Ok,
    /// Command failed (operational error).
    No,
    /// Command failed (protocol/syntax error).
    Bad,
    /// Server greeting (pre-authenticated).
    PreAuth,
    /// Server is closing connection.
    Bye,
}

impl Status {
    /// Returns true if this is a successful status.
    #[must_use]
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok | Self::PreAuth)
    }
}

/// Server capability token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `IMAP4rev1` (RFC 3501)
    Imap4Rev1,
    /// IDLE command support (RFC 2177)
    Idle,
    /// NAMESPACE command support (RFC 2342)
    Namespace,
    /// UIDPLUS extension (RFC 4315)
    UidPlus,
    /// MOVE extension (RFC 6851)
    Move,
    /// LITERAL+ extension (RFC 7888)
    LiteralPlus,
    /// LITERAL- extension (RFC 7888)
    LiteralMinus,
    /// STARTTLS support
    StartTls,
    /// LOGIN disabled until the connection is secured
    LoginDisabled,
    /// AUTH mechanism
    Auth(String),
    /// SASL initial response (RFC 4959)
    SaslIr,
    /// ENABLE command (RFC 5161)
    Enable,
    /// UTF8=ACCEPT (RFC 6855)
    Utf8Accept,
    /// CONDSTORE (RFC 7162)
    CondStore,
    /// QRESYNC (RFC 7162)
    QResync,
    /// ESEARCH (RFC 4731)
    Esearch,
    /// SORT (RFC 5256)
    Sort,
    /// THREAD algorithm (RFC 5256), e.g. `THREAD=REFERENCES`
    Thread(String),
    /// ID extension (RFC 2971)
    Id,
    /// SPECIAL-USE mailboxes (RFC 6154)
    SpecialUse,
    /// XLIST (pre-SPECIAL-USE Gmail)
    XList,
    /// LIST-EXTENDED (RFC 5258)
    ListExtended,
    /// LIST-STATUS (RFC 5819)
    ListStatus,
    /// MULTIAPPEND (RFC 3502)
    MultiAppend,
    /// BINARY content fetch (RFC 3516)
    Binary,
    /// COMPRESS=DEFLATE (RFC 4978)
    CompressDeflate,
    /// ACL (RFC 4314)
    Acl,
    /// QUOTA (RFC 2087)
    Quota,
    /// METADATA (RFC 5464)
    Metadata,
    /// METADATA-SERVER (RFC 5464)
    MetadataServer,
    /// NOTIFY (RFC 5465)
    Notify,
    /// UNSELECT (RFC 3691)
    Unselect,
    /// Gmail extensions (`X-GM-EXT-1`)
    GmailExt1,
    /// Unknown capability
    Unknown(String),
}

impl Capability {
    /// Parses a capability string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let upper = s.to_uppercase();
        match upper.as_str() {
            "IMAP4REV1" => Self::Imap4Rev1,
            "IDLE" => Self::Idle,
            "NAMESPACE" => Self::Namespace,
            "UIDPLUS" => Self::UidPlus,
            "MOVE" => Self::Move,
            "LITERAL+" => Self::LiteralPlus,
            "LITERAL-" => Self::LiteralMinus,
            "STARTTLS" => Self::StartTls,
            "LOGINDISABLED" => Self::LoginDisabled,
            "SASL-IR" => Self::SaslIr,
            "ENABLE" => Self::Enable,
            "UTF8=ACCEPT" => Self::Utf8Accept,
            "CONDSTORE" => Self::CondStore,
            "QRESYNC" => Self::QResync,
            "ESEARCH" => Self::Esearch,
            "SORT" => Self::Sort,
            "ID" => Self::Id,
            "SPECIAL-USE" => Self::SpecialUse,
            "XLIST" => Self::XList,
            "LIST-EXTENDED" => Self::ListExtended,
            "LIST-STATUS" => Self::ListStatus,
            "MULTIAPPEND" => Self::MultiAppend,
            "BINARY" => Self::Binary,
            "COMPRESS=DEFLATE" => Self::CompressDeflate,
            "ACL" => Self::Acl,
            "QUOTA" => Self::Quota,
            "METADATA" => Self::Metadata,
            "METADATA-SERVER" => Self::MetadataServer,
            "NOTIFY" => Self::Notify,
            "UNSELECT" => Self::Unselect,
            "X-GM-EXT-1" => Self::GmailExt1,
            _ if upper.starts_with("AUTH=") => Self::Auth(s[5..].to_uppercase()),
            _ if upper.starts_with("THREAD=") => Self::Thread(s[7..].to_uppercase()),
            _ => Self::Unknown(s.to_string()),
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Imap4Rev1 => write!(f, "IMAP4rev1"),
            Self::Idle => write!(f, "IDLE"),
            Self::Namespace => write!(f, "NAMESPACE"),
            Self::UidPlus => write!(f, "UIDPLUS"),
            Self::Move => write!(f, "MOVE"),
            Self::LiteralPlus => write!(f, "LITERAL+"),
            Self::LiteralMinus => write!(f, "LITERAL-"),
            Self::StartTls => write!(f, "STARTTLS"),
            Self::LoginDisabled => write!(f, "LOGINDISABLED"),
            Self::Auth(mech) => write!(f, "AUTH={mech}"),
            Self::SaslIr => write!(f, "SASL-IR"),
            Self::Enable => write!(f, "ENABLE"),
            Self::Utf8Accept => write!(f, "UTF8=ACCEPT"),
            Self::CondStore => write!(f, "CONDSTORE"),
            Self::QResync => write!(f, "QRESYNC"),
            Self::Esearch => write!(f, "ESEARCH"),
            Self::Sort => write!(f, "SORT"),
            Self::Thread(alg) => write!(f, "THREAD={alg}"),
            Self::Id => write!(f, "ID"),
            Self::SpecialUse => write!(f, "SPECIAL-USE"),
            Self::XList => write!(f, "XLIST"),
            Self::ListExtended => write!(f, "LIST-EXTENDED"),
            Self::ListStatus => write!(f, "LIST-STATUS"),
            Self::MultiAppend => write!(f, "MULTIAPPEND"),
            Self::Binary => write!(f, "BINARY"),
            Self::CompressDeflate => write!(f, "COMPRESS=DEFLATE"),
            Self::Acl => write!(f, "ACL"),
            Self::Quota => write!(f, "QUOTA"),
            Self::Metadata => write!(f, "METADATA"),
            Self::MetadataServer => write!(f, "METADATA-SERVER"),
            Self::Notify => write!(f, "NOTIFY"),
            Self::Unselect => write!(f, "UNSELECT"),
            Self::GmailExt1 => write!(f, "X-GM-EXT-1"),
            Self::Unknown(s) => write!(f, "{s}"),
        }
    }
}

/// The set of capabilities advertised by a server, with derived lookups.
///
/// Reset and re-learned after STARTTLS and again after authentication.
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    caps: Vec<Capability>,
    /// Capabilities turned on via ENABLE (RFC 5161).
    enabled: Vec<Capability>,
}

impl Capabilities {
    /// Creates an empty capability set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the advertised set, keeping ENABLEd state.
    pub fn replace(&mut self, caps: Vec<Capability>) {
        self.caps = caps;
    }

    /// Clears everything, as required after STARTTLS.
    pub fn reset(&mut self) {
        self.caps.clear();
        self.enabled.clear();
    }

    /// Records a capability the server confirmed via `* ENABLED`.
    pub fn mark_enabled(&mut self, cap: Capability) {
        if !self.enabled.contains(&cap) {
            self.enabled.push(cap);
        }
    }

    /// Returns true if the capability was advertised.
    #[must_use]
    pub fn has(&self, cap: &Capability) -> bool {
        self.caps.contains(cap)
    }

    /// Returns true if the capability has been ENABLEd this session.
    #[must_use]
    pub fn is_enabled(&self, cap: &Capability) -> bool {
        self.enabled.contains(cap)
    }

    /// Returns the advertised capabilities.
    #[must_use]
    pub fn as_slice(&self) -> &[Capability] {
        &self.caps
    }

    /// Returns the advertised AUTH= mechanisms.
    pub fn auth_mechanisms(&self) -> impl Iterator<Item = &str> {
        self.caps.iter().filter_map(|c| match c {
            Capability::Auth(m) => Some(m.as_str()),
            _ => None,
        })
    }

    /// Returns the advertised THREAD= algorithms.
    pub fn thread_algorithms(&self) -> impl Iterator<Item = &str> {
        self.caps.iter().filter_map(|c| match c {
            Capability::Thread(alg) => Some(alg.as_str()),
            _ => None,
        })
    }

    /// IDLE (RFC 2177).
    #[must_use]
    pub fn supports_idle(&self) -> bool {
        self.has(&Capability::Idle)
    }

    /// CONDSTORE (RFC 7162).
    #[must_use]
    pub fn supports_condstore(&self) -> bool {
        self.has(&Capability::CondStore) || self.has(&Capability::QResync)
    }

    /// QRESYNC (RFC 7162).
    #[must_use]
    pub fn supports_qresync(&self) -> bool {
        self.has(&Capability::QResync)
    }

    /// UIDPLUS (RFC 4315).
    #[must_use]
    pub fn supports_uidplus(&self) -> bool {
        self.has(&Capability::UidPlus)
    }

    /// MOVE (RFC 6851).
    #[must_use]
    pub fn supports_move(&self) -> bool {
        self.has(&Capability::Move)
    }

    /// ESEARCH (RFC 4731).
    #[must_use]
    pub fn supports_esearch(&self) -> bool {
        self.has(&Capability::Esearch)
    }

    /// SORT (RFC 5256).
    #[must_use]
    pub fn supports_sort(&self) -> bool {
        self.has(&Capability::Sort)
    }

    /// At least one THREAD algorithm (RFC 5256).
    #[must_use]
    pub fn supports_thread(&self) -> bool {
        self.thread_algorithms().next().is_some()
    }

    /// NOTIFY (RFC 5465).
    #[must_use]
    pub fn supports_notify(&self) -> bool {
        self.has(&Capability::Notify)
    }

    /// LITERAL+ or LITERAL- (RFC 7888).
    #[must_use]
    pub fn supports_nonsync_literals(&self) -> bool {
        self.has(&Capability::LiteralPlus) || self.has(&Capability::LiteralMinus)
    }

    /// LITERAL- caps non-synchronizing literals at 4096 bytes.
    #[must_use]
    pub fn nonsync_literal_limit(&self) -> Option<usize> {
        if self.has(&Capability::LiteralPlus) {
            Some(usize::MAX)
        } else if self.has(&Capability::LiteralMinus) {
            Some(4096)
        } else {
            None
        }
    }

    /// BINARY (RFC 3516).
    #[must_use]
    pub fn supports_binary(&self) -> bool {
        self.has(&Capability::Binary)
    }

    /// UTF8=ACCEPT (RFC 6855).
    #[must_use]
    pub fn supports_utf8_accept(&self) -> bool {
        self.has(&Capability::Utf8Accept)
    }

    /// STARTTLS.
    #[must_use]
    pub fn supports_starttls(&self) -> bool {
        self.has(&Capability::StartTls)
    }

    /// ACL (RFC 4314).
    #[must_use]
    pub fn supports_acl(&self) -> bool {
        self.has(&Capability::Acl)
    }

    /// QUOTA (RFC 2087).
    #[must_use]
    pub fn supports_quota(&self) -> bool {
        self.has(&Capability::Quota)
    }

    /// METADATA (RFC 5464).
    #[must_use]
    pub fn supports_metadata(&self) -> bool {
        self.has(&Capability::Metadata) || self.has(&Capability::MetadataServer)
    }

    /// COMPRESS=DEFLATE (RFC 4978).
    #[must_use]
    pub fn supports_compress(&self) -> bool {
        self.has(&Capability::CompressDeflate)
    }

    /// MULTIAPPEND (RFC 3502).
    #[must_use]
    pub fn supports_multiappend(&self) -> bool {
        self.has(&Capability::MultiAppend)
    }

    /// UNSELECT (RFC 3691).
    #[must_use]
    pub fn supports_unselect(&self) -> bool {
        self.has(&Capability::Unselect)
    }

    /// SASL-IR (RFC 4959).
    #[must_use]
    pub fn supports_sasl_ir(&self) -> bool {
        self.has(&Capability::SaslIr)
    }

    /// ENABLE (RFC 5161).
    #[must_use]
    pub fn supports_enable(&self) -> bool {
        self.has(&Capability::Enable)
    }

    /// ID (RFC 2971).
    #[must_use]
    pub fn supports_id(&self) -> bool {
        self.has(&Capability::Id)
    }

    /// Gmail extension set (labels, message/thread ids).
    #[must_use]
    pub fn supports_gmail_ext(&self) -> bool {
        self.has(&Capability::GmailExt1)
    }

    /// LOGINDISABLED advertised.
    #[must_use]
    pub fn login_disabled(&self) -> bool {
        self.has(&Capability::LoginDisabled)
    }
}

impl FromIterator<Capability> for Capabilities {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        Self {
            caps: iter.into_iter().collect(),
            enabled: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps_of(tokens: &[&str]) -> Capabilities {
        tokens.iter().map(|s| Capability::parse(s)).collect()
    }

    #[test]
    fn status_is_ok() {
        assert!(Status::Ok.is_ok());
        assert!(Status::PreAuth.is_ok());
        assert!(!Status::No.is_ok());
        assert!(!Status::Bad.is_ok());
        assert!(!Status::Bye.is_ok());
    }

    #[test]
    fn parse_matrix() {
        assert_eq!(Capability::parse("IMAP4rev1"), Capability::Imap4Rev1);
        assert_eq!(Capability::parse("COMPRESS=DEFLATE"), Capability::CompressDeflate);
        assert_eq!(
            Capability::parse("THREAD=REFERENCES"),
            Capability::Thread("REFERENCES".to_string())
        );
        assert_eq!(
            Capability::parse("AUTH=xoauth2"),
            Capability::Auth("XOAUTH2".to_string())
        );
        assert_eq!(Capability::parse("SASL-IR"), Capability::SaslIr);
        assert_eq!(Capability::parse("X-GM-EXT-1"), Capability::GmailExt1);
        assert_eq!(
            Capability::parse("XAPPLEPUSHSERVICE"),
            Capability::Unknown("XAPPLEPUSHSERVICE".to_string())
        );
    }

    #[test]
    fn display_round_trips() {
        for token in [
            "IMAP4rev1",
            "IDLE",
            "UIDPLUS",
            "LITERAL+",
            "UTF8=ACCEPT",
            "THREAD=ORDEREDSUBJECT",
            "COMPRESS=DEFLATE",
        ] {
            let cap = Capability::parse(token);
            assert_eq!(Capability::parse(&cap.to_string()), cap);
        }
    }

    #[test]
    fn derived_booleans() {
        let caps = caps_of(&[
            "IMAP4rev1",
            "IDLE",
            "UIDPLUS",
            "CONDSTORE",
            "LITERAL+",
            "THREAD=REFERENCES",
            "AUTH=PLAIN",
        ]);
        assert!(caps.supports_idle());
        assert!(caps.supports_uidplus());
        assert!(caps.supports_condstore());
        assert!(!caps.supports_qresync());
        assert!(caps.supports_thread());
        assert!(caps.supports_nonsync_literals());
        assert!(!caps.supports_compress());
        assert_eq!(caps.auth_mechanisms().collect::<Vec<_>>(), vec!["PLAIN"]);
    }

    #[test]
    fn qresync_implies_condstore() {
        let caps = caps_of(&["IMAP4rev1", "QRESYNC"]);
        assert!(caps.supports_condstore());
        assert!(caps.supports_qresync());
    }

    #[test]
    fn literal_minus_limit() {
        let caps = caps_of(&["IMAP4rev1", "LITERAL-"]);
        assert_eq!(caps.nonsync_literal_limit(), Some(4096));
        let caps = caps_of(&["IMAP4rev1", "LITERAL+"]);
        assert_eq!(caps.nonsync_literal_limit(), Some(usize::MAX));
        let caps = caps_of(&["IMAP4rev1"]);
        assert_eq!(caps.nonsync_literal_limit(), None);
    }

    #[test]
    fn reset_clears_everything() {
        let mut caps = caps_of(&["IMAP4rev1", "UTF8=ACCEPT"]);
        caps.mark_enabled(Capability::Utf8Accept);
        assert!(caps.is_enabled(&Capability::Utf8Accept));
        caps.reset();
        assert!(!caps.supports_utf8_accept());
        assert!(!caps.is_enabled(&Capability::Utf8Accept));
    }
}
