//! Server quirks and workarounds.
//!
//! IMAP servers disagree on the edges of the RFCs. This module fingerprints
//! the server from its capabilities, greeting, and ID response, and derives
//! the workaround switches the engine consults (IDLE renewal cadence, label
//! semantics, mailbox-name normalization).

use crate::types::{Capabilities, Capability};

/// Known IMAP server families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerType {
    /// Unknown or generic IMAP server.
    #[default]
    Unknown,
    /// Gmail IMAP (imap.gmail.com).
    Gmail,
    /// Microsoft Outlook / Office 365.
    Outlook,
    /// Yahoo Mail.
    Yahoo,
    /// Apple iCloud Mail.
    ICloud,
    /// Fastmail.
    Fastmail,
    /// Dovecot.
    Dovecot,
    /// Courier IMAP.
    Courier,
    /// Cyrus IMAP.
    Cyrus,
}

impl ServerType {
    /// Detects the server family from capabilities, the greeting line, and
    /// any ID response fields.
    #[must_use]
    pub fn detect(
        capabilities: &Capabilities,
        greeting: Option<&str>,
        id_fields: Option<&[(String, String)]>,
    ) -> Self {
        if capabilities.supports_gmail_ext() {
            return Self::Gmail;
        }

        if let Some(fields) = id_fields {
            for (key, value) in fields {
                if key.eq_ignore_ascii_case("name") {
                    if let Some(found) = Self::from_text(value) {
                        return found;
                    }
                }
            }
        }

        for cap in capabilities.as_slice() {
            if let Capability::Unknown(s) = cap {
                let upper = s.to_uppercase();
                if upper.starts_with("X-GM-") {
                    return Self::Gmail;
                }
                if upper == "XYMHIGHESTMODSEQ" {
                    return Self::Yahoo;
                }
            }
        }

        greeting.and_then(Self::from_text).unwrap_or_default()
    }

    fn from_text(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        if lower.contains("gimap") || lower.contains("gmail") {
            Some(Self::Gmail)
        } else if lower.contains("outlook") || lower.contains("microsoft") {
            Some(Self::Outlook)
        } else if lower.contains("dovecot") {
            Some(Self::Dovecot)
        } else if lower.contains("courier") {
            Some(Self::Courier)
        } else if lower.contains("cyrus") {
            Some(Self::Cyrus)
        } else if lower.contains("fastmail") {
            Some(Self::Fastmail)
        } else if lower.contains("icloud") || lower.contains("apple") {
            Some(Self::ICloud)
        } else if lower.contains("yahoo") {
            Some(Self::Yahoo)
        } else {
            None
        }
    }
}

/// Server-specific switches consulted by the engine.
#[derive(Debug, Clone, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct ServerQuirks {
    /// The detected server family.
    pub server_type: ServerType,

    /// Gmail folders are labels; MOVE between them relabels rather than
    /// copies, and `X-GM-LABELS` store actions are meaningful.
    pub gmail_labels: bool,

    /// Some servers treat mailbox names other than INBOX case-sensitively.
    pub inbox_case_sensitive: bool,

    /// Seconds before IDLE should be refreshed. Gmail drops idle
    /// connections at 10 minutes; the RFC bound is 29.
    pub idle_renewal_secs: u32,

    /// Server rejects SEARCH CHARSET arguments other than US-ASCII.
    pub no_search_charset: bool,

    /// Server auto-expunges on CLOSE; no explicit EXPUNGE needed.
    pub auto_expunge_on_close: bool,
}

impl ServerQuirks {
    /// Derives quirks for the detected server family.
    #[must_use]
    pub fn for_server(server_type: ServerType) -> Self {
        let base = Self {
            server_type,
            ..Default::default()
        };

        match server_type {
            ServerType::Gmail => Self {
                gmail_labels: true,
                idle_renewal_secs: 540,
                // Gmail rejects CHARSET on SEARCH; it is always UTF-8.
                no_search_charset: true,
                ..base
            },
            ServerType::Outlook | ServerType::Fastmail => Self {
                idle_renewal_secs: 1680,
                ..base
            },
            ServerType::Yahoo | ServerType::ICloud => Self {
                idle_renewal_secs: 1200,
                ..base
            },
            ServerType::Dovecot => Self {
                idle_renewal_secs: 1680,
                auto_expunge_on_close: true,
                ..base
            },
            ServerType::Courier | ServerType::Cyrus => Self {
                inbox_case_sensitive: true,
                idle_renewal_secs: 1680,
                ..base
            },
            ServerType::Unknown => Self {
                idle_renewal_secs: 540,
                ..base
            },
        }
    }

    /// Returns the IDLE renewal interval as a Duration.
    #[must_use]
    pub fn idle_renewal(&self) -> std::time::Duration {
        std::time::Duration::from_secs(u64::from(self.idle_renewal_secs))
    }

    /// Normalizes a mailbox name: INBOX is canonicalized regardless of
    /// spelling, other names pass through.
    #[must_use]
    pub fn normalize_mailbox(&self, mailbox: &str) -> String {
        if mailbox.eq_ignore_ascii_case("inbox") {
            return "INBOX".to_string();
        }
        mailbox.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps_of(tokens: &[&str]) -> Capabilities {
        tokens.iter().map(|s| Capability::parse(s)).collect()
    }

    #[test]
    fn detect_gmail_from_extension() {
        let caps = caps_of(&["IMAP4rev1", "X-GM-EXT-1"]);
        assert_eq!(ServerType::detect(&caps, None, None), ServerType::Gmail);
    }

    #[test]
    fn detect_from_greeting() {
        let caps = caps_of(&["IMAP4rev1"]);
        assert_eq!(
            ServerType::detect(&caps, Some("Dovecot ready."), None),
            ServerType::Dovecot
        );
    }

    #[test]
    fn detect_from_id_fields() {
        let caps = caps_of(&["IMAP4rev1"]);
        let fields = vec![("name".to_string(), "Courier-IMAP".to_string())];
        assert_eq!(
            ServerType::detect(&caps, None, Some(&fields)),
            ServerType::Courier
        );
    }

    #[test]
    fn unknown_when_nothing_matches() {
        let caps = caps_of(&["IMAP4rev1"]);
        assert_eq!(
            ServerType::detect(&caps, Some("ready"), None),
            ServerType::Unknown
        );
    }

    #[test]
    fn gmail_quirks() {
        let quirks = ServerQuirks::for_server(ServerType::Gmail);
        assert!(quirks.gmail_labels);
        assert!(quirks.no_search_charset);
        assert_eq!(quirks.idle_renewal_secs, 540);
    }

    #[test]
    fn normalize_inbox() {
        let quirks = ServerQuirks::for_server(ServerType::Unknown);
        assert_eq!(quirks.normalize_mailbox("inbox"), "INBOX");
        assert_eq!(quirks.normalize_mailbox("Sent"), "Sent");
    }
}
