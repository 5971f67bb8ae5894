//! IMAP command builder.
//!
//! [`Command`] enumerates every operation the engine can issue and encodes
//! itself into line/literal phases via [`EncodedCommand`]. The connection
//! layer owns tag assignment and literal continuation handling.

mod serialize;
mod tag_generator;
mod types;

use crate::qresync::QresyncParams;
use crate::types::{Mailbox, MetadataEntry, ModSeq, SequenceSet};

pub use serialize::{CommandEncoder, CommandPart, EncodedCommand};
pub use tag_generator::TagGenerator;
pub use types::{
    AppendMessage, FetchAttribute, FetchItems, NotifyEvent, NotifyRequest, SearchCriteria,
    SearchReturn, SortKey, StatusAttribute, StoreAction, ThreadAlgorithm,
};

use serialize::{
    settable_flags, write_append_message, write_fetch_items, write_notify_request,
    write_search_criteria, write_sort_keys, write_store_action,
};

/// IMAP command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // Any state
    /// CAPABILITY command.
    Capability,
    /// NOOP command.
    Noop,
    /// LOGOUT command.
    Logout,
    /// ID command (RFC 2971). `None` sends `ID NIL`.
    Id {
        /// Client identification field/value pairs.
        parameters: Option<Vec<(String, String)>>,
    },

    // Not authenticated
    /// STARTTLS command.
    StartTls,
    /// LOGIN command.
    Login {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },
    /// AUTHENTICATE command.
    Authenticate {
        /// SASL mechanism name.
        mechanism: String,
        /// Base64 initial response (SASL-IR).
        initial_response: Option<String>,
    },

    // Authenticated
    /// ENABLE command (RFC 5161).
    Enable {
        /// Capability names to enable.
        capabilities: Vec<String>,
    },
    /// COMPRESS command (RFC 4978).
    Compress,
    /// SELECT command, with optional CONDSTORE/QRESYNC parameters.
    Select {
        /// Mailbox to select.
        mailbox: Mailbox,
        /// Append `(CONDSTORE)`.
        condstore: bool,
        /// QRESYNC resync parameters.
        qresync: Option<QresyncParams>,
    },
    /// EXAMINE command (read-only SELECT).
    Examine {
        /// Mailbox to examine.
        mailbox: Mailbox,
        /// Append `(CONDSTORE)`.
        condstore: bool,
        /// QRESYNC resync parameters.
        qresync: Option<QresyncParams>,
    },
    /// CREATE command.
    Create {
        /// Mailbox to create.
        mailbox: Mailbox,
    },
    /// DELETE command.
    Delete {
        /// Mailbox to delete.
        mailbox: Mailbox,
    },
    /// RENAME command.
    Rename {
        /// Current mailbox name.
        from: Mailbox,
        /// New mailbox name.
        to: Mailbox,
    },
    /// SUBSCRIBE command.
    Subscribe {
        /// Mailbox to subscribe.
        mailbox: Mailbox,
    },
    /// UNSUBSCRIBE command.
    Unsubscribe {
        /// Mailbox to unsubscribe.
        mailbox: Mailbox,
    },
    /// LIST command, with LIST-EXTENDED options when requested.
    List {
        /// Reference name.
        reference: String,
        /// Mailbox pattern.
        pattern: String,
        /// `(SUBSCRIBED)` selection option.
        select_subscribed: bool,
        /// `RETURN (SUBSCRIBED)`.
        return_subscribed: bool,
        /// `RETURN (CHILDREN)`.
        return_children: bool,
        /// `RETURN (STATUS (...))` (RFC 5819).
        return_status: Option<Vec<StatusAttribute>>,
    },
    /// LSUB command.
    Lsub {
        /// Reference name.
        reference: String,
        /// Mailbox pattern.
        pattern: String,
    },
    /// XLIST command (pre-SPECIAL-USE Gmail).
    XList {
        /// Reference name.
        reference: String,
        /// Mailbox pattern.
        pattern: String,
    },
    /// NAMESPACE command.
    Namespace,
    /// STATUS command.
    Status {
        /// Mailbox name.
        mailbox: Mailbox,
        /// Attributes to request.
        items: Vec<StatusAttribute>,
    },
    /// APPEND command; more than one message is a MULTIAPPEND (RFC 3502).
    Append {
        /// Target mailbox.
        mailbox: Mailbox,
        /// Messages to upload.
        messages: Vec<AppendMessage>,
    },
    /// GETQUOTA command (RFC 2087).
    GetQuota {
        /// Quota root.
        root: String,
    },
    /// GETQUOTAROOT command (RFC 2087).
    GetQuotaRoot {
        /// Mailbox.
        mailbox: Mailbox,
    },
    /// SETQUOTA command (RFC 2087).
    SetQuota {
        /// Quota root.
        root: String,
        /// Resource limits (name, limit).
        limits: Vec<(String, u64)>,
    },
    /// GETACL command (RFC 4314).
    GetAcl {
        /// Mailbox.
        mailbox: Mailbox,
    },
    /// SETACL command (RFC 4314).
    SetAcl {
        /// Mailbox.
        mailbox: Mailbox,
        /// Identifier.
        identifier: String,
        /// Rights modification string.
        rights: String,
    },
    /// DELETEACL command (RFC 4314).
    DeleteAcl {
        /// Mailbox.
        mailbox: Mailbox,
        /// Identifier.
        identifier: String,
    },
    /// MYRIGHTS command (RFC 4314).
    MyRights {
        /// Mailbox.
        mailbox: Mailbox,
    },
    /// LISTRIGHTS command (RFC 4314).
    ListRights {
        /// Mailbox.
        mailbox: Mailbox,
        /// Identifier.
        identifier: String,
    },
    /// GETMETADATA command (RFC 5464).
    GetMetadata {
        /// Mailbox (empty for server metadata).
        mailbox: Mailbox,
        /// Entry names.
        entries: Vec<String>,
    },
    /// SETMETADATA command (RFC 5464).
    SetMetadata {
        /// Mailbox (empty for server metadata).
        mailbox: Mailbox,
        /// Entries to set; a `None` value removes the entry.
        entries: Vec<MetadataEntry>,
    },
    /// NOTIFY command (RFC 5465).
    Notify {
        /// The notification request.
        request: NotifyRequest,
    },

    // Selected
    /// CHECK command.
    Check,
    /// CLOSE command.
    Close,
    /// UNSELECT command (RFC 3691).
    Unselect,
    /// EXPUNGE command.
    Expunge,
    /// UID EXPUNGE command (RFC 4315).
    UidExpunge {
        /// UIDs to expunge.
        uids: SequenceSet,
    },
    /// SEARCH command, optionally ESEARCH (`RETURN (...)`).
    Search {
        /// Search criteria.
        criteria: SearchCriteria,
        /// Use UID SEARCH.
        uid: bool,
        /// CHARSET argument.
        charset: Option<String>,
        /// ESEARCH return options (RFC 4731).
        returns: Vec<SearchReturn>,
    },
    /// SORT command (RFC 5256).
    Sort {
        /// Sort program.
        keys: Vec<SortKey>,
        /// Search criteria.
        criteria: SearchCriteria,
        /// Use UID SORT.
        uid: bool,
        /// Charset (required by the SORT grammar).
        charset: String,
    },
    /// THREAD command (RFC 5256).
    Thread {
        /// Threading algorithm.
        algorithm: ThreadAlgorithm,
        /// Search criteria.
        criteria: SearchCriteria,
        /// Use UID THREAD.
        uid: bool,
        /// Charset (required by the THREAD grammar).
        charset: String,
    },
    /// FETCH command, with CONDSTORE modifiers.
    Fetch {
        /// Sequence set.
        sequence: SequenceSet,
        /// Items to fetch.
        items: FetchItems,
        /// Use UID FETCH.
        uid: bool,
        /// `(CHANGEDSINCE modseq)` modifier (RFC 7162).
        changed_since: Option<ModSeq>,
        /// Append `VANISHED` to CHANGEDSINCE (QRESYNC).
        vanished: bool,
    },
    /// STORE command.
    Store {
        /// Sequence set.
        sequence: SequenceSet,
        /// Action and operands.
        action: StoreAction,
        /// Use UID STORE.
        uid: bool,
        /// Suppress the untagged FETCH echo.
        silent: bool,
        /// `(UNCHANGEDSINCE modseq)` modifier (RFC 7162).
        unchanged_since: Option<ModSeq>,
    },
    /// COPY command.
    Copy {
        /// Sequence set.
        sequence: SequenceSet,
        /// Target mailbox.
        mailbox: Mailbox,
        /// Use UID COPY.
        uid: bool,
    },
    /// MOVE command (RFC 6851).
    Move {
        /// Sequence set.
        sequence: SequenceSet,
        /// Target mailbox.
        mailbox: Mailbox,
        /// Use UID MOVE.
        uid: bool,
    },
    /// IDLE command (RFC 2177).
    Idle,
    /// DONE (ends IDLE; sent without a tag).
    Done,
}

impl Command {
    /// Encodes the command with the given tag into line/literal phases.
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub fn encode(&self, tag: &str) -> EncodedCommand {
        let mut enc = if matches!(self, Self::Done) {
            CommandEncoder::untagged()
        } else {
            CommandEncoder::new(tag)
        };

        match self {
            Self::Capability => enc.text("CAPABILITY"),
            Self::Noop => enc.text("NOOP"),
            Self::Logout => enc.text("LOGOUT"),
            Self::StartTls => enc.text("STARTTLS"),
            Self::Compress => enc.text("COMPRESS DEFLATE"),
            Self::Check => enc.text("CHECK"),
            Self::Close => enc.text("CLOSE"),
            Self::Unselect => enc.text("UNSELECT"),
            Self::Expunge => enc.text("EXPUNGE"),
            Self::Namespace => enc.text("NAMESPACE"),
            Self::Idle => enc.text("IDLE"),
            Self::Done => enc.text("DONE"),

            Self::Login { username, password } => {
                enc.text("LOGIN ");
                enc.astring(username);
                enc.byte(b' ');
                enc.astring(password);
            }

            Self::Authenticate {
                mechanism,
                initial_response,
            } => {
                enc.text("AUTHENTICATE ");
                enc.text(mechanism);
                if let Some(resp) = initial_response {
                    enc.byte(b' ');
                    enc.text(resp);
                }
            }

            Self::Id { parameters } => {
                enc.text("ID ");
                if let Some(params) = parameters {
                    enc.byte(b'(');
                    for (i, (key, value)) in params.iter().enumerate() {
                        if i > 0 {
                            enc.byte(b' ');
                        }
                        enc.astring(key);
                        enc.byte(b' ');
                        enc.astring(value);
                    }
                    enc.byte(b')');
                } else {
                    enc.text("NIL");
                }
            }

            Self::Enable { capabilities } => {
                enc.text("ENABLE");
                for cap in capabilities {
                    enc.byte(b' ');
                    enc.text(cap);
                }
            }

            Self::Select {
                mailbox,
                condstore,
                qresync,
            } => {
                enc.text("SELECT ");
                enc.mailbox(mailbox);
                write_select_params(&mut enc, *condstore, qresync.as_ref());
            }

            Self::Examine {
                mailbox,
                condstore,
                qresync,
            } => {
                enc.text("EXAMINE ");
                enc.mailbox(mailbox);
                write_select_params(&mut enc, *condstore, qresync.as_ref());
            }

            Self::Create { mailbox } => {
                enc.text("CREATE ");
                enc.mailbox(mailbox);
            }

            Self::Delete { mailbox } => {
                enc.text("DELETE ");
                enc.mailbox(mailbox);
            }

            Self::Rename { from, to } => {
                enc.text("RENAME ");
                enc.mailbox(from);
                enc.byte(b' ');
                enc.mailbox(to);
            }

            Self::Subscribe { mailbox } => {
                enc.text("SUBSCRIBE ");
                enc.mailbox(mailbox);
            }

            Self::Unsubscribe { mailbox } => {
                enc.text("UNSUBSCRIBE ");
                enc.mailbox(mailbox);
            }

            Self::List {
                reference,
                pattern,
                select_subscribed,
                return_subscribed,
                return_children,
                return_status,
            } => {
                enc.text("LIST ");
                if *select_subscribed {
                    enc.text("(SUBSCRIBED) ");
                }
                enc.astring(reference);
                enc.byte(b' ');
                enc.astring(pattern);

                let mut returns: Vec<String> = Vec::new();
                if *return_subscribed {
                    returns.push("SUBSCRIBED".to_string());
                }
                if *return_children {
                    returns.push("CHILDREN".to_string());
                }
                if let Some(items) = return_status {
                    let names: Vec<&str> = items.iter().map(|i| i.as_str()).collect();
                    returns.push(format!("STATUS ({})", names.join(" ")));
                }
                if !returns.is_empty() {
                    enc.text(&format!(" RETURN ({})", returns.join(" ")));
                }
            }

            Self::Lsub { reference, pattern } => {
                enc.text("LSUB ");
                enc.astring(reference);
                enc.byte(b' ');
                enc.astring(pattern);
            }

            Self::XList { reference, pattern } => {
                enc.text("XLIST ");
                enc.astring(reference);
                enc.byte(b' ');
                enc.astring(pattern);
            }

            Self::Status { mailbox, items } => {
                enc.text("STATUS ");
                enc.mailbox(mailbox);
                enc.text(" (");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        enc.byte(b' ');
                    }
                    enc.text(item.as_str());
                }
                enc.byte(b')');
            }

            Self::Append { mailbox, messages } => {
                enc.text("APPEND ");
                enc.mailbox(mailbox);
                for message in messages {
                    let message = AppendMessage {
                        flags: message.flags.as_ref().map(settable_flags),
                        internal_date: message.internal_date.clone(),
                        body: message.body.clone(),
                    };
                    write_append_message(&mut enc, &message);
                }
            }

            Self::GetQuota { root } => {
                enc.text("GETQUOTA ");
                enc.astring(root);
            }

            Self::GetQuotaRoot { mailbox } => {
                enc.text("GETQUOTAROOT ");
                enc.mailbox(mailbox);
            }

            Self::SetQuota { root, limits } => {
                enc.text("SETQUOTA ");
                enc.astring(root);
                enc.text(" (");
                for (i, (name, limit)) in limits.iter().enumerate() {
                    if i > 0 {
                        enc.byte(b' ');
                    }
                    enc.text(&format!("{name} {limit}"));
                }
                enc.byte(b')');
            }

            Self::GetAcl { mailbox } => {
                enc.text("GETACL ");
                enc.mailbox(mailbox);
            }

            Self::SetAcl {
                mailbox,
                identifier,
                rights,
            } => {
                enc.text("SETACL ");
                enc.mailbox(mailbox);
                enc.byte(b' ');
                enc.astring(identifier);
                enc.byte(b' ');
                enc.astring(rights);
            }

            Self::DeleteAcl {
                mailbox,
                identifier,
            } => {
                enc.text("DELETEACL ");
                enc.mailbox(mailbox);
                enc.byte(b' ');
                enc.astring(identifier);
            }

            Self::MyRights { mailbox } => {
                enc.text("MYRIGHTS ");
                enc.mailbox(mailbox);
            }

            Self::ListRights {
                mailbox,
                identifier,
            } => {
                enc.text("LISTRIGHTS ");
                enc.mailbox(mailbox);
                enc.byte(b' ');
                enc.astring(identifier);
            }

            Self::GetMetadata { mailbox, entries } => {
                enc.text("GETMETADATA ");
                enc.mailbox(mailbox);
                enc.text(" (");
                for (i, entry) in entries.iter().enumerate() {
                    if i > 0 {
                        enc.byte(b' ');
                    }
                    enc.astring(entry);
                }
                enc.byte(b')');
            }

            Self::SetMetadata { mailbox, entries } => {
                enc.text("SETMETADATA ");
                enc.mailbox(mailbox);
                enc.text(" (");
                for (i, entry) in entries.iter().enumerate() {
                    if i > 0 {
                        enc.byte(b' ');
                    }
                    enc.astring(&entry.name);
                    enc.byte(b' ');
                    match &entry.value {
                        Some(value) => enc.literal(value.clone()),
                        None => enc.text("NIL"),
                    }
                }
                enc.byte(b')');
            }

            Self::Notify { request } => {
                enc.text("NOTIFY ");
                write_notify_request(&mut enc, request);
            }

            Self::UidExpunge { uids } => {
                enc.text("UID EXPUNGE ");
                enc.text(&uids.to_string());
            }

            Self::Search {
                criteria,
                uid,
                charset,
                returns,
            } => {
                if *uid {
                    enc.text("UID ");
                }
                enc.text("SEARCH ");
                if !returns.is_empty() {
                    let names: Vec<&str> = returns.iter().map(|r| r.as_str()).collect();
                    enc.text(&format!("RETURN ({}) ", names.join(" ")));
                }
                if let Some(charset) = charset {
                    enc.text("CHARSET ");
                    enc.text(charset);
                    enc.byte(b' ');
                }
                write_search_criteria(&mut enc, criteria);
            }

            Self::Sort {
                keys,
                criteria,
                uid,
                charset,
            } => {
                if *uid {
                    enc.text("UID ");
                }
                enc.text("SORT ");
                write_sort_keys(&mut enc, keys);
                enc.byte(b' ');
                enc.text(charset);
                enc.byte(b' ');
                write_search_criteria(&mut enc, criteria);
            }

            Self::Thread {
                algorithm,
                criteria,
                uid,
                charset,
            } => {
                if *uid {
                    enc.text("UID ");
                }
                enc.text("THREAD ");
                enc.text(algorithm.as_str());
                enc.byte(b' ');
                enc.text(charset);
                enc.byte(b' ');
                write_search_criteria(&mut enc, criteria);
            }

            Self::Fetch {
                sequence,
                items,
                uid,
                changed_since,
                vanished,
            } => {
                if *uid {
                    enc.text("UID ");
                }
                enc.text("FETCH ");
                enc.text(&sequence.to_string());
                enc.byte(b' ');
                write_fetch_items(&mut enc, items);
                if let Some(modseq) = changed_since {
                    enc.text(&format!(" (CHANGEDSINCE {modseq}"));
                    if *vanished {
                        enc.text(" VANISHED");
                    }
                    enc.byte(b')');
                }
            }

            Self::Store {
                sequence,
                action,
                uid,
                silent,
                unchanged_since,
            } => {
                if *uid {
                    enc.text("UID ");
                }
                enc.text("STORE ");
                enc.text(&sequence.to_string());
                enc.byte(b' ');
                if let Some(modseq) = unchanged_since {
                    enc.text(&format!("(UNCHANGEDSINCE {modseq}) "));
                }
                write_store_action(&mut enc, action, *silent);
            }

            Self::Copy {
                sequence,
                mailbox,
                uid,
            } => {
                if *uid {
                    enc.text("UID ");
                }
                enc.text("COPY ");
                enc.text(&sequence.to_string());
                enc.byte(b' ');
                enc.mailbox(mailbox);
            }

            Self::Move {
                sequence,
                mailbox,
                uid,
            } => {
                if *uid {
                    enc.text("UID ");
                }
                enc.text("MOVE ");
                enc.text(&sequence.to_string());
                enc.byte(b' ');
                enc.mailbox(mailbox);
            }
        }

        enc.finish()
    }
}

/// Writes the parenthesized SELECT/EXAMINE parameter list.
fn write_select_params(enc: &mut CommandEncoder, condstore: bool, qresync: Option<&QresyncParams>) {
    match (condstore, qresync) {
        (_, Some(params)) => {
            enc.byte(b' ');
            enc.text(&params.serialize());
        }
        (true, None) => enc.text(" (CONDSTORE)"),
        (false, None) => {}
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{Flag, Flags, Uid, UidSet, UidValidity};

    fn wire(cmd: &Command, tag: &str) -> String {
        String::from_utf8(cmd.encode(tag).to_wire_nonsync()).unwrap()
    }

    #[test]
    fn capability() {
        assert_eq!(wire(&Command::Capability, "A0001"), "A0001 CAPABILITY\r\n");
    }

    #[test]
    fn login_plain_and_quoted() {
        let cmd = Command::Login {
            username: "user".to_string(),
            password: "pass word".to_string(),
        };
        assert_eq!(wire(&cmd, "A0002"), "A0002 LOGIN user \"pass word\"\r\n");
    }

    #[test]
    fn authenticate_with_initial_response() {
        let cmd = Command::Authenticate {
            mechanism: "PLAIN".to_string(),
            initial_response: Some("AGpvZQBwYXNz".to_string()),
        };
        assert_eq!(
            wire(&cmd, "A0002"),
            "A0002 AUTHENTICATE PLAIN AGpvZQBwYXNz\r\n"
        );
    }

    #[test]
    fn select_plain_condstore_qresync() {
        let select = Command::Select {
            mailbox: Mailbox::inbox(),
            condstore: false,
            qresync: None,
        };
        assert_eq!(wire(&select, "A0003"), "A0003 SELECT INBOX\r\n");

        let condstore = Command::Select {
            mailbox: Mailbox::inbox(),
            condstore: true,
            qresync: None,
        };
        assert_eq!(wire(&condstore, "A0003"), "A0003 SELECT INBOX (CONDSTORE)\r\n");

        let params = QresyncParams::new(
            UidValidity::new(3_857_529_045).unwrap(),
            ModSeq::from_u64(715_194_045_007).unwrap(),
        );
        let qresync = Command::Select {
            mailbox: Mailbox::inbox(),
            condstore: false,
            qresync: Some(params),
        };
        assert_eq!(
            wire(&qresync, "A0003"),
            "A0003 SELECT INBOX (QRESYNC (3857529045 715194045007))\r\n"
        );
    }

    #[test]
    fn list_extended() {
        let cmd = Command::List {
            reference: String::new(),
            pattern: "*".to_string(),
            select_subscribed: true,
            return_subscribed: true,
            return_children: true,
            return_status: Some(vec![StatusAttribute::Messages, StatusAttribute::UidNext]),
        };
        assert_eq!(
            wire(&cmd, "A0004"),
            "A0004 LIST (SUBSCRIBED) \"\" \"*\" RETURN (SUBSCRIBED CHILDREN STATUS (MESSAGES UIDNEXT))\r\n"
        );
    }

    #[test]
    fn plain_list() {
        let cmd = Command::List {
            reference: String::new(),
            pattern: "*".to_string(),
            select_subscribed: false,
            return_subscribed: false,
            return_children: false,
            return_status: None,
        };
        assert_eq!(wire(&cmd, "A0004"), "A0004 LIST \"\" \"*\"\r\n");
    }

    #[test]
    fn uid_fetch_changedsince_vanished() {
        let cmd = Command::Fetch {
            sequence: SequenceSet::range(300, 500).unwrap(),
            items: FetchItems::Items(vec![FetchAttribute::Uid, FetchAttribute::Flags]),
            uid: true,
            changed_since: ModSeq::from_u64(12345),
            vanished: true,
        };
        assert_eq!(
            wire(&cmd, "A0005"),
            "A0005 UID FETCH 300:500 (UID FLAGS) (CHANGEDSINCE 12345 VANISHED)\r\n"
        );
    }

    #[test]
    fn store_unchangedsince_silent() {
        let uids = UidSet::from_uids([Uid::new(101).unwrap(), Uid::new(102).unwrap()]);
        let cmd = Command::Store {
            sequence: SequenceSet::from_uid_set(&uids),
            action: StoreAction::AddFlags(Flags::from_vec(vec![Flag::Seen])),
            uid: true,
            silent: true,
            unchanged_since: ModSeq::from_u64(1000),
        };
        assert_eq!(
            wire(&cmd, "A0010"),
            "A0010 UID STORE 101:102 (UNCHANGEDSINCE 1000) +FLAGS.SILENT (\\Seen)\r\n"
        );
    }

    #[test]
    fn esearch_return_options() {
        let cmd = Command::Search {
            criteria: SearchCriteria::Unseen,
            uid: true,
            charset: None,
            returns: vec![SearchReturn::Min, SearchReturn::Max, SearchReturn::Count],
        };
        assert_eq!(
            wire(&cmd, "A0006"),
            "A0006 UID SEARCH RETURN (MIN MAX COUNT) UNSEEN\r\n"
        );
    }

    #[test]
    fn search_with_charset() {
        let cmd = Command::Search {
            criteria: SearchCriteria::Subject("héllo".to_string()),
            uid: false,
            charset: Some("UTF-8".to_string()),
            returns: vec![],
        };
        let encoded = cmd.encode("A0006");
        assert_eq!(encoded.literal_count(), 1);
        let text = String::from_utf8_lossy(&encoded.to_wire_nonsync()).into_owned();
        assert!(text.starts_with("A0006 SEARCH CHARSET UTF-8 SUBJECT {6+}\r\n"));
    }

    #[test]
    fn sort_command() {
        let cmd = Command::Sort {
            keys: vec![SortKey::Reverse, SortKey::Date],
            criteria: SearchCriteria::All,
            uid: true,
            charset: "UTF-8".to_string(),
        };
        assert_eq!(
            wire(&cmd, "A0008"),
            "A0008 UID SORT (REVERSE DATE) UTF-8 ALL\r\n"
        );
    }

    #[test]
    fn thread_command() {
        let cmd = Command::Thread {
            algorithm: ThreadAlgorithm::References,
            criteria: SearchCriteria::All,
            uid: false,
            charset: "US-ASCII".to_string(),
        };
        assert_eq!(
            wire(&cmd, "A0009"),
            "A0009 THREAD REFERENCES US-ASCII ALL\r\n"
        );
    }

    #[test]
    fn append_single() {
        let cmd = Command::Append {
            mailbox: Mailbox::new("saved-messages"),
            messages: vec![AppendMessage::new(b"a message".to_vec())],
        };
        assert_eq!(
            wire(&cmd, "A0007"),
            "A0007 APPEND saved-messages {9+}\r\na message\r\n"
        );
    }

    #[test]
    fn multiappend_has_one_literal_per_message() {
        let cmd = Command::Append {
            mailbox: Mailbox::inbox(),
            messages: vec![
                AppendMessage::new(b"first".to_vec()),
                AppendMessage::new(b"second".to_vec())
                    .with_flags(Flags::from_vec(vec![Flag::Flagged])),
            ],
        };
        let encoded = cmd.encode("A0008");
        assert_eq!(encoded.literal_count(), 2);
        assert_eq!(
            encoded.to_wire_nonsync(),
            b"A0008 APPEND INBOX {5+}\r\nfirst (\\Flagged) {6+}\r\nsecond\r\n"
        );
    }

    #[test]
    fn append_strips_recent() {
        let cmd = Command::Append {
            mailbox: Mailbox::inbox(),
            messages: vec![
                AppendMessage::new(b"x".to_vec())
                    .with_flags(Flags::from_vec(vec![Flag::Seen, Flag::Recent])),
            ],
        };
        let text = wire(&cmd, "A0009");
        assert!(text.contains("(\\Seen)"));
        assert!(!text.contains("Recent"));
    }

    #[test]
    fn move_and_copy() {
        let cmd = Command::Move {
            sequence: SequenceSet::range(1, 3).unwrap(),
            mailbox: Mailbox::new("Archive"),
            uid: true,
        };
        assert_eq!(wire(&cmd, "A0010"), "A0010 UID MOVE 1:3 Archive\r\n");

        let cmd = Command::Copy {
            sequence: SequenceSet::single(7).unwrap(),
            mailbox: Mailbox::new("Backup"),
            uid: false,
        };
        assert_eq!(wire(&cmd, "A0011"), "A0011 COPY 7 Backup\r\n");
    }

    #[test]
    fn quota_commands() {
        assert_eq!(
            wire(
                &Command::SetQuota {
                    root: String::new(),
                    limits: vec![("STORAGE".to_string(), 512)]
                },
                "A0012"
            ),
            "A0012 SETQUOTA \"\" (STORAGE 512)\r\n"
        );
        assert_eq!(
            wire(
                &Command::GetQuotaRoot {
                    mailbox: Mailbox::inbox()
                },
                "A0013"
            ),
            "A0013 GETQUOTAROOT INBOX\r\n"
        );
    }

    #[test]
    fn acl_commands() {
        assert_eq!(
            wire(
                &Command::SetAcl {
                    mailbox: Mailbox::inbox(),
                    identifier: "alice".to_string(),
                    rights: "+lrswi".to_string(),
                },
                "A0014"
            ),
            "A0014 SETACL INBOX alice +lrswi\r\n"
        );
        assert_eq!(
            wire(
                &Command::MyRights {
                    mailbox: Mailbox::inbox()
                },
                "A0015"
            ),
            "A0015 MYRIGHTS INBOX\r\n"
        );
    }

    #[test]
    fn metadata_commands() {
        assert_eq!(
            wire(
                &Command::GetMetadata {
                    mailbox: Mailbox::inbox(),
                    entries: vec!["/shared/comment".to_string()],
                },
                "A0016"
            ),
            "A0016 GETMETADATA INBOX (/shared/comment)\r\n"
        );

        let set = Command::SetMetadata {
            mailbox: Mailbox::inbox(),
            entries: vec![MetadataEntry {
                name: "/shared/comment".to_string(),
                value: Some(b"My comment".to_vec()),
            }],
        };
        assert_eq!(
            set.encode("A0017").to_wire_nonsync(),
            b"A0017 SETMETADATA INBOX (/shared/comment {10+}\r\nMy comment)\r\n"
        );
    }

    #[test]
    fn uid_expunge() {
        let cmd = Command::UidExpunge {
            uids: SequenceSet::range(100, 200).unwrap(),
        };
        assert_eq!(wire(&cmd, "A0018"), "A0018 UID EXPUNGE 100:200\r\n");
    }

    #[test]
    fn notify_selected() {
        let cmd = Command::Notify {
            request: NotifyRequest::Selected(vec![
                NotifyEvent::MessageNew,
                NotifyEvent::MessageExpunge,
                NotifyEvent::FlagChange,
            ]),
        };
        assert_eq!(
            wire(&cmd, "A0019"),
            "A0019 NOTIFY SET (SELECTED (MessageNew MessageExpunge FlagChange))\r\n"
        );
    }

    #[test]
    fn done_has_no_tag() {
        assert_eq!(wire(&Command::Done, ""), "DONE\r\n");
    }

    #[test]
    fn compress() {
        assert_eq!(wire(&Command::Compress, "A0020"), "A0020 COMPRESS DEFLATE\r\n");
    }
}
