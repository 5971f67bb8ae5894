//! IMAP response parser.
//!
//! Grammar-directed parsing of complete framed server responses into
//! typed values. Any grammar violation aborts the response with a parse
//! error, which the connection layer treats as fatal.

#![allow(clippy::missing_errors_doc)]

mod fetch;
mod helpers;
mod types;

pub use types::{
    Address, BodyStructure, Envelope, EsearchResult, FetchItem, StatusResponse, ThreadNode,
    UntaggedResponse,
};

use crate::parser::lexer::{Lexer, Token};
use crate::types::{ResponseCode, SeqNum, Status, Tag};
use crate::{Error, Result};

use helpers::{
    parse_acl_response, parse_capability_data, parse_esearch_response, parse_id_response,
    parse_list_entry, parse_metadata_response, parse_namespace_response, parse_quota_response,
    parse_quotaroot_response, parse_search_response, parse_sort_response, parse_status_response,
    parse_thread_response, read_sequence_set, read_text_until_crlf,
};

pub(crate) use helpers::parse_flag_list;

/// A parsed IMAP response.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Tagged response (command completion).
    Tagged {
        /// The command tag.
        tag: Tag,
        /// Response status.
        status: Status,
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// Untagged response (server data).
    Untagged(UntaggedResponse),
    /// Continuation request (`+ ...`).
    Continuation {
        /// Optional text or challenge data.
        text: Option<String>,
    },
}

/// Response parser.
pub struct ResponseParser;

impl ResponseParser {
    /// Parses a complete framed response.
    pub fn parse(input: &[u8]) -> Result<Response> {
        let mut lexer = Lexer::new(input);

        match lexer.next_token()? {
            Token::Asterisk => Self::parse_untagged(&mut lexer),
            Token::Plus => Self::parse_continuation(&mut lexer),
            Token::Atom(tag) => Self::parse_tagged(&mut lexer, tag),
            token => Err(Error::Parse {
                position: 0,
                message: format!("expected *, +, or tag, got {token:?}"),
            }),
        }
    }

    /// Parses a tagged response.
    fn parse_tagged(lexer: &mut Lexer<'_>, tag_str: &str) -> Result<Response> {
        lexer.expect_space()?;

        let status = Self::parse_status(lexer)?;
        lexer.expect_space()?;

        let (code, text) = Self::parse_resp_text(lexer)?;

        Ok(Response::Tagged {
            tag: Tag::new(tag_str),
            status,
            code,
            text,
        })
    }

    /// Parses an untagged response.
    #[allow(clippy::too_many_lines)]
    fn parse_untagged(lexer: &mut Lexer<'_>) -> Result<Response> {
        lexer.expect_space()?;

        let token = lexer.next_token()?;

        match token {
            Token::Atom(s) => {
                let upper = s.to_uppercase();
                match upper.as_str() {
                    "OK" => {
                        lexer.expect_space()?;
                        let (code, text) = Self::parse_resp_text(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Ok { code, text }))
                    }
                    "NO" => {
                        lexer.expect_space()?;
                        let (code, text) = Self::parse_resp_text(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::No { code, text }))
                    }
                    "BAD" => {
                        lexer.expect_space()?;
                        let (code, text) = Self::parse_resp_text(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Bad { code, text }))
                    }
                    "PREAUTH" => {
                        lexer.expect_space()?;
                        let (code, text) = Self::parse_resp_text(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::PreAuth { code, text }))
                    }
                    "BYE" => {
                        lexer.expect_space()?;
                        let (code, text) = Self::parse_resp_text(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Bye { code, text }))
                    }
                    "CAPABILITY" => {
                        let caps = parse_capability_data(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Capability(caps)))
                    }
                    "ENABLED" => {
                        let caps = parse_capability_data(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Enabled(caps)))
                    }
                    "FLAGS" => {
                        lexer.expect_space()?;
                        let flags = parse_flag_list(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Flags(flags)))
                    }
                    "LIST" | "XLIST" => {
                        lexer.expect_space()?;
                        let entry = parse_list_entry(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::List(entry)))
                    }
                    "LSUB" => {
                        lexer.expect_space()?;
                        let entry = parse_list_entry(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Lsub(entry)))
                    }
                    "SEARCH" => {
                        let (ids, modseq) = parse_search_response(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Search { ids, modseq }))
                    }
                    "ESEARCH" => {
                        let result = parse_esearch_response(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Esearch(result)))
                    }
                    "SORT" => {
                        let ids = parse_sort_response(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Sort(ids)))
                    }
                    "THREAD" => {
                        let roots = parse_thread_response(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Thread(roots)))
                    }
                    "STATUS" => {
                        lexer.expect_space()?;
                        let status = parse_status_response(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Status(status)))
                    }
                    "NAMESPACE" => {
                        lexer.expect_space()?;
                        let namespaces = parse_namespace_response(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Namespace(namespaces)))
                    }
                    "ID" => {
                        lexer.expect_space()?;
                        let fields = parse_id_response(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Id(fields)))
                    }
                    "QUOTA" => {
                        lexer.expect_space()?;
                        let quota = parse_quota_response(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Quota(quota)))
                    }
                    "QUOTAROOT" => {
                        lexer.expect_space()?;
                        let root = parse_quotaroot_response(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::QuotaRoot(root)))
                    }
                    "ACL" => {
                        lexer.expect_space()?;
                        let acl = parse_acl_response(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Acl(acl)))
                    }
                    "MYRIGHTS" => {
                        lexer.expect_space()?;
                        let mailbox = crate::types::Mailbox::new(lexer.read_astring()?);
                        lexer.expect_space()?;
                        let rights = lexer.read_astring()?;
                        Ok(Response::Untagged(UntaggedResponse::MyRights {
                            mailbox,
                            rights,
                        }))
                    }
                    "LISTRIGHTS" => {
                        lexer.expect_space()?;
                        let mailbox = crate::types::Mailbox::new(lexer.read_astring()?);
                        lexer.expect_space()?;
                        let identifier = lexer.read_astring()?;
                        let mut rights = Vec::new();
                        while lexer.peek() == Some(b' ') {
                            lexer.advance();
                            rights.push(lexer.read_astring()?);
                        }
                        Ok(Response::Untagged(UntaggedResponse::ListRights {
                            mailbox,
                            identifier,
                            rights,
                        }))
                    }
                    "METADATA" => {
                        lexer.expect_space()?;
                        let (mailbox, entries) = parse_metadata_response(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Metadata {
                            mailbox,
                            entries,
                        }))
                    }
                    "VANISHED" => {
                        lexer.expect_space()?;
                        let mut earlier = false;
                        if lexer.peek() == Some(b'(') {
                            lexer.advance();
                            let keyword = lexer.read_atom_string()?;
                            if !keyword.eq_ignore_ascii_case("EARLIER") {
                                return Err(lexer
                                    .error(&format!("unexpected VANISHED modifier: {keyword}")));
                            }
                            lexer.expect(Token::RParen)?;
                            lexer.expect_space()?;
                            earlier = true;
                        }
                        let uids = read_sequence_set(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Vanished {
                            uids,
                            earlier,
                        }))
                    }
                    _ => Err(lexer.error(&format!("unknown untagged response: {s}"))),
                }
            }
            Token::Number(n) => {
                let n = u32::try_from(n)
                    .map_err(|_| lexer.error("message number exceeds 32 bits"))?;
                lexer.expect_space()?;
                let keyword = lexer.read_atom_string()?;
                let upper = keyword.to_uppercase();

                match upper.as_str() {
                    "EXISTS" => Ok(Response::Untagged(UntaggedResponse::Exists(n))),
                    "RECENT" => Ok(Response::Untagged(UntaggedResponse::Recent(n))),
                    "EXPUNGE" => {
                        let seq =
                            SeqNum::new(n).ok_or_else(|| lexer.error("EXPUNGE with sequence 0"))?;
                        Ok(Response::Untagged(UntaggedResponse::Expunge(seq)))
                    }
                    "FETCH" => {
                        let seq =
                            SeqNum::new(n).ok_or_else(|| lexer.error("FETCH with sequence 0"))?;
                        lexer.expect_space()?;
                        let items = fetch::parse_fetch_response(lexer)?;
                        Ok(Response::Untagged(UntaggedResponse::Fetch { seq, items }))
                    }
                    _ => Err(lexer.error(&format!("unknown message data: {keyword}"))),
                }
            }
            _ => Err(lexer.error(&format!("unexpected token in untagged response: {token:?}"))),
        }
    }

    /// Parses a continuation response.
    fn parse_continuation(lexer: &mut Lexer<'_>) -> Result<Response> {
        if lexer.peek() == Some(b' ') {
            lexer.advance();
        }

        let text = read_text_until_crlf(lexer);

        Ok(Response::Continuation {
            text: if text.is_empty() { None } else { Some(text) },
        })
    }

    /// Parses a status keyword.
    fn parse_status(lexer: &mut Lexer<'_>) -> Result<Status> {
        let s = lexer.read_atom_string()?;
        match s.to_uppercase().as_str() {
            "OK" => Ok(Status::Ok),
            "NO" => Ok(Status::No),
            "BAD" => Ok(Status::Bad),
            "PREAUTH" => Ok(Status::PreAuth),
            "BYE" => Ok(Status::Bye),
            _ => Err(lexer.error(&format!("invalid status: {s}"))),
        }
    }

    /// Parses response text with optional response code.
    fn parse_resp_text(lexer: &mut Lexer<'_>) -> Result<(Option<ResponseCode>, String)> {
        let code = if lexer.peek() == Some(b'[') {
            Some(helpers::parse_response_code(lexer)?)
        } else {
            None
        };

        if lexer.peek() == Some(b' ') {
            lexer.advance();
        }

        let text = read_text_until_crlf(lexer);

        Ok((code, text))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{Capability, Flag, MailboxAttribute, ModSeq};

    #[test]
    fn untagged_ok() {
        let response = ResponseParser::parse(b"* OK IMAP4rev1 server ready\r\n").unwrap();
        match response {
            Response::Untagged(UntaggedResponse::Ok { code, text }) => {
                assert!(code.is_none());
                assert_eq!(text, "IMAP4rev1 server ready");
            }
            other => panic!("expected untagged OK, got {other:?}"),
        }
    }

    #[test]
    fn tagged_ok_with_code() {
        let response =
            ResponseParser::parse(b"A0003 OK [READ-WRITE] SELECT completed\r\n").unwrap();
        match response {
            Response::Tagged {
                tag,
                status,
                code,
                text,
            } => {
                assert_eq!(tag.as_str(), "A0003");
                assert_eq!(status, Status::Ok);
                assert_eq!(code, Some(ResponseCode::ReadWrite));
                assert_eq!(text, "SELECT completed");
            }
            other => panic!("expected tagged, got {other:?}"),
        }
    }

    #[test]
    fn tagged_no_with_reason() {
        let response = ResponseParser::parse(b"A0009 NO [ALREADYEXISTS] duplicate\r\n").unwrap();
        match response {
            Response::Tagged { status, code, .. } => {
                assert_eq!(status, Status::No);
                assert_eq!(code, Some(ResponseCode::AlreadyExists));
            }
            other => panic!("expected tagged, got {other:?}"),
        }
    }

    #[test]
    fn capability_line() {
        let response =
            ResponseParser::parse(b"* CAPABILITY IMAP4rev1 IDLE UIDPLUS CONDSTORE LITERAL+\r\n")
                .unwrap();
        match response {
            Response::Untagged(UntaggedResponse::Capability(caps)) => {
                assert!(caps.contains(&Capability::Imap4Rev1));
                assert!(caps.contains(&Capability::Idle));
                assert!(caps.contains(&Capability::UidPlus));
                assert!(caps.contains(&Capability::CondStore));
                assert!(caps.contains(&Capability::LiteralPlus));
            }
            other => panic!("expected capability, got {other:?}"),
        }
    }

    #[test]
    fn enabled_line() {
        let response = ResponseParser::parse(b"* ENABLED QRESYNC\r\n").unwrap();
        match response {
            Response::Untagged(UntaggedResponse::Enabled(caps)) => {
                assert_eq!(caps, vec![Capability::QResync]);
            }
            other => panic!("expected enabled, got {other:?}"),
        }
    }

    #[test]
    fn exists_and_recent() {
        assert_eq!(
            ResponseParser::parse(b"* 172 EXISTS\r\n").unwrap(),
            Response::Untagged(UntaggedResponse::Exists(172))
        );
        assert_eq!(
            ResponseParser::parse(b"* 1 RECENT\r\n").unwrap(),
            Response::Untagged(UntaggedResponse::Recent(1))
        );
    }

    #[test]
    fn expunge() {
        let response = ResponseParser::parse(b"* 2 EXPUNGE\r\n").unwrap();
        match response {
            Response::Untagged(UntaggedResponse::Expunge(seq)) => assert_eq!(seq.get(), 2),
            other => panic!("expected expunge, got {other:?}"),
        }
    }

    #[test]
    fn vanished_plain() {
        let response = ResponseParser::parse(b"* VANISHED 405,407,410:412\r\n").unwrap();
        match response {
            Response::Untagged(UntaggedResponse::Vanished { uids, earlier }) => {
                assert!(!earlier);
                assert_eq!(uids.len(), 5);
            }
            other => panic!("expected vanished, got {other:?}"),
        }
    }

    #[test]
    fn vanished_earlier() {
        let response = ResponseParser::parse(b"* VANISHED (EARLIER) 41,43:45\r\n").unwrap();
        match response {
            Response::Untagged(UntaggedResponse::Vanished { uids, earlier }) => {
                assert!(earlier);
                assert_eq!(uids.to_string(), "41,43:45");
            }
            other => panic!("expected vanished, got {other:?}"),
        }
    }

    #[test]
    fn list_line() {
        let response = ResponseParser::parse(b"* LIST (\\HasChildren) \"/\" \"INBOX\"\r\n").unwrap();
        match response {
            Response::Untagged(UntaggedResponse::List(entry)) => {
                assert!(entry.attributes.contains(&MailboxAttribute::HasChildren));
                assert_eq!(entry.delimiter, Some('/'));
                assert_eq!(entry.mailbox.as_str(), "INBOX");
            }
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn xlist_maps_to_list() {
        let response =
            ResponseParser::parse(b"* XLIST (\\Inbox \\HasNoChildren) \"/\" \"Inbox\"\r\n").unwrap();
        match response {
            Response::Untagged(UntaggedResponse::List(entry)) => {
                assert!(entry.attributes.contains(&MailboxAttribute::Inbox));
            }
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn lsub_line() {
        let response = ResponseParser::parse(b"* LSUB () \".\" INBOX.Sent\r\n").unwrap();
        assert!(matches!(
            response,
            Response::Untagged(UntaggedResponse::Lsub(_))
        ));
    }

    #[test]
    fn search_with_modseq() {
        let response = ResponseParser::parse(b"* SEARCH 2 5 6 (MODSEQ 917162500)\r\n").unwrap();
        match response {
            Response::Untagged(UntaggedResponse::Search { ids, modseq }) => {
                assert_eq!(ids, vec![2, 5, 6]);
                assert_eq!(modseq, ModSeq::from_u64(917_162_500));
            }
            other => panic!("expected search, got {other:?}"),
        }
    }

    #[test]
    fn empty_search() {
        let response = ResponseParser::parse(b"* SEARCH\r\n").unwrap();
        match response {
            Response::Untagged(UntaggedResponse::Search { ids, modseq }) => {
                assert!(ids.is_empty());
                assert!(modseq.is_none());
            }
            other => panic!("expected search, got {other:?}"),
        }
    }

    #[test]
    fn sort_line() {
        let response = ResponseParser::parse(b"* SORT 5 3 4 1 2\r\n").unwrap();
        assert_eq!(
            response,
            Response::Untagged(UntaggedResponse::Sort(vec![5, 3, 4, 1, 2]))
        );
    }

    #[test]
    fn thread_line() {
        let response = ResponseParser::parse(b"* THREAD (2)(3 6 (4 23)(44 7 96))\r\n").unwrap();
        match response {
            Response::Untagged(UntaggedResponse::Thread(roots)) => assert_eq!(roots.len(), 2),
            other => panic!("expected thread, got {other:?}"),
        }
    }

    #[test]
    fn esearch_line() {
        let response =
            ResponseParser::parse(b"* ESEARCH (TAG \"A0011\") UID COUNT 17 ALL 4:18,21\r\n")
                .unwrap();
        match response {
            Response::Untagged(UntaggedResponse::Esearch(result)) => {
                assert_eq!(result.tag.as_deref(), Some("A0011"));
                assert_eq!(result.count, Some(17));
            }
            other => panic!("expected esearch, got {other:?}"),
        }
    }

    #[test]
    fn fetch_line() {
        let response =
            ResponseParser::parse(b"* 1 FETCH (FLAGS (\\Seen) UID 12345)\r\n").unwrap();
        match response {
            Response::Untagged(UntaggedResponse::Fetch { seq, items }) => {
                assert_eq!(seq.get(), 1);
                assert!(items.iter().any(|i| matches!(i, FetchItem::Uid(uid) if uid.get() == 12345)));
                assert!(items.iter().any(|i| matches!(i, FetchItem::Flags(f) if f.is_seen())));
            }
            other => panic!("expected fetch, got {other:?}"),
        }
    }

    #[test]
    fn fetch_with_literal_body() {
        let response =
            ResponseParser::parse(b"* 1 FETCH (UID 101 BODY[] {5}\r\nHello)\r\n").unwrap();
        match response {
            Response::Untagged(UntaggedResponse::Fetch { items, .. }) => {
                let body = items
                    .iter()
                    .find_map(|i| match i {
                        FetchItem::Body { data, .. } => data.as_deref(),
                        _ => None,
                    })
                    .unwrap();
                assert_eq!(body, b"Hello");
            }
            other => panic!("expected fetch, got {other:?}"),
        }
    }

    #[test]
    fn id_line() {
        let response =
            ResponseParser::parse(b"* ID (\"name\" \"Dovecot\" \"version\" \"2.3\")\r\n").unwrap();
        match response {
            Response::Untagged(UntaggedResponse::Id(Some(fields))) => {
                assert_eq!(fields[0], ("name".to_string(), "Dovecot".to_string()));
            }
            other => panic!("expected id, got {other:?}"),
        }
    }

    #[test]
    fn id_nil() {
        let response = ResponseParser::parse(b"* ID NIL\r\n").unwrap();
        assert_eq!(response, Response::Untagged(UntaggedResponse::Id(None)));
    }

    #[test]
    fn status_line() {
        let response =
            ResponseParser::parse(b"* STATUS blurdybloop (MESSAGES 231 UIDNEXT 44292)\r\n")
                .unwrap();
        assert!(matches!(
            response,
            Response::Untagged(UntaggedResponse::Status(_))
        ));
    }

    #[test]
    fn flags_line() {
        let response =
            ResponseParser::parse(b"* FLAGS (\\Answered \\Flagged \\Deleted \\Seen \\Draft)\r\n")
                .unwrap();
        match response {
            Response::Untagged(UntaggedResponse::Flags(flags)) => {
                assert!(flags.contains(&Flag::Answered));
                assert!(flags.contains(&Flag::Draft));
            }
            other => panic!("expected flags, got {other:?}"),
        }
    }

    #[test]
    fn continuation_with_text() {
        let response = ResponseParser::parse(b"+ idling\r\n").unwrap();
        assert_eq!(
            response,
            Response::Continuation {
                text: Some("idling".to_string())
            }
        );
    }

    #[test]
    fn bare_continuation() {
        let response = ResponseParser::parse(b"+\r\n").unwrap();
        assert_eq!(response, Response::Continuation { text: None });
    }

    #[test]
    fn garbage_rejected() {
        assert!(ResponseParser::parse(b"* BOGUS stuff\r\n").is_err());
        assert!(ResponseParser::parse(b"(\r\n").is_err());
    }
}
