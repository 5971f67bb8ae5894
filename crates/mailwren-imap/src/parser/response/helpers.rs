//! Parser helper functions for untagged data and response codes.

use crate::parser::lexer::{Lexer, Token};
use crate::types::{
    Acl, AclEntry, Capability, Flag, Flags, ListEntry, Mailbox, MetadataEntry, ModSeq, Namespace,
    Namespaces, Quota, QuotaResource, QuotaRoot, ResponseCode, SeqNum, StatusItem, Uid, UidSet,
    UidValidity,
};
use crate::{Error, Result};

use super::types::{EsearchResult, StatusResponse, ThreadNode};

/// Parses a response code (the bracketed part of a status response).
pub fn parse_response_code(lexer: &mut Lexer<'_>) -> Result<ResponseCode> {
    lexer.expect(Token::LBracket)?;

    let atom = lexer.read_atom_string()?;
    let upper = atom.to_uppercase();

    let code = match upper.as_str() {
        "ALERT" => ResponseCode::Alert,
        "PARSE" => ResponseCode::Parse,
        "READ-ONLY" => ResponseCode::ReadOnly,
        "READ-WRITE" => ResponseCode::ReadWrite,
        "TRYCREATE" => ResponseCode::TryCreate,
        "NOMODSEQ" => ResponseCode::NoModSeq,
        "CLOSED" => ResponseCode::Closed,
        "UIDNOTSTICKY" => ResponseCode::UidNotSticky,
        "INUSE" => ResponseCode::InUse,
        "OVERQUOTA" => ResponseCode::OverQuota,
        "CONTACTADMIN" => ResponseCode::ContactAdmin,
        "AUTHENTICATIONFAILED" => ResponseCode::AuthenticationFailed,
        "AUTHORIZATIONFAILED" => ResponseCode::AuthorizationFailed,
        "EXPIRED" => ResponseCode::Expired,
        "PRIVACYREQUIRED" => ResponseCode::PrivacyRequired,
        "UNAVAILABLE" => ResponseCode::Unavailable,
        "LIMIT" => ResponseCode::Limit,
        "NONEXISTENT" => ResponseCode::NonExistent,
        "ALREADYEXISTS" => ResponseCode::AlreadyExists,
        "SERVERBUG" => ResponseCode::ServerBug,
        "CLIENTBUG" => ResponseCode::ClientBug,
        "CANNOT" => ResponseCode::Cannot,
        "COMPRESSIONACTIVE" => ResponseCode::CompressionActive,
        "USEATTR" => ResponseCode::UseAttr,
        "HASCHILDREN" => ResponseCode::HasChildren,
        "UNKNOWN-CTE" => ResponseCode::UnknownCte,
        "NOTIFICATIONOVERFLOW" => ResponseCode::NotificationOverflow,
        "UIDNEXT" => {
            lexer.expect_space()?;
            let n = lexer.read_number_u32()?;
            let uid = Uid::new(n).ok_or_else(|| lexer.error("UIDNEXT cannot be 0"))?;
            ResponseCode::UidNext(uid)
        }
        "UIDVALIDITY" => {
            lexer.expect_space()?;
            let n = lexer.read_number_u32()?;
            let validity =
                UidValidity::new(n).ok_or_else(|| lexer.error("UIDVALIDITY cannot be 0"))?;
            ResponseCode::UidValidity(validity)
        }
        "UNSEEN" => {
            lexer.expect_space()?;
            let n = lexer.read_number_u32()?;
            let seq = SeqNum::new(n).ok_or_else(|| lexer.error("UNSEEN cannot be 0"))?;
            ResponseCode::Unseen(seq)
        }
        "HIGHESTMODSEQ" => {
            lexer.expect_space()?;
            let n = lexer.read_number()?;
            let modseq = ModSeq::from_u64(n).ok_or_else(|| lexer.error("MODSEQ cannot be 0"))?;
            ResponseCode::HighestModSeq(modseq)
        }
        "MODIFIED" => {
            lexer.expect_space()?;
            let set = read_sequence_set(lexer)?;
            ResponseCode::Modified(set)
        }
        "APPENDUID" => {
            lexer.expect_space()?;
            let n = lexer.read_number_u32()?;
            let uidvalidity =
                UidValidity::new(n).ok_or_else(|| lexer.error("UIDVALIDITY cannot be 0"))?;
            lexer.expect_space()?;
            let uids = read_sequence_set(lexer)?;
            ResponseCode::AppendUid { uidvalidity, uids }
        }
        "COPYUID" => {
            lexer.expect_space()?;
            let n = lexer.read_number_u32()?;
            let uidvalidity =
                UidValidity::new(n).ok_or_else(|| lexer.error("UIDVALIDITY cannot be 0"))?;
            lexer.expect_space()?;
            let source = read_sequence_set(lexer)?;
            lexer.expect_space()?;
            let dest = read_sequence_set(lexer)?;
            ResponseCode::CopyUid {
                uidvalidity,
                source,
                dest,
            }
        }
        "BADCHARSET" => {
            let mut charsets = Vec::new();
            lexer.skip_spaces();
            if lexer.peek() == Some(b'(') {
                lexer.advance();
                loop {
                    match lexer.next_token()? {
                        Token::RParen => break,
                        Token::Space => {}
                        Token::Atom(s) => charsets.push(s.to_string()),
                        Token::QuotedString(s) => charsets.push(s),
                        token => {
                            return Err(
                                lexer.error(&format!("unexpected token in BADCHARSET: {token:?}"))
                            );
                        }
                    }
                }
            }
            ResponseCode::BadCharset(charsets)
        }
        "CAPABILITY" => {
            let caps = parse_capability_data(lexer)?;
            ResponseCode::Capability(caps)
        }
        "PERMANENTFLAGS" => {
            lexer.expect_space()?;
            let flags = parse_flag_list(lexer)?;
            ResponseCode::PermanentFlags(flags)
        }
        "MAILBOXID" => {
            lexer.expect_space()?;
            lexer.expect(Token::LParen)?;
            let id = lexer.read_astring()?;
            lexer.expect(Token::RParen)?;
            ResponseCode::MailboxId(id)
        }
        "REFERRAL" => {
            lexer.expect_space()?;
            let url = read_until_bracket(lexer);
            ResponseCode::Referral(url)
        }
        "METADATA" => {
            lexer.skip_spaces();
            let detail = read_until_bracket(lexer);
            ResponseCode::Metadata(detail)
        }
        _ => {
            // Unknown codes are kept verbatim; their arguments are skipped.
            let _ = read_until_bracket(lexer);
            ResponseCode::Unknown(atom.to_string())
        }
    };

    // Tolerate trailing arguments on known codes.
    while lexer.peek() != Some(b']') && !lexer.is_eof() {
        lexer.advance();
    }
    lexer.expect(Token::RBracket)?;

    Ok(code)
}

/// Reads an IMAP sequence-set atom (`1,3:7,12`) into a compact set.
pub fn read_sequence_set(lexer: &mut Lexer<'_>) -> Result<UidSet> {
    let position = lexer.position();
    match lexer.next_token()? {
        Token::Atom(s) => UidSet::parse(s),
        Token::Number(n) => {
            let n = u32::try_from(n).map_err(|_| lexer.error("UID exceeds 32 bits"))?;
            let uid = Uid::new(n).ok_or_else(|| lexer.error("UID cannot be 0"))?;
            Ok(UidSet::single(uid))
        }
        token => Err(Error::Parse {
            position,
            message: format!("expected sequence set, got {token:?}"),
        }),
    }
}

/// Parses capability data: the space-separated atoms after `CAPABILITY`.
pub fn parse_capability_data(lexer: &mut Lexer<'_>) -> Result<Vec<Capability>> {
    let mut caps = Vec::new();

    while lexer.peek() == Some(b' ') {
        lexer.advance();
        match lexer.next_token()? {
            Token::Atom(s) => caps.push(Capability::parse(s)),
            // NIL lexes specially but is a valid capability atom name.
            Token::Nil => caps.push(Capability::parse("NIL")),
            token => return Err(lexer.error(&format!("unexpected capability token: {token:?}"))),
        }
    }

    Ok(caps)
}

/// Parses a parenthesized flag list.
pub fn parse_flag_list(lexer: &mut Lexer<'_>) -> Result<Flags> {
    lexer.expect(Token::LParen)?;

    let mut flags = Flags::new();

    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Atom(s) => flags.insert(Flag::parse(s)),
            Token::Space => {}
            token => {
                return Err(lexer.error(&format!("unexpected token in flag list: {token:?}")));
            }
        }
    }

    Ok(flags)
}

/// Parses a LIST/LSUB/XLIST line: attributes, delimiter, name, and any
/// LIST-EXTENDED extension data.
pub fn parse_list_entry(lexer: &mut Lexer<'_>) -> Result<ListEntry> {
    lexer.expect(Token::LParen)?;
    let mut attributes = Vec::new();

    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Atom(s) => attributes.push(crate::types::MailboxAttribute::parse(s)),
            Token::Space => {}
            token => {
                return Err(lexer.error(&format!("unexpected token in LIST attributes: {token:?}")));
            }
        }
    }

    lexer.expect_space()?;

    let delimiter = match lexer.next_token()? {
        Token::Nil => None,
        Token::QuotedString(s) => s.chars().next(),
        token => {
            return Err(lexer.error(&format!("expected delimiter, got {token:?}")));
        }
    };

    lexer.expect_space()?;

    let mailbox_name = lexer.read_astring()?;

    // LIST-EXTENDED data: ("CHILDINFO" ("SUBSCRIBED"))
    let mut child_info = Vec::new();
    lexer.skip_spaces();
    if lexer.peek() == Some(b'(') {
        lexer.advance();
        loop {
            match lexer.next_token()? {
                Token::RParen => break,
                Token::Space => {}
                token @ (Token::QuotedString(_) | Token::Atom(_)) => {
                    let item = match &token {
                        Token::QuotedString(s) => s.clone(),
                        Token::Atom(s) => (*s).to_string(),
                        _ => String::new(),
                    };
                    if item.eq_ignore_ascii_case("CHILDINFO") {
                        lexer.skip_spaces();
                        lexer.expect(Token::LParen)?;
                        loop {
                            match lexer.next_token()? {
                                Token::RParen => break,
                                Token::Space => {}
                                Token::QuotedString(s) => child_info.push(s),
                                Token::Atom(s) => child_info.push(s.to_string()),
                                token => {
                                    return Err(lexer
                                        .error(&format!("unexpected CHILDINFO token: {token:?}")));
                                }
                            }
                        }
                    } else {
                        // Unknown extension item: skip its value.
                        skip_extension_value(lexer)?;
                    }
                }
                token => {
                    return Err(lexer.error(&format!("unexpected LIST extension: {token:?}")));
                }
            }
        }
    }

    Ok(ListEntry {
        attributes,
        delimiter,
        mailbox: Mailbox::new(mailbox_name),
        child_info,
    })
}

/// Skips one parenthesized or atomic extension value.
fn skip_extension_value(lexer: &mut Lexer<'_>) -> Result<()> {
    lexer.skip_spaces();
    if lexer.peek() == Some(b'(') {
        let mut depth = 0usize;
        loop {
            match lexer.peek() {
                Some(b'(') => {
                    depth += 1;
                    lexer.advance();
                }
                Some(b')') => {
                    depth -= 1;
                    lexer.advance();
                    if depth == 0 {
                        break;
                    }
                }
                Some(b'{') => {
                    let _ = lexer.next_token()?;
                }
                Some(_) => {
                    lexer.advance();
                }
                None => break,
            }
        }
    } else {
        let _ = lexer.next_token()?;
    }
    Ok(())
}

/// Parses a SEARCH response: ids plus optional trailing `(MODSEQ n)`.
pub fn parse_search_response(lexer: &mut Lexer<'_>) -> Result<(Vec<u32>, Option<ModSeq>)> {
    let mut ids = Vec::new();
    let mut modseq = None;

    loop {
        lexer.skip_spaces();
        match lexer.peek() {
            Some(b'0'..=b'9') => {
                ids.push(lexer.read_number_u32()?);
            }
            Some(b'(') => {
                lexer.advance();
                let keyword = lexer.read_atom_string()?;
                if !keyword.eq_ignore_ascii_case("MODSEQ") {
                    return Err(lexer.error(&format!("unexpected SEARCH modifier: {keyword}")));
                }
                lexer.expect_space()?;
                let n = lexer.read_number()?;
                modseq = ModSeq::from_u64(n);
                lexer.expect(Token::RParen)?;
            }
            _ => break,
        }
    }

    Ok((ids, modseq))
}

/// Parses an ESEARCH response (RFC 4731).
///
/// `* ESEARCH (TAG "A0005") UID MIN 2 MAX 47 COUNT 25 ALL 2:8,12 MODSEQ 1234`
pub fn parse_esearch_response(lexer: &mut Lexer<'_>) -> Result<EsearchResult> {
    let mut result = EsearchResult::default();

    lexer.skip_spaces();
    if lexer.peek() == Some(b'(') {
        lexer.advance();
        let keyword = lexer.read_atom_string()?;
        if !keyword.eq_ignore_ascii_case("TAG") {
            return Err(lexer.error(&format!("unexpected ESEARCH correlator: {keyword}")));
        }
        lexer.expect_space()?;
        result.tag = Some(lexer.read_astring()?);
        lexer.expect(Token::RParen)?;
    }

    loop {
        lexer.skip_spaces();
        let token = lexer.next_token()?;
        let keyword = match token {
            Token::Atom(s) => s.to_uppercase(),
            Token::Crlf | Token::Eof => break,
            other => return Err(lexer.error(&format!("unexpected ESEARCH token: {other:?}"))),
        };

        match keyword.as_str() {
            "UID" => result.uid = true,
            "MIN" => {
                lexer.expect_space()?;
                result.min = Some(lexer.read_number_u32()?);
            }
            "MAX" => {
                lexer.expect_space()?;
                result.max = Some(lexer.read_number_u32()?);
            }
            "COUNT" => {
                lexer.expect_space()?;
                result.count = Some(lexer.read_number_u32()?);
            }
            "ALL" => {
                lexer.expect_space()?;
                result.all = Some(read_sequence_set(lexer)?);
            }
            "MODSEQ" => {
                lexer.expect_space()?;
                let n = lexer.read_number()?;
                result.modseq = ModSeq::from_u64(n);
            }
            other => return Err(lexer.error(&format!("unknown ESEARCH item: {other}"))),
        }
    }

    Ok(result)
}

/// Parses a SORT response: a flat list of message numbers.
pub fn parse_sort_response(lexer: &mut Lexer<'_>) -> Result<Vec<u32>> {
    let mut ids = Vec::new();
    loop {
        lexer.skip_spaces();
        match lexer.peek() {
            Some(b'0'..=b'9') => ids.push(lexer.read_number_u32()?),
            _ => break,
        }
    }
    Ok(ids)
}

/// Parses a THREAD response: nested parenthesized message numbers.
///
/// `* THREAD (2)(3 6 (4 23)(44 7 96))`
pub fn parse_thread_response(lexer: &mut Lexer<'_>) -> Result<Vec<ThreadNode>> {
    let mut roots = Vec::new();
    loop {
        lexer.skip_spaces();
        match lexer.peek() {
            Some(b'(') => {
                lexer.advance();
                roots.push(parse_thread_members(lexer)?);
            }
            _ => break,
        }
    }
    Ok(roots)
}

/// Parses thread members after an opening paren, up to its close.
fn parse_thread_members(lexer: &mut Lexer<'_>) -> Result<ThreadNode> {
    let mut ids: Vec<u32> = Vec::new();
    let mut children = Vec::new();

    loop {
        lexer.skip_spaces();
        match lexer.peek() {
            Some(b')') => {
                lexer.advance();
                break;
            }
            Some(b'(') => {
                lexer.advance();
                children.push(parse_thread_members(lexer)?);
            }
            Some(b'0'..=b'9') => {
                if !children.is_empty() {
                    return Err(lexer.error("thread member after subthread"));
                }
                ids.push(lexer.read_number_u32()?);
            }
            _ => return Err(lexer.error("unexpected byte in THREAD response")),
        }
    }

    // A run like (3 6 (4)(44)) threads 3 -> 6 -> [(4), (44)]; fold the
    // id chain into nested single-child nodes.
    let mut node = ThreadNode { id: None, children };
    while let Some(id) = ids.pop() {
        node = if node.id.is_none() && node.children.is_empty() {
            ThreadNode {
                id: Some(id),
                children: Vec::new(),
            }
        } else if node.id.is_none() {
            ThreadNode {
                id: Some(id),
                children: node.children,
            }
        } else {
            ThreadNode {
                id: Some(id),
                children: vec![node],
            }
        };
    }

    Ok(node)
}

/// Parses a STATUS response.
pub fn parse_status_response(lexer: &mut Lexer<'_>) -> Result<StatusResponse> {
    let mailbox_name = lexer.read_astring()?;
    lexer.expect_space()?;
    lexer.expect(Token::LParen)?;

    let mut items = Vec::new();

    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Space => {}
            Token::Atom(name) => {
                lexer.expect_space()?;
                let value = lexer.read_number()?;

                let item = match name.to_uppercase().as_str() {
                    "MESSAGES" => StatusItem::Messages(u32::try_from(value).unwrap_or(u32::MAX)),
                    "RECENT" => StatusItem::Recent(u32::try_from(value).unwrap_or(u32::MAX)),
                    "UIDNEXT" => match u32::try_from(value).ok().and_then(Uid::new) {
                        Some(uid) => StatusItem::UidNext(uid),
                        None => continue,
                    },
                    "UIDVALIDITY" => match u32::try_from(value).ok().and_then(UidValidity::new) {
                        Some(v) => StatusItem::UidValidity(v),
                        None => continue,
                    },
                    "UNSEEN" => StatusItem::Unseen(u32::try_from(value).unwrap_or(u32::MAX)),
                    "HIGHESTMODSEQ" => match ModSeq::from_u64(value) {
                        Some(m) => StatusItem::HighestModSeq(m),
                        None => continue,
                    },
                    "SIZE" => StatusItem::Size(value),
                    _ => continue,
                };
                items.push(item);
            }
            token => {
                return Err(lexer.error(&format!("unexpected STATUS token: {token:?}")));
            }
        }
    }

    Ok(StatusResponse {
        mailbox: Mailbox::new(mailbox_name),
        items,
    })
}

/// Parses a NAMESPACE response: three namespace lists.
pub fn parse_namespace_response(lexer: &mut Lexer<'_>) -> Result<Namespaces> {
    let personal = parse_namespace_list(lexer)?;
    lexer.expect_space()?;
    let other_users = parse_namespace_list(lexer)?;
    lexer.expect_space()?;
    let shared = parse_namespace_list(lexer)?;

    Ok(Namespaces {
        personal,
        other_users,
        shared,
    })
}

fn parse_namespace_list(lexer: &mut Lexer<'_>) -> Result<Vec<Namespace>> {
    match lexer.next_token()? {
        Token::Nil => Ok(Vec::new()),
        Token::LParen => {
            let mut namespaces = Vec::new();
            loop {
                lexer.skip_spaces();
                match lexer.peek() {
                    Some(b')') => {
                        lexer.advance();
                        break;
                    }
                    Some(b'(') => {
                        lexer.advance();
                        let prefix = lexer.read_astring()?;
                        lexer.expect_space()?;
                        let delimiter = match lexer.next_token()? {
                            Token::Nil => None,
                            Token::QuotedString(s) => s.chars().next(),
                            token => {
                                return Err(lexer
                                    .error(&format!("expected namespace delimiter: {token:?}")));
                            }
                        };
                        // Skip namespace extension data up to the close.
                        while lexer.peek() != Some(b')') && !lexer.is_eof() {
                            skip_extension_value(lexer)?;
                            lexer.skip_spaces();
                        }
                        lexer.expect(Token::RParen)?;
                        namespaces.push(Namespace { prefix, delimiter });
                    }
                    _ => return Err(lexer.error("unexpected byte in namespace list")),
                }
            }
            Ok(namespaces)
        }
        token => Err(lexer.error(&format!("expected namespace list, got {token:?}"))),
    }
}

/// Parses an ID response: `NIL` or a parenthesized field/value list.
pub fn parse_id_response(lexer: &mut Lexer<'_>) -> Result<Option<Vec<(String, String)>>> {
    match lexer.next_token()? {
        Token::Nil => Ok(None),
        Token::LParen => {
            let mut fields = Vec::new();
            loop {
                lexer.skip_spaces();
                if lexer.peek() == Some(b')') {
                    lexer.advance();
                    break;
                }
                let key = lexer.read_astring()?;
                lexer.expect_space()?;
                let value = lexer.read_nstring()?.unwrap_or_default();
                fields.push((key, value));
            }
            Ok(Some(fields))
        }
        token => Err(lexer.error(&format!("expected ID data, got {token:?}"))),
    }
}

/// Parses a QUOTA response: root name plus resource triplets.
pub fn parse_quota_response(lexer: &mut Lexer<'_>) -> Result<Quota> {
    let root = lexer.read_astring()?;
    lexer.expect_space()?;
    lexer.expect(Token::LParen)?;

    let mut resources = Vec::new();
    loop {
        lexer.skip_spaces();
        if lexer.peek() == Some(b')') {
            lexer.advance();
            break;
        }
        let name = lexer.read_atom_string()?.to_uppercase();
        lexer.expect_space()?;
        let usage = lexer.read_number()?;
        lexer.expect_space()?;
        let limit = lexer.read_number()?;
        resources.push(QuotaResource { name, usage, limit });
    }

    Ok(Quota { root, resources })
}

/// Parses a QUOTAROOT response: mailbox plus zero or more root names.
pub fn parse_quotaroot_response(lexer: &mut Lexer<'_>) -> Result<QuotaRoot> {
    let mailbox = lexer.read_astring()?;
    let mut roots = Vec::new();
    while lexer.peek() == Some(b' ') {
        lexer.advance();
        roots.push(lexer.read_astring()?);
    }
    Ok(QuotaRoot {
        mailbox: Mailbox::new(mailbox),
        roots,
    })
}

/// Parses an ACL response: mailbox plus identifier/rights pairs.
pub fn parse_acl_response(lexer: &mut Lexer<'_>) -> Result<Acl> {
    let mailbox = lexer.read_astring()?;
    let mut entries = Vec::new();
    while lexer.peek() == Some(b' ') {
        lexer.advance();
        let identifier = lexer.read_astring()?;
        lexer.expect_space()?;
        let rights = lexer.read_astring()?;
        entries.push(AclEntry { identifier, rights });
    }
    Ok(Acl {
        mailbox: Mailbox::new(mailbox),
        entries,
    })
}

/// Parses a METADATA response.
///
/// GETMETADATA results carry `(name value ...)`; unsolicited change
/// notifications carry bare entry names.
pub fn parse_metadata_response(lexer: &mut Lexer<'_>) -> Result<(Mailbox, Vec<MetadataEntry>)> {
    let mailbox = Mailbox::new(lexer.read_astring()?);
    let mut entries = Vec::new();

    lexer.skip_spaces();
    if lexer.peek() == Some(b'(') {
        lexer.advance();
        loop {
            lexer.skip_spaces();
            if lexer.peek() == Some(b')') {
                lexer.advance();
                break;
            }
            let name = lexer.read_astring()?;
            lexer.expect_space()?;
            let value = lexer.read_nstring_bytes()?;
            entries.push(MetadataEntry { name, value });
        }
    } else {
        while !matches!(lexer.peek(), None | Some(b'\r')) {
            let name = lexer.read_astring()?;
            entries.push(MetadataEntry { name, value: None });
            lexer.skip_spaces();
        }
    }

    Ok((mailbox, entries))
}

/// Reads text until CRLF (or end of input), consuming the CRLF.
pub fn read_text_until_crlf(lexer: &mut Lexer<'_>) -> String {
    let remaining = lexer.remaining();

    let end = remaining
        .windows(2)
        .position(|w| w == b"\r\n")
        .unwrap_or(remaining.len());

    lexer.skip(end);

    if lexer.peek() == Some(b'\r') {
        lexer.skip(2);
    }

    String::from_utf8_lossy(&remaining[..end]).to_string()
}

/// Reads raw text until the closing bracket of a response code.
fn read_until_bracket(lexer: &mut Lexer<'_>) -> String {
    let remaining = lexer.remaining();
    let end = remaining
        .iter()
        .position(|&b| b == b']')
        .unwrap_or(remaining.len());
    lexer.skip(end);
    String::from_utf8_lossy(&remaining[..end]).to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn lex(input: &[u8]) -> Lexer<'_> {
        Lexer::new(input)
    }

    mod response_code_tests {
        use super::*;

        #[test]
        fn uidvalidity() {
            let mut lexer = lex(b"[UIDVALIDITY 3857529045]");
            let code = parse_response_code(&mut lexer).unwrap();
            assert_eq!(
                code,
                ResponseCode::UidValidity(UidValidity::new(3_857_529_045).unwrap())
            );
        }

        #[test]
        fn highestmodseq_is_u64() {
            let mut lexer = lex(b"[HIGHESTMODSEQ 715194045007]");
            let code = parse_response_code(&mut lexer).unwrap();
            assert_eq!(
                code,
                ResponseCode::HighestModSeq(ModSeq::from_u64(715_194_045_007).unwrap())
            );
        }

        #[test]
        fn appenduid() {
            let mut lexer = lex(b"[APPENDUID 38505 3955]");
            let code = parse_response_code(&mut lexer).unwrap();
            match code {
                ResponseCode::AppendUid { uidvalidity, uids } => {
                    assert_eq!(uidvalidity.get(), 38505);
                    assert_eq!(uids.to_string(), "3955");
                }
                other => panic!("expected APPENDUID, got {other:?}"),
            }
        }

        #[test]
        fn appenduid_multiappend_set() {
            let mut lexer = lex(b"[APPENDUID 38505 3955:3957]");
            let code = parse_response_code(&mut lexer).unwrap();
            match code {
                ResponseCode::AppendUid { uids, .. } => assert_eq!(uids.len(), 3),
                other => panic!("expected APPENDUID, got {other:?}"),
            }
        }

        #[test]
        fn copyuid_sets() {
            let mut lexer = lex(b"[COPYUID 38505 304,319:320 3956:3958]");
            let code = parse_response_code(&mut lexer).unwrap();
            match code {
                ResponseCode::CopyUid {
                    uidvalidity,
                    source,
                    dest,
                } => {
                    assert_eq!(uidvalidity.get(), 38505);
                    assert_eq!(source.len(), 3);
                    assert_eq!(dest.len(), 3);
                }
                other => panic!("expected COPYUID, got {other:?}"),
            }
        }

        #[test]
        fn modified_set() {
            let mut lexer = lex(b"[MODIFIED 102]");
            let code = parse_response_code(&mut lexer).unwrap();
            assert_eq!(code, ResponseCode::Modified(UidSet::parse("102").unwrap()));
        }

        #[test]
        fn permanentflags_with_wildcard() {
            let mut lexer = lex(b"[PERMANENTFLAGS (\\Deleted \\Seen \\*)]");
            let code = parse_response_code(&mut lexer).unwrap();
            match code {
                ResponseCode::PermanentFlags(flags) => {
                    assert!(flags.contains(&Flag::Deleted));
                    assert!(flags.contains(&Flag::Wildcard));
                }
                other => panic!("expected PERMANENTFLAGS, got {other:?}"),
            }
        }

        #[test]
        fn badcharset_alternatives() {
            let mut lexer = lex(b"[BADCHARSET (UTF-8 US-ASCII)]");
            let code = parse_response_code(&mut lexer).unwrap();
            assert_eq!(
                code,
                ResponseCode::BadCharset(vec!["UTF-8".to_string(), "US-ASCII".to_string()])
            );
        }

        #[test]
        fn rfc5530_codes() {
            for (input, expected) in [
                (&b"[OVERQUOTA]"[..], ResponseCode::OverQuota),
                (b"[ALREADYEXISTS]", ResponseCode::AlreadyExists),
                (b"[NONEXISTENT]", ResponseCode::NonExistent),
                (b"[AUTHENTICATIONFAILED]", ResponseCode::AuthenticationFailed),
                (b"[UNKNOWN-CTE]", ResponseCode::UnknownCte),
                (b"[COMPRESSIONACTIVE]", ResponseCode::CompressionActive),
            ] {
                let mut lexer = lex(input);
                assert_eq!(parse_response_code(&mut lexer).unwrap(), expected);
            }
        }

        #[test]
        fn unknown_code_preserved() {
            let mut lexer = lex(b"[XWEIRD 1 2 3]");
            let code = parse_response_code(&mut lexer).unwrap();
            assert_eq!(code, ResponseCode::Unknown("XWEIRD".to_string()));
        }
    }

    mod search_tests {
        use super::*;

        #[test]
        fn plain_ids() {
            let mut lexer = lex(b" 2 84 882");
            let (ids, modseq) = parse_search_response(&mut lexer).unwrap();
            assert_eq!(ids, vec![2, 84, 882]);
            assert!(modseq.is_none());
        }

        #[test]
        fn empty_result() {
            let mut lexer = lex(b"\r\n");
            let (ids, modseq) = parse_search_response(&mut lexer).unwrap();
            assert!(ids.is_empty());
            assert!(modseq.is_none());
        }

        #[test]
        fn with_modseq() {
            let mut lexer = lex(b" 2 5 6 (MODSEQ 917162500)");
            let (ids, modseq) = parse_search_response(&mut lexer).unwrap();
            assert_eq!(ids, vec![2, 5, 6]);
            assert_eq!(modseq, ModSeq::from_u64(917_162_500));
        }
    }

    mod esearch_tests {
        use super::*;

        #[test]
        fn keyed_results() {
            let mut lexer = lex(b" (TAG \"A0005\") UID MIN 2 MAX 47 COUNT 25 ALL 2:8,12\r\n");
            let result = parse_esearch_response(&mut lexer).unwrap();
            assert_eq!(result.tag.as_deref(), Some("A0005"));
            assert!(result.uid);
            assert_eq!(result.min, Some(2));
            assert_eq!(result.max, Some(47));
            assert_eq!(result.count, Some(25));
            assert_eq!(result.all.unwrap().to_string(), "2:8,12");
        }

        #[test]
        fn modseq_only() {
            let mut lexer = lex(b" (TAG \"A0007\") MODSEQ 720162338\r\n");
            let result = parse_esearch_response(&mut lexer).unwrap();
            assert_eq!(result.modseq, ModSeq::from_u64(720_162_338));
            assert!(result.all.is_none());
            assert!(result.count.is_none());
        }
    }

    mod thread_tests {
        use super::*;

        #[test]
        fn flat_and_nested() {
            let mut lexer = lex(b" (2)(3 6 (4 23)(44 7 96))");
            let roots = parse_thread_response(&mut lexer).unwrap();
            assert_eq!(roots.len(), 2);
            assert_eq!(roots[0].id, Some(2));
            assert!(roots[0].children.is_empty());

            let second = &roots[1];
            assert_eq!(second.id, Some(3));
            assert_eq!(second.children.len(), 1);
            let six = &second.children[0];
            assert_eq!(six.id, Some(6));
            assert_eq!(six.children.len(), 2);
            assert_eq!(six.children[0].id, Some(4));
            assert_eq!(six.children[0].children[0].id, Some(23));
            assert_eq!(six.children[1].id, Some(44));
        }
    }

    mod status_tests {
        use super::*;

        #[test]
        fn full_status() {
            let mut lexer =
                lex(b"\"blurdybloop\" (MESSAGES 231 UIDNEXT 44292 HIGHESTMODSEQ 7011231777)");
            let status = parse_status_response(&mut lexer).unwrap();
            assert_eq!(status.mailbox.as_str(), "blurdybloop");
            assert!(status.items.contains(&StatusItem::Messages(231)));
            assert!(
                status
                    .items
                    .contains(&StatusItem::UidNext(Uid::new(44292).unwrap()))
            );
            assert!(status.items.contains(&StatusItem::HighestModSeq(
                ModSeq::from_u64(7_011_231_777).unwrap()
            )));
        }
    }

    mod namespace_tests {
        use super::*;

        #[test]
        fn personal_only() {
            let mut lexer = lex(b"((\"\" \"/\")) NIL NIL");
            let ns = parse_namespace_response(&mut lexer).unwrap();
            assert_eq!(ns.personal.len(), 1);
            assert_eq!(ns.personal[0].prefix, "");
            assert_eq!(ns.personal[0].delimiter, Some('/'));
            assert!(ns.other_users.is_empty());
            assert!(ns.shared.is_empty());
        }

        #[test]
        fn all_three_classes() {
            let mut lexer =
                lex(b"((\"\" \"/\")) ((\"~\" \"/\")) ((\"#shared/\" \"/\")(\"#public/\" \"/\"))");
            let ns = parse_namespace_response(&mut lexer).unwrap();
            assert_eq!(ns.personal.len(), 1);
            assert_eq!(ns.other_users.len(), 1);
            assert_eq!(ns.shared.len(), 2);
            assert_eq!(ns.shared[1].prefix, "#public/");
        }
    }

    mod quota_tests {
        use super::*;

        #[test]
        fn quota_resources() {
            let mut lexer = lex(b"\"\" (STORAGE 10 512)");
            let quota = parse_quota_response(&mut lexer).unwrap();
            assert_eq!(quota.root, "");
            assert_eq!(
                quota.resources,
                vec![QuotaResource {
                    name: "STORAGE".to_string(),
                    usage: 10,
                    limit: 512
                }]
            );
        }

        #[test]
        fn quotaroot_names() {
            let mut lexer = lex(b"INBOX \"\"");
            let root = parse_quotaroot_response(&mut lexer).unwrap();
            assert_eq!(root.mailbox.as_str(), "INBOX");
            assert_eq!(root.roots, vec![String::new()]);
        }
    }

    mod acl_tests {
        use super::*;

        #[test]
        fn entries() {
            let mut lexer = lex(b"INBOX alice lrswipkxte bob lrs");
            let acl = parse_acl_response(&mut lexer).unwrap();
            assert_eq!(acl.entries.len(), 2);
            assert_eq!(acl.entries[0].identifier, "alice");
            assert_eq!(acl.entries[1].rights, "lrs");
        }
    }

    mod metadata_tests {
        use super::*;

        #[test]
        fn get_result() {
            let mut lexer = lex(b"INBOX (/shared/comment \"Shared comment\")");
            let (mailbox, entries) = parse_metadata_response(&mut lexer).unwrap();
            assert_eq!(mailbox.as_str(), "INBOX");
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].name, "/shared/comment");
            assert_eq!(entries[0].value.as_deref(), Some(&b"Shared comment"[..]));
        }

        #[test]
        fn unsolicited_names_only() {
            let mut lexer = lex(b"INBOX /shared/comment\r\n");
            let (_, entries) = parse_metadata_response(&mut lexer).unwrap();
            assert_eq!(entries.len(), 1);
            assert!(entries[0].value.is_none());
        }
    }

    mod list_tests {
        use super::*;
        use crate::types::MailboxAttribute;

        #[test]
        fn extended_childinfo() {
            let mut lexer =
                lex(b"(\\Subscribed) \"/\" \"Fruit/Banana\" (\"CHILDINFO\" (\"SUBSCRIBED\"))");
            let entry = parse_list_entry(&mut lexer).unwrap();
            assert!(entry.attributes.contains(&MailboxAttribute::Subscribed));
            assert_eq!(entry.child_info, vec!["SUBSCRIBED".to_string()]);
        }
    }
}
