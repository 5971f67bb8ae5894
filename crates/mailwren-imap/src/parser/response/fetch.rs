//! FETCH response parsing.

use crate::parser::lexer::{Lexer, Token};
use crate::types::{Label, ModSeq, Uid};
use crate::{Error, Result};

use super::parse_flag_list;
use super::types::{Address, BodyStructure, Envelope, FetchItem};

/// Parses the parenthesized item list of a FETCH response.
///
/// Servers may return more items than were requested; unknown items are
/// skipped rather than treated as errors.
pub fn parse_fetch_response(lexer: &mut Lexer<'_>) -> Result<Vec<FetchItem>> {
    lexer.expect(Token::LParen)?;

    let mut items = Vec::new();

    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Space => {}
            Token::Atom(name) => {
                let upper = name.to_uppercase();
                match upper.as_str() {
                    "FLAGS" => {
                        lexer.expect_space()?;
                        let flags = parse_flag_list(lexer)?;
                        items.push(FetchItem::Flags(flags));
                    }
                    "UID" => {
                        lexer.expect_space()?;
                        let n = lexer.read_number_u32()?;
                        let uid = Uid::new(n).ok_or_else(|| Error::Parse {
                            position: lexer.position(),
                            message: "UID cannot be 0".to_string(),
                        })?;
                        items.push(FetchItem::Uid(uid));
                    }
                    "RFC822.SIZE" => {
                        lexer.expect_space()?;
                        let size = lexer.read_number()?;
                        items.push(FetchItem::Rfc822Size(size));
                    }
                    "INTERNALDATE" => {
                        lexer.expect_space()?;
                        match lexer.next_token()? {
                            Token::QuotedString(date) => {
                                items.push(FetchItem::InternalDate(date));
                            }
                            token => {
                                return Err(lexer
                                    .error(&format!("expected INTERNALDATE string: {token:?}")));
                            }
                        }
                    }
                    "ENVELOPE" => {
                        lexer.expect_space()?;
                        let envelope = parse_envelope(lexer)?;
                        items.push(FetchItem::Envelope(Box::new(envelope)));
                    }
                    "BODYSTRUCTURE" => {
                        lexer.expect_space()?;
                        let body_structure = parse_body_structure(lexer)?;
                        items.push(FetchItem::BodyStructure(body_structure));
                    }
                    "BODY" => {
                        // BODY with no bracket is a non-extensible
                        // BODYSTRUCTURE; BODY[section]<origin> carries content.
                        if lexer.peek() == Some(b'[') {
                            let (section, origin) = parse_section_and_origin(lexer)?;
                            lexer.expect_space()?;
                            let data = lexer.read_nstring_bytes()?;
                            items.push(FetchItem::Body {
                                section,
                                origin,
                                data,
                            });
                        } else {
                            lexer.expect_space()?;
                            let body_structure = parse_body_structure(lexer)?;
                            items.push(FetchItem::BodyStructure(body_structure));
                        }
                    }
                    "RFC822" | "RFC822.HEADER" | "RFC822.TEXT" => {
                        // Obsolete equivalents of BODY[], BODY[HEADER], BODY[TEXT].
                        lexer.expect_space()?;
                        let data = lexer.read_nstring_bytes()?;
                        let section = match upper.as_str() {
                            "RFC822.HEADER" => Some("HEADER".to_string()),
                            "RFC822.TEXT" => Some("TEXT".to_string()),
                            _ => None,
                        };
                        items.push(FetchItem::Body {
                            section,
                            origin: None,
                            data,
                        });
                    }
                    "BINARY" => {
                        let (section, origin) = parse_section_and_origin(lexer)?;
                        lexer.expect_space()?;
                        let data = lexer.read_nstring_bytes()?;
                        items.push(FetchItem::Binary {
                            section,
                            origin,
                            data,
                        });
                    }
                    "BINARY.SIZE" => {
                        let (section, _) = parse_section_and_origin(lexer)?;
                        lexer.expect_space()?;
                        let size = lexer.read_number()?;
                        items.push(FetchItem::BinarySize { section, size });
                    }
                    "MODSEQ" => {
                        lexer.expect_space()?;
                        lexer.expect(Token::LParen)?;
                        let n = lexer.read_number()?;
                        lexer.expect(Token::RParen)?;
                        let modseq = ModSeq::from_u64(n)
                            .ok_or_else(|| lexer.error("MODSEQ cannot be 0"))?;
                        items.push(FetchItem::ModSeq(modseq));
                    }
                    "X-GM-MSGID" => {
                        lexer.expect_space()?;
                        items.push(FetchItem::GmailMsgId(lexer.read_number()?));
                    }
                    "X-GM-THRID" => {
                        lexer.expect_space()?;
                        items.push(FetchItem::GmailThreadId(lexer.read_number()?));
                    }
                    "X-GM-LABELS" => {
                        lexer.expect_space()?;
                        items.push(FetchItem::GmailLabels(parse_label_list(lexer)?));
                    }
                    "PREVIEW" => {
                        lexer.expect_space()?;
                        items.push(FetchItem::Preview(lexer.read_nstring()?));
                    }
                    "SAVEDATE" => {
                        lexer.expect_space()?;
                        items.push(FetchItem::SaveDate(lexer.read_nstring()?));
                    }
                    "EMAILID" => {
                        lexer.expect_space()?;
                        lexer.expect(Token::LParen)?;
                        let id = lexer.read_astring()?;
                        lexer.expect(Token::RParen)?;
                        items.push(FetchItem::EmailId(id));
                    }
                    "THREADID" => {
                        lexer.expect_space()?;
                        let id = match lexer.next_token()? {
                            Token::Nil => None,
                            Token::LParen => {
                                let id = lexer.read_astring()?;
                                lexer.expect(Token::RParen)?;
                                Some(id)
                            }
                            token => {
                                return Err(
                                    lexer.error(&format!("unexpected THREADID value: {token:?}"))
                                );
                            }
                        };
                        items.push(FetchItem::ThreadId(id));
                    }
                    _ => {
                        skip_fetch_item(lexer)?;
                    }
                }
            }
            token => {
                return Err(lexer.error(&format!("unexpected token in FETCH items: {token:?}")));
            }
        }
    }

    Ok(items)
}

/// Parses optional `[section]` and `<origin>` after a BODY/BINARY atom.
fn parse_section_and_origin(lexer: &mut Lexer<'_>) -> Result<(Option<String>, Option<u32>)> {
    let mut section = None;
    let mut origin = None;

    if lexer.peek() == Some(b'[') {
        lexer.advance();

        let mut section_buf = String::new();
        loop {
            match lexer.peek() {
                Some(b']') => {
                    lexer.advance();
                    break;
                }
                Some(b) => {
                    section_buf.push(b as char);
                    lexer.advance();
                }
                None => return Err(lexer.error("unterminated BODY section")),
            }
        }

        if !section_buf.is_empty() {
            section = Some(section_buf);
        }
    }

    if lexer.peek() == Some(b'<') {
        lexer.advance();

        let mut origin_buf = String::new();
        loop {
            match lexer.peek() {
                Some(b'>') => {
                    lexer.advance();
                    break;
                }
                Some(b) if b.is_ascii_digit() => {
                    origin_buf.push(b as char);
                    lexer.advance();
                }
                _ => return Err(lexer.error("invalid BODY origin")),
            }
        }

        if !origin_buf.is_empty() {
            origin = origin_buf.parse().ok();
        }
    }

    Ok((section, origin))
}

/// Parses an envelope structure.
pub fn parse_envelope(lexer: &mut Lexer<'_>) -> Result<Envelope> {
    lexer.expect(Token::LParen)?;

    let date = lexer.read_nstring()?;
    lexer.expect_space()?;

    let subject = lexer.read_nstring()?;
    lexer.expect_space()?;

    let from = parse_address_list(lexer)?;
    lexer.expect_space()?;

    let sender = parse_address_list(lexer)?;
    lexer.expect_space()?;

    let reply_to = parse_address_list(lexer)?;
    lexer.expect_space()?;

    let to = parse_address_list(lexer)?;
    lexer.expect_space()?;

    let cc = parse_address_list(lexer)?;
    lexer.expect_space()?;

    let bcc = parse_address_list(lexer)?;
    lexer.expect_space()?;

    let in_reply_to = lexer.read_nstring()?;
    lexer.expect_space()?;

    let message_id = lexer.read_nstring()?;

    lexer.expect(Token::RParen)?;

    Ok(Envelope {
        date,
        subject,
        from,
        sender,
        reply_to,
        to,
        cc,
        bcc,
        in_reply_to,
        message_id,
    })
}

/// Parses an address list.
pub fn parse_address_list(lexer: &mut Lexer<'_>) -> Result<Vec<Address>> {
    match lexer.next_token()? {
        Token::Nil => Ok(Vec::new()),
        Token::LParen => {
            let mut addresses = Vec::new();

            loop {
                match lexer.peek() {
                    Some(b')') => {
                        lexer.advance();
                        break;
                    }
                    Some(b'(') => {
                        addresses.push(parse_address(lexer)?);
                    }
                    Some(b' ') => {
                        lexer.advance();
                    }
                    _ => return Err(lexer.error("unexpected byte in address list")),
                }
            }

            Ok(addresses)
        }
        token => Err(lexer.error(&format!("expected address list, got {token:?}"))),
    }
}

/// Parses a single address.
fn parse_address(lexer: &mut Lexer<'_>) -> Result<Address> {
    lexer.expect(Token::LParen)?;

    let name = lexer.read_nstring()?;
    lexer.expect_space()?;

    let adl = lexer.read_nstring()?;
    lexer.expect_space()?;

    let mailbox = lexer.read_nstring()?;
    lexer.expect_space()?;

    let host = lexer.read_nstring()?;

    lexer.expect(Token::RParen)?;

    Ok(Address {
        name,
        adl,
        mailbox,
        host,
    })
}

/// Parses a BODYSTRUCTURE response.
///
/// Handles the nested grammar:
/// - single-part: `("TYPE" "SUBTYPE" params id desc enc size ...)`
/// - message/rfc822: adds envelope + nested structure + line count
/// - multipart: `((part)(part) "SUBTYPE" ...)`
pub fn parse_body_structure(lexer: &mut Lexer<'_>) -> Result<BodyStructure> {
    lexer.expect(Token::LParen)?;

    if lexer.peek() == Some(b'(') {
        let mut parts = Vec::new();
        while lexer.peek() == Some(b'(') {
            parts.push(parse_body_structure(lexer)?);
            if lexer.peek() == Some(b' ') {
                lexer.advance();
            }
        }

        let subtype = lexer.read_nstring()?.unwrap_or_default().to_uppercase();

        skip_to_close_paren(lexer)?;

        Ok(BodyStructure::Multipart {
            bodies: parts,
            subtype,
        })
    } else {
        let media_type = lexer.read_nstring()?.unwrap_or_default().to_uppercase();
        lexer.expect_space()?;

        let media_subtype = lexer.read_nstring()?.unwrap_or_default().to_uppercase();
        lexer.expect_space()?;

        let params = parse_body_params(lexer)?;
        lexer.expect_space()?;

        let id = lexer.read_nstring()?;
        lexer.expect_space()?;

        let description = lexer.read_nstring()?;
        lexer.expect_space()?;

        let encoding = lexer.read_nstring()?.unwrap_or_default();
        lexer.expect_space()?;

        let size = lexer.read_number()?;

        if media_type == "MESSAGE" && media_subtype == "RFC822" {
            lexer.expect_space()?;
            let envelope = parse_envelope(lexer)?;
            lexer.expect_space()?;
            let body = parse_body_structure(lexer)?;
            lexer.expect_space()?;
            let lines = lexer.read_number_u32()?;

            skip_to_close_paren(lexer)?;

            return Ok(BodyStructure::Message {
                envelope: Box::new(envelope),
                body: Box::new(body),
                lines,
            });
        }

        let lines = if media_type == "TEXT" {
            if lexer.peek() == Some(b' ') {
                lexer.advance();
                Some(lexer.read_number_u32()?)
            } else {
                None
            }
        } else {
            None
        };

        // Remaining optional fields (MD5, disposition, language, location)
        // are not modeled; skip to the end of this part.
        skip_to_close_paren(lexer)?;

        if media_type == "TEXT" {
            Ok(BodyStructure::Text {
                subtype: media_subtype,
                params,
                id,
                description,
                encoding,
                size,
                lines: lines.unwrap_or(0),
            })
        } else {
            Ok(BodyStructure::Basic {
                media_type,
                media_subtype,
                params,
                id,
                description,
                encoding,
                size,
            })
        }
    }
}

/// Parses body parameters (NIL or `(key value key value ...)`).
fn parse_body_params(lexer: &mut Lexer<'_>) -> Result<Vec<(String, String)>> {
    match lexer.next_token()? {
        Token::Nil => Ok(Vec::new()),
        Token::LParen => {
            let mut params = Vec::new();
            loop {
                match lexer.peek() {
                    Some(b')') => {
                        lexer.advance();
                        break;
                    }
                    Some(b' ') => {
                        lexer.advance();
                    }
                    _ => {
                        let key = lexer.read_nstring()?.unwrap_or_default();
                        if lexer.peek() == Some(b' ') {
                            lexer.advance();
                        }
                        let value = lexer.read_nstring()?.unwrap_or_default();
                        params.push((key, value));
                    }
                }
            }
            Ok(params)
        }
        _ => Ok(Vec::new()),
    }
}

/// Parses an X-GM-LABELS list: `(\Inbox "custom label")` or NIL.
fn parse_label_list(lexer: &mut Lexer<'_>) -> Result<Vec<Label>> {
    match lexer.next_token()? {
        Token::Nil => Ok(Vec::new()),
        Token::LParen => {
            let mut labels = Vec::new();
            loop {
                match lexer.next_token()? {
                    Token::RParen => break,
                    Token::Space => {}
                    Token::Atom(s) => labels.push(Label::new(s)),
                    Token::QuotedString(s) => labels.push(Label::new(s)),
                    Token::Literal(data) => {
                        labels.push(Label::new(String::from_utf8_lossy(&data).into_owned()));
                    }
                    token => {
                        return Err(lexer.error(&format!("unexpected label token: {token:?}")));
                    }
                }
            }
            Ok(labels)
        }
        token => Err(lexer.error(&format!("expected label list, got {token:?}"))),
    }
}

/// Skips to the closing parenthesis at the current nesting level.
fn skip_to_close_paren(lexer: &mut Lexer<'_>) -> Result<()> {
    let mut depth = 1;
    while depth > 0 {
        match lexer.peek() {
            Some(b'(') => {
                depth += 1;
                lexer.advance();
            }
            Some(b')') => {
                depth -= 1;
                lexer.advance();
            }
            Some(b'"') => {
                let _ = lexer.next_token()?;
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
    Ok(())
}

/// Skips an unknown fetch item value.
fn skip_fetch_item(lexer: &mut Lexer<'_>) -> Result<()> {
    if lexer.peek() == Some(b' ') {
        lexer.advance();
    }

    let mut paren_depth = 0;

    loop {
        match lexer.peek() {
            Some(b'(') => {
                paren_depth += 1;
                lexer.advance();
            }
            Some(b')') => {
                if paren_depth == 0 {
                    break;
                }
                paren_depth -= 1;
                lexer.advance();
            }
            Some(b' ') if paren_depth == 0 => break,
            Some(b'"') => {
                let _ = lexer.next_token()?;
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

    Ok(())
}
