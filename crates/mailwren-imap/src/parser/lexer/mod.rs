//! IMAP lexer for tokenizing server responses.
//!
//! Breaks a framed response (a complete line including any embedded
//! literals) into tokens for the grammar-directed parser. Literal bodies
//! are binary-safe: the `{n}` prefix is consumed and exactly `n` raw bytes
//! are yielded without charset interpretation.

#![allow(clippy::missing_errors_doc)]

mod token;

pub use token::Token;

use crate::{Error, Result};

/// IMAP lexer state.
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    #[must_use]
    pub const fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    /// Returns the current position in the input.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Returns the remaining input.
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        &self.input[self.pos..]
    }

    /// Returns true if at end of input.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Peeks at the current byte without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Peeks at the byte at offset from current position.
    #[must_use]
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    /// Advances by one byte and returns it.
    pub fn advance(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    /// Skips n bytes.
    pub fn skip(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    /// Reads the next token.
    pub fn next_token(&mut self) -> Result<Token<'a>> {
        let Some(byte) = self.peek() else {
            return Ok(Token::Eof);
        };

        match byte {
            b'\r' => {
                if self.peek_at(1) == Some(b'\n') {
                    self.skip(2);
                    Ok(Token::Crlf)
                } else {
                    Err(self.error("expected LF after CR"))
                }
            }

            b' ' => {
                self.advance();
                Ok(Token::Space)
            }

            b'(' => {
                self.advance();
                Ok(Token::LParen)
            }
            b')' => {
                self.advance();
                Ok(Token::RParen)
            }
            b'[' => {
                self.advance();
                Ok(Token::LBracket)
            }
            b']' => {
                self.advance();
                Ok(Token::RBracket)
            }
            b'*' => {
                self.advance();
                Ok(Token::Asterisk)
            }
            b'+' => {
                self.advance();
                Ok(Token::Plus)
            }

            b'"' => self.read_quoted_string(),

            b'{' => self.read_literal(),

            b'0'..=b'9' => self.read_number_or_atom(),

            _ if is_atom_char(byte) => self.read_atom(),

            _ => Err(self.error(&format!("unexpected byte: {byte:#04x}"))),
        }
    }

    /// Reads a quoted string token. Only `\"` and `\\` escapes are legal.
    fn read_quoted_string(&mut self) -> Result<Token<'a>> {
        self.advance(); // opening quote

        let mut result = Vec::new();

        loop {
            match self.advance() {
                Some(b'"') => break,
                Some(b'\\') => match self.advance() {
                    Some(b'"') => result.push(b'"'),
                    Some(b'\\') => result.push(b'\\'),
                    Some(c) => {
                        return Err(self.error(&format!("invalid escape: \\{}", c as char)));
                    }
                    None => return Err(self.error("unexpected EOF in quoted string")),
                },
                Some(b'\r' | b'\n') => {
                    return Err(self.error("bare newline in quoted string"));
                }
                Some(c) => result.push(c),
                None => return Err(self.error("unexpected EOF in quoted string")),
            }
        }

        let s =
            String::from_utf8(result).map_err(|_| self.error("invalid UTF-8 in quoted string"))?;

        Ok(Token::QuotedString(s))
    }

    /// Reads a literal: the `{n}` or `{n+}` prefix, CRLF, then exactly `n`
    /// raw bytes. From the reader's point of view synchronizing and
    /// non-synchronizing literals are identical; the continuation dance
    /// only matters on the sending side.
    fn read_literal(&mut self) -> Result<Token<'a>> {
        self.advance(); // {

        let start = self.pos;
        let mut nonsync = false;

        while let Some(b) = self.peek() {
            match b {
                b'0'..=b'9' => {
                    self.advance();
                }
                b'+' => {
                    nonsync = true;
                    self.advance();
                }
                b'}' => break,
                _ => return Err(self.error("invalid character in literal size")),
            }
        }

        let digits_end = if nonsync { self.pos - 1 } else { self.pos };
        let size_str = std::str::from_utf8(&self.input[start..digits_end])
            .map_err(|_| self.error("invalid literal size"))?;
        let size: usize = size_str
            .parse()
            .map_err(|_| self.error("invalid literal size number"))?;

        if self.advance() != Some(b'}') {
            return Err(self.error("expected } after literal size"));
        }
        if self.advance() != Some(b'\r') || self.advance() != Some(b'\n') {
            return Err(self.error("expected CRLF after literal size"));
        }

        if self.pos + size > self.input.len() {
            return Err(self.error("incomplete literal data"));
        }

        let data = self.input[self.pos..self.pos + size].to_vec();
        self.skip(size);

        Ok(Token::Literal(data))
    }

    /// Reads a number or atom starting with a digit.
    fn read_number_or_atom(&mut self) -> Result<Token<'a>> {
        let start = self.pos;
        let mut all_digits = true;

        while let Some(b) = self.peek() {
            if is_atom_char(b) {
                if !b.is_ascii_digit() {
                    all_digits = false;
                }
                self.advance();
            } else {
                break;
            }
        }

        let s = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| self.error("invalid UTF-8 in atom"))?;

        if all_digits {
            let n: u64 = s.parse().map_err(|_| self.error("number too large"))?;
            Ok(Token::Number(n))
        } else {
            Ok(Token::Atom(s))
        }
    }

    /// Reads an atom token.
    fn read_atom(&mut self) -> Result<Token<'a>> {
        let start = self.pos;

        while let Some(b) = self.peek() {
            if is_atom_char(b) {
                self.advance();
            } else {
                break;
            }
        }

        // The PERMANENTFLAGS wildcard `\*` is a lone backslash followed
        // by an asterisk; fold it into one atom.
        if self.pos == start + 1 && self.input[start] == b'\\' && self.peek() == Some(b'*') {
            self.advance();
        }

        let s = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| self.error("invalid UTF-8 in atom"))?;

        if s.eq_ignore_ascii_case("NIL") {
            Ok(Token::Nil)
        } else {
            Ok(Token::Atom(s))
        }
    }

    /// Creates a parse error at the current position.
    pub(crate) fn error(&self, message: &str) -> Error {
        Error::Parse {
            position: self.pos,
            message: message.to_string(),
        }
    }

    /// Expects and consumes a token of the same kind.
    #[allow(clippy::needless_pass_by_value)]
    pub fn expect(&mut self, expected: Token<'_>) -> Result<()> {
        let token = self.next_token()?;
        if std::mem::discriminant(&token) == std::mem::discriminant(&expected) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {expected:?}, got {token:?}")))
        }
    }

    /// Expects and consumes a space.
    pub fn expect_space(&mut self) -> Result<()> {
        self.expect(Token::Space)
    }

    /// Expects and consumes CRLF.
    pub fn expect_crlf(&mut self) -> Result<()> {
        self.expect(Token::Crlf)
    }

    /// Reads an astring (atom or string).
    pub fn read_astring(&mut self) -> Result<String> {
        match self.next_token()? {
            Token::Atom(s) => Ok(s.to_string()),
            // An unquoted NIL in astring position is the literal name "NIL".
            Token::Nil => Ok("NIL".to_string()),
            Token::QuotedString(s) => Ok(s),
            Token::Literal(data) => {
                String::from_utf8(data).map_err(|_| self.error("invalid UTF-8 in literal"))
            }
            token => Err(self.error(&format!("expected astring, got {token:?}"))),
        }
    }

    /// Reads a nstring (NIL or string).
    pub fn read_nstring(&mut self) -> Result<Option<String>> {
        match self.next_token()? {
            Token::Nil => Ok(None),
            Token::QuotedString(s) => Ok(Some(s)),
            Token::Literal(data) => {
                let s = String::from_utf8_lossy(&data).into_owned();
                Ok(Some(s))
            }
            token => Err(self.error(&format!("expected nstring, got {token:?}"))),
        }
    }

    /// Reads a nstring, preserving raw bytes.
    pub fn read_nstring_bytes(&mut self) -> Result<Option<Vec<u8>>> {
        match self.next_token()? {
            Token::Nil => Ok(None),
            Token::QuotedString(s) => Ok(Some(s.into_bytes())),
            Token::Literal(data) => Ok(Some(data)),
            token => Err(self.error(&format!("expected nstring, got {token:?}"))),
        }
    }

    /// Reads a number.
    pub fn read_number(&mut self) -> Result<u64> {
        match self.next_token()? {
            Token::Number(n) => Ok(n),
            token => Err(self.error(&format!("expected number, got {token:?}"))),
        }
    }

    /// Reads a number that must fit in u32 (sequence numbers, UIDs, counts).
    pub fn read_number_u32(&mut self) -> Result<u32> {
        let n = self.read_number()?;
        u32::try_from(n).map_err(|_| self.error("number exceeds 32 bits"))
    }

    /// Reads an atom.
    pub fn read_atom_string(&mut self) -> Result<&'a str> {
        match self.next_token()? {
            Token::Atom(s) => Ok(s),
            token => Err(self.error(&format!("expected atom, got {token:?}"))),
        }
    }

    /// Skips optional spaces.
    pub fn skip_spaces(&mut self) {
        while self.peek() == Some(b' ') {
            self.advance();
        }
    }
}

/// Returns true if the byte is a valid atom character.
///
/// Note: this includes `\` so flags like `\Seen` lex as single atoms, and
/// `%` is excluded along with the other list-wildcards and specials.
#[must_use]
pub const fn is_atom_char(b: u8) -> bool {
    matches!(b,
        0x21 | 0x23 | 0x24 | 0x26 | 0x27 |
        0x2B..=0x5A |
        0x5C |
        0x5E..=0x7A |
        0x7C |
        0x7E
    )
}

/// Returns true if the byte is an atom special character.
#[must_use]
pub const fn is_atom_special(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'{' | b' ' | b'%' | b'*' | b'"' | b'\\' | b']'
    ) || b < 0x20
        || b == 0x7F
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn simple_tokens() {
        let mut lexer = Lexer::new(b"* OK");

        assert_eq!(lexer.next_token().unwrap(), Token::Asterisk);
        assert_eq!(lexer.next_token().unwrap(), Token::Space);
        assert_eq!(lexer.next_token().unwrap(), Token::Atom("OK"));
        assert_eq!(lexer.next_token().unwrap(), Token::Eof);
    }

    #[test]
    fn tagged_response() {
        let mut lexer = Lexer::new(b"A0001 OK LOGIN completed\r\n");

        assert_eq!(lexer.next_token().unwrap(), Token::Atom("A0001"));
        assert_eq!(lexer.next_token().unwrap(), Token::Space);
        assert_eq!(lexer.next_token().unwrap(), Token::Atom("OK"));
    }

    #[test]
    fn numbers_are_u64() {
        let mut lexer = Lexer::new(b"715194045007");
        assert_eq!(lexer.next_token().unwrap(), Token::Number(715_194_045_007));
    }

    #[test]
    fn number_u32_overflow_rejected() {
        let mut lexer = Lexer::new(b"715194045007");
        assert!(lexer.read_number_u32().is_err());
    }

    #[test]
    fn quoted_string_escapes() {
        let mut lexer = Lexer::new(b"\"a \\\"b\\\" \\\\c\"");
        assert_eq!(
            lexer.next_token().unwrap(),
            Token::QuotedString("a \"b\" \\c".to_string())
        );
    }

    #[test]
    fn invalid_escape_rejected() {
        let mut lexer = Lexer::new(b"\"bad \\n\"");
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn nil_case_insensitive() {
        let mut lexer = Lexer::new(b"NIL nil Nil");
        assert_eq!(lexer.next_token().unwrap(), Token::Nil);
        lexer.skip_spaces();
        assert_eq!(lexer.next_token().unwrap(), Token::Nil);
        lexer.skip_spaces();
        assert_eq!(lexer.next_token().unwrap(), Token::Nil);
    }

    #[test]
    fn flags_lex_as_atoms() {
        let mut lexer = Lexer::new(b"(\\Seen \\Flagged)");
        assert_eq!(lexer.next_token().unwrap(), Token::LParen);
        assert_eq!(lexer.next_token().unwrap(), Token::Atom("\\Seen"));
        assert_eq!(lexer.next_token().unwrap(), Token::Space);
        assert_eq!(lexer.next_token().unwrap(), Token::Atom("\\Flagged"));
        assert_eq!(lexer.next_token().unwrap(), Token::RParen);
    }

    #[test]
    fn permanentflags_wildcard_is_one_atom() {
        let mut lexer = Lexer::new(b"(\\Deleted \\*)");
        assert_eq!(lexer.next_token().unwrap(), Token::LParen);
        assert_eq!(lexer.next_token().unwrap(), Token::Atom("\\Deleted"));
        assert_eq!(lexer.next_token().unwrap(), Token::Space);
        assert_eq!(lexer.next_token().unwrap(), Token::Atom("\\*"));
        assert_eq!(lexer.next_token().unwrap(), Token::RParen);
    }

    #[test]
    fn brackets() {
        let mut lexer = Lexer::new(b"[UIDNEXT 4392]");
        assert_eq!(lexer.next_token().unwrap(), Token::LBracket);
        assert_eq!(lexer.next_token().unwrap(), Token::Atom("UIDNEXT"));
        assert_eq!(lexer.next_token().unwrap(), Token::Space);
        assert_eq!(lexer.next_token().unwrap(), Token::Number(4392));
        assert_eq!(lexer.next_token().unwrap(), Token::RBracket);
    }

    #[test]
    fn literal_bytes() {
        let mut lexer = Lexer::new(b"{5}\r\nHello rest");
        match lexer.next_token().unwrap() {
            Token::Literal(data) => assert_eq!(data, b"Hello"),
            other => panic!("expected literal, got {other:?}"),
        }
        assert_eq!(lexer.next_token().unwrap(), Token::Space);
        assert_eq!(lexer.next_token().unwrap(), Token::Atom("rest"));
    }

    #[test]
    fn empty_literal() {
        let mut lexer = Lexer::new(b"{0}\r\n");
        match lexer.next_token().unwrap() {
            Token::Literal(data) => assert!(data.is_empty()),
            other => panic!("expected literal, got {other:?}"),
        }
    }

    #[test]
    fn literal_is_binary_safe() {
        // All 256 byte values survive untouched.
        let mut input = b"{256}\r\n".to_vec();
        let body: Vec<u8> = (0u16..=255).map(|b| b as u8).collect();
        input.extend_from_slice(&body);
        let mut lexer = Lexer::new(&input);
        match lexer.next_token().unwrap() {
            Token::Literal(data) => assert_eq!(data, body),
            other => panic!("expected literal, got {other:?}"),
        }
    }

    #[test]
    fn nonsync_literal_prefix() {
        let mut lexer = Lexer::new(b"{5+}\r\nHello");
        match lexer.next_token().unwrap() {
            Token::Literal(data) => assert_eq!(data, b"Hello"),
            other => panic!("expected literal, got {other:?}"),
        }
    }

    #[test]
    fn truncated_literal_rejected() {
        let mut lexer = Lexer::new(b"{10}\r\nshort");
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn continuation() {
        let mut lexer = Lexer::new(b"+ Ready\r\n");
        assert_eq!(lexer.next_token().unwrap(), Token::Plus);
        assert_eq!(lexer.next_token().unwrap(), Token::Space);
        assert_eq!(lexer.next_token().unwrap(), Token::Atom("Ready"));
        assert_eq!(lexer.next_token().unwrap(), Token::Crlf);
    }

    #[test]
    fn atom_char_classification() {
        assert!(is_atom_char(b'A'));
        assert!(is_atom_char(b'0'));
        assert!(is_atom_char(b':'));
        assert!(is_atom_char(b'\\'));
        assert!(!is_atom_char(b'%'));
        assert!(!is_atom_char(b'*'));
        assert!(!is_atom_char(b' '));
        assert!(!is_atom_char(b'('));
        assert!(!is_atom_char(b'{'));
        assert!(!is_atom_char(b'"'));
    }

    mod literal_props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn literal_preserves_all_bytes(body in proptest::collection::vec(any::<u8>(), 0..512)) {
                let mut input = format!("{{{}}}\r\n", body.len()).into_bytes();
                input.extend_from_slice(&body);
                let mut lexer = Lexer::new(&input);
                match lexer.next_token().unwrap() {
                    Token::Literal(data) => prop_assert_eq!(data, body),
                    other => prop_assert!(false, "expected literal, got {:?}", other),
                }
            }
        }
    }
}
