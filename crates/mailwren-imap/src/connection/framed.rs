//! Framed I/O for the IMAP protocol.
//!
//! A server response is a CRLF-terminated line that may embed literals:
//! `{n}\r\n` followed by `n` raw bytes, after which the line continues.
//! [`FramedStream::read_response`] assembles one complete response —
//! line plus all embedded literals — so the parser always receives a
//! whole unit. Writes go straight to the transport and are flushed per
//! phase, since the command engine controls phase boundaries itself.

#![allow(clippy::missing_errors_doc)]

use std::io;

use bytes::BytesMut;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::Result;

/// Read buffer capacity.
const READ_BUFFER: usize = 8192;

/// Caps on a single response, against hostile or broken servers.
#[derive(Debug, Clone, Copy)]
pub struct FrameLimits {
    /// Longest accepted line, literals excluded.
    pub max_line: usize,
    /// Largest accepted single literal.
    pub max_literal: usize,
}

impl Default for FrameLimits {
    fn default() -> Self {
        Self {
            max_line: 1024 * 1024,
            max_literal: 100 * 1024 * 1024,
        }
    }
}

/// Framed connection for the IMAP protocol.
pub struct FramedStream<S> {
    reader: BufReader<S>,
    limits: FrameLimits,
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new framed stream with default limits.
    pub fn new(stream: S) -> Self {
        Self::with_limits(stream, FrameLimits::default())
    }

    /// Creates a new framed stream with explicit limits.
    pub fn with_limits(stream: S, limits: FrameLimits) -> Self {
        Self {
            reader: BufReader::with_capacity(READ_BUFFER, stream),
            limits,
        }
    }

    /// Reads one complete response, including any embedded literals.
    pub async fn read_response(&mut self) -> Result<Vec<u8>> {
        let mut response = BytesMut::with_capacity(256);

        loop {
            let line_start = response.len();
            self.read_line_into(&mut response).await?;

            match literal_announcement(&response[line_start..]) {
                Some(announced) => {
                    if announced > self.limits.max_literal {
                        return Err(crate::Error::Protocol(format!(
                            "literal of {announced} bytes exceeds the {} byte cap",
                            self.limits.max_literal
                        )));
                    }
                    let body_start = response.len();
                    response.resize(body_start + announced, 0);
                    self.reader
                        .read_exact(&mut response[body_start..])
                        .await?;
                    // The line resumes after the literal body.
                }
                None => return Ok(response.to_vec()),
            }
        }
    }

    /// Appends one CRLF-terminated line to `out`, CRLF included.
    ///
    /// Consumes exactly up to the line ending, never past it: bytes after
    /// the CRLF belong to a literal body or the next response. Scanning
    /// for LF (rather than the CRLF pair) keeps a line ending that
    /// straddles a chunk boundary from being missed; bare LF outside a
    /// literal is illegal and rejected.
    async fn read_line_into(&mut self, out: &mut BytesMut) -> Result<()> {
        let start = out.len();

        loop {
            let chunk = self.reader.fill_buf().await?;
            if chunk.is_empty() {
                return Err(crate::Error::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed mid-response",
                )));
            }

            if let Some(at) = chunk.iter().position(|&b| b == b'\n') {
                out.extend_from_slice(&chunk[..=at]);
                self.reader.consume(at + 1);
                if out[start..].ends_with(b"\r\n") {
                    return Ok(());
                }
                return Err(crate::Error::Protocol(
                    "bare LF in response line".to_string(),
                ));
            }

            let taken = chunk.len();
            out.extend_from_slice(chunk);
            self.reader.consume(taken);

            if out.len() - start > self.limits.max_line {
                return Err(crate::Error::Protocol(format!(
                    "response line exceeds the {} byte cap",
                    self.limits.max_line
                )));
            }
        }
    }

    /// Writes bytes and flushes.
    pub async fn write_all_flush(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.reader.get_mut();
        stream.write_all(data).await?;
        stream.flush().await?;
        Ok(())
    }

    /// Gets a reference to the underlying stream.
    pub fn get_ref(&self) -> &S {
        self.reader.get_ref()
    }

    /// Consumes the framed stream and returns the inner stream.
    ///
    /// Buffered read data is discarded; callers only do this at a
    /// protocol quiet point (after a tagged response, before the next
    /// command), e.g. for STARTTLS or COMPRESS.
    pub fn into_inner(self) -> S {
        self.reader.into_inner()
    }
}

/// Parses the literal size a line announces at its end, if any.
///
/// `... {123}\r\n` and the non-synchronizing `... {123+}\r\n` both
/// announce 123 bytes to follow.
fn literal_announcement(line: &[u8]) -> Option<usize> {
    let body = line.strip_suffix(b"\r\n")?;

    let inner = body.strip_suffix(b"}")?;
    let digits = inner.strip_suffix(b"+").unwrap_or(inner);
    let open = digits.iter().rposition(|&b| b == b'{')?;
    let digits = &digits[open + 1..];

    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}
