//! Stream types for IMAP connections.
//!
//! [`ImapStream`] is the duplex the rest of the engine reads and writes.
//! It starts plain or TLS, can be upgraded in place by STARTTLS, and can
//! be wrapped in a DEFLATE layer when the server accepts COMPRESS
//! (RFC 4978).

#![allow(clippy::missing_errors_doc)]

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_compression::tokio::bufread::DeflateDecoder;
use async_compression::tokio::write::DeflateEncoder;
use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncWrite, BufReader, ReadBuf, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;

use super::config::Config;
use crate::{Error, Result};

/// A duplex stream that can be plaintext, TLS, or deflate-compressed.
pub enum ImapStream {
    /// Plaintext TCP stream.
    Plain(TcpStream),
    /// TLS-encrypted stream (boxed to reduce enum size).
    Tls(Box<TlsStream<TcpStream>>),
    /// DEFLATE-compressed stream over either of the above.
    Deflate(Box<DeflateStream>),
}

/// The split-and-wrapped halves of a compressed connection.
pub struct DeflateStream {
    reader: DeflateDecoder<BufReader<ReadHalf<ImapStream>>>,
    writer: DeflateEncoder<WriteHalf<ImapStream>>,
    /// Whether the stream under the compression layer is TLS.
    tls: bool,
}

impl ImapStream {
    /// Wraps a plaintext stream.
    #[must_use]
    pub const fn plain(stream: TcpStream) -> Self {
        Self::Plain(stream)
    }

    /// Wraps a TLS stream.
    #[must_use]
    pub fn tls(stream: TlsStream<TcpStream>) -> Self {
        Self::Tls(Box::new(stream))
    }

    /// Upgrades a plaintext stream to TLS (STARTTLS).
    pub async fn upgrade_to_tls(self, host: &str) -> Result<Self> {
        match self {
            Self::Plain(tcp) => {
                let connector = tls_connector();
                let server_name = ServerName::try_from(host.to_string())?;
                let tls = connector.connect(server_name, tcp).await?;
                Ok(Self::Tls(Box::new(tls)))
            }
            Self::Tls(_) | Self::Deflate(_) => Err(Error::Protocol(
                "stream is already encrypted or compressed".to_string(),
            )),
        }
    }

    /// Wraps the stream in a DEFLATE layer after a successful COMPRESS.
    pub fn enable_compression(self) -> Result<Self> {
        if matches!(self, Self::Deflate(_)) {
            return Err(Error::Protocol("compression is already active".to_string()));
        }
        let tls = self.is_tls();
        let (read_half, write_half) = tokio::io::split(self);
        Ok(Self::Deflate(Box::new(DeflateStream {
            reader: DeflateDecoder::new(BufReader::new(read_half)),
            writer: DeflateEncoder::new(write_half),
            tls,
        })))
    }

    /// Returns true if the stream is TLS-encrypted (possibly under
    /// compression).
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        match self {
            Self::Plain(_) => false,
            Self::Tls(_) => true,
            Self::Deflate(inner) => inner.tls,
        }
    }

    /// Returns true if COMPRESS is active.
    #[must_use]
    pub const fn is_compressed(&self) -> bool {
        matches!(self, Self::Deflate(_))
    }
}

impl AsyncRead for ImapStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_read(cx, buf),
            Self::Deflate(stream) => Pin::new(&mut stream.reader).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for ImapStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_write(cx, buf),
            Self::Deflate(stream) => Pin::new(&mut stream.writer).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_flush(cx),
            Self::Tls(stream) => Pin::new(stream).poll_flush(cx),
            Self::Deflate(stream) => Pin::new(&mut stream.writer).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            Self::Tls(stream) => Pin::new(stream).poll_shutdown(cx),
            Self::Deflate(stream) => Pin::new(&mut stream.writer).poll_shutdown(cx),
        }
    }
}

/// Builds a TLS connector with the webpki root store.
fn tls_connector() -> TlsConnector {
    let root_store = rustls::RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    TlsConnector::from(Arc::new(config))
}

/// Connects per the configuration's security mode. `StartTls` connects
/// plaintext; the upgrade happens after capability negotiation.
pub async fn connect(config: &Config) -> Result<ImapStream> {
    let addr = format!("{}:{}", config.host, config.port);
    let connect = TcpStream::connect(&addr);
    let tcp = tokio::time::timeout(config.connect_timeout, connect)
        .await
        .map_err(|_| {
            Error::Io(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("connect to {addr} timed out"),
            ))
        })??;

    match config.security {
        super::config::Security::Implicit => {
            let connector = tls_connector();
            let server_name = ServerName::try_from(config.host.clone())?;
            let tls = connector.connect(server_name, tcp).await?;
            Ok(ImapStream::Tls(Box::new(tls)))
        }
        super::config::Security::StartTls | super::config::Security::None => {
            Ok(ImapStream::Plain(tcp))
        }
    }
}
