//! Error types for the IMAP engine.

use thiserror::Error;

use crate::types::FailureReason;

/// Errors that can occur during IMAP operations.
///
/// Engine-level failures (`Parse`, `Bad`, `Io`, `Bye`) are fatal to the
/// connection; `Failed` (a tagged `NO`) and precondition errors leave the
/// connection usable.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error during network operations. Fatal to the connection.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS handshake or encryption error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Invalid DNS name for TLS.
    #[error("Invalid DNS name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// Ungrammatical server response. Fatal to the connection.
    #[error("Protocol error at position {position}: {message}")]
    Parse {
        /// Byte position where the error occurred.
        position: usize,
        /// Description of what went wrong.
        message: String,
    },

    /// Protocol violation that isn't a parse failure (unexpected
    /// continuation, missing tagged response, ...). Fatal.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Server returned a tagged `NO`: the operation failed but the
    /// connection stays open.
    #[error("Command failed ({reason:?}): {text}")]
    Failed {
        /// Machine-readable reason from the response code, if any.
        reason: FailureReason,
        /// Human-readable server text.
        text: String,
    },

    /// Server returned a tagged `BAD`: the server rejected the command
    /// syntax. Fatal to the connection.
    #[error("Server rejected command: {0}")]
    Bad(String),

    /// Server sent BYE and is closing the connection.
    #[error("Server sent BYE: {0}")]
    Bye(String),

    /// The operation requires an open connection.
    #[error("Not connected")]
    NotConnected,

    /// The operation requires an authenticated session.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The operation requires a selected mailbox.
    #[error("No mailbox is open")]
    FolderNotOpen,

    /// The requested mailbox was not found.
    #[error("Mailbox not found: {0}")]
    FolderNotFound(String),

    /// The requested message was not found in the selected mailbox.
    #[error("Message not found")]
    MessageNotFound,

    /// The server lacks a required capability, or the caller requested a
    /// feature that has not been enabled.
    #[error("Not supported: {0}")]
    NotSupported(String),

    /// The operation was cancelled before completion.
    #[error("Operation cancelled")]
    Cancelled,

    /// Caller misuse detected before any I/O.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Returns true if this error terminates the connection.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Io(_)
                | Self::Tls(_)
                | Self::Parse { .. }
                | Self::Protocol(_)
                | Self::Bad(_)
                | Self::Bye(_)
        )
    }

    /// Returns the failure reason for a tagged `NO`, if that is what this is.
    #[must_use]
    pub const fn failure_reason(&self) -> Option<FailureReason> {
        match self {
            Self::Failed { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
