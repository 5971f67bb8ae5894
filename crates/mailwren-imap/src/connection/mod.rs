//! Connection management.
//!
//! [`client`] holds the type-state client and command dispatch;
//! [`framed`] the CRLF/literal framing; [`stream`] the plain/TLS/deflate
//! duplex; [`idle`] the push channel; [`config`] the knobs.

pub mod client;
pub mod config;
pub mod framed;
pub mod idle;
pub mod stream;

pub use client::{
    AppendedUids, Authenticated, Client, CommandOutput, CopiedUids, NotAuthenticated, OpenParams,
    Progress, Selected, SessionStart,
};
pub use config::{Config, ConfigBuilder, Security};
pub use framed::FramedStream;
pub use idle::{IdleEvent, IdleHandle};
pub use stream::{ImapStream, connect};
