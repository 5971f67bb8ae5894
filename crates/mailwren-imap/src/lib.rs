//! # mailwren-imap
//!
//! An async IMAP4rev1 client protocol engine: connection lifecycle,
//! capability negotiation, a binary-safe response parser, a command
//! engine with literal continuation handling, per-mailbox state
//! tracking, and a typed event surface.
//!
//! ## Features
//!
//! - **Type-state connection management**: compile-time enforcement of
//!   valid IMAP state transitions (`NotAuthenticated` → `Authenticated`
//!   → `Selected`)
//! - **Wide extension matrix**: IDLE, CONDSTORE/QRESYNC, UIDPLUS,
//!   ESEARCH/SORT/THREAD, ACL, QUOTA, METADATA, NOTIFY,
//!   COMPRESS=DEFLATE, LIST-EXTENDED/SPECIAL-USE, ENABLE, ID, SASL-IR,
//!   STARTTLS, LITERAL+/LITERAL-, MULTIAPPEND, MOVE, BINARY,
//!   UTF8=ACCEPT, and the Gmail extensions
//! - **Mailbox state tracking**: a dense sequence↔UID map kept current
//!   under unsolicited EXISTS/EXPUNGE/VANISHED/FETCH pushes, with typed
//!   events for every change
//! - **TLS via rustls**: no OpenSSL dependency
//! - **Sans-I/O parser**: tokenizer and grammar are pure functions over
//!   framed bytes
//!
//! ## Quick start
//!
//! ```ignore
//! use mailwren_imap::{Client, Config, FetchItems, OpenParams, SessionStart};
//!
//! #[tokio::main]
//! async fn main() -> mailwren_imap::Result<()> {
//!     let config = Config::new("imap.example.com");
//!     let (start, mut events) = Client::connect(config).await?;
//!
//!     let client = match start {
//!         SessionStart::NotAuthenticated(client) => {
//!             client.login("user@example.com", "password").await?
//!         }
//!         SessionStart::Authenticated(client) => client,
//!     };
//!
//!     let (mut client, info) = client.select("INBOX", OpenParams::plain()).await?;
//!     println!("{} messages", info.exists);
//!
//!     let summaries = client
//!         .uid_fetch(&client.known_uids(), FetchItems::Fast)
//!         .await?;
//!
//!     // Real-time updates
//!     let mut handle = client.idle().await?;
//!     let event = handle.wait(std::time::Duration::from_secs(60)).await?;
//!     handle.done().await?;
//!
//!     drop((summaries, event, events));
//!     client.close().await?.logout().await
//! }
//! ```
//!
//! ## Modules
//!
//! - [`command`]: command descriptors and phased encoding
//! - [`connection`]: type-state client, framing, TLS/COMPRESS transport
//! - [`events`]: typed mailbox/session events over a bounded channel
//! - [`handler`]: synchronous unsolicited-response fan-out
//! - [`mailbox_state`]: the selected-mailbox state machine
//! - [`parser`]: sans-I/O tokenizer and response grammar
//! - [`qresync`]: fast-resync state types (RFC 7162)
//! - [`quirks`]: server fingerprinting and workarounds
//! - [`sasl`]: SASL mechanism interface and reference mechanisms
//! - [`types`]: identifiers, sets, flags, capabilities, response codes

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod events;
pub mod handler;
pub mod mailbox_state;
pub mod parser;
pub mod qresync;
pub mod quirks;
pub mod sasl;
pub mod types;

pub use command::{
    AppendMessage, Command, FetchAttribute, FetchItems, NotifyEvent, NotifyRequest,
    SearchCriteria, SearchReturn, SortKey, StatusAttribute, StoreAction, TagGenerator,
    ThreadAlgorithm,
};
pub use connection::{
    AppendedUids, Authenticated, Client, Config, ConfigBuilder, CopiedUids, FramedStream,
    IdleEvent, IdleHandle, ImapStream, NotAuthenticated, OpenParams, Progress, Security, Selected,
    SessionStart,
};
pub use error::{Error, Result};
pub use events::{Event, EventSink, MailboxEvent, SessionEvent};
pub use handler::{CollectingHandler, LoggingHandler, NoopHandler, ResponseHandler};
pub use parser::{
    BodyStructure, Envelope, EsearchResult, FetchItem, Response, ResponseParser, ThreadNode,
    UntaggedResponse,
};
pub use qresync::{QresyncParams, SyncState};
pub use quirks::{ServerQuirks, ServerType};
pub use sasl::{Plain, SaslMechanism, XOAuth2};
pub use types::{
    Capabilities, Capability, FailureReason, Flag, Flags, FolderAccess, Label, ListEntry, Mailbox,
    MailboxAttribute, ModSeq, ResponseCode, SelectInfo, SeqNum, SequenceSet, SetOrder, Status,
    StatusItem, Tag, Uid, UidSet, UidValidity, UniqueId,
};

/// IMAP protocol version implemented.
pub const IMAP_VERSION: &str = "IMAP4rev1";
