//! Type-state IMAP client connection.
//!
//! The type parameter tracks the protocol state at compile time
//! (`NotAuthenticated` → `Authenticated` → `Selected`), so operations
//! that require a selected mailbox simply do not exist on the earlier
//! states.
//!
//! Every command funnels through [`Client::run_command`], the single
//! dispatch point: it writes the command phases (handling synchronizing
//! literal continuations), then reads responses until the tagged
//! completion. Each untagged response is parsed once, applied to the
//! selected-mailbox state, fanned out to the handler and event channel,
//! and buffered for the operation to pick over.

#![allow(clippy::missing_errors_doc)]

mod authenticated;
mod not_authenticated;
mod selected;
mod states;

use std::marker::PhantomData;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;

pub use self::authenticated::{AppendedUids, OpenParams};
pub use self::selected::CopiedUids;
pub use self::states::{Authenticated, NotAuthenticated, Selected};

use super::config::Config;
use super::framed::FramedStream;
use super::stream::ImapStream;
use crate::command::{Command, CommandPart, EncodedCommand, TagGenerator};
use crate::events::{Event, EventSink, MailboxEvent, SessionEvent};
use crate::handler::{NoopHandler, ResponseHandler};
use crate::mailbox_state::SelectedMailbox;
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::quirks::{ServerQuirks, ServerType};
use crate::types::{Capabilities, ResponseCode, Status};
use crate::{Error, Result};

/// Result of reading a connection greeting.
pub enum SessionStart<S> {
    /// Normal greeting: the caller must authenticate.
    NotAuthenticated(Client<S, NotAuthenticated>),
    /// `PREAUTH` greeting: the session is already authenticated.
    Authenticated(Client<S, Authenticated>),
}

impl<S> std::fmt::Debug for SessionStart<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAuthenticated(client) => {
                f.debug_tuple("NotAuthenticated").field(client).finish()
            }
            Self::Authenticated(client) => f.debug_tuple("Authenticated").field(client).finish(),
        }
    }
}

/// What a completed command produced.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Untagged responses observed before the tagged completion, in wire
    /// order.
    pub untagged: Vec<UntaggedResponse>,
    /// Response code from the tagged OK, if any.
    pub code: Option<ResponseCode>,
    /// Human-readable completion text.
    pub text: String,
}

/// Reports upload/download progress during literal transfers.
pub trait Progress: Send {
    /// Called as bytes move, with the running total and, when known, the
    /// final size.
    fn report(&mut self, transferred: u64, total: Option<u64>);
}

/// IMAP client connection with type-state.
pub struct Client<S, State> {
    pub(crate) stream: FramedStream<S>,
    pub(crate) tag_gen: TagGenerator,
    pub(crate) caps: Capabilities,
    pub(crate) config: Config,
    pub(crate) quirks: ServerQuirks,
    pub(crate) handler: Box<dyn ResponseHandler>,
    pub(crate) events: EventSink,
    pub(crate) mailbox: Option<SelectedMailbox>,
    pub(crate) _state: PhantomData<State>,
}

impl<S, State> std::fmt::Debug for Client<S, State> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("tag_gen", &self.tag_gen)
            .field("capabilities", &self.caps)
            .field("quirks", &self.quirks)
            .finish_non_exhaustive()
    }
}

impl<S> Client<S, NotAuthenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps a connected stream, consumes the server greeting, and returns
    /// the resulting session state plus the event receiver.
    pub async fn from_stream(
        stream: S,
        config: Config,
    ) -> Result<(SessionStart<S>, mpsc::Receiver<Event>)> {
        let (events, rx) = EventSink::channel(config.event_queue);
        let mut client = Self {
            stream: FramedStream::new(stream),
            tag_gen: TagGenerator::default(),
            caps: Capabilities::new(),
            config,
            quirks: ServerQuirks::default(),
            handler: Box::new(NoopHandler),
            events,
            mailbox: None,
            _state: PhantomData,
        };

        let greeting = client.stream.read_response().await?;
        let start = match ResponseParser::parse(&greeting)? {
            Response::Untagged(UntaggedResponse::Ok { code, text }) => {
                client.absorb_greeting(code.as_ref(), &text);
                SessionStart::NotAuthenticated(client)
            }
            Response::Untagged(UntaggedResponse::PreAuth { code, text }) => {
                client.absorb_greeting(code.as_ref(), &text);
                client.events.session(SessionEvent::Authenticated);
                SessionStart::Authenticated(client.into_state())
            }
            Response::Untagged(UntaggedResponse::Bye { text, .. }) => {
                return Err(Error::Bye(text));
            }
            other => {
                return Err(Error::Protocol(format!("unexpected greeting: {other:?}")));
            }
        };

        Ok((start, rx))
    }

    fn absorb_greeting(&mut self, code: Option<&ResponseCode>, text: &str) {
        if let Some(ResponseCode::Capability(caps)) = code {
            self.caps.replace(caps.clone());
        }
        self.quirks =
            ServerQuirks::for_server(ServerType::detect(&self.caps, Some(text), None));
        tracing::debug!(server = ?self.quirks.server_type, "greeting");
    }
}

impl Client<ImapStream, NotAuthenticated> {
    /// Dials the configured server and consumes the greeting. With
    /// `Security::StartTls` the TLS upgrade is performed before returning.
    pub async fn connect(
        config: Config,
    ) -> Result<(SessionStart<ImapStream>, mpsc::Receiver<Event>)> {
        let stream = super::stream::connect(&config).await?;
        let starttls = matches!(config.security, super::config::Security::StartTls);
        let (start, rx) = Client::from_stream(stream, config).await?;

        if starttls {
            match start {
                SessionStart::NotAuthenticated(client) => {
                    let client = client.start_tls().await?;
                    Ok((SessionStart::NotAuthenticated(client), rx))
                }
                // A PREAUTH greeting on a STARTTLS port leaves no window
                // to negotiate TLS before authentication.
                SessionStart::Authenticated(_) => Err(Error::Protocol(
                    "server sent PREAUTH before STARTTLS".to_string(),
                )),
            }
        } else {
            Ok((start, rx))
        }
    }
}

/// Shared implementation for all states.
impl<S, State> Client<S, State>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Returns the server capabilities.
    #[must_use]
    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    /// Returns the detected server quirks.
    #[must_use]
    pub fn quirks(&self) -> &ServerQuirks {
        &self.quirks
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Installs an unsolicited-response handler, replacing the previous
    /// one.
    pub fn set_handler(&mut self, handler: Box<dyn ResponseHandler>) {
        self.handler = handler;
    }

    /// Sends a NOOP, giving the server a window to push updates.
    pub async fn noop(&mut self) -> Result<()> {
        self.run_command(&Command::Noop).await.map(|_| ())
    }

    /// Sends CAPABILITY and replaces the stored capability set.
    pub async fn capability(&mut self) -> Result<Capabilities> {
        let output = self.run_command(&Command::Capability).await?;
        self.absorb_capabilities(&output);
        Ok(self.caps.clone())
    }

    /// Sends ID (RFC 2971) and refines quirk detection with the server's
    /// identity.
    pub async fn id(
        &mut self,
        parameters: Option<Vec<(String, String)>>,
    ) -> Result<Option<Vec<(String, String)>>> {
        if !self.caps.supports_id() {
            return Err(Error::NotSupported("ID".to_string()));
        }
        let output = self.run_command(&Command::Id { parameters }).await?;
        let fields = output.untagged.into_iter().find_map(|resp| match resp {
            UntaggedResponse::Id(fields) => Some(fields),
            _ => None,
        });
        let fields = fields.flatten();
        if fields.is_some() {
            self.quirks = ServerQuirks::for_server(ServerType::detect(
                &self.caps,
                None,
                fields.as_deref(),
            ));
        }
        Ok(fields)
    }

    /// Sends LOGOUT and drops the connection.
    pub async fn logout(mut self) -> Result<()> {
        // BYE is expected here; any other failure is moot since the
        // connection is going away.
        match self.run_command(&Command::Logout).await {
            Ok(_) | Err(Error::Bye(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Transitions to another type-state, carrying all connection state.
    pub(crate) fn into_state<T>(self) -> Client<S, T> {
        Client {
            stream: self.stream,
            tag_gen: self.tag_gen,
            caps: self.caps,
            config: self.config,
            quirks: self.quirks,
            handler: self.handler,
            events: self.events,
            mailbox: self.mailbox,
            _state: PhantomData,
        }
    }

    /// Replaces stored capabilities from a CAPABILITY untagged response or
    /// response code in the output.
    pub(crate) fn absorb_capabilities(&mut self, output: &CommandOutput) {
        for resp in &output.untagged {
            if let UntaggedResponse::Capability(caps) = resp {
                self.caps.replace(caps.clone());
                return;
            }
        }
        if let Some(ResponseCode::Capability(caps)) = &output.code {
            self.caps.replace(caps.clone());
        }
    }

    /// Runs one command to completion. See the module docs for the
    /// dispatch semantics.
    pub(crate) async fn run_command(&mut self, command: &Command) -> Result<CommandOutput> {
        let tag = self.tag_gen.next();
        let encoded = command.encode(&tag);
        tracing::debug!(tag, ?command, "sending command");

        let mut collected = self.send_encoded(&encoded, None).await?;
        let output = self.read_until_tagged(&tag, &mut collected).await?;
        Ok(output)
    }

    /// Like [`Self::run_command`] but reports literal transfer progress.
    pub(crate) async fn run_command_with_progress(
        &mut self,
        command: &Command,
        progress: &mut dyn Progress,
    ) -> Result<CommandOutput> {
        let tag = self.tag_gen.next();
        let encoded = command.encode(&tag);
        tracing::debug!(tag, ?command, "sending command with progress");

        let mut collected = self.send_encoded(&encoded, Some(progress)).await?;
        let output = self.read_until_tagged(&tag, &mut collected).await?;
        Ok(output)
    }

    /// Writes the encoded phases. Synchronizing literals flush the line
    /// with `{n}` and wait for a `+` continuation before the bytes go out;
    /// with LITERAL+/LITERAL- the `{n+}` form is streamed straight
    /// through. Untagged responses that arrive while waiting are applied
    /// and collected.
    async fn send_encoded(
        &mut self,
        encoded: &EncodedCommand,
        mut progress: Option<&mut dyn Progress>,
    ) -> Result<Vec<UntaggedResponse>> {
        let total: u64 = encoded
            .parts
            .iter()
            .filter_map(|part| match part {
                CommandPart::Literal(data) => Some(data.len() as u64),
                CommandPart::Line(_) => None,
            })
            .sum();
        let mut transferred = 0u64;
        let mut collected = Vec::new();

        let mut buf: Vec<u8> = Vec::new();
        let parts = &encoded.parts;
        for (i, part) in parts.iter().enumerate() {
            match part {
                CommandPart::Line(line) => {
                    buf.extend_from_slice(line);
                    if i + 1 == parts.len() {
                        buf.extend_from_slice(b"\r\n");
                        self.stream.write_all_flush(&buf).await?;
                        buf.clear();
                    }
                }
                CommandPart::Literal(data) => {
                    let nonsync = self
                        .caps
                        .nonsync_literal_limit()
                        .is_some_and(|limit| data.len() <= limit);
                    if nonsync {
                        buf.extend_from_slice(format!("{{{}+}}\r\n", data.len()).as_bytes());
                        buf.extend_from_slice(data);
                    } else {
                        buf.extend_from_slice(format!("{{{}}}\r\n", data.len()).as_bytes());
                        self.stream.write_all_flush(&buf).await?;
                        buf.clear();
                        self.await_continuation(&mut collected).await?;
                        buf.extend_from_slice(data);
                    }
                    transferred += data.len() as u64;
                    if let Some(sink) = progress.as_mut() {
                        sink.report(transferred, Some(total));
                    }
                }
            }
        }

        Ok(collected)
    }

    /// Reads until the server grants a `+` continuation, applying any
    /// untagged responses that arrive first.
    async fn await_continuation(
        &mut self,
        collected: &mut Vec<UntaggedResponse>,
    ) -> Result<()> {
        loop {
            let raw = self.stream.read_response().await?;
            match ResponseParser::parse(&raw)? {
                Response::Continuation { .. } => return Ok(()),
                Response::Untagged(untagged) => {
                    self.dispatch_untagged(&untagged)?;
                    collected.push(untagged);
                }
                Response::Tagged { status, text, .. } => {
                    // The server refused the literal before continuing.
                    return match status {
                        Status::No => Err(Error::Failed {
                            reason: ResponseCode::failure_reason(None),
                            text,
                        }),
                        Status::Bad => Err(Error::Bad(text)),
                        Status::Bye => Err(Error::Bye(text)),
                        Status::Ok | Status::PreAuth => Err(Error::Protocol(
                            "tagged OK while awaiting continuation".to_string(),
                        )),
                    };
                }
            }
        }
    }

    /// Reads responses until the tagged completion for `tag`, dispatching
    /// each untagged response along the way.
    pub(crate) async fn read_until_tagged(
        &mut self,
        tag: &str,
        collected: &mut Vec<UntaggedResponse>,
    ) -> Result<CommandOutput> {
        loop {
            let raw = self.stream.read_response().await?;
            match ResponseParser::parse(&raw)? {
                Response::Untagged(untagged) => {
                    if let UntaggedResponse::Bye { text, .. } = &untagged {
                        self.handler.on_bye(text);
                        self.events.session(SessionEvent::Disconnected {
                            reason: Some(text.clone()),
                        });
                        return Err(Error::Bye(text.clone()));
                    }
                    self.dispatch_untagged(&untagged)?;
                    collected.push(untagged);
                }
                Response::Continuation { .. } => {
                    // No command we run here expects a continuation at
                    // this point.
                    return Err(Error::Protocol(
                        "unexpected continuation request".to_string(),
                    ));
                }
                Response::Tagged {
                    tag: resp_tag,
                    status,
                    code,
                    text,
                } => {
                    if resp_tag.as_str() != tag {
                        return Err(Error::Protocol(format!(
                            "tagged response for {} while waiting for {tag}",
                            resp_tag.as_str()
                        )));
                    }
                    // Response codes on the completion can carry state
                    // too (e.g. HIGHESTMODSEQ on SELECT).
                    if let Some(code) = &code {
                        self.apply_response_code(code);
                    }
                    return match status {
                        Status::Ok | Status::PreAuth => Ok(CommandOutput {
                            untagged: std::mem::take(collected),
                            code,
                            text,
                        }),
                        Status::No => Err(Error::Failed {
                            reason: ResponseCode::failure_reason(code.as_ref()),
                            text,
                        }),
                        Status::Bad => Err(Error::Bad(text)),
                        Status::Bye => Err(Error::Bye(text)),
                    };
                }
            }
        }
    }

    /// Applies one untagged response to folder/session state and fans it
    /// out to the handler and event channel.
    pub(crate) fn dispatch_untagged(&mut self, untagged: &UntaggedResponse) -> Result<()> {
        // Session-level codes first: ALERT can ride on any status
        // response.
        match untagged {
            UntaggedResponse::Ok {
                code: Some(ResponseCode::Alert),
                text,
            }
            | UntaggedResponse::No {
                code: Some(ResponseCode::Alert),
                text,
            }
            | UntaggedResponse::Bad {
                code: Some(ResponseCode::Alert),
                text,
            } => {
                self.handler.on_alert(text);
                self.events.session(SessionEvent::Alert(text.clone()));
            }
            UntaggedResponse::Metadata { mailbox, entries } if entries.iter().all(|e| e.value.is_none()) => {
                self.events.session(SessionEvent::MetadataChanged {
                    mailbox: mailbox.clone(),
                    entries: entries.iter().map(|e| e.name.clone()).collect(),
                });
            }
            UntaggedResponse::Enabled(caps) => {
                for cap in caps {
                    self.caps.mark_enabled(cap.clone());
                }
            }
            _ => {}
        }

        // FLAGS produces no event but the handler still hears about it.
        if let UntaggedResponse::Flags(flags) = untagged {
            self.handler.on_flags(flags);
        }

        // Folder-state updates go through the selected mailbox.
        if let Some(mailbox) = self.mailbox.as_mut() {
            let events = mailbox.apply(untagged);
            for event in &events {
                self.notify_handler(untagged, event);
            }
            for event in events {
                self.events.mailbox(event);
            }
        }

        Ok(())
    }

    /// Mirrors mailbox mutations onto the synchronous handler in wire
    /// order.
    fn notify_handler(&mut self, untagged: &UntaggedResponse, event: &MailboxEvent) {
        match (untagged, event) {
            (UntaggedResponse::Exists(n), MailboxEvent::CountChanged(_)) => {
                self.handler.on_exists(*n);
            }
            (UntaggedResponse::Recent(n), MailboxEvent::RecentChanged(_)) => {
                self.handler.on_recent(*n);
            }
            (UntaggedResponse::Expunge(_), MailboxEvent::MessageExpunged { seq, .. }) => {
                self.handler.on_expunge(*seq);
            }
            (
                UntaggedResponse::Vanished { .. },
                MailboxEvent::MessagesVanished { uids, earlier },
            ) => {
                self.handler.on_vanished(uids, *earlier);
            }
            (
                UntaggedResponse::Fetch { seq, items },
                MailboxEvent::MessageSummaryFetched { .. },
            ) => {
                self.handler.on_fetch(*seq, items);
            }
            _ => {}
        }
    }

    /// Applies a response code from a tagged completion to mailbox state.
    fn apply_response_code(&mut self, code: &ResponseCode) {
        if let Some(mailbox) = self.mailbox.as_mut() {
            let synthetic = UntaggedResponse::Ok {
                code: Some(code.clone()),
                text: String::new(),
            };
            let events = mailbox.apply(&synthetic);
            for event in events {
                self.events.mailbox(event);
            }
        }
    }
}
