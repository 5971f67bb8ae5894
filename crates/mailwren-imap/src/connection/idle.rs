//! IMAP IDLE support (RFC 2177).
//!
//! IDLE turns the connection into a push channel: after the server grants
//! the continuation, it streams untagged updates until the client sends
//! `DONE`. The handle below dispatches every update through the normal
//! state/event path and renews the IDLE (DONE + re-IDLE) before the
//! server's patience runs out, staying inside the 29-minute RFC bound
//! and any tighter quirk-derived limit.

#![allow(clippy::missing_errors_doc)]

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::Instant;

use super::client::{Client, Selected};
use crate::command::Command;
use crate::events::SessionEvent;
use crate::parser::{FetchItem, Response, ResponseParser, UntaggedResponse};
use crate::types::{SeqNum, Status, UidSet};
use crate::{Error, Result};

/// Event surfaced from an IDLE wait.
#[derive(Debug, Clone, PartialEq)]
pub enum IdleEvent {
    /// New message count (EXISTS).
    Exists(u32),
    /// Recent count changed.
    Recent(u32),
    /// A message was expunged.
    Expunge(SeqNum),
    /// Messages vanished by UID (QRESYNC).
    Vanished(UidSet),
    /// Message metadata changed.
    Fetch {
        /// Sequence number.
        seq: SeqNum,
        /// The fetch items.
        items: Vec<FetchItem>,
    },
    /// The wait elapsed without a reportable update.
    Timeout,
}

/// Handle for an active IDLE session.
///
/// Created by [`Client::idle`]; call [`IdleHandle::wait`] to receive
/// events and [`IdleHandle::done`] to leave IDLE mode. Dropping the
/// handle without `done()` leaves the protocol inside IDLE, which only a
/// disconnect can recover; always call `done()`.
pub struct IdleHandle<'a, S> {
    client: &'a mut Client<S, Selected>,
    tag: String,
    entered_at: Instant,
}

impl<S> Client<S, Selected>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Enters IDLE mode.
    pub async fn idle(&mut self) -> Result<IdleHandle<'_, S>> {
        if !self.caps.supports_idle() {
            return Err(Error::NotSupported("IDLE".to_string()));
        }

        let tag = enter_idle(self).await?;
        Ok(IdleHandle {
            client: self,
            tag,
            entered_at: Instant::now(),
        })
    }
}

/// Sends IDLE and consumes responses up to the continuation grant.
async fn enter_idle<S>(client: &mut Client<S, Selected>) -> Result<String>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let tag = client.tag_gen.next();
    let encoded = Command::Idle.encode(&tag);
    client
        .stream
        .write_all_flush(&encoded.to_wire_nonsync())
        .await?;

    loop {
        let raw = client.stream.read_response().await?;
        match ResponseParser::parse(&raw)? {
            Response::Continuation { .. } => return Ok(tag),
            Response::Untagged(untagged) => {
                if let UntaggedResponse::Bye { text, .. } = &untagged {
                    return Err(Error::Bye(text.clone()));
                }
                client.dispatch_untagged(&untagged)?;
            }
            Response::Tagged { status, text, .. } => {
                return match status {
                    Status::No => Err(Error::Failed {
                        reason: crate::types::FailureReason::Unspecified,
                        text,
                    }),
                    Status::Bad => Err(Error::Bad(text)),
                    Status::Bye => Err(Error::Bye(text)),
                    Status::Ok | Status::PreAuth => {
                        Err(Error::Protocol("IDLE completed without continuation".to_string()))
                    }
                };
            }
        }
    }
}

impl<S> IdleHandle<'_, S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Waits up to `duration` for a server event.
    ///
    /// Updates are applied to mailbox state and delivered on the handler
    /// and event channel exactly as outside IDLE; the returned
    /// [`IdleEvent`] is a convenience summary. The IDLE is transparently
    /// renewed when the renewal interval elapses mid-wait.
    pub async fn wait(&mut self, duration: Duration) -> Result<IdleEvent> {
        let renewal = self
            .client
            .quirks()
            .idle_renewal()
            .min(self.client.config().idle_renewal);
        let deadline = Instant::now() + duration;

        loop {
            let now = Instant::now();
            if now >= deadline {
                return Ok(IdleEvent::Timeout);
            }

            let renew_at = self.entered_at + renewal;
            if now >= renew_at {
                self.renew().await?;
                continue;
            }

            let wait_until = deadline.min(renew_at);
            let raw = match tokio::time::timeout_at(wait_until, self.client.stream.read_response())
                .await
            {
                Ok(result) => result?,
                Err(_) => continue,
            };

            match ResponseParser::parse(&raw)? {
                Response::Untagged(untagged) => {
                    if let UntaggedResponse::Bye { text, .. } = &untagged {
                        self.client
                            .events
                            .session(SessionEvent::Disconnected {
                                reason: Some(text.clone()),
                            });
                        return Err(Error::Bye(text.clone()));
                    }
                    self.client.dispatch_untagged(&untagged)?;
                    if let Some(event) = summarize(untagged) {
                        return Ok(event);
                    }
                }
                Response::Continuation { .. } => {
                    return Err(Error::Protocol(
                        "unexpected continuation during IDLE".to_string(),
                    ));
                }
                Response::Tagged {
                    tag: resp_tag,
                    status,
                    text,
                    ..
                } => {
                    if resp_tag.as_str() != self.tag {
                        return Err(Error::Protocol(format!(
                            "tagged response for {} during IDLE",
                            resp_tag.as_str()
                        )));
                    }
                    match status {
                        // The server ended the IDLE on its own; re-enter
                        // and keep waiting.
                        Status::Ok => {
                            self.tag = enter_idle(self.client).await?;
                            self.entered_at = Instant::now();
                        }
                        Status::No => {
                            return Err(Error::Failed {
                                reason: crate::types::FailureReason::Unspecified,
                                text,
                            });
                        }
                        Status::Bad => return Err(Error::Bad(text)),
                        Status::Bye | Status::PreAuth => {
                            return Err(Error::Protocol(format!(
                                "unexpected {status:?} ending IDLE"
                            )));
                        }
                    }
                }
            }
        }
    }

    /// Ends the current IDLE and immediately starts a fresh one.
    async fn renew(&mut self) -> Result<()> {
        tracing::debug!("renewing IDLE");
        self.finish_current().await?;
        self.tag = enter_idle(self.client).await?;
        self.entered_at = Instant::now();
        Ok(())
    }

    /// Exits IDLE mode with DONE, consuming the handle.
    pub async fn done(mut self) -> Result<()> {
        self.finish_current().await
    }

    /// Sends DONE and drains responses up to the tagged completion.
    async fn finish_current(&mut self) -> Result<()> {
        let encoded = Command::Done.encode("");
        self.client
            .stream
            .write_all_flush(&encoded.to_wire_nonsync())
            .await?;

        loop {
            let raw = self.client.stream.read_response().await?;
            match ResponseParser::parse(&raw)? {
                Response::Untagged(untagged) => {
                    if let UntaggedResponse::Bye { text, .. } = &untagged {
                        return Err(Error::Bye(text.clone()));
                    }
                    self.client.dispatch_untagged(&untagged)?;
                }
                Response::Continuation { .. } => {
                    return Err(Error::Protocol(
                        "continuation after DONE".to_string(),
                    ));
                }
                Response::Tagged {
                    tag: resp_tag,
                    status,
                    text,
                    ..
                } => {
                    if resp_tag.as_str() != self.tag {
                        return Err(Error::Protocol(format!(
                            "tagged response for {} after DONE",
                            resp_tag.as_str()
                        )));
                    }
                    return match status {
                        Status::Ok => Ok(()),
                        Status::No => Err(Error::Failed {
                            reason: crate::types::FailureReason::Unspecified,
                            text,
                        }),
                        Status::Bad => Err(Error::Bad(text)),
                        Status::Bye => Err(Error::Bye(text)),
                        Status::PreAuth => {
                            Err(Error::Protocol("unexpected PREAUTH after DONE".to_string()))
                        }
                    };
                }
            }
        }
    }
}

/// Maps an untagged response to the IDLE summary event, when it has one.
fn summarize(untagged: UntaggedResponse) -> Option<IdleEvent> {
    match untagged {
        UntaggedResponse::Exists(n) => Some(IdleEvent::Exists(n)),
        UntaggedResponse::Recent(n) => Some(IdleEvent::Recent(n)),
        UntaggedResponse::Expunge(seq) => Some(IdleEvent::Expunge(seq)),
        UntaggedResponse::Vanished { uids, .. } => Some(IdleEvent::Vanished(uids)),
        UntaggedResponse::Fetch { seq, items } => Some(IdleEvent::Fetch { seq, items }),
        _ => None,
    }
}
