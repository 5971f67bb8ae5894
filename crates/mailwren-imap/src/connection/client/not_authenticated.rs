//! Implementation for the not-authenticated state.

use tokio::io::{AsyncRead, AsyncWrite};

use super::states::Authenticated;
use super::{Client, NotAuthenticated};
use crate::command::Command;
use crate::connection::framed::FramedStream;
use crate::connection::stream::ImapStream;
use crate::events::SessionEvent;
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::sasl::{SaslMechanism, decode_challenge, encode_response};
use crate::types::{FailureReason, Status};
use crate::{Error, Result};

impl<S> Client<S, NotAuthenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Authenticates with LOGIN.
    ///
    /// Fails without I/O when the server advertises LOGINDISABLED, which
    /// it must until the connection is secured.
    pub async fn login(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<S, Authenticated>> {
        if self.caps.login_disabled() {
            return Err(Error::NotSupported(
                "LOGIN is disabled; negotiate STARTTLS or use AUTHENTICATE".to_string(),
            ));
        }

        let output = self
            .run_command(&Command::Login {
                username: username.to_string(),
                password: password.to_string(),
            })
            .await
            .map_err(auth_failure)?;

        self.finish_authentication(output).await
    }

    /// Authenticates with a SASL mechanism.
    ///
    /// With SASL-IR the initial response travels on the AUTHENTICATE line;
    /// otherwise the exchange runs over `+` continuations, base64 both
    /// ways. A mechanism error aborts the exchange with `*`.
    pub async fn authenticate(
        mut self,
        mechanism: &mut dyn SaslMechanism,
    ) -> Result<Client<S, Authenticated>> {
        let name = mechanism.name().to_uppercase();
        let advertised = self
            .caps
            .auth_mechanisms()
            .any(|m| m.eq_ignore_ascii_case(&name));
        if !advertised {
            return Err(Error::NotSupported(format!("AUTH={name}")));
        }

        let initial_response = if self.caps.supports_sasl_ir() {
            mechanism
                .initial_response()
                .map(|data| encode_response(&data))
        } else {
            None
        };

        let tag = self.tag_gen.next();
        let command = Command::Authenticate {
            mechanism: name,
            initial_response,
        };
        let encoded = command.encode(&tag);
        self.stream
            .write_all_flush(&encoded.to_wire_nonsync())
            .await?;

        let mut collected = Vec::new();
        let output = loop {
            let raw = self.stream.read_response().await?;
            match ResponseParser::parse(&raw)? {
                Response::Continuation { text } => {
                    let challenge = match text {
                        Some(text) => decode_challenge(&text)?,
                        None => Vec::new(),
                    };
                    match mechanism.respond(&challenge) {
                        Ok(response) => {
                            let line = format!("{}\r\n", encode_response(&response));
                            self.stream.write_all_flush(line.as_bytes()).await?;
                        }
                        Err(e) => {
                            // Abort the exchange, then surface the
                            // mechanism error over the tagged NO.
                            self.stream.write_all_flush(b"*\r\n").await?;
                            let _ = self.read_until_tagged(&tag, &mut collected).await;
                            return Err(e);
                        }
                    }
                }
                Response::Untagged(untagged) => {
                    if let UntaggedResponse::Bye { text, .. } = &untagged {
                        return Err(Error::Bye(text.clone()));
                    }
                    self.dispatch_untagged(&untagged)?;
                    collected.push(untagged);
                }
                Response::Tagged {
                    tag: resp_tag,
                    status,
                    code,
                    text,
                } => {
                    if resp_tag.as_str() != tag {
                        return Err(Error::Protocol(format!(
                            "tagged response for {} during AUTHENTICATE",
                            resp_tag.as_str()
                        )));
                    }
                    match status {
                        Status::Ok => {
                            break super::CommandOutput {
                                untagged: collected,
                                code,
                                text,
                            };
                        }
                        Status::No => {
                            return Err(Error::Failed {
                                reason: FailureReason::AuthenticationFailed,
                                text,
                            });
                        }
                        Status::Bad => return Err(Error::Bad(text)),
                        Status::Bye | Status::PreAuth => {
                            return Err(Error::Protocol(format!(
                                "unexpected {status:?} completing AUTHENTICATE"
                            )));
                        }
                    }
                }
            }
        };

        self.finish_authentication(output).await
    }

    /// Common post-authentication steps: pick up the new capability set
    /// and emit the session event.
    async fn finish_authentication(
        mut self,
        output: super::CommandOutput,
    ) -> Result<Client<S, Authenticated>> {
        self.caps.reset();
        self.absorb_capabilities(&output);
        if self.caps.as_slice().is_empty() {
            let _ = self.capability().await?;
        }
        self.events.session(SessionEvent::Authenticated);
        tracing::info!("authenticated");
        Ok(self.into_state())
    }
}

impl Client<ImapStream, NotAuthenticated> {
    /// Negotiates STARTTLS and upgrades the transport in place.
    ///
    /// Capabilities are discarded and re-fetched over the secured stream,
    /// as required by RFC 3501: pre-TLS capabilities are untrusted.
    pub async fn start_tls(mut self) -> Result<Self> {
        if self.stream.get_ref().is_tls() {
            return Err(Error::Protocol("connection is already TLS".to_string()));
        }
        if !self.caps.as_slice().is_empty() && !self.caps.supports_starttls() {
            return Err(Error::NotSupported("STARTTLS".to_string()));
        }

        let output = self.run_command(&Command::StartTls).await?;
        drop(output);

        let host = self.config.host.clone();
        let stream = self.stream.into_inner();
        let upgraded = stream.upgrade_to_tls(&host).await?;
        self.stream = FramedStream::new(upgraded);

        self.caps.reset();
        let _ = self.capability().await?;
        tracing::info!("STARTTLS negotiated");
        Ok(self)
    }
}

/// Maps a LOGIN failure to an authentication failure unless the server
/// gave a more specific reason.
fn auth_failure(err: Error) -> Error {
    match err {
        Error::Failed {
            reason: FailureReason::Unspecified,
            text,
        } => Error::Failed {
            reason: FailureReason::AuthenticationFailed,
            text,
        },
        other => other,
    }
}

impl<S> Client<S, NotAuthenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Returns true if the advertised capability set allows plaintext
    /// LOGIN.
    #[must_use]
    pub fn can_login(&self) -> bool {
        !self.caps.login_disabled()
    }
}
