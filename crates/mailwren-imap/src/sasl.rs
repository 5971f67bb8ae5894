//! SASL authentication interface.
//!
//! The engine consumes mechanisms through the [`SaslMechanism`] trait and
//! owns the base64 framing of the AUTHENTICATE exchange: the initial
//! response travels inline when the server advertises SASL-IR, otherwise
//! each challenge arrives via a `+` continuation and the mechanism's reply
//! is sent as a base64 line.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::{Error, Result};

/// A SASL mechanism.
///
/// Implementations produce client responses to server challenges; the
/// engine handles all wire framing.
pub trait SaslMechanism: Send {
    /// The mechanism name as advertised in `AUTH=` capabilities.
    fn name(&self) -> &str;

    /// The initial client response, if the mechanism has one.
    fn initial_response(&self) -> Option<Vec<u8>>;

    /// Produces the response to a server challenge.
    fn respond(&mut self, challenge: &[u8]) -> Result<Vec<u8>>;
}

/// Encodes a mechanism response for the wire. An empty response is `=` per
/// RFC 4959.
#[must_use]
pub fn encode_response(data: &[u8]) -> String {
    if data.is_empty() {
        "=".to_string()
    } else {
        BASE64.encode(data)
    }
}

/// Decodes a base64 challenge from a continuation line.
pub fn decode_challenge(text: &str) -> Result<Vec<u8>> {
    BASE64
        .decode(text.trim())
        .map_err(|e| Error::Protocol(format!("invalid base64 challenge: {e}")))
}

/// The PLAIN mechanism (RFC 4616): `\0user\0password` in one shot.
pub struct Plain {
    authorization_id: String,
    username: String,
    password: String,
}

impl Plain {
    /// Creates a PLAIN mechanism for the given credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            authorization_id: String::new(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Sets a distinct authorization identity.
    #[must_use]
    pub fn with_authorization_id(mut self, id: impl Into<String>) -> Self {
        self.authorization_id = id.into();
        self
    }

    fn message(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(self.authorization_id.as_bytes());
        out.push(0);
        out.extend_from_slice(self.username.as_bytes());
        out.push(0);
        out.extend_from_slice(self.password.as_bytes());
        out
    }
}

impl SaslMechanism for Plain {
    fn name(&self) -> &str {
        "PLAIN"
    }

    fn initial_response(&self) -> Option<Vec<u8>> {
        Some(self.message())
    }

    fn respond(&mut self, _challenge: &[u8]) -> Result<Vec<u8>> {
        // A server that challenges PLAIN gets the same single message.
        Ok(self.message())
    }
}

/// The XOAUTH2 mechanism (Gmail/Outlook OAuth bearer tokens).
pub struct XOAuth2 {
    username: String,
    access_token: String,
    failed: bool,
}

impl XOAuth2 {
    /// Creates an XOAUTH2 mechanism for the given user and token.
    #[must_use]
    pub fn new(username: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            access_token: access_token.into(),
            failed: false,
        }
    }

    fn message(&self) -> Vec<u8> {
        format!(
            "user={}\x01auth=Bearer {}\x01\x01",
            self.username, self.access_token
        )
        .into_bytes()
    }
}

impl SaslMechanism for XOAuth2 {
    fn name(&self) -> &str {
        "XOAUTH2"
    }

    fn initial_response(&self) -> Option<Vec<u8>> {
        Some(self.message())
    }

    fn respond(&mut self, challenge: &[u8]) -> Result<Vec<u8>> {
        // A challenge after the initial response is a JSON error blob; the
        // client acknowledges with an empty line and the server follows
        // with a tagged NO.
        if self.failed {
            return Err(Error::Protocol(
                "server rejected XOAUTH2 response twice".to_string(),
            ));
        }
        self.failed = true;
        tracing::debug!(error = %String::from_utf8_lossy(challenge), "XOAUTH2 challenge");
        Ok(Vec::new())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn plain_message_layout() {
        let mech = Plain::new("joe", "secret");
        let initial = mech.initial_response().unwrap();
        assert_eq!(initial, b"\0joe\0secret");
    }

    #[test]
    fn plain_with_authorization_id() {
        let mech = Plain::new("joe", "secret").with_authorization_id("admin");
        assert_eq!(mech.initial_response().unwrap(), b"admin\0joe\0secret");
    }

    #[test]
    fn encode_empty_is_equals() {
        assert_eq!(encode_response(b""), "=");
        assert_eq!(encode_response(b"\0joe\0secret"), "AGpvZQBzZWNyZXQ=");
    }

    #[test]
    fn decode_round_trip() {
        let decoded = decode_challenge("AGpvZQBzZWNyZXQ=").unwrap();
        assert_eq!(decoded, b"\0joe\0secret");
        assert!(decode_challenge("!!!").is_err());
    }

    #[test]
    fn xoauth2_message_layout() {
        let mech = XOAuth2::new("joe@example.com", "ya29.token");
        let initial = mech.initial_response().unwrap();
        assert_eq!(
            initial,
            b"user=joe@example.com\x01auth=Bearer ya29.token\x01\x01"
        );
    }

    #[test]
    fn xoauth2_error_challenge_gets_empty_ack() {
        let mut mech = XOAuth2::new("joe", "tok");
        let ack = mech.respond(br#"{"status":"401"}"#).unwrap();
        assert!(ack.is_empty());
        assert!(mech.respond(b"again").is_err());
    }
}
