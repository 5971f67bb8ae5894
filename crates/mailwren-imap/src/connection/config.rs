//! Connection configuration.

use std::time::Duration;

use crate::types::SetOrder;

/// Connection security mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Security {
    /// No encryption (port 143). **Not recommended for production.**
    None,
    /// Start with plaintext, upgrade with STARTTLS (port 143).
    StartTls,
    /// TLS from the start (port 993). **Recommended.**
    #[default]
    Implicit,
}

impl Security {
    /// Returns the default port for this security mode.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::None | Self::StartTls => 143,
            Self::Implicit => 993,
        }
    }
}

/// IMAP connection configuration.
///
/// All engine behavior is configured here explicitly; there are no
/// environment variables and no persisted state.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Security mode.
    pub security: Security,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Read/write timeout for individual commands.
    pub io_timeout: Duration,
    /// Interval at which IDLE is refreshed with DONE + re-IDLE. Must stay
    /// below the 29-minute RFC 2177 bound; servers often time out sooner.
    pub idle_renewal: Duration,
    /// Maximum encoded length of a UID/sequence set argument before the
    /// operation is split into multiple commands.
    pub max_set_encoded_len: usize,
    /// Order used when serializing UID sets.
    pub set_order: SetOrder,
    /// Capacity of the event channel.
    pub event_queue: usize,
}

impl Config {
    /// Creates a new configuration with implicit TLS on port 993.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Security::Implicit.default_port(),
            security: Security::Implicit,
            connect_timeout: Duration::from_secs(30),
            io_timeout: Duration::from_secs(60),
            idle_renewal: Duration::from_secs(28 * 60),
            max_set_encoded_len: 8 * 1024,
            set_order: SetOrder::Ascending,
            event_queue: crate::events::DEFAULT_EVENT_QUEUE,
        }
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(host: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder::new(host)
    }
}

/// Builder for connection configuration.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
    port: Option<u16>,
}

impl ConfigBuilder {
    /// Creates a new builder with the given hostname.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            config: Config::new(host),
            port: None,
        }
    }

    /// Sets the port. Defaults to the security mode's standard port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the security mode.
    #[must_use]
    pub const fn security(mut self, security: Security) -> Self {
        self.config.security = security;
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Sets the per-command I/O timeout.
    #[must_use]
    pub const fn io_timeout(mut self, timeout: Duration) -> Self {
        self.config.io_timeout = timeout;
        self
    }

    /// Sets the IDLE renewal interval.
    #[must_use]
    pub const fn idle_renewal(mut self, interval: Duration) -> Self {
        self.config.idle_renewal = interval;
        self
    }

    /// Sets the maximum encoded set length per command.
    #[must_use]
    pub const fn max_set_encoded_len(mut self, len: usize) -> Self {
        self.config.max_set_encoded_len = len;
        self
    }

    /// Sets the UID set serialization order.
    #[must_use]
    pub const fn set_order(mut self, order: SetOrder) -> Self {
        self.config.set_order = order;
        self
    }

    /// Sets the event queue capacity.
    #[must_use]
    pub const fn event_queue(mut self, capacity: usize) -> Self {
        self.config.event_queue = capacity;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(mut self) -> Config {
        self.config.port = self
            .port
            .unwrap_or_else(|| self.config.security.default_port());
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ports() {
        assert_eq!(Security::Implicit.default_port(), 993);
        assert_eq!(Security::StartTls.default_port(), 143);
        assert_eq!(Security::None.default_port(), 143);
    }

    #[test]
    fn builder_defaults_port_from_security() {
        let config = Config::builder("imap.example.com")
            .security(Security::StartTls)
            .build();
        assert_eq!(config.port, 143);

        let config = Config::builder("imap.example.com").build();
        assert_eq!(config.port, 993);
    }

    #[test]
    fn builder_explicit_port_wins() {
        let config = Config::builder("imap.example.com").port(1143).build();
        assert_eq!(config.port, 1143);
    }

    #[test]
    fn idle_renewal_stays_below_rfc_bound() {
        let config = Config::new("imap.example.com");
        assert!(config.idle_renewal < Duration::from_secs(29 * 60));
    }
}
