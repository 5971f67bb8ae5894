//! Unsolicited response handler.
//!
//! Servers may push EXISTS, RECENT, EXPUNGE, VANISHED, and FETCH data at
//! almost any time. The reader path applies those to the selected-mailbox
//! state first, then invokes the [`ResponseHandler`] installed on the
//! client. Handlers run synchronously on the reader path and must not
//! block; anything slow belongs on the event channel instead.

use crate::parser::FetchItem;
use crate::types::{Flags, SeqNum, UidSet};

/// Handler for unsolicited server responses.
///
/// All methods default to no-ops so implementations override only what
/// they care about.
pub trait ResponseHandler: Send {
    /// The message count changed (EXISTS).
    fn on_exists(&mut self, count: u32) {
        let _ = count;
    }

    /// A message was expunged. The sequence number is its position before
    /// removal; later messages shift down by one.
    fn on_expunge(&mut self, seq: SeqNum) {
        let _ = seq;
    }

    /// Messages vanished by UID (QRESYNC).
    fn on_vanished(&mut self, uids: &UidSet, earlier: bool) {
        let _ = (uids, earlier);
    }

    /// Message metadata changed (unsolicited FETCH).
    fn on_fetch(&mut self, seq: SeqNum, items: &[FetchItem]) {
        let _ = (seq, items);
    }

    /// The mailbox flag list changed.
    fn on_flags(&mut self, flags: &Flags) {
        let _ = flags;
    }

    /// The recent count changed.
    fn on_recent(&mut self, count: u32) {
        let _ = count;
    }

    /// The server is closing the connection.
    fn on_bye(&mut self, text: &str) {
        let _ = text;
    }

    /// The server issued an ALERT. RFC 3501 requires showing these to the
    /// user.
    fn on_alert(&mut self, text: &str) {
        let _ = text;
    }
}

/// Ignores every unsolicited response.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHandler;

impl ResponseHandler for NoopHandler {}

/// Logs unsolicited responses via `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ResponseHandler for LoggingHandler {
    fn on_exists(&mut self, count: u32) {
        tracing::debug!(count, "EXISTS");
    }

    fn on_expunge(&mut self, seq: SeqNum) {
        tracing::debug!(seq = seq.get(), "EXPUNGE");
    }

    fn on_vanished(&mut self, uids: &UidSet, earlier: bool) {
        tracing::debug!(uids = %uids, earlier, "VANISHED");
    }

    fn on_fetch(&mut self, seq: SeqNum, items: &[FetchItem]) {
        tracing::debug!(seq = seq.get(), ?items, "FETCH");
    }

    fn on_flags(&mut self, flags: &Flags) {
        tracing::debug!(?flags, "FLAGS");
    }

    fn on_recent(&mut self, count: u32) {
        tracing::debug!(count, "RECENT");
    }

    fn on_bye(&mut self, text: &str) {
        tracing::info!(text, "BYE");
    }

    fn on_alert(&mut self, text: &str) {
        tracing::warn!(text, "ALERT");
    }
}

/// Collects unsolicited responses for later inspection. Used in tests and
/// batch synchronization.
#[derive(Debug, Default, Clone)]
pub struct CollectingHandler {
    /// Collected events in arrival order.
    pub events: Vec<UnsolicitedEvent>,
}

impl CollectingHandler {
    /// Creates a new collecting handler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes all collected events, leaving the handler empty.
    pub fn take(&mut self) -> Vec<UnsolicitedEvent> {
        std::mem::take(&mut self.events)
    }
}

impl ResponseHandler for CollectingHandler {
    fn on_exists(&mut self, count: u32) {
        self.events.push(UnsolicitedEvent::Exists(count));
    }

    fn on_expunge(&mut self, seq: SeqNum) {
        self.events.push(UnsolicitedEvent::Expunge(seq));
    }

    fn on_vanished(&mut self, uids: &UidSet, earlier: bool) {
        self.events
            .push(UnsolicitedEvent::Vanished(uids.clone(), earlier));
    }

    fn on_fetch(&mut self, seq: SeqNum, items: &[FetchItem]) {
        self.events
            .push(UnsolicitedEvent::Fetch(seq, items.to_vec()));
    }

    fn on_flags(&mut self, flags: &Flags) {
        self.events.push(UnsolicitedEvent::Flags(flags.clone()));
    }

    fn on_recent(&mut self, count: u32) {
        self.events.push(UnsolicitedEvent::Recent(count));
    }

    fn on_bye(&mut self, text: &str) {
        self.events.push(UnsolicitedEvent::Bye(text.to_string()));
    }

    fn on_alert(&mut self, text: &str) {
        self.events.push(UnsolicitedEvent::Alert(text.to_string()));
    }
}

/// An unsolicited event captured by [`CollectingHandler`].
#[derive(Debug, Clone, PartialEq)]
pub enum UnsolicitedEvent {
    /// EXISTS response.
    Exists(u32),
    /// EXPUNGE response.
    Expunge(SeqNum),
    /// VANISHED response.
    Vanished(UidSet, bool),
    /// FETCH response with items.
    Fetch(SeqNum, Vec<FetchItem>),
    /// FLAGS response.
    Flags(Flags),
    /// RECENT response.
    Recent(u32),
    /// BYE response.
    Bye(String),
    /// ALERT response code.
    Alert(String),
}
