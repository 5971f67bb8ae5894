//! Typed event surface.
//!
//! State changes observed by the reader path are fanned out two ways: the
//! synchronous [`crate::handler::ResponseHandler`] trait, and the bounded
//! channel in this module for callers that want to consume events from
//! their own task. The queue is bounded so a slow consumer cannot stall
//! the reader; overflowing events are dropped with a warning rather than
//! blocking protocol progress.

use tokio::sync::mpsc;

use crate::parser::FetchItem;
use crate::types::{Flags, Label, Mailbox, ModSeq, SeqNum, Uid, UidSet, UidValidity};

/// Default capacity of an event channel.
pub const DEFAULT_EVENT_QUEUE: usize = 256;

/// Events scoped to the selected mailbox.
#[derive(Debug, Clone, PartialEq)]
pub enum MailboxEvent {
    /// The mailbox was opened (SELECT/EXAMINE completed).
    Opened(Mailbox),
    /// The mailbox was closed.
    Closed(Mailbox),
    /// The mailbox was deleted on the server.
    Deleted(Mailbox),
    /// The mailbox was renamed.
    Renamed {
        /// Old full name.
        from: Mailbox,
        /// New full name.
        to: Mailbox,
    },
    /// The mailbox was subscribed.
    Subscribed(Mailbox),
    /// The mailbox was unsubscribed.
    Unsubscribed(Mailbox),
    /// A message was expunged.
    MessageExpunged {
        /// Sequence number before removal.
        seq: SeqNum,
        /// The UID, when the sequence map knew it.
        uid: Option<Uid>,
    },
    /// Messages were removed by UID (QRESYNC VANISHED).
    MessagesVanished {
        /// The vanished UIDs.
        uids: UidSet,
        /// True when tagged `(EARLIER)` during a resync.
        earlier: bool,
    },
    /// New messages arrived (EXISTS grew).
    MessagesArrived {
        /// How many new messages.
        count: u32,
    },
    /// A message's flags changed.
    MessageFlagsChanged {
        /// Sequence number.
        seq: SeqNum,
        /// UID when known.
        uid: Option<Uid>,
        /// The new flags.
        flags: Flags,
    },
    /// A message's Gmail labels changed.
    MessageLabelsChanged {
        /// Sequence number.
        seq: SeqNum,
        /// UID when known.
        uid: Option<Uid>,
        /// The new labels.
        labels: Vec<Label>,
    },
    /// A message's MODSEQ advanced.
    ModSeqChanged {
        /// Sequence number.
        seq: SeqNum,
        /// UID when known.
        uid: Option<Uid>,
        /// The new MODSEQ.
        modseq: ModSeq,
    },
    /// A complete per-message FETCH record was applied.
    MessageSummaryFetched {
        /// Sequence number.
        seq: SeqNum,
        /// The items from the record.
        items: Vec<FetchItem>,
    },
    /// The mailbox HIGHESTMODSEQ advanced.
    HighestModSeqChanged(ModSeq),
    /// UIDVALIDITY changed; all cached UIDs are invalid.
    UidValidityChanged(UidValidity),
    /// The message count changed.
    CountChanged(u32),
    /// The recent count changed.
    RecentChanged(u32),
}

/// Events scoped to the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The server issued an ALERT that must be shown to the user.
    Alert(String),
    /// The connection was lost or closed by the server.
    Disconnected {
        /// Server text from BYE, if any.
        reason: Option<String>,
    },
    /// Authentication completed.
    Authenticated,
    /// Server metadata changed (RFC 5464 unsolicited METADATA).
    MetadataChanged {
        /// The mailbox the entries belong to.
        mailbox: Mailbox,
        /// Names of the changed entries.
        entries: Vec<String>,
    },
}

/// Any event the engine can emit.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Event on the selected mailbox.
    Mailbox(MailboxEvent),
    /// Connection-level event.
    Session(SessionEvent),
}

/// Sending half of the event channel, held by the client.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::Sender<Event>,
}

impl EventSink {
    /// Creates a channel pair with the given capacity.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Emits an event without blocking the reader path. Events are dropped
    /// when the consumer falls more than a queue length behind.
    pub fn emit(&self, event: Event) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                tracing::warn!(?event, "event queue full, dropping");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }

    /// Emits a mailbox event.
    pub fn mailbox(&self, event: MailboxEvent) {
        self.emit(Event::Mailbox(event));
    }

    /// Emits a session event.
    pub fn session(&self, event: SessionEvent) {
        self.emit(Event::Session(event));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_flow_through_channel() {
        let (sink, mut rx) = EventSink::channel(8);
        sink.mailbox(MailboxEvent::CountChanged(173));
        sink.session(SessionEvent::Authenticated);

        assert_eq!(
            rx.recv().await.unwrap(),
            Event::Mailbox(MailboxEvent::CountChanged(173))
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            Event::Session(SessionEvent::Authenticated)
        );
    }

    #[tokio::test]
    async fn full_queue_drops_instead_of_blocking() {
        let (sink, mut rx) = EventSink::channel(1);
        sink.mailbox(MailboxEvent::CountChanged(1));
        // Queue is full; this one is dropped.
        sink.mailbox(MailboxEvent::CountChanged(2));

        assert_eq!(
            rx.recv().await.unwrap(),
            Event::Mailbox(MailboxEvent::CountChanged(1))
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn closed_receiver_is_ignored() {
        let (sink, rx) = EventSink::channel(1);
        drop(rx);
        // Must not panic.
        sink.mailbox(MailboxEvent::RecentChanged(1));
    }
}
