//! Selected-mailbox state.
//!
//! Tracks the per-mailbox invariants while the server pushes unsolicited
//! updates: the dense sequence↔UID map, message counts, flag caches, and
//! mod-sequences. [`SelectedMailbox::apply`] consumes one untagged
//! response, mutates state, and returns the events the mutation produced;
//! the caller fans those out to the handler and event channel in wire
//! order.

use crate::events::MailboxEvent;
use crate::parser::{FetchItem, UntaggedResponse};
use crate::types::{
    Flags, FolderAccess, Label, Mailbox, ModSeq, ResponseCode, SelectInfo, SeqNum, Uid, UidSet,
    UidValidity,
};

/// Cached per-message state, indexed by sequence number.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageEntry {
    /// The message UID, once learned from a FETCH.
    pub uid: Option<Uid>,
    /// Last seen flags.
    pub flags: Option<Flags>,
    /// Last seen Gmail labels.
    pub labels: Option<Vec<Label>>,
    /// Last seen MODSEQ.
    pub modseq: Option<ModSeq>,
}

/// State of the currently selected mailbox.
#[derive(Debug)]
pub struct SelectedMailbox {
    mailbox: Mailbox,
    access: FolderAccess,
    uid_validity: Option<UidValidity>,
    uid_next: Option<Uid>,
    highest_mod_seq: Option<ModSeq>,
    no_mod_seq: bool,
    recent: u32,
    first_unseen: Option<SeqNum>,
    accepted_flags: Flags,
    permanent_flags: Flags,
    /// Dense sequence↔UID map; index `i` holds sequence number `i + 1`.
    messages: Vec<MessageEntry>,
}

impl SelectedMailbox {
    /// Creates state for a freshly selected mailbox.
    #[must_use]
    pub fn new(mailbox: Mailbox) -> Self {
        Self {
            mailbox,
            access: FolderAccess::ReadWrite,
            uid_validity: None,
            uid_next: None,
            highest_mod_seq: None,
            no_mod_seq: false,
            recent: 0,
            first_unseen: None,
            accepted_flags: Flags::new(),
            permanent_flags: Flags::new(),
            messages: Vec::new(),
        }
    }

    /// The mailbox name.
    #[must_use]
    pub fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    /// Number of messages (EXISTS).
    #[must_use]
    pub fn count(&self) -> u32 {
        u32::try_from(self.messages.len()).unwrap_or(u32::MAX)
    }

    /// Recent count.
    #[must_use]
    pub const fn recent(&self) -> u32 {
        self.recent
    }

    /// UIDVALIDITY, once announced.
    #[must_use]
    pub const fn uid_validity(&self) -> Option<UidValidity> {
        self.uid_validity
    }

    /// UIDNEXT, once announced.
    #[must_use]
    pub const fn uid_next(&self) -> Option<Uid> {
        self.uid_next
    }

    /// HIGHESTMODSEQ; `None` when the mailbox lacks CONDSTORE.
    #[must_use]
    pub const fn highest_mod_seq(&self) -> Option<ModSeq> {
        self.highest_mod_seq
    }

    /// Effective access mode.
    #[must_use]
    pub const fn access(&self) -> FolderAccess {
        self.access
    }

    /// Marks the access mode from the SELECT/EXAMINE completion.
    pub fn set_access(&mut self, access: FolderAccess) {
        self.access = access;
    }

    /// Looks up the UID at a sequence number.
    #[must_use]
    pub fn uid_at(&self, seq: SeqNum) -> Option<Uid> {
        self.messages
            .get(seq.get() as usize - 1)
            .and_then(|entry| entry.uid)
    }

    /// Looks up the sequence number of a UID.
    #[must_use]
    pub fn seq_of(&self, uid: Uid) -> Option<SeqNum> {
        self.messages
            .iter()
            .position(|entry| entry.uid == Some(uid))
            .and_then(|idx| SeqNum::new(u32::try_from(idx).ok()? + 1))
    }

    /// Returns the cached entry at a sequence number.
    #[must_use]
    pub fn entry(&self, seq: SeqNum) -> Option<&MessageEntry> {
        self.messages.get(seq.get() as usize - 1)
    }

    /// All currently known UIDs as a compact set.
    #[must_use]
    pub fn known_uids(&self) -> UidSet {
        self.messages
            .iter()
            .filter_map(|entry| entry.uid)
            .collect()
    }

    /// Snapshot of the SELECT-level fields.
    #[must_use]
    pub fn select_info(&self) -> SelectInfo {
        SelectInfo {
            exists: self.count(),
            recent: self.recent,
            unseen: self.first_unseen,
            uid_next: self.uid_next,
            uid_validity: self.uid_validity,
            flags: self.accepted_flags.clone(),
            permanent_flags: self.permanent_flags.clone(),
            access: self.access,
            highest_mod_seq: self.highest_mod_seq,
            no_mod_seq: self.no_mod_seq,
        }
    }

    /// Applies one untagged response, returning the events it produced in
    /// emission order.
    #[must_use]
    pub fn apply(&mut self, response: &UntaggedResponse) -> Vec<MailboxEvent> {
        match response {
            UntaggedResponse::Exists(n) => self.apply_exists(*n),
            UntaggedResponse::Recent(n) => {
                self.recent = *n;
                vec![MailboxEvent::RecentChanged(*n)]
            }
            UntaggedResponse::Expunge(seq) => self.apply_expunge(*seq),
            UntaggedResponse::Vanished { uids, earlier } => self.apply_vanished(uids, *earlier),
            UntaggedResponse::Fetch { seq, items } => self.apply_fetch(*seq, items),
            UntaggedResponse::Flags(flags) => {
                self.accepted_flags = flags.clone();
                Vec::new()
            }
            UntaggedResponse::Ok {
                code: Some(code), ..
            }
            | UntaggedResponse::No {
                code: Some(code), ..
            }
            | UntaggedResponse::Bad {
                code: Some(code), ..
            } => self.apply_code(code),
            _ => Vec::new(),
        }
    }

    fn apply_exists(&mut self, n: u32) -> Vec<MailboxEvent> {
        let old = self.count();
        // EXISTS never shrinks the mailbox; that only happens via
        // EXPUNGE/VANISHED.
        if n <= old {
            return Vec::new();
        }
        self.messages
            .resize_with(n as usize, MessageEntry::default);
        vec![
            MailboxEvent::CountChanged(n),
            MailboxEvent::MessagesArrived { count: n - old },
        ]
    }

    fn apply_expunge(&mut self, seq: SeqNum) -> Vec<MailboxEvent> {
        let idx = seq.get() as usize - 1;
        if idx >= self.messages.len() {
            tracing::warn!(seq = seq.get(), count = self.count(), "EXPUNGE out of range");
            return Vec::new();
        }
        let removed = self.messages.remove(idx);
        let mut events = vec![MailboxEvent::MessageExpunged {
            seq,
            uid: removed.uid,
        }];
        events.push(MailboxEvent::CountChanged(self.count()));
        events
    }

    fn apply_vanished(&mut self, uids: &UidSet, earlier: bool) -> Vec<MailboxEvent> {
        let before = self.messages.len();
        self.messages
            .retain(|entry| entry.uid.is_none_or(|uid| !uids.contains(uid)));
        let removed = before - self.messages.len();

        let mut events = vec![MailboxEvent::MessagesVanished {
            uids: uids.clone(),
            earlier,
        }];
        // VANISHED (EARLIER) reports expunges from before this session;
        // they are not part of the current EXISTS count.
        if !earlier && removed > 0 {
            events.push(MailboxEvent::CountChanged(self.count()));
        }
        events
    }

    fn apply_fetch(&mut self, seq: SeqNum, items: &[FetchItem]) -> Vec<MailboxEvent> {
        let mut events = Vec::new();
        let idx = seq.get() as usize - 1;

        // A FETCH can race ahead of its EXISTS; grow the map and treat the
        // gap as arrivals.
        if idx >= self.messages.len() {
            let old = self.count();
            self.messages.resize_with(idx + 1, MessageEntry::default);
            events.push(MailboxEvent::CountChanged(self.count()));
            events.push(MailboxEvent::MessagesArrived {
                count: seq.get() - old,
            });
        }

        let entry = &mut self.messages[idx];
        let mut uid = entry.uid;
        let mut flag_change: Option<Flags> = None;
        let mut label_change: Option<Vec<Label>> = None;
        let mut modseq_change: Option<ModSeq> = None;

        for item in items {
            match item {
                FetchItem::Uid(new_uid) => {
                    entry.uid = Some(*new_uid);
                    uid = Some(*new_uid);
                }
                FetchItem::Flags(flags) => {
                    if entry.flags.as_ref() != Some(flags) {
                        flag_change = Some(flags.clone());
                    }
                    entry.flags = Some(flags.clone());
                }
                FetchItem::GmailLabels(labels) => {
                    if entry.labels.as_ref() != Some(labels) {
                        label_change = Some(labels.clone());
                    }
                    entry.labels = Some(labels.clone());
                }
                FetchItem::ModSeq(modseq) => {
                    if entry.modseq != Some(*modseq) {
                        modseq_change = Some(*modseq);
                    }
                    entry.modseq = Some(*modseq);
                    if self.highest_mod_seq.is_none_or(|h| *modseq > h) {
                        self.highest_mod_seq = Some(*modseq);
                    }
                }
                _ => {}
            }
        }

        if let Some(flags) = flag_change {
            events.push(MailboxEvent::MessageFlagsChanged { seq, uid, flags });
        }
        if let Some(labels) = label_change {
            events.push(MailboxEvent::MessageLabelsChanged { seq, uid, labels });
        }
        if let Some(modseq) = modseq_change {
            events.push(MailboxEvent::ModSeqChanged { seq, uid, modseq });
        }
        events.push(MailboxEvent::MessageSummaryFetched {
            seq,
            items: items.to_vec(),
        });

        events
    }

    fn apply_code(&mut self, code: &ResponseCode) -> Vec<MailboxEvent> {
        match code {
            ResponseCode::UidValidity(validity) => {
                let changed = self
                    .uid_validity
                    .is_some_and(|current| current != *validity);
                self.uid_validity = Some(*validity);
                if changed {
                    // The UID epoch moved: every cached UID is invalid.
                    tracing::info!(validity = validity.get(), "UIDVALIDITY changed");
                    for entry in &mut self.messages {
                        *entry = MessageEntry::default();
                    }
                    vec![MailboxEvent::UidValidityChanged(*validity)]
                } else {
                    Vec::new()
                }
            }
            ResponseCode::UidNext(uid) => {
                self.uid_next = Some(*uid);
                Vec::new()
            }
            ResponseCode::HighestModSeq(modseq) => {
                let changed = self.highest_mod_seq != Some(*modseq);
                self.highest_mod_seq = Some(*modseq);
                self.no_mod_seq = false;
                if changed {
                    vec![MailboxEvent::HighestModSeqChanged(*modseq)]
                } else {
                    Vec::new()
                }
            }
            ResponseCode::NoModSeq => {
                self.no_mod_seq = true;
                self.highest_mod_seq = None;
                Vec::new()
            }
            ResponseCode::PermanentFlags(flags) => {
                self.permanent_flags = flags.clone();
                Vec::new()
            }
            ResponseCode::Unseen(seq) => {
                self.first_unseen = Some(*seq);
                Vec::new()
            }
            ResponseCode::ReadOnly => {
                self.access = FolderAccess::ReadOnly;
                Vec::new()
            }
            ResponseCode::ReadWrite => {
                self.access = FolderAccess::ReadWrite;
                Vec::new()
            }
            _ => Vec::new(),
        }
    }
}
