//! QRESYNC and CONDSTORE support (RFC 7162).
//!
//! CONDSTORE attaches a modification sequence (`MODSEQ`) to every message;
//! QRESYNC builds on it so a client can reopen a mailbox by diffing against
//! a previously saved `(UIDVALIDITY, HIGHESTMODSEQ, known UIDs)` triple
//! instead of re-fetching all flags. The engine keeps no persistent state
//! itself; callers capture a [`SyncState`] when closing and hand it back as
//! [`QresyncParams`] on reopen.

use crate::types::{Flags, ModSeq, SeqNum, SetOrder, Uid, UidSet, UidValidity};

/// State a caller saves to enable fast resynchronization.
#[derive(Debug, Clone)]
pub struct SyncState {
    /// The UIDVALIDITY value when state was captured. If it changes, all
    /// cached data must be discarded.
    pub uidvalidity: UidValidity,

    /// The HIGHESTMODSEQ when state was captured.
    pub highestmodseq: ModSeq,

    /// Known UIDs at capture time. Optional but recommended: it lets the
    /// server report expunges as VANISHED (EARLIER).
    pub known_uids: Option<UidSet>,
}

impl SyncState {
    /// Creates a new sync state.
    #[must_use]
    pub const fn new(uidvalidity: UidValidity, highestmodseq: ModSeq) -> Self {
        Self {
            uidvalidity,
            highestmodseq,
            known_uids: None,
        }
    }

    /// Sets the known UIDs.
    #[must_use]
    pub fn with_known_uids(mut self, uids: UidSet) -> Self {
        self.known_uids = Some(uids);
        self
    }

    /// Creates QRESYNC parameters from this state.
    #[must_use]
    pub fn to_params(&self) -> QresyncParams {
        QresyncParams {
            uidvalidity: self.uidvalidity,
            modseq: self.highestmodseq,
            known_uids: self.known_uids.clone(),
            seq_match: None,
        }
    }
}

/// Parameters for a QRESYNC SELECT/EXAMINE.
#[derive(Debug, Clone, PartialEq)]
pub struct QresyncParams {
    /// The last known UIDVALIDITY.
    pub uidvalidity: UidValidity,

    /// The last known HIGHESTMODSEQ.
    pub modseq: ModSeq,

    /// Optional set of known UIDs.
    pub known_uids: Option<UidSet>,

    /// Optional sequence-to-UID sample, letting the server detect bulk
    /// renumbering cheaply.
    pub seq_match: Option<SeqUidMatch>,
}

impl QresyncParams {
    /// Creates minimal QRESYNC parameters.
    #[must_use]
    pub const fn new(uidvalidity: UidValidity, modseq: ModSeq) -> Self {
        Self {
            uidvalidity,
            modseq,
            known_uids: None,
            seq_match: None,
        }
    }

    /// Adds known UIDs.
    #[must_use]
    pub fn with_known_uids(mut self, uids: UidSet) -> Self {
        self.known_uids = Some(uids);
        self
    }

    /// Adds a sequence-UID sample.
    #[must_use]
    pub fn with_seq_match(mut self, seq_match: SeqUidMatch) -> Self {
        self.seq_match = Some(seq_match);
        self
    }

    /// Serializes the parameter list for SELECT/EXAMINE:
    /// `(QRESYNC (uidvalidity modseq [known-uids] [(seqs uids)]))`.
    #[must_use]
    pub fn serialize(&self) -> String {
        let mut parts = vec![
            self.uidvalidity.get().to_string(),
            self.modseq.get().to_string(),
        ];

        if let Some(ref uids) = self.known_uids {
            parts.push(uids.to_sequence_string(SetOrder::Ascending));
        }

        if let Some(ref seq_match) = self.seq_match {
            parts.push(format!("({})", seq_match.serialize()));
        }

        format!("(QRESYNC ({}))", parts.join(" "))
    }
}

/// Paired sequence-number and UID samples for QRESYNC.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeqUidMatch {
    /// Sampled sequence numbers.
    pub seqs: Vec<SeqNum>,
    /// Corresponding UIDs, element-wise.
    pub uids: Vec<Uid>,
}

impl SeqUidMatch {
    /// Creates an empty sample.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            seqs: Vec::new(),
            uids: Vec::new(),
        }
    }

    /// Adds one sequence/UID pair.
    pub fn push(&mut self, seq: SeqNum, uid: Uid) {
        self.seqs.push(seq);
        self.uids.push(uid);
    }

    /// Serializes as `seq,seq,... uid,uid,...`.
    #[must_use]
    pub fn serialize(&self) -> String {
        let seqs: Vec<String> = self.seqs.iter().map(ToString::to_string).collect();
        let uids: Vec<String> = self.uids.iter().map(ToString::to_string).collect();
        format!("{} {}", seqs.join(","), uids.join(","))
    }
}

/// Changes reported by the server during a QRESYNC reopen.
#[derive(Debug, Clone, Default)]
pub struct SyncChanges {
    /// UIDs expunged since the saved state (VANISHED EARLIER).
    pub vanished: UidSet,

    /// Messages whose metadata changed since the saved state.
    pub changed: Vec<ChangedMessage>,

    /// The new HIGHESTMODSEQ.
    pub highestmodseq: Option<ModSeq>,
}

impl SyncChanges {
    /// Returns true if anything changed.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.vanished.is_empty() || !self.changed.is_empty()
    }
}

/// One changed message from a QRESYNC resync FETCH.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedMessage {
    /// The message UID.
    pub uid: Uid,
    /// Its new MODSEQ.
    pub modseq: ModSeq,
    /// Its current flags, when included in the response.
    pub flags: Option<Flags>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn validity() -> UidValidity {
        UidValidity::new(3_857_529_045).unwrap()
    }

    fn modseq() -> ModSeq {
        ModSeq::from_u64(715_194_045_007).unwrap()
    }

    #[test]
    fn minimal_params_serialize() {
        let params = QresyncParams::new(validity(), modseq());
        assert_eq!(
            params.serialize(),
            "(QRESYNC (3857529045 715194045007))"
        );
    }

    #[test]
    fn params_with_known_uids() {
        let params =
            QresyncParams::new(validity(), modseq()).with_known_uids(UidSet::parse("1:100").unwrap());
        assert_eq!(
            params.serialize(),
            "(QRESYNC (3857529045 715194045007 1:100))"
        );
    }

    #[test]
    fn params_with_seq_match() {
        let mut sample = SeqUidMatch::new();
        sample.push(SeqNum::new(1).unwrap(), Uid::new(10).unwrap());
        sample.push(SeqNum::new(50).unwrap(), Uid::new(600).unwrap());
        let params = QresyncParams::new(validity(), modseq()).with_seq_match(sample);
        assert_eq!(
            params.serialize(),
            "(QRESYNC (3857529045 715194045007 (1,50 10,600)))"
        );
    }

    #[test]
    fn sync_state_round_trip() {
        let state = SyncState::new(validity(), modseq())
            .with_known_uids(UidSet::parse("1,3:7").unwrap());
        let params = state.to_params();
        assert_eq!(params.uidvalidity, validity());
        assert_eq!(params.known_uids.unwrap().to_string(), "1,3:7");
    }

    #[test]
    fn sync_changes_detection() {
        let mut changes = SyncChanges::default();
        assert!(!changes.has_changes());
        changes.vanished.insert(Uid::new(41).unwrap());
        assert!(changes.has_changes());
    }
}
