//! Compact UID sets and message sequence sets.
//!
//! IMAP encodes sets of message numbers as comma-separated ranges
//! (`1,3:7,12:*`). [`UidSet`] stores a set of UIDs within a single
//! UIDVALIDITY epoch as sorted, non-overlapping inclusive runs, which keeps
//! membership O(log n) and keeps the wire encoding canonical. [`SequenceSet`]
//! is the looser input form used when building commands, where `*` and
//! open-ended ranges are meaningful.

use crate::{Error, Result};

use super::{SeqNum, Uid};

/// Order used when serializing a [`UidSet`] to the wire.
///
/// Some servers process large sets faster when given the newest UIDs first;
/// the run representation is identical either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SetOrder {
    /// Lowest UID first (`1:3,9`).
    #[default]
    Ascending,
    /// Highest UID first (`9,3:1`).
    Descending,
}

/// A sorted set of UIDs stored as non-overlapping inclusive ranges.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UidSet {
    /// Sorted, coalesced inclusive runs.
    runs: Vec<(u32, u32)>,
}

impl UidSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self { runs: Vec::new() }
    }

    /// Creates a set holding a single UID.
    #[must_use]
    pub fn single(uid: Uid) -> Self {
        let mut set = Self::new();
        set.insert(uid);
        set
    }

    /// Creates a set from an inclusive range of UIDs.
    #[must_use]
    pub fn range(start: Uid, end: Uid) -> Self {
        let (lo, hi) = if start <= end {
            (start.get(), end.get())
        } else {
            (end.get(), start.get())
        };
        Self {
            runs: vec![(lo, hi)],
        }
    }

    /// Builds a set from arbitrary UIDs, sorting and coalescing runs.
    #[must_use]
    pub fn from_uids<I: IntoIterator<Item = Uid>>(uids: I) -> Self {
        let mut set = Self::new();
        for uid in uids {
            set.insert(uid);
        }
        set
    }

    /// Returns true if the set holds no UIDs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Returns the number of UIDs in the set.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.runs
            .iter()
            .map(|&(lo, hi)| u64::from(hi) - u64::from(lo) + 1)
            .sum()
    }

    /// Returns the smallest UID in the set.
    #[must_use]
    pub fn min(&self) -> Option<Uid> {
        self.runs.first().and_then(|&(lo, _)| Uid::new(lo))
    }

    /// Returns the largest UID in the set.
    #[must_use]
    pub fn max(&self) -> Option<Uid> {
        self.runs.last().and_then(|&(_, hi)| Uid::new(hi))
    }

    /// Returns true if the set contains the UID. O(log n) in run count.
    #[must_use]
    pub fn contains(&self, uid: Uid) -> bool {
        let n = uid.get();
        self.runs
            .binary_search_by(|&(lo, hi)| {
                if n < lo {
                    std::cmp::Ordering::Greater
                } else if n > hi {
                    std::cmp::Ordering::Less
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    /// Inserts a UID, merging adjacent runs.
    pub fn insert(&mut self, uid: Uid) {
        let n = uid.get();
        let idx = self.runs.partition_point(|&(_, hi)| hi < n);

        // Already covered by the run at idx.
        if let Some(&(lo, hi)) = self.runs.get(idx)
            && lo <= n
            && n <= hi
        {
            return;
        }

        let extends_prev = idx > 0 && self.runs[idx - 1].1 == n - 1;
        let extends_next = self
            .runs
            .get(idx)
            .is_some_and(|&(lo, _)| n != u32::MAX && lo == n + 1);

        match (extends_prev, extends_next) {
            (true, true) => {
                self.runs[idx - 1].1 = self.runs[idx].1;
                self.runs.remove(idx);
            }
            (true, false) => self.runs[idx - 1].1 = n,
            (false, true) => self.runs[idx].0 = n,
            (false, false) => self.runs.insert(idx, (n, n)),
        }
    }

    /// Removes a UID, splitting a run if necessary.
    pub fn remove(&mut self, uid: Uid) {
        let n = uid.get();
        let Ok(idx) = self.runs.binary_search_by(|&(lo, hi)| {
            if n < lo {
                std::cmp::Ordering::Greater
            } else if n > hi {
                std::cmp::Ordering::Less
            } else {
                std::cmp::Ordering::Equal
            }
        }) else {
            return;
        };

        let (lo, hi) = self.runs[idx];
        match (lo == n, hi == n) {
            (true, true) => {
                self.runs.remove(idx);
            }
            (true, false) => self.runs[idx].0 = n + 1,
            (false, true) => self.runs[idx].1 = n - 1,
            (false, false) => {
                self.runs[idx].1 = n - 1;
                self.runs.insert(idx + 1, (n + 1, hi));
            }
        }
    }

    /// Merges another set into this one. O(n + m) in run count.
    pub fn union(&mut self, other: &Self) {
        if other.runs.is_empty() {
            return;
        }
        if self.runs.is_empty() {
            self.runs = other.runs.clone();
            return;
        }

        let mut merged: Vec<(u32, u32)> = Vec::with_capacity(self.runs.len() + other.runs.len());
        let mut a = self.runs.iter().copied().peekable();
        let mut b = other.runs.iter().copied().peekable();

        let push = |run: (u32, u32), merged: &mut Vec<(u32, u32)>| {
            if let Some(last) = merged.last_mut()
                && u64::from(run.0) <= u64::from(last.1) + 1
            {
                last.1 = last.1.max(run.1);
            } else {
                merged.push(run);
            }
        };

        loop {
            let next = match (a.peek(), b.peek()) {
                (Some(&ra), Some(&rb)) => {
                    if ra.0 <= rb.0 {
                        a.next()
                    } else {
                        b.next()
                    }
                }
                (Some(_), None) => a.next(),
                (None, Some(_)) => b.next(),
                (None, None) => break,
            };
            if let Some(run) = next {
                push(run, &mut merged);
            }
        }

        self.runs = merged;
    }

    /// Iterates the UIDs in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = Uid> + '_ {
        self.runs
            .iter()
            .flat_map(|&(lo, hi)| (lo..=hi).filter_map(Uid::new))
    }

    /// Serializes to the canonical IMAP sequence-set form.
    #[must_use]
    pub fn to_sequence_string(&self, order: SetOrder) -> String {
        let mut parts: Vec<String> = self
            .runs
            .iter()
            .map(|&(lo, hi)| {
                if lo == hi {
                    lo.to_string()
                } else {
                    match order {
                        SetOrder::Ascending => format!("{lo}:{hi}"),
                        SetOrder::Descending => format!("{hi}:{lo}"),
                    }
                }
            })
            .collect();
        if order == SetOrder::Descending {
            parts.reverse();
        }
        parts.join(",")
    }

    /// Parses an IMAP sequence-set string into a canonical set.
    ///
    /// Accepts out-of-order and overlapping input; the result is always
    /// sorted and coalesced. `*` is not valid here because a concrete set
    /// cannot contain the "largest UID" wildcard.
    pub fn parse(s: &str) -> Result<Self> {
        let mut set = Self::new();
        if s.is_empty() {
            return Ok(set);
        }

        for part in s.split(',') {
            let mut bounds = part.splitn(2, ':');
            let lo = parse_uid_token(bounds.next().unwrap_or_default())?;
            let hi = match bounds.next() {
                Some(text) => parse_uid_token(text)?,
                None => lo,
            };
            let run = Self::range(lo, hi);
            set.union(&run);
        }

        Ok(set)
    }

    /// Splits the set into chunks whose encoded form stays at or below
    /// `max_encoded_len` bytes.
    ///
    /// Folder operations use this to keep command lines within the server
    /// limit, issuing one command per chunk.
    #[must_use]
    pub fn chunks(&self, max_encoded_len: usize, order: SetOrder) -> Vec<Self> {
        let mut chunks = Vec::new();
        let mut current = Self::new();
        let mut current_len = 0usize;

        for &(lo, hi) in &self.runs {
            let piece = Self {
                runs: vec![(lo, hi)],
            };
            let encoded = piece.to_sequence_string(order).len();
            let extra = if current.is_empty() {
                encoded
            } else {
                encoded + 1
            };
            if !current.is_empty() && current_len + extra > max_encoded_len {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            current_len += if current.is_empty() { encoded } else { extra };
            current.union(&piece);
        }

        if !current.is_empty() {
            chunks.push(current);
        }
        chunks
    }

    /// Returns the underlying runs as `(low, high)` inclusive pairs.
    #[must_use]
    pub fn runs(&self) -> &[(u32, u32)] {
        &self.runs
    }
}

impl std::fmt::Display for UidSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_sequence_string(SetOrder::Ascending))
    }
}

impl FromIterator<Uid> for UidSet {
    fn from_iter<I: IntoIterator<Item = Uid>>(iter: I) -> Self {
        Self::from_uids(iter)
    }
}

fn parse_uid_token(text: &str) -> Result<Uid> {
    let n: u32 = text.parse().map_err(|_| Error::Parse {
        position: 0,
        message: format!("invalid UID in sequence set: {text:?}"),
    })?;
    Uid::new(n).ok_or_else(|| Error::Parse {
        position: 0,
        message: "UID 0 is not valid in a sequence set".to_string(),
    })
}

/// Sequence set for specifying message ranges in commands.
///
/// Unlike [`UidSet`] this form can express `*` (the highest number in the
/// mailbox) and open-ended ranges, which only make sense on the way out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceSet {
    /// Single sequence number.
    Single(SeqNum),
    /// Range of sequence numbers (inclusive).
    Range(SeqNum, SeqNum),
    /// Range from start to end of mailbox (`n:*`).
    RangeFrom(SeqNum),
    /// All messages (`*`).
    All,
    /// Multiple sequence specifications.
    Set(Vec<Self>),
}

impl SequenceSet {
    /// Creates a sequence set from a single number.
    #[must_use]
    pub fn single(n: u32) -> Option<Self> {
        SeqNum::new(n).map(Self::Single)
    }

    /// Creates a range sequence set.
    #[must_use]
    pub fn range(start: u32, end: u32) -> Option<Self> {
        Some(Self::Range(SeqNum::new(start)?, SeqNum::new(end)?))
    }

    /// Converts a concrete UID set into command-input form.
    #[must_use]
    pub fn from_uid_set(uids: &UidSet) -> Self {
        let items: Vec<Self> = uids
            .runs()
            .iter()
            .filter_map(|&(lo, hi)| {
                let start = SeqNum::new(lo)?;
                if lo == hi {
                    Some(Self::Single(start))
                } else {
                    Some(Self::Range(start, SeqNum::new(hi)?))
                }
            })
            .collect();
        if items.len() == 1 {
            items.into_iter().next().unwrap_or(Self::All)
        } else {
            Self::Set(items)
        }
    }
}

impl std::fmt::Display for SequenceSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(n) => write!(f, "{n}"),
            Self::Range(start, end) => write!(f, "{start}:{end}"),
            Self::RangeFrom(start) => write!(f, "{start}:*"),
            Self::All => write!(f, "*"),
            Self::Set(items) => {
                let s: Vec<_> = items.iter().map(ToString::to_string).collect();
                write!(f, "{}", s.join(","))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn uid(n: u32) -> Uid {
        Uid::new(n).unwrap()
    }

    mod uid_set_tests {
        use super::*;

        #[test]
        fn insert_coalesces_adjacent_runs() {
            let mut set = UidSet::new();
            set.insert(uid(1));
            set.insert(uid(3));
            set.insert(uid(2));
            assert_eq!(set.runs(), &[(1, 3)]);
        }

        #[test]
        fn insert_is_idempotent() {
            let mut set = UidSet::range(uid(5), uid(9));
            set.insert(uid(7));
            assert_eq!(set.runs(), &[(5, 9)]);
            assert_eq!(set.len(), 5);
        }

        #[test]
        fn remove_splits_run() {
            let mut set = UidSet::range(uid(1), uid(5));
            set.remove(uid(3));
            assert_eq!(set.runs(), &[(1, 2), (4, 5)]);
            assert!(!set.contains(uid(3)));
            assert!(set.contains(uid(2)));
            assert!(set.contains(uid(4)));
        }

        #[test]
        fn remove_missing_is_noop() {
            let mut set = UidSet::range(uid(1), uid(3));
            set.remove(uid(9));
            assert_eq!(set.runs(), &[(1, 3)]);
        }

        #[test]
        fn contains_is_exact_at_run_edges() {
            let set = UidSet::from_uids([uid(1), uid(3), uid(4), uid(5), uid(12)]);
            assert!(set.contains(uid(1)));
            assert!(!set.contains(uid(2)));
            assert!(set.contains(uid(3)));
            assert!(set.contains(uid(5)));
            assert!(!set.contains(uid(6)));
            assert!(set.contains(uid(12)));
        }

        #[test]
        fn union_merges_overlapping_runs() {
            let mut a = UidSet::from_uids([uid(1), uid(2), uid(10)]);
            let b = UidSet::from_uids([uid(3), uid(9), uid(11)]);
            a.union(&b);
            assert_eq!(a.runs(), &[(1, 3), (9, 11)]);
        }

        #[test]
        fn serialize_canonical() {
            let set = UidSet::from_uids([uid(1), uid(3), uid(4), uid(5), uid(6), uid(7), uid(12)]);
            assert_eq!(set.to_sequence_string(SetOrder::Ascending), "1,3:7,12");
            assert_eq!(set.to_sequence_string(SetOrder::Descending), "12,7:3,1");
        }

        #[test]
        fn parse_round_trip() {
            let set = UidSet::parse("1,3:7,12").unwrap();
            assert_eq!(set.to_sequence_string(SetOrder::Ascending), "1,3:7,12");
        }

        #[test]
        fn parse_canonicalizes_disordered_input() {
            let set = UidSet::parse("7:3,1,4").unwrap();
            assert_eq!(set.to_sequence_string(SetOrder::Ascending), "1,3:7");
        }

        #[test]
        fn parse_rejects_zero() {
            assert!(UidSet::parse("0:3").is_err());
        }

        #[test]
        fn parse_rejects_garbage() {
            assert!(UidSet::parse("1,abc").is_err());
        }

        #[test]
        fn chunks_respect_encoded_length() {
            let set = UidSet::parse("1:9,100:199,300,500:599,1000").unwrap();
            let chunks = set.chunks(12, SetOrder::Ascending);
            assert!(chunks.len() > 1);
            for chunk in &chunks {
                assert!(chunk.to_sequence_string(SetOrder::Ascending).len() <= 12);
            }
            let mut rejoined = UidSet::new();
            for chunk in &chunks {
                rejoined.union(chunk);
            }
            assert_eq!(rejoined, set);
        }

        #[test]
        fn min_max_len() {
            let set = UidSet::parse("41,43:45").unwrap();
            assert_eq!(set.min(), Some(uid(41)));
            assert_eq!(set.max(), Some(uid(45)));
            assert_eq!(set.len(), 4);
        }

        #[test]
        fn iter_ascending() {
            let set = UidSet::parse("3,1:2").unwrap();
            let uids: Vec<u32> = set.iter().map(Uid::get).collect();
            assert_eq!(uids, vec![1, 2, 3]);
        }
    }

    mod sequence_set_tests {
        use super::*;

        #[test]
        fn display_forms() {
            assert_eq!(SequenceSet::single(42).unwrap().to_string(), "42");
            assert_eq!(SequenceSet::range(1, 100).unwrap().to_string(), "1:100");
            assert_eq!(
                SequenceSet::RangeFrom(SeqNum::new(50).unwrap()).to_string(),
                "50:*"
            );
            assert_eq!(SequenceSet::All.to_string(), "*");
        }

        #[test]
        fn display_set() {
            let set = SequenceSet::Set(vec![
                SequenceSet::single(1).unwrap(),
                SequenceSet::range(5, 10).unwrap(),
            ]);
            assert_eq!(set.to_string(), "1,5:10");
        }

        #[test]
        fn from_uid_set() {
            let uids = UidSet::parse("1,3:7").unwrap();
            assert_eq!(SequenceSet::from_uid_set(&uids).to_string(), "1,3:7");
        }
    }

    mod round_trip_props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn parse_serialize_identity(uids in proptest::collection::btree_set(1u32..5000, 0..60)) {
                let set = UidSet::from_uids(uids.iter().filter_map(|&n| Uid::new(n)));
                let text = set.to_sequence_string(SetOrder::Ascending);
                if text.is_empty() {
                    prop_assert!(set.is_empty());
                } else {
                    let parsed = UidSet::parse(&text).unwrap();
                    prop_assert_eq!(parsed, set);
                }
            }

            #[test]
            fn membership_matches_source(uids in proptest::collection::btree_set(1u32..500, 0..40), probe in 1u32..500) {
                let set = UidSet::from_uids(uids.iter().filter_map(|&n| Uid::new(n)));
                prop_assert_eq!(set.contains(Uid::new(probe).unwrap()), uids.contains(&probe));
            }
        }
    }
}
