//! Implementation for the selected state.

use tokio::io::{AsyncRead, AsyncWrite};

use super::states::{Authenticated, Selected};
use super::{Client, CommandOutput};
use crate::command::{
    Command, FetchItems, SearchCriteria, SearchReturn, SortKey, StoreAction, ThreadAlgorithm,
};
use crate::events::MailboxEvent;
use crate::parser::{EsearchResult, FetchItem, ThreadNode, UntaggedResponse};
use crate::qresync::SyncState;
use crate::types::{
    Capability, Mailbox, ModSeq, ResponseCode, SelectInfo, SeqNum, SequenceSet, UidSet,
    UidValidity,
};
use crate::{Error, Result};

/// UIDs mapped by a COPY or MOVE, from `[COPYUID ...]` (RFC 4315).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopiedUids {
    /// UIDVALIDITY of the destination mailbox.
    pub uidvalidity: Option<UidValidity>,
    /// Source UIDs, element-wise correspondent with `dest`.
    pub source: UidSet,
    /// Destination UIDs.
    pub dest: UidSet,
}

impl<S> Client<S, Selected>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// The selected mailbox name.
    #[must_use]
    pub fn mailbox(&self) -> &Mailbox {
        self.state().mailbox()
    }

    /// Snapshot of the selected mailbox.
    #[must_use]
    pub fn select_info(&self) -> SelectInfo {
        self.state().select_info()
    }

    /// All UIDs currently known to the sequence map.
    #[must_use]
    pub fn known_uids(&self) -> UidSet {
        self.state().known_uids()
    }

    /// State a caller can persist for a future QRESYNC reopen, available
    /// once UIDVALIDITY and HIGHESTMODSEQ are both known.
    #[must_use]
    pub fn sync_state(&self) -> Option<SyncState> {
        let state = self.state();
        let uidvalidity = state.uid_validity()?;
        let highestmodseq = state.highest_mod_seq()?;
        Some(SyncState::new(uidvalidity, highestmodseq).with_known_uids(state.known_uids()))
    }

    fn state(&self) -> &crate::mailbox_state::SelectedMailbox {
        // The Selected type-state always carries mailbox state.
        self.mailbox
            .as_ref()
            .unwrap_or_else(|| unreachable!("selected client without mailbox state"))
    }

    /// Fetches items for messages by sequence set.
    pub async fn fetch(
        &mut self,
        sequence: &SequenceSet,
        items: FetchItems,
    ) -> Result<Vec<(SeqNum, Vec<FetchItem>)>> {
        let output = self
            .run_command(&Command::Fetch {
                sequence: sequence.clone(),
                items,
                uid: false,
                changed_since: None,
                vanished: false,
            })
            .await?;
        Ok(collect_fetches(output))
    }

    /// Fetches items for messages by UID, splitting oversized sets into
    /// multiple commands.
    pub async fn uid_fetch(
        &mut self,
        uids: &UidSet,
        items: FetchItems,
    ) -> Result<Vec<(SeqNum, Vec<FetchItem>)>> {
        if uids.is_empty() {
            return Ok(Vec::new());
        }
        let mut results = Vec::new();
        for chunk in uids.chunks(self.config.max_set_encoded_len, self.config.set_order) {
            let output = self
                .run_command(&Command::Fetch {
                    sequence: SequenceSet::from_uid_set(&chunk),
                    items: items.clone(),
                    uid: true,
                    changed_since: None,
                    vanished: false,
                })
                .await?;
            results.extend(collect_fetches(output));
        }
        Ok(results)
    }

    /// UID FETCH with `CHANGEDSINCE` (RFC 7162), optionally requesting
    /// VANISHED (QRESYNC). Expunges arrive through the event surface.
    pub async fn uid_fetch_changed_since(
        &mut self,
        uids: &UidSet,
        items: FetchItems,
        changed_since: ModSeq,
        vanished: bool,
    ) -> Result<Vec<(SeqNum, Vec<FetchItem>)>> {
        if !self.caps.supports_condstore() {
            return Err(Error::NotSupported("CONDSTORE".to_string()));
        }
        if vanished && !self.caps.is_enabled(&Capability::QResync) {
            return Err(Error::NotSupported("QRESYNC (not enabled)".to_string()));
        }
        if uids.is_empty() {
            return Ok(Vec::new());
        }
        let mut results = Vec::new();
        for chunk in uids.chunks(self.config.max_set_encoded_len, self.config.set_order) {
            let output = self
                .run_command(&Command::Fetch {
                    sequence: SequenceSet::from_uid_set(&chunk),
                    items: items.clone(),
                    uid: true,
                    changed_since: Some(changed_since),
                    vanished,
                })
                .await?;
            results.extend(collect_fetches(output));
        }
        Ok(results)
    }

    /// Stores flags or labels on messages by sequence set. Returns the
    /// untagged FETCH echoes unless `silent`.
    pub async fn store(
        &mut self,
        sequence: &SequenceSet,
        action: StoreAction,
        silent: bool,
    ) -> Result<Vec<(SeqNum, Vec<FetchItem>)>> {
        self.check_store(&action)?;
        let output = self
            .run_command(&Command::Store {
                sequence: sequence.clone(),
                action,
                uid: false,
                silent,
                unchanged_since: None,
            })
            .await?;
        Ok(collect_fetches(output))
    }

    /// Stores flags or labels by UID.
    pub async fn uid_store(
        &mut self,
        uids: &UidSet,
        action: StoreAction,
        silent: bool,
    ) -> Result<Vec<(SeqNum, Vec<FetchItem>)>> {
        self.check_store(&action)?;
        if uids.is_empty() {
            return Ok(Vec::new());
        }
        let mut results = Vec::new();
        for chunk in uids.chunks(self.config.max_set_encoded_len, self.config.set_order) {
            let output = self
                .run_command(&Command::Store {
                    sequence: SequenceSet::from_uid_set(&chunk),
                    action: action.clone(),
                    uid: true,
                    silent,
                    unchanged_since: None,
                })
                .await?;
            results.extend(collect_fetches(output));
        }
        Ok(results)
    }

    /// Conditional UID STORE with `UNCHANGEDSINCE` (RFC 7162). Returns
    /// the UIDs the server did NOT update (the `[MODIFIED ...]` set);
    /// empty means every message took the change.
    pub async fn uid_store_unchanged_since(
        &mut self,
        uids: &UidSet,
        action: StoreAction,
        silent: bool,
        unchanged_since: ModSeq,
    ) -> Result<UidSet> {
        if !self.caps.supports_condstore() {
            return Err(Error::NotSupported("CONDSTORE".to_string()));
        }
        self.check_store(&action)?;
        if uids.is_empty() {
            return Ok(UidSet::new());
        }

        let mut modified = UidSet::new();
        for chunk in uids.chunks(self.config.max_set_encoded_len, self.config.set_order) {
            let output = self
                .run_command(&Command::Store {
                    sequence: SequenceSet::from_uid_set(&chunk),
                    action: action.clone(),
                    uid: true,
                    silent,
                    unchanged_since: Some(unchanged_since),
                })
                .await?;
            if let Some(ResponseCode::Modified(set)) = output.code {
                modified.union(&set);
            }
        }
        Ok(modified)
    }

    /// Searches by sequence number.
    pub async fn search(&mut self, criteria: SearchCriteria) -> Result<Vec<u32>> {
        let output = self.run_search(criteria, false, vec![]).await?;
        Ok(collect_search_ids(output))
    }

    /// Searches by UID.
    pub async fn uid_search(&mut self, criteria: SearchCriteria) -> Result<UidSet> {
        let output = self.run_search(criteria, true, vec![]).await?;
        let ids = collect_search_ids(output);
        Ok(ids
            .into_iter()
            .filter_map(crate::types::Uid::new)
            .collect())
    }

    /// ESEARCH with `RETURN (...)` options (RFC 4731).
    pub async fn search_extended(
        &mut self,
        criteria: SearchCriteria,
        uid: bool,
        returns: Vec<SearchReturn>,
    ) -> Result<EsearchResult> {
        if !self.caps.supports_esearch() {
            return Err(Error::NotSupported("ESEARCH".to_string()));
        }
        let returns = if returns.is_empty() {
            vec![SearchReturn::All]
        } else {
            returns
        };
        let output = self.run_search(criteria, uid, returns).await?;
        Ok(output
            .untagged
            .into_iter()
            .find_map(|resp| match resp {
                UntaggedResponse::Esearch(result) => Some(result),
                _ => None,
            })
            .unwrap_or_default())
    }

    async fn run_search(
        &mut self,
        criteria: SearchCriteria,
        uid: bool,
        returns: Vec<SearchReturn>,
    ) -> Result<CommandOutput> {
        let charset = if criteria.needs_charset() {
            if self.quirks.no_search_charset {
                None
            } else {
                Some("UTF-8".to_string())
            }
        } else {
            None
        };
        self.run_command(&Command::Search {
            criteria,
            uid,
            charset,
            returns,
        })
        .await
    }

    /// Server-side SORT (RFC 5256).
    pub async fn sort(
        &mut self,
        keys: Vec<SortKey>,
        criteria: SearchCriteria,
        uid: bool,
    ) -> Result<Vec<u32>> {
        if !self.caps.supports_sort() {
            return Err(Error::NotSupported("SORT".to_string()));
        }
        let charset = if criteria.needs_charset() {
            "UTF-8"
        } else {
            "US-ASCII"
        };
        let output = self
            .run_command(&Command::Sort {
                keys,
                criteria,
                uid,
                charset: charset.to_string(),
            })
            .await?;
        Ok(output
            .untagged
            .into_iter()
            .find_map(|resp| match resp {
                UntaggedResponse::Sort(ids) => Some(ids),
                _ => None,
            })
            .unwrap_or_default())
    }

    /// Server-side THREAD (RFC 5256).
    pub async fn thread(
        &mut self,
        algorithm: ThreadAlgorithm,
        criteria: SearchCriteria,
        uid: bool,
    ) -> Result<Vec<ThreadNode>> {
        let advertised = self
            .caps
            .thread_algorithms()
            .any(|alg| alg.eq_ignore_ascii_case(algorithm.as_str()));
        if !advertised {
            return Err(Error::NotSupported(format!(
                "THREAD={}",
                algorithm.as_str()
            )));
        }
        let charset = if criteria.needs_charset() {
            "UTF-8"
        } else {
            "US-ASCII"
        };
        let output = self
            .run_command(&Command::Thread {
                algorithm,
                criteria,
                uid,
                charset: charset.to_string(),
            })
            .await?;
        Ok(output
            .untagged
            .into_iter()
            .find_map(|resp| match resp {
                UntaggedResponse::Thread(roots) => Some(roots),
                _ => None,
            })
            .unwrap_or_default())
    }

    /// Copies messages by sequence set.
    pub async fn copy(&mut self, sequence: &SequenceSet, mailbox: &str) -> Result<CopiedUids> {
        let output = self
            .run_command(&Command::Copy {
                sequence: sequence.clone(),
                mailbox: Mailbox::new(mailbox),
                uid: false,
            })
            .await?;
        Ok(copied_from_code(output.code))
    }

    /// Copies messages by UID, aggregating `[COPYUID]` across chunks.
    pub async fn uid_copy(&mut self, uids: &UidSet, mailbox: &str) -> Result<CopiedUids> {
        self.uid_transfer(uids, mailbox, false).await
    }

    /// Moves messages by sequence set (RFC 6851). The source expunge
    /// arrives as untagged EXPUNGE/VANISHED and flows through the event
    /// surface.
    pub async fn r#move(&mut self, sequence: &SequenceSet, mailbox: &str) -> Result<CopiedUids> {
        if !self.caps.supports_move() {
            return Err(Error::NotSupported("MOVE".to_string()));
        }
        let output = self
            .run_command(&Command::Move {
                sequence: sequence.clone(),
                mailbox: Mailbox::new(mailbox),
                uid: false,
            })
            .await?;
        Ok(copied_from_code(output.code))
    }

    /// Moves messages by UID (RFC 6851).
    pub async fn uid_move(&mut self, uids: &UidSet, mailbox: &str) -> Result<CopiedUids> {
        if !self.caps.supports_move() {
            return Err(Error::NotSupported("MOVE".to_string()));
        }
        self.uid_transfer(uids, mailbox, true).await
    }

    async fn uid_transfer(
        &mut self,
        uids: &UidSet,
        mailbox: &str,
        is_move: bool,
    ) -> Result<CopiedUids> {
        if uids.is_empty() {
            return Ok(CopiedUids::default());
        }
        let mut copied = CopiedUids::default();
        for chunk in uids.chunks(self.config.max_set_encoded_len, self.config.set_order) {
            let sequence = SequenceSet::from_uid_set(&chunk);
            let target = Mailbox::new(mailbox);
            let command = if is_move {
                Command::Move {
                    sequence,
                    mailbox: target,
                    uid: true,
                }
            } else {
                Command::Copy {
                    sequence,
                    mailbox: target,
                    uid: true,
                }
            };
            let output = self.run_command(&command).await?;
            let chunk_copied = copied_from_code(output.code);
            copied.uidvalidity = chunk_copied.uidvalidity.or(copied.uidvalidity);
            copied.source.union(&chunk_copied.source);
            copied.dest.union(&chunk_copied.dest);
        }
        Ok(copied)
    }

    /// Permanently removes messages marked `\Deleted`. Returns the
    /// expunged sequence numbers in server order.
    pub async fn expunge(&mut self) -> Result<Vec<SeqNum>> {
        let output = self.run_command(&Command::Expunge).await?;
        Ok(collect_expunges(output))
    }

    /// UID EXPUNGE (RFC 4315): expunges only the given UIDs.
    pub async fn uid_expunge(&mut self, uids: &UidSet) -> Result<Vec<SeqNum>> {
        if !self.caps.supports_uidplus() {
            return Err(Error::NotSupported("UIDPLUS".to_string()));
        }
        if uids.is_empty() {
            return Ok(Vec::new());
        }
        let mut expunged = Vec::new();
        for chunk in uids.chunks(self.config.max_set_encoded_len, self.config.set_order) {
            let output = self
                .run_command(&Command::UidExpunge {
                    uids: SequenceSet::from_uid_set(&chunk),
                })
                .await?;
            expunged.extend(collect_expunges(output));
        }
        Ok(expunged)
    }

    /// Requests a server checkpoint (CHECK).
    pub async fn check(&mut self) -> Result<()> {
        self.run_command(&Command::Check).await.map(|_| ())
    }

    /// Closes the mailbox (CLOSE), expunging `\Deleted` messages, and
    /// returns to the authenticated state.
    pub async fn close(mut self) -> Result<Client<S, Authenticated>> {
        let name = self.mailbox().clone();
        self.run_command(&Command::Close).await?;
        self.mailbox = None;
        self.events.mailbox(MailboxEvent::Closed(name));
        Ok(self.into_state())
    }

    /// Closes the mailbox without expunging (UNSELECT, RFC 3691).
    pub async fn unselect(mut self) -> Result<Client<S, Authenticated>> {
        if !self.caps.supports_unselect() {
            return Err(Error::NotSupported("UNSELECT".to_string()));
        }
        let name = self.mailbox().clone();
        self.run_command(&Command::Unselect).await?;
        self.mailbox = None;
        self.events.mailbox(MailboxEvent::Closed(name));
        Ok(self.into_state())
    }

    /// Validates a store action against capabilities and settable flags.
    fn check_store(&self, action: &StoreAction) -> Result<()> {
        if action.is_labels() && !self.caps.supports_gmail_ext() {
            return Err(Error::NotSupported("X-GM-EXT-1 labels".to_string()));
        }
        if self.select_info().access == crate::types::FolderAccess::ReadOnly {
            return Err(Error::Failed {
                reason: crate::types::FailureReason::Unspecified,
                text: "mailbox is open read-only".to_string(),
            });
        }
        Ok(())
    }
}

/// Pulls per-message FETCH records out of a command output.
fn collect_fetches(output: CommandOutput) -> Vec<(SeqNum, Vec<FetchItem>)> {
    output
        .untagged
        .into_iter()
        .filter_map(|resp| match resp {
            UntaggedResponse::Fetch { seq, items } => Some((seq, items)),
            _ => None,
        })
        .collect()
}

/// Pulls SEARCH ids (plain or ESEARCH ALL) out of a command output.
fn collect_search_ids(output: CommandOutput) -> Vec<u32> {
    let mut ids = Vec::new();
    for resp in output.untagged {
        match resp {
            UntaggedResponse::Search { ids: found, .. } => ids.extend(found),
            UntaggedResponse::Esearch(result) => {
                if let Some(all) = result.all {
                    ids.extend(all.iter().map(crate::types::Uid::get));
                }
            }
            _ => {}
        }
    }
    ids
}

/// Pulls EXPUNGE sequence numbers out of a command output.
fn collect_expunges(output: CommandOutput) -> Vec<SeqNum> {
    output
        .untagged
        .into_iter()
        .filter_map(|resp| match resp {
            UntaggedResponse::Expunge(seq) => Some(seq),
            _ => None,
        })
        .collect()
}

/// Decodes a `[COPYUID ...]` response code.
fn copied_from_code(code: Option<ResponseCode>) -> CopiedUids {
    match code {
        Some(ResponseCode::CopyUid {
            uidvalidity,
            source,
            dest,
        }) => CopiedUids {
            uidvalidity: Some(uidvalidity),
            source,
            dest,
        },
        _ => CopiedUids::default(),
    }
}
