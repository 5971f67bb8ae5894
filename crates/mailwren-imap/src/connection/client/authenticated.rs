//! Implementation for the authenticated state.

use tokio::io::{AsyncRead, AsyncWrite};

use super::states::{Authenticated, Selected};
use super::{Client, CommandOutput, Progress};
use crate::command::{AppendMessage, Command, StatusAttribute};
use crate::connection::framed::FramedStream;
use crate::connection::stream::ImapStream;
use crate::events::MailboxEvent;
use crate::mailbox_state::SelectedMailbox;
use crate::parser::UntaggedResponse;
use crate::qresync::QresyncParams;
use crate::types::{
    Acl, Capability, ListEntry, Mailbox, MetadataEntry, Namespaces, Quota, QuotaRoot,
    ResponseCode, SelectInfo, StatusItem, UidSet, UidValidity,
};
use crate::{Error, Result};

/// How to open a mailbox.
#[derive(Debug, Clone, Default)]
pub struct OpenParams {
    /// Request CONDSTORE on open.
    pub condstore: bool,
    /// QRESYNC resync parameters; implies CONDSTORE.
    pub qresync: Option<QresyncParams>,
}

impl OpenParams {
    /// Plain open.
    #[must_use]
    pub fn plain() -> Self {
        Self::default()
    }

    /// Open with CONDSTORE.
    #[must_use]
    pub fn condstore() -> Self {
        Self {
            condstore: true,
            qresync: None,
        }
    }

    /// Open with QRESYNC against saved state.
    #[must_use]
    pub fn qresync(params: QresyncParams) -> Self {
        Self {
            condstore: false,
            qresync: Some(params),
        }
    }
}

/// UIDs assigned by an APPEND, from `[APPENDUID ...]` (RFC 4315).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendedUids {
    /// UIDVALIDITY of the destination mailbox.
    pub uidvalidity: UidValidity,
    /// One UID per appended message, in order.
    pub uids: UidSet,
}

impl<S> Client<S, Authenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Enables capabilities via ENABLE (RFC 5161), returning those the
    /// server confirmed.
    pub async fn enable(&mut self, capabilities: &[Capability]) -> Result<Vec<Capability>> {
        if !self.caps.supports_enable() {
            return Err(Error::NotSupported("ENABLE".to_string()));
        }
        let names: Vec<String> = capabilities.iter().map(ToString::to_string).collect();
        let output = self
            .run_command(&Command::Enable {
                capabilities: names,
            })
            .await?;
        // dispatch_untagged already marked them; collect for the caller.
        Ok(output
            .untagged
            .into_iter()
            .find_map(|resp| match resp {
                UntaggedResponse::Enabled(caps) => Some(caps),
                _ => None,
            })
            .unwrap_or_default())
    }

    /// Selects a mailbox read-write.
    pub async fn select(
        self,
        mailbox: &str,
        params: OpenParams,
    ) -> Result<(Client<S, Selected>, SelectInfo)> {
        self.open(mailbox, params, false).await
    }

    /// Opens a mailbox read-only.
    pub async fn examine(
        self,
        mailbox: &str,
        params: OpenParams,
    ) -> Result<(Client<S, Selected>, SelectInfo)> {
        self.open(mailbox, params, true).await
    }

    async fn open(
        mut self,
        mailbox: &str,
        params: OpenParams,
        read_only: bool,
    ) -> Result<(Client<S, Selected>, SelectInfo)> {
        let name = self.quirks.normalize_mailbox(mailbox);
        self.check_mailbox_name(&name)?;

        if params.condstore && !self.caps.supports_condstore() {
            return Err(Error::NotSupported("CONDSTORE".to_string()));
        }
        if params.qresync.is_some() && !self.caps.is_enabled(&Capability::QResync) {
            // RFC 7162: QRESYNC parameters are only valid once ENABLEd.
            return Err(Error::NotSupported("QRESYNC (not enabled)".to_string()));
        }

        let mailbox = Mailbox::new(name);
        // Install state before sending so resync traffic (VANISHED
        // EARLIER, FETCH) lands in the map as it arrives.
        self.mailbox = Some(SelectedMailbox::new(mailbox.clone()));

        let command = if read_only {
            Command::Examine {
                mailbox: mailbox.clone(),
                condstore: params.condstore,
                qresync: params.qresync,
            }
        } else {
            Command::Select {
                mailbox: mailbox.clone(),
                condstore: params.condstore,
                qresync: params.qresync,
            }
        };

        match self.run_command(&command).await {
            Ok(_) => {}
            Err(e) => {
                self.mailbox = None;
                return Err(match e {
                    Error::Failed { reason, .. }
                        if reason == crate::types::FailureReason::NonExistent =>
                    {
                        Error::FolderNotFound(mailbox.as_str().to_string())
                    }
                    other => other,
                });
            }
        }

        if read_only {
            if let Some(state) = self.mailbox.as_mut() {
                state.set_access(crate::types::FolderAccess::ReadOnly);
            }
        }

        let info = self
            .mailbox
            .as_ref()
            .map(SelectedMailbox::select_info)
            .unwrap_or_default();
        self.events.mailbox(MailboxEvent::Opened(mailbox));

        Ok((self.into_state(), info))
    }

    /// Lists mailboxes matching a pattern.
    pub async fn list(&mut self, reference: &str, pattern: &str) -> Result<Vec<ListEntry>> {
        let output = self
            .run_command(&Command::List {
                reference: reference.to_string(),
                pattern: pattern.to_string(),
                select_subscribed: false,
                return_subscribed: false,
                return_children: false,
                return_status: None,
            })
            .await?;
        Ok(collect_list_entries(output))
    }

    /// LIST-EXTENDED query: subscribed mailboxes with children info and
    /// optional inline STATUS (RFC 5258 / RFC 5819).
    pub async fn list_extended(
        &mut self,
        reference: &str,
        pattern: &str,
        subscribed_only: bool,
        return_status: Option<Vec<StatusAttribute>>,
    ) -> Result<Vec<ListEntry>> {
        if !self.caps.has(&Capability::ListExtended) {
            return Err(Error::NotSupported("LIST-EXTENDED".to_string()));
        }
        if return_status.is_some() && !self.caps.has(&Capability::ListStatus) {
            return Err(Error::NotSupported("LIST-STATUS".to_string()));
        }
        let output = self
            .run_command(&Command::List {
                reference: reference.to_string(),
                pattern: pattern.to_string(),
                select_subscribed: subscribed_only,
                return_subscribed: true,
                return_children: true,
                return_status,
            })
            .await?;
        Ok(collect_list_entries(output))
    }

    /// Lists subscribed mailboxes (LSUB).
    pub async fn lsub(&mut self, reference: &str, pattern: &str) -> Result<Vec<ListEntry>> {
        let output = self
            .run_command(&Command::Lsub {
                reference: reference.to_string(),
                pattern: pattern.to_string(),
            })
            .await?;
        Ok(output
            .untagged
            .into_iter()
            .filter_map(|resp| match resp {
                UntaggedResponse::Lsub(entry) | UntaggedResponse::List(entry) => Some(entry),
                _ => None,
            })
            .collect())
    }

    /// Lists mailboxes with Gmail XLIST special-use attributes.
    pub async fn xlist(&mut self, reference: &str, pattern: &str) -> Result<Vec<ListEntry>> {
        if !self.caps.has(&Capability::XList) {
            return Err(Error::NotSupported("XLIST".to_string()));
        }
        let output = self
            .run_command(&Command::XList {
                reference: reference.to_string(),
                pattern: pattern.to_string(),
            })
            .await?;
        Ok(collect_list_entries(output))
    }

    /// Creates a mailbox.
    pub async fn create(&mut self, mailbox: &str) -> Result<()> {
        self.check_mailbox_name(mailbox)?;
        self.run_command(&Command::Create {
            mailbox: Mailbox::new(mailbox),
        })
        .await
        .map(|_| ())
    }

    /// Deletes a mailbox.
    pub async fn delete(&mut self, mailbox: &str) -> Result<()> {
        let name = Mailbox::new(mailbox);
        self.run_command(&Command::Delete { mailbox: name.clone() })
            .await?;
        self.events.mailbox(MailboxEvent::Deleted(name));
        Ok(())
    }

    /// Renames a mailbox.
    pub async fn rename(&mut self, from: &str, to: &str) -> Result<()> {
        self.check_mailbox_name(to)?;
        let from = Mailbox::new(from);
        let to = Mailbox::new(to);
        self.run_command(&Command::Rename {
            from: from.clone(),
            to: to.clone(),
        })
        .await?;
        self.events.mailbox(MailboxEvent::Renamed { from, to });
        Ok(())
    }

    /// Subscribes to a mailbox.
    pub async fn subscribe(&mut self, mailbox: &str) -> Result<()> {
        let name = Mailbox::new(mailbox);
        self.run_command(&Command::Subscribe { mailbox: name.clone() })
            .await?;
        self.events.mailbox(MailboxEvent::Subscribed(name));
        Ok(())
    }

    /// Unsubscribes from a mailbox.
    pub async fn unsubscribe(&mut self, mailbox: &str) -> Result<()> {
        let name = Mailbox::new(mailbox);
        self.run_command(&Command::Unsubscribe { mailbox: name.clone() })
            .await?;
        self.events.mailbox(MailboxEvent::Unsubscribed(name));
        Ok(())
    }

    /// Queries mailbox status without selecting it.
    pub async fn status(
        &mut self,
        mailbox: &str,
        items: Vec<StatusAttribute>,
    ) -> Result<Vec<StatusItem>> {
        if items.is_empty() {
            return Err(Error::InvalidArgument(
                "STATUS requires at least one attribute".to_string(),
            ));
        }
        let output = self
            .run_command(&Command::Status {
                mailbox: Mailbox::new(mailbox),
                items,
            })
            .await?;
        let mut result = Vec::new();
        for resp in output.untagged {
            if let UntaggedResponse::Status(status) = resp {
                result.extend(status.items);
            }
        }
        Ok(result)
    }

    /// Queries the namespace layout (RFC 2342).
    pub async fn namespace(&mut self) -> Result<Namespaces> {
        if !self.caps.has(&Capability::Namespace) {
            return Err(Error::NotSupported("NAMESPACE".to_string()));
        }
        let output = self.run_command(&Command::Namespace).await?;
        output
            .untagged
            .into_iter()
            .find_map(|resp| match resp {
                UntaggedResponse::Namespace(ns) => Some(ns),
                _ => None,
            })
            .ok_or_else(|| Error::Protocol("NAMESPACE completed without data".to_string()))
    }

    /// Appends one message, returning the assigned UID when the server
    /// supports UIDPLUS.
    pub async fn append(
        &mut self,
        mailbox: &str,
        message: AppendMessage,
    ) -> Result<Option<AppendedUids>> {
        self.append_many(mailbox, vec![message], None).await
    }

    /// Appends one or more messages (MULTIAPPEND when more than one),
    /// optionally reporting upload progress.
    pub async fn append_many(
        &mut self,
        mailbox: &str,
        messages: Vec<AppendMessage>,
        progress: Option<&mut dyn Progress>,
    ) -> Result<Option<AppendedUids>> {
        if messages.is_empty() {
            return Err(Error::InvalidArgument(
                "APPEND requires at least one message".to_string(),
            ));
        }
        if messages.len() > 1 && !self.caps.supports_multiappend() {
            return Err(Error::NotSupported("MULTIAPPEND".to_string()));
        }
        self.check_mailbox_name(mailbox)?;
        if !self.caps.is_enabled(&Capability::Utf8Accept)
            && messages.iter().any(|m| !m.body.is_ascii())
        {
            // 8-bit message content without UTF8=ACCEPT is tolerated by
            // most servers but the RFC route is BINARY/UTF8; log it.
            tracing::debug!("appending 8-bit content without UTF8=ACCEPT");
        }

        let command = Command::Append {
            mailbox: Mailbox::new(self.quirks.normalize_mailbox(mailbox)),
            messages,
        };

        let output = match progress {
            Some(sink) => self.run_command_with_progress(&command, sink).await?,
            None => self.run_command(&command).await?,
        };

        Ok(match output.code {
            Some(ResponseCode::AppendUid { uidvalidity, uids }) => {
                Some(AppendedUids { uidvalidity, uids })
            }
            _ => None,
        })
    }

    /// GETQUOTA (RFC 2087).
    pub async fn get_quota(&mut self, root: &str) -> Result<Vec<Quota>> {
        if !self.caps.supports_quota() {
            return Err(Error::NotSupported("QUOTA".to_string()));
        }
        let output = self
            .run_command(&Command::GetQuota {
                root: root.to_string(),
            })
            .await?;
        Ok(collect_quotas(output))
    }

    /// GETQUOTAROOT (RFC 2087): the roots governing a mailbox plus their
    /// current quotas.
    pub async fn get_quota_root(&mut self, mailbox: &str) -> Result<(Vec<QuotaRoot>, Vec<Quota>)> {
        if !self.caps.supports_quota() {
            return Err(Error::NotSupported("QUOTA".to_string()));
        }
        let output = self
            .run_command(&Command::GetQuotaRoot {
                mailbox: Mailbox::new(mailbox),
            })
            .await?;
        let mut roots = Vec::new();
        let mut quotas = Vec::new();
        for resp in output.untagged {
            match resp {
                UntaggedResponse::QuotaRoot(root) => roots.push(root),
                UntaggedResponse::Quota(quota) => quotas.push(quota),
                _ => {}
            }
        }
        Ok((roots, quotas))
    }

    /// SETQUOTA (RFC 2087).
    pub async fn set_quota(
        &mut self,
        root: &str,
        limits: Vec<(String, u64)>,
    ) -> Result<Vec<Quota>> {
        if !self.caps.supports_quota() {
            return Err(Error::NotSupported("QUOTA".to_string()));
        }
        let output = self
            .run_command(&Command::SetQuota {
                root: root.to_string(),
                limits,
            })
            .await?;
        Ok(collect_quotas(output))
    }

    /// GETACL (RFC 4314).
    pub async fn get_acl(&mut self, mailbox: &str) -> Result<Acl> {
        if !self.caps.supports_acl() {
            return Err(Error::NotSupported("ACL".to_string()));
        }
        let output = self
            .run_command(&Command::GetAcl {
                mailbox: Mailbox::new(mailbox),
            })
            .await?;
        output
            .untagged
            .into_iter()
            .find_map(|resp| match resp {
                UntaggedResponse::Acl(acl) => Some(acl),
                _ => None,
            })
            .ok_or_else(|| Error::Protocol("GETACL completed without data".to_string()))
    }

    /// SETACL (RFC 4314).
    pub async fn set_acl(&mut self, mailbox: &str, identifier: &str, rights: &str) -> Result<()> {
        if !self.caps.supports_acl() {
            return Err(Error::NotSupported("ACL".to_string()));
        }
        self.run_command(&Command::SetAcl {
            mailbox: Mailbox::new(mailbox),
            identifier: identifier.to_string(),
            rights: rights.to_string(),
        })
        .await
        .map(|_| ())
    }

    /// DELETEACL (RFC 4314).
    pub async fn delete_acl(&mut self, mailbox: &str, identifier: &str) -> Result<()> {
        if !self.caps.supports_acl() {
            return Err(Error::NotSupported("ACL".to_string()));
        }
        self.run_command(&Command::DeleteAcl {
            mailbox: Mailbox::new(mailbox),
            identifier: identifier.to_string(),
        })
        .await
        .map(|_| ())
    }

    /// MYRIGHTS (RFC 4314).
    pub async fn my_rights(&mut self, mailbox: &str) -> Result<String> {
        if !self.caps.supports_acl() {
            return Err(Error::NotSupported("ACL".to_string()));
        }
        let output = self
            .run_command(&Command::MyRights {
                mailbox: Mailbox::new(mailbox),
            })
            .await?;
        output
            .untagged
            .into_iter()
            .find_map(|resp| match resp {
                UntaggedResponse::MyRights { rights, .. } => Some(rights),
                _ => None,
            })
            .ok_or_else(|| Error::Protocol("MYRIGHTS completed without data".to_string()))
    }

    /// LISTRIGHTS (RFC 4314).
    pub async fn list_rights(&mut self, mailbox: &str, identifier: &str) -> Result<Vec<String>> {
        if !self.caps.supports_acl() {
            return Err(Error::NotSupported("ACL".to_string()));
        }
        let output = self
            .run_command(&Command::ListRights {
                mailbox: Mailbox::new(mailbox),
                identifier: identifier.to_string(),
            })
            .await?;
        output
            .untagged
            .into_iter()
            .find_map(|resp| match resp {
                UntaggedResponse::ListRights { rights, .. } => Some(rights),
                _ => None,
            })
            .ok_or_else(|| Error::Protocol("LISTRIGHTS completed without data".to_string()))
    }

    /// GETMETADATA (RFC 5464).
    pub async fn get_metadata(
        &mut self,
        mailbox: &str,
        entries: Vec<String>,
    ) -> Result<Vec<MetadataEntry>> {
        if !self.caps.supports_metadata() {
            return Err(Error::NotSupported("METADATA".to_string()));
        }
        let output = self
            .run_command(&Command::GetMetadata {
                mailbox: Mailbox::new(mailbox),
                entries,
            })
            .await?;
        let mut result = Vec::new();
        for resp in output.untagged {
            if let UntaggedResponse::Metadata { entries, .. } = resp {
                result.extend(entries);
            }
        }
        Ok(result)
    }

    /// SETMETADATA (RFC 5464). An entry with a `None` value is removed.
    pub async fn set_metadata(
        &mut self,
        mailbox: &str,
        entries: Vec<MetadataEntry>,
    ) -> Result<()> {
        if !self.caps.supports_metadata() {
            return Err(Error::NotSupported("METADATA".to_string()));
        }
        self.run_command(&Command::SetMetadata {
            mailbox: Mailbox::new(mailbox),
            entries,
        })
        .await
        .map(|_| ())
    }

    /// NOTIFY (RFC 5465): subscribes to server-push events. The pushed
    /// data arrives as regular untagged responses and flows through the
    /// dispatcher like any other update.
    pub async fn notify(&mut self, request: crate::command::NotifyRequest) -> Result<()> {
        if !self.caps.supports_notify() {
            return Err(Error::NotSupported("NOTIFY".to_string()));
        }
        self.run_command(&Command::Notify { request })
            .await
            .map(|_| ())
    }

    /// Rejects non-ASCII mailbox names unless UTF8=ACCEPT was ENABLEd.
    fn check_mailbox_name(&self, name: &str) -> Result<()> {
        if !name.is_ascii() && !self.caps.is_enabled(&Capability::Utf8Accept) {
            return Err(Error::NotSupported(
                "UTF-8 mailbox names require UTF8=ACCEPT".to_string(),
            ));
        }
        Ok(())
    }
}

impl Client<ImapStream, Authenticated> {
    /// Negotiates COMPRESS=DEFLATE (RFC 4978) and wraps the transport.
    ///
    /// Issued only between commands; the tagged OK is the last
    /// uncompressed byte from the server.
    pub async fn compress(mut self) -> Result<Self> {
        if !self.caps.supports_compress() {
            return Err(Error::NotSupported("COMPRESS=DEFLATE".to_string()));
        }
        if self.stream.get_ref().is_compressed() {
            return Err(Error::Protocol("compression is already active".to_string()));
        }

        self.run_command(&Command::Compress).await?;

        let stream = self.stream.into_inner();
        self.stream = FramedStream::new(stream.enable_compression()?);
        tracing::info!("COMPRESS=DEFLATE active");
        Ok(self)
    }
}

/// Pulls the LIST entries out of a command output.
fn collect_list_entries(output: CommandOutput) -> Vec<ListEntry> {
    output
        .untagged
        .into_iter()
        .filter_map(|resp| match resp {
            UntaggedResponse::List(entry) => Some(entry),
            _ => None,
        })
        .collect()
}

/// Pulls the QUOTA responses out of a command output.
fn collect_quotas(output: CommandOutput) -> Vec<Quota> {
    output
        .untagged
        .into_iter()
        .filter_map(|resp| match resp {
            UntaggedResponse::Quota(quota) => Some(quota),
            _ => None,
        })
        .collect()
}
