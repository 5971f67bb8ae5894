//! Core IMAP types.
//!
//! Identifier newtypes, compact UID sets, flags, mailbox metadata,
//! capabilities, and response codes. These are protocol-level values
//! shared by the parser, command builder, and connection layers.

mod capability;
mod flags;
mod identifiers;
mod mailbox;
mod response_code;
mod uidset;

pub use capability::{Capabilities, Capability, Status};
pub use flags::{Flag, Flags, Label};
pub use identifiers::{ModSeq, SeqNum, Tag, Uid, UidValidity, UniqueId};
pub use mailbox::{
    Acl, AclEntry, FolderAccess, ListEntry, Mailbox, MailboxAttribute, MetadataEntry, Namespace,
    Namespaces, Quota, QuotaResource, QuotaRoot, SelectInfo, StatusItem,
};
pub use response_code::{FailureReason, ResponseCode};
pub use uidset::{SequenceSet, SetOrder, UidSet};
