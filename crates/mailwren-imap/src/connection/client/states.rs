//! Connection state markers.

/// Connected, greeting consumed, not yet authenticated.
#[derive(Debug)]
pub struct NotAuthenticated;

/// Authenticated; no mailbox selected.
#[derive(Debug)]
pub struct Authenticated;

/// A mailbox is selected.
#[derive(Debug)]
pub struct Selected;
