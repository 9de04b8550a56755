//! Mailbox registry handed to request handlers as opaque state.
//!
//! Pairing and expiry are owned by the handler layer; this only guarantees
//! concurrent, per-key access.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::{mapref::entry::Entry, DashMap};

/// Rendezvous state for one session key.
#[derive(Debug, Clone)]
pub struct Mailbox {
    opened_at: Instant,
}

impl Mailbox {
    fn new() -> Self {
        Self {
            opened_at: Instant::now(),
        }
    }

    pub fn opened_at(&self) -> Instant {
        self.opened_at
    }

    pub fn age(&self) -> Duration {
        self.opened_at.elapsed()
    }
}

// DashMap shards the lock per key so concurrent handlers for different
// sessions never wait on each other
#[derive(Clone, Default)]
pub struct MailboxStore {
    mailboxes: Arc<DashMap<String, Mailbox>>,
}

impl MailboxStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a mailbox for `key`. Refuses keys that are already open.
    pub fn open(&self, key: impl Into<String>) -> bool {
        match self.mailboxes.entry(key.into()) {
            Entry::Occupied(entry) => {
                tracing::debug!("Mailbox '{}' already open", entry.key());
                false
            }
            Entry::Vacant(entry) => {
                entry.insert(Mailbox::new());
                true
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<Mailbox> {
        self.mailboxes.get(key).map(|mailbox| mailbox.clone())
    }

    pub fn close(&self, key: &str) -> Option<Mailbox> {
        self.mailboxes.remove(key).map(|(_, mailbox)| mailbox)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.mailboxes.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.mailboxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mailboxes.is_empty()
    }
}
