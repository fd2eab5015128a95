//! Pool table state shared by every manager that opens connections.
//!
//! All transitions happen under one short-lived lock that is never held
//! across an await.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::error::ConnectionError;
use crate::infrastructure::config::store::Fingerprint;

/// Result of one open attempt, delivered to the initializer and every waiter.
pub(super) type Outcome<H> = Result<H, ConnectionError>;

/// Lifecycle of a single fingerprint.
///
/// Failed opens remove the entry, so there is no stored failed state.
pub(super) enum PoolEntry<H> {
    Initializing {
        /// Distinguishes this attempt from later retries of the same key.
        generation: u64,
        waiters: Vec<oneshot::Sender<Outcome<H>>>,
    },
    Ready(H),
}

/// Snapshot of an entry for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Initializing { waiters: usize },
    Ready,
}

/// What the caller of `claim` has to do next.
pub(super) enum Claim<H> {
    Ready(H),
    Wait(oneshot::Receiver<Outcome<H>>),
    Initialize(u64),
}

/// Process-wide table of store connections keyed by fingerprint.
///
/// Create one per process (or one per test) and share it through an `Arc`.
/// Ready entries live as long as the table.
pub struct PoolTable<H> {
    entries: Mutex<HashMap<Fingerprint, PoolEntry<H>>>,
    next_generation: AtomicU64,
}

impl<H: Clone> PoolTable<H> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(1),
        }
    }

    /// Number of entries, initializing or ready.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn state(&self, fingerprint: &Fingerprint) -> Option<EntryState> {
        self.entries.lock().get(fingerprint).map(|entry| match entry {
            PoolEntry::Initializing { waiters, .. } => EntryState::Initializing {
                waiters: waiters.len(),
            },
            PoolEntry::Ready(_) => EntryState::Ready,
        })
    }

    /// Inspect the entry for `fingerprint` and decide the caller's role.
    ///
    /// Creates an initializing entry when none exists; the caller then owns
    /// the open for the returned generation.
    pub(super) fn claim(&self, fingerprint: &Fingerprint) -> Claim<H> {
        let mut entries = self.entries.lock();
        match entries.get_mut(fingerprint) {
            Some(PoolEntry::Ready(handle)) => Claim::Ready(handle.clone()),
            Some(PoolEntry::Initializing { waiters, .. }) => {
                let (tx, rx) = oneshot::channel();
                waiters.push(tx);
                Claim::Wait(rx)
            }
            None => {
                let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                entries.insert(
                    fingerprint.clone(),
                    PoolEntry::Initializing {
                        generation,
                        waiters: Vec::new(),
                    },
                );
                Claim::Initialize(generation)
            }
        }
    }

    /// Record the outcome of the open for `generation`.
    ///
    /// Success stores the handle; failure removes the entry so a later call
    /// retries. Returns the waiters to release.
    pub(super) fn complete(
        &self,
        fingerprint: &Fingerprint,
        generation: u64,
        outcome: &Outcome<H>,
    ) -> Vec<oneshot::Sender<Outcome<H>>> {
        let mut entries = self.entries.lock();
        let waiters = match entries.get_mut(fingerprint) {
            Some(PoolEntry::Initializing {
                generation: current,
                waiters,
            }) if *current == generation => std::mem::take(waiters),
            _ => return Vec::new(),
        };
        match outcome {
            Ok(handle) => {
                entries.insert(fingerprint.clone(), PoolEntry::Ready(handle.clone()));
            }
            Err(_) => {
                entries.remove(fingerprint);
            }
        }
        waiters
    }

    /// Drop an initializing entry whose initializer went away mid-open.
    ///
    /// Waiters see their channel close and re-check the table.
    pub(super) fn abandon(&self, fingerprint: &Fingerprint, generation: u64) {
        let mut entries = self.entries.lock();
        if matches!(
            entries.get(fingerprint),
            Some(PoolEntry::Initializing { generation: current, .. }) if *current == generation
        ) {
            entries.remove(fingerprint);
        }
    }
}

impl<H: Clone> Default for PoolTable<H> {
    fn default() -> Self {
        Self::new()
    }
}
