//! Connection pool manager.
//!
//! Hands out one live store connection per configuration fingerprint and
//! deduplicates concurrent open requests against a shared [`PoolTable`].
//!
//! # Lifecycle
//!
//! - The first caller for a fingerprint becomes the initializer: it inserts an
//!   initializing entry and performs the single `open` call.
//! - Callers arriving while the entry is initializing queue on it and receive
//!   whatever the initializer produced.
//! - Success turns the entry ready for the lifetime of the table. Failure
//!   removes it, so the next caller retries; the pool never retries on its
//!   own.
//! - An initializer that is dropped mid-open removes its entry. Its waiters
//!   re-check the table and one of them takes over.
//!
//! No deadline is applied to `open`; a caller that wants one wraps
//! [`ConnectionPoolManager::acquire`] in `tokio::time::timeout`.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::infrastructure::config::store::{Fingerprint, StoreConfig};
use crate::port::StoreConnector;

mod state;

pub use state::{EntryState, PoolTable};

use state::Claim;

/// Removes an initializing entry if the initializer is dropped before the
/// open completes.
struct InitGuard<'a, H: Clone> {
    table: &'a PoolTable<H>,
    fingerprint: &'a Fingerprint,
    generation: u64,
    armed: bool,
}

impl<H: Clone> Drop for InitGuard<'_, H> {
    fn drop(&mut self) {
        if self.armed {
            warn!(
                fingerprint = %self.fingerprint,
                "Initializer dropped before open completed, releasing entry"
            );
            self.table.abandon(self.fingerprint, self.generation);
        }
    }
}

/// Deduplicating front end to a [`StoreConnector`].
pub struct ConnectionPoolManager<C: StoreConnector> {
    connector: C,
    table: Arc<PoolTable<C::Handle>>,
}

impl<C: StoreConnector> ConnectionPoolManager<C> {
    /// Create a manager over an existing (usually process-wide) table.
    pub fn new(connector: C, table: Arc<PoolTable<C::Handle>>) -> Self {
        Self { connector, table }
    }

    /// Create a manager with a table of its own.
    pub fn with_fresh_table(connector: C) -> Self {
        Self::new(connector, Arc::new(PoolTable::new()))
    }

    pub fn table(&self) -> &Arc<PoolTable<C::Handle>> {
        &self.table
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Return the live connection for `config`, opening it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`](crate::error::Error::Connection) if the
    /// open performed for this fingerprint failed, whether this caller or an
    /// earlier concurrent one issued it.
    pub async fn acquire(&self, config: &StoreConfig) -> Result<C::Handle> {
        let fingerprint = config.fingerprint();

        // Every pass re-reads the table: the entry may have been completed,
        // failed or abandoned while this caller was suspended.
        loop {
            match self.table.claim(&fingerprint) {
                Claim::Ready(handle) => return Ok(handle),
                Claim::Wait(rx) => {
                    debug!(fingerprint = %fingerprint, "Waiting on in-flight open");
                    match rx.await {
                        Ok(outcome) => return outcome.map_err(Into::into),
                        Err(_) => {
                            debug!(fingerprint = %fingerprint, "Initializer went away, re-checking");
                        }
                    }
                }
                Claim::Initialize(generation) => {
                    return self.initialize(config, &fingerprint, generation).await;
                }
            }
        }
    }

    async fn initialize(
        &self,
        config: &StoreConfig,
        fingerprint: &Fingerprint,
        generation: u64,
    ) -> Result<C::Handle> {
        let mut guard = InitGuard {
            table: &self.table,
            fingerprint,
            generation,
            armed: true,
        };

        debug!(fingerprint = %fingerprint, "Opening store connection");
        let outcome = self.connector.open(config).await;
        guard.armed = false;

        let waiters = self.table.complete(fingerprint, generation, &outcome);
        match &outcome {
            Ok(_) => info!(
                fingerprint = %fingerprint,
                waiters = waiters.len(),
                "Store connection ready"
            ),
            Err(e) => warn!(
                fingerprint = %fingerprint,
                waiters = waiters.len(),
                error = %e,
                "Store connection failed"
            ),
        }

        for waiter in waiters {
            // A waiter that gave up has dropped its receiver.
            let _ = waiter.send(outcome.clone());
        }

        outcome.map_err(Into::into)
    }
}
