//! Scripted store connector.
//!
//! Each `open` pops the next scripted result (success when the script is
//! exhausted), optionally sleeps, and returns a handle numbered by the open
//! that produced it.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::ConnectionError;
use crate::infrastructure::config::store::StoreConfig;
use crate::port::StoreConnector;

/// Handle produced by [`ScriptedConnector`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockHandle {
    /// 1 for the first successful or failed open, 2 for the next, and so on.
    pub id: u32,
    pub fingerprint: String,
}

#[derive(Clone, Default)]
pub struct ScriptedConnector {
    script: Arc<Mutex<VecDeque<Result<(), String>>>>,
    delay: Duration,
    opens: Arc<AtomicU32>,
}

impl ScriptedConnector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every open for `delay` before returning.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Make the next unscripted open fail with `reason`.
    #[must_use]
    pub fn then_fail(self, reason: &str) -> Self {
        self.script.lock().push_back(Err(reason.to_string()));
        self
    }

    /// Make the next unscripted open succeed.
    #[must_use]
    pub fn then_succeed(self) -> Self {
        self.script.lock().push_back(Ok(()));
        self
    }

    /// Number of times `open` was entered.
    pub fn open_count(&self) -> u32 {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StoreConnector for ScriptedConnector {
    type Handle = MockHandle;

    async fn open(&self, config: &StoreConfig) -> Result<MockHandle, ConnectionError> {
        let id = self.opens.fetch_add(1, Ordering::SeqCst) + 1;
        let scripted = self.script.lock().pop_front().unwrap_or(Ok(()));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let fingerprint = config.fingerprint().to_string();
        match scripted {
            Ok(()) => Ok(MockHandle { id, fingerprint }),
            Err(reason) => Err(ConnectionError::new(fingerprint, reason)),
        }
    }
}
