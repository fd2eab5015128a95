//! Connection opener port used by the pool manager.

use async_trait::async_trait;

use crate::error::ConnectionError;
use crate::infrastructure::config::store::StoreConfig;

/// Opens live connections to the document store.
///
/// The pool manager guarantees `open` is called at most once per
/// in-flight fingerprint, so implementations need no deduplication of their
/// own.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    /// Live connection handle, shared by every caller of the same fingerprint.
    type Handle: Clone + Send + Sync + 'static;

    /// Open a connection for `config`.
    async fn open(&self, config: &StoreConfig) -> Result<Self::Handle, ConnectionError>;
}
