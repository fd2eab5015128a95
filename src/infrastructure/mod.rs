//! Infrastructure layer.
//!
//! Provides technical concerns that support the adapter without containing
//! translation or resolution logic.
//!
//! # Submodules
//!
//! - [`config`] - Configuration loading and validation, logging setup
//! - [`pool`] - Connection pool manager keyed by configuration fingerprint

pub mod config;
pub mod pool;

pub use config::settings::Config;
pub use pool::{ConnectionPoolManager, EntryState, PoolTable};
