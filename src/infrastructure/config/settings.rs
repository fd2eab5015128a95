//! Adapter configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all adapter settings.
//! Configuration is loaded from a TOML file; the store may be given either as
//! a `[store]` table or as a single `store_url` connection string.
//!
//! # Example
//!
//! ```no_run
//! use docbridge::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("docbridge.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::Deserialize;

use super::logging::LoggingConfig;
use super::resolver::ResolverConfig;
use super::store::StoreConfig;
use crate::error::{ConfigError, Result};

/// Main adapter configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Store connection settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Connection string; replaces `store` when present.
    #[serde(default)]
    pub store_url: Option<String>,

    /// Relation hydration settings.
    #[serde(default)]
    pub resolver: ResolverConfig,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The TOML content is malformed
    /// - `store_url` cannot be parsed
    /// - Validation fails (e.g., port 0)
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;

        if let Some(ref url) = config.store_url {
            config.store = StoreConfig::from_url(url)?;
        }

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or [`Config::parse_toml`]
    /// fails.
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<()> {
        self.store.validate()?;
        self.resolver.validate()?;
        Ok(())
    }

    /// Initialize logging based on configuration.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}
