//! Relation resolver settings.

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Relation resolver configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ResolverConfig {
    /// Maximum number of relation levels hydrated below the queried entity.
    ///
    /// `None` follows the metadata chain as far as it goes. Entity types
    /// whose relations form a cycle need a cap when their data does too.
    #[serde(default)]
    pub max_depth: Option<usize>,
}

impl ResolverConfig {
    #[must_use]
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            max_depth: Some(max_depth),
        }
    }

    #[allow(clippy::result_large_err)]
    pub(crate) fn validate(&self) -> Result<()> {
        if self.max_depth == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "resolver.max_depth",
                reason: "must be > 0 when set".to_string(),
            }
            .into());
        }
        Ok(())
    }
}
