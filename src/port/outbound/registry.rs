//! Schema registry port.

use std::sync::Arc;

use crate::domain::EntityMetadata;
use crate::error::{Error, Result};

/// Entity metadata lookup by entity name.
pub trait MetadataRegistry: Send + Sync {
    /// Metadata for `name`, if declared.
    fn entity(&self, name: &str) -> Option<Arc<EntityMetadata>>;

    /// Metadata for `name`, failing with [`Error::UnknownEntity`] if undeclared.
    fn require(&self, name: &str) -> Result<Arc<EntityMetadata>> {
        self.entity(name).ok_or_else(|| Error::UnknownEntity {
            entity: name.to_string(),
        })
    }
}
