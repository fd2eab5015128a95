//! Static metadata registry.
//!
//! A fixed set of entity declarations, built in code or loaded from JSON.
//! Stands in for the schema registry where no dynamic one is available.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::EntityMetadata;
use crate::error::Result;
use crate::port::MetadataRegistry;

/// In-memory [`MetadataRegistry`] keyed by entity name.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    entities: HashMap<String, Arc<EntityMetadata>>,
}

impl StaticRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `meta`, replacing any previous declaration of the same name.
    pub fn register(&mut self, meta: EntityMetadata) {
        self.entities.insert(meta.name.clone(), Arc::new(meta));
    }

    #[must_use]
    pub fn with(mut self, meta: EntityMetadata) -> Self {
        self.register(meta);
        self
    }

    /// Load a JSON array of entity declarations.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not describe a list of entities.
    pub fn from_json(json: &str) -> Result<Self> {
        let entities: Vec<EntityMetadata> = serde_json::from_str(json)?;
        Ok(entities.into_iter().collect())
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl FromIterator<EntityMetadata> for StaticRegistry {
    fn from_iter<I: IntoIterator<Item = EntityMetadata>>(iter: I) -> Self {
        let mut registry = Self::new();
        for meta in iter {
            registry.register(meta);
        }
        registry
    }
}

impl MetadataRegistry for StaticRegistry {
    fn entity(&self, name: &str) -> Option<Arc<EntityMetadata>> {
        self.entities.get(name).cloned()
    }
}
