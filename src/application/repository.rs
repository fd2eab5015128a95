//! Session-facing repository.
//!
//! Reads translate the query, fetch from the store, hydrate relations and
//! decode the result to domain values. Writes collapse hydrated relations
//! back to reference pairs and encode before handing the document to the
//! store.

use std::sync::Arc;

use tracing::debug;

use crate::adapter::codec;
use crate::adapter::{CriteriaTranslator, RelationResolver};
use crate::domain::{Document, EntityMetadata, ObjectId, Page, Query, Value};
use crate::error::{Error, Result};
use crate::infrastructure::config::resolver::ResolverConfig;
use crate::port::{MetadataRegistry, StoreClient};

/// Entry point for reading and writing entities by name.
pub struct Repository {
    store: Arc<dyn StoreClient>,
    registry: Arc<dyn MetadataRegistry>,
    resolver: RelationResolver,
}

impl Repository {
    pub fn new(store: Arc<dyn StoreClient>, registry: Arc<dyn MetadataRegistry>) -> Self {
        Self::with_resolver_config(store, registry, ResolverConfig::default())
    }

    pub fn with_resolver_config(
        store: Arc<dyn StoreClient>,
        registry: Arc<dyn MetadataRegistry>,
        config: ResolverConfig,
    ) -> Self {
        let resolver = RelationResolver::with_config(Arc::clone(&store), Arc::clone(&registry), config);
        Self {
            store,
            registry,
            resolver,
        }
    }

    pub fn resolver(&self) -> &RelationResolver {
        &self.resolver
    }

    /// Run `query` against `entity` and return one hydrated page.
    ///
    /// When the query asks for a count, the total is fetched concurrently
    /// with the page and ignores skip and limit.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is unknown, a store call fails, or
    /// relation resolution fails.
    pub async fn find(&self, entity: &str, query: &Query) -> Result<Page> {
        let meta = self.registry.require(entity)?;
        let translated = CriteriaTranslator::new(&meta).translate(query);
        let page = self
            .store
            .find_many(&meta.collection, &translated.filter, &translated.options);

        let (documents, total) = if translated.count {
            let count = self.store.count(&meta.collection, &translated.filter);
            let (documents, total) = tokio::try_join!(page, count)?;
            (documents, Some(total))
        } else {
            (page.await?, None)
        };

        debug!(
            entity = %meta.name,
            returned = documents.len(),
            total = ?total,
            "Query executed"
        );

        let documents = self.hydrate(&meta, documents).await?;
        Ok(Page { documents, total })
    }

    /// Number of `entity` documents matching the conditions of `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is unknown or the store call fails.
    pub async fn count(&self, entity: &str, query: &Query) -> Result<u64> {
        let meta = self.registry.require(entity)?;
        let filter = CriteriaTranslator::new(&meta).filter(query);
        self.store.count(&meta.collection, &filter).await
    }

    /// Load one hydrated document by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingIdentifier`] if the entity declares no
    /// identifier field, or any store or resolution error.
    pub async fn find_by_id(
        &self,
        entity: &str,
        id: impl Into<ObjectId>,
    ) -> Result<Option<Document>> {
        let meta = self.registry.require(entity)?;
        let id_field = meta.require_id()?;
        let found = self
            .store
            .find_by_id_in(&meta.collection, id_field, &[id.into()])
            .await?;
        Ok(self.hydrate(&meta, found).await?.into_iter().next())
    }

    /// Store `document`, replacing any stored document with the same
    /// identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingIdentifier`] if the entity declares no
    /// identifier field and [`Error::MissingIdentifierValue`] if the document
    /// carries no identifier.
    pub async fn save(&self, entity: &str, document: Document) -> Result<()> {
        let meta = self.registry.require(entity)?;
        let id_field = meta.require_id()?;
        if document
            .get(id_field)
            .and_then(Value::as_object_id)
            .is_none()
        {
            return Err(Error::MissingIdentifierValue {
                entity: meta.name.clone(),
                field: id_field.to_string(),
            });
        }

        let document = self.resolver.dehydrate(&meta, document)?;
        let document = codec::encode_document(&meta, document);
        self.store.upsert(&meta.collection, id_field, document).await
    }

    /// Delete the document with identifier `id`. Returns whether one was
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingIdentifier`] if the entity declares no
    /// identifier field, or the store error.
    pub async fn delete(&self, entity: &str, id: impl Into<ObjectId>) -> Result<bool> {
        let meta = self.registry.require(entity)?;
        let id_field = meta.require_id()?;
        self.store.delete(&meta.collection, id_field, &id.into()).await
    }

    async fn hydrate(&self, meta: &EntityMetadata, documents: Vec<Document>) -> Result<Vec<Document>> {
        let documents = self.resolver.resolve(meta, documents).await?;
        Ok(documents
            .into_iter()
            .map(|doc| codec::decode_document(meta, doc))
            .collect())
    }
}
