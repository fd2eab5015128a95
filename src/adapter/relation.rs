//! Relation resolver.
//!
//! Hydrates declared relation fields on a batch of raw documents of one
//! entity type. For each relation field the ids referenced across the whole
//! batch are collected and deduplicated, then fetched from the target
//! collection in one round trip. Fetched targets are hydrated recursively
//! against their own relation declarations before being attached.
//!
//! # Concurrency
//!
//! The batched fetches of one level run concurrently and are joined with
//! `try_join_all`: the first failure drops the remaining fetches and the
//! caller receives only the error. Source documents are not touched until
//! every fetch of the level has succeeded, so a partially hydrated batch is
//! never observable.
//!
//! # Depth
//!
//! Hydration follows the metadata chain with no cap of its own. If two
//! entity types reference each other and their data does too, recursion
//! does not terminate; set [`ResolverConfig::max_depth`] for such schemas.
//! Without a cap, a warning is logged whenever a chain revisits an entity
//! type.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::{try_join_all, BoxFuture};
use tracing::{debug, warn};

use crate::domain::{
    Document, EntityMetadata, Operator, Query, Reference, RelationKind, RelationMetadata, Value,
};
use crate::error::{Error, Result};
use crate::infrastructure::config::resolver::ResolverConfig;
use crate::port::{MetadataRegistry, StoreClient};

use super::codec;
use super::criteria::CriteriaTranslator;

mod batch;

use batch::{FetchPlan, Lookup, ResolvedField};

/// Hydrates relation fields using batched lookups against a [`StoreClient`].
pub struct RelationResolver {
    store: Arc<dyn StoreClient>,
    registry: Arc<dyn MetadataRegistry>,
    config: ResolverConfig,
}

impl RelationResolver {
    pub fn new(store: Arc<dyn StoreClient>, registry: Arc<dyn MetadataRegistry>) -> Self {
        Self::with_config(store, registry, ResolverConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn StoreClient>,
        registry: Arc<dyn MetadataRegistry>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            store,
            registry,
            config,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Hydrate every declared relation field of `documents`.
    ///
    /// Relation values become [`Value::Resolved`] targets (decoded to
    /// domain values), `Null` for dangling single references, or an array
    /// of targets in the source document's own order for list references.
    /// Documents of the batch that point at the same target share one
    /// `Arc`. The batch itself stays in wire form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RelationResolution`] for the first batched fetch
    /// that fails at any level.
    pub async fn resolve(
        &self,
        meta: &EntityMetadata,
        documents: Vec<Document>,
    ) -> Result<Vec<Document>> {
        self.resolve_level(meta, documents, vec![meta.name.clone()])
            .await
    }

    /// `lineage` holds the entity names from the queried entity down to
    /// `meta`; its length minus one is the current depth.
    fn resolve_level<'a>(
        &'a self,
        meta: &'a EntityMetadata,
        mut documents: Vec<Document>,
        lineage: Vec<String>,
    ) -> BoxFuture<'a, Result<Vec<Document>>> {
        Box::pin(async move {
            if documents.is_empty() || meta.relations.is_empty() {
                return Ok(documents);
            }
            let depth = lineage.len() - 1;
            if self.config.max_depth.is_some_and(|max| depth >= max) {
                debug!(entity = %meta.name, depth, "Relation depth cap reached");
                return Ok(documents);
            }

            let source_id = meta.id_field.as_deref();
            let plans: Vec<(&RelationMetadata, FetchPlan)> = meta
                .relations
                .iter()
                .map(|relation| (relation, FetchPlan::collect(relation, source_id, &documents)))
                .filter(|(_, plan)| !plan.is_empty())
                .collect();

            let resolved = try_join_all(
                plans
                    .into_iter()
                    .map(|(relation, plan)| self.fetch(meta, relation, plan, &lineage)),
            )
            .await?;

            for field in &resolved {
                field.apply(&mut documents, source_id);
            }
            Ok(documents)
        })
    }

    async fn fetch(
        &self,
        meta: &EntityMetadata,
        relation: &RelationMetadata,
        plan: FetchPlan,
        lineage: &[String],
    ) -> Result<ResolvedField> {
        self.fetch_targets(meta, relation, plan, lineage)
            .await
            .map_err(|e| Error::relation(&meta.name, &relation.field, e))
    }

    async fn fetch_targets(
        &self,
        meta: &EntityMetadata,
        relation: &RelationMetadata,
        plan: FetchPlan,
        lineage: &[String],
    ) -> Result<ResolvedField> {
        let target = self.registry.require(&relation.target)?;
        let target_id = target.require_id()?;

        if self.config.max_depth.is_none() && lineage.contains(&target.name) {
            warn!(
                entity = %meta.name,
                field = %relation.field,
                target = %target.name,
                "Relation chain revisits an entity type with no depth cap"
            );
        }

        debug!(
            entity = %meta.name,
            field = %relation.field,
            collection = %target.collection,
            ids = plan.ids.len(),
            "Batched relation fetch"
        );

        let (fetched, key_column) = match &plan.lookup {
            Lookup::Forward => {
                let docs = self
                    .store
                    .find_by_id_in(&target.collection, target_id, &plan.ids)
                    .await?;
                (docs, target_id.to_string())
            }
            Lookup::Inverse { column } => {
                let mut keys = plan.ids.iter().cloned().map(Value::ObjectId).collect::<Vec<_>>();
                // A back-pointer declared as a relation is saved as a reference pair.
                if target.relation(column).is_some() {
                    keys.extend(plan.ids.iter().map(|id| {
                        Value::Reference(Reference::new(meta.collection.as_str(), id.clone()))
                    }));
                }
                let query =
                    Query::new().where_op(column.as_str(), Operator::In, Value::Array(keys));
                let translated = CriteriaTranslator::new(&target).translate(&query);
                let docs = self
                    .store
                    .find_many(&target.collection, &translated.filter, &translated.options)
                    .await?;
                (docs, target.column_of(column).to_string())
            }
        };

        // The back-pointer of an inverse target leads to the documents being
        // resolved and stays a stored reference.
        let target = match &plan.lookup {
            Lookup::Inverse { column } if target.relation(column).is_some() => {
                let mut trimmed = (*target).clone();
                trimmed.relations.retain(|r| r.field != *column);
                Arc::new(trimmed)
            }
            _ => target,
        };

        let mut child_lineage = lineage.to_vec();
        child_lineage.push(target.name.clone());
        let hydrated = self.resolve_level(&target, fetched, child_lineage).await?;

        let mut targets = HashMap::with_capacity(hydrated.len());
        for doc in hydrated {
            let Some(key) = doc.get(&key_column).and_then(Value::as_object_id) else {
                continue;
            };
            targets
                .entry(key)
                .or_insert_with(|| Arc::new(codec::decode_document(&target, doc)));
        }

        let dangling = plan.ids.iter().filter(|id| !targets.contains_key(*id)).count();
        if dangling > 0 {
            debug!(
                entity = %meta.name,
                field = %relation.field,
                dangling,
                "References with no matching target"
            );
        }

        let sort = match &relation.kind {
            RelationKind::Many { sort: Some(sort) } => Some((sort.field.clone(), sort.direction)),
            _ => None,
        };

        Ok(ResolvedField {
            field: relation.field.clone(),
            kind: relation.kind.clone(),
            lookup: plan.lookup,
            targets,
            sort,
        })
    }

    /// Collapse hydrated relation fields back to reference tuples for
    /// storage.
    ///
    /// Raw identifiers are wrapped as tuples too. Inverse relations are not
    /// stored on the source document and are removed.
    ///
    /// # Errors
    ///
    /// Returns an error if a relation target is not registered or has no
    /// identifier field.
    pub fn dehydrate(&self, meta: &EntityMetadata, mut document: Document) -> Result<Document> {
        for relation in &meta.relations {
            let Some(value) = document.remove(&relation.field) else {
                continue;
            };
            if matches!(relation.kind, RelationKind::One { inverse: Some(_) }) {
                continue;
            }

            let target = self.registry.require(&relation.target)?;
            let target_id = target.require_id()?;
            let to_reference = |value: Value| -> Value {
                let id = match value {
                    Value::Resolved(ref doc) => doc.get(target_id).and_then(Value::as_object_id),
                    Value::String(_) | Value::ObjectId(_) => value.as_object_id(),
                    other => return other,
                };
                id.map_or(Value::Null, |id| {
                    Value::Reference(Reference::new(target.collection.as_str(), id))
                })
            };

            let value = match value {
                Value::Array(items) => Value::Array(items.into_iter().map(to_reference).collect()),
                other => to_reference(other),
            };
            document.insert(relation.field.clone(), value);
        }
        Ok(document)
    }
}
