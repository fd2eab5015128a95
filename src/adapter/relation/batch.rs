//! Per-relation batching: collecting ids from a batch of source documents
//! and writing hydrated targets back into them.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::domain::{Document, ObjectId, RelationKind, RelationMetadata, SortDirection, Value};

/// How the targets of one relation field are looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Lookup {
    /// Source documents hold the target ids; fetch targets by their id.
    Forward,
    /// Targets hold the source id in `column`; fetch targets by that column.
    Inverse { column: String },
}

/// Ids to fetch for one relation field across the whole batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct FetchPlan {
    pub(super) lookup: Lookup,
    /// Deduplicated, in first-seen order.
    pub(super) ids: Vec<ObjectId>,
}

impl FetchPlan {
    /// Collect the ids referenced by `relation` across `documents`.
    ///
    /// `source_id_field` is only consulted for inverse relations.
    pub(super) fn collect(
        relation: &RelationMetadata,
        source_id_field: Option<&str>,
        documents: &[Document],
    ) -> Self {
        let (lookup, raw): (Lookup, Vec<ObjectId>) = match &relation.kind {
            RelationKind::One {
                inverse: Some(column),
            } => {
                let ids = source_id_field
                    .map(|id_field| {
                        documents
                            .iter()
                            .filter_map(|doc| doc.get(id_field).and_then(Value::as_object_id))
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default();
                (
                    Lookup::Inverse {
                        column: column.clone(),
                    },
                    ids,
                )
            }
            RelationKind::One { inverse: None } => (
                Lookup::Forward,
                documents
                    .iter()
                    .filter_map(|doc| doc.get(&relation.field))
                    .filter_map(Value::as_object_id)
                    .collect(),
            ),
            RelationKind::Many { .. } => (
                Lookup::Forward,
                documents
                    .iter()
                    .filter_map(|doc| doc.get(&relation.field))
                    .flat_map(reference_list)
                    .collect(),
            ),
        };

        Self {
            lookup,
            ids: dedup(raw),
        }
    }

    pub(super) fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Ids held by a list-reference value. A lone reference counts as a list
/// of one.
fn reference_list(value: &Value) -> Vec<ObjectId> {
    match value {
        Value::Array(items) => items.iter().filter_map(Value::as_object_id).collect(),
        Value::Null => Vec::new(),
        other => other.as_object_id().into_iter().collect(),
    }
}

fn dedup(ids: Vec<ObjectId>) -> Vec<ObjectId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

/// Hydrated targets for one relation field, keyed by the lookup id.
#[derive(Debug)]
pub(super) struct ResolvedField {
    pub(super) field: String,
    pub(super) kind: RelationKind,
    pub(super) lookup: Lookup,
    pub(super) targets: HashMap<ObjectId, Arc<Document>>,
    /// Field and direction for ordering list references.
    pub(super) sort: Option<(String, SortDirection)>,
}

impl ResolvedField {
    /// Replace raw references in every source document with hydrated
    /// targets. Ids missing from `targets` are dangling: single references
    /// become `Null`, list entries are dropped.
    pub(super) fn apply(&self, documents: &mut [Document], source_id_field: Option<&str>) {
        for doc in documents.iter_mut() {
            let replacement = match (&self.kind, &self.lookup) {
                (RelationKind::One { .. }, Lookup::Inverse { .. }) => {
                    let Some(id) = source_id_field
                        .and_then(|f| doc.get(f))
                        .and_then(Value::as_object_id)
                    else {
                        continue;
                    };
                    Some(self.single(&id))
                }
                (RelationKind::One { .. }, Lookup::Forward) => doc
                    .get(&self.field)
                    .and_then(Value::as_object_id)
                    .map(|id| self.single(&id)),
                (RelationKind::Many { .. }, _) => match doc.get(&self.field) {
                    None | Some(Value::Null) => None,
                    Some(value) => self.list(value),
                },
            };
            if let Some(value) = replacement {
                doc.insert(self.field.clone(), value);
            }
        }
    }

    fn single(&self, id: &ObjectId) -> Value {
        self.targets
            .get(id)
            .map_or(Value::Null, |target| Value::Resolved(Arc::clone(target)))
    }

    /// Hydrate one document's list in its own order, or `None` when the
    /// value holds no references at all.
    fn list(&self, value: &Value) -> Option<Value> {
        let ids = reference_list(value);
        if ids.is_empty() {
            return None;
        }
        let mut hydrated: Vec<Arc<Document>> = ids
            .iter()
            .filter_map(|id| self.targets.get(id).cloned())
            .collect();
        if let Some((column, direction)) = &self.sort {
            hydrated.sort_by(|a, b| {
                let a = a.get(column).unwrap_or(&Value::Null);
                let b = b.get(column).unwrap_or(&Value::Null);
                match direction {
                    SortDirection::Ascending => a.sort_cmp(b),
                    SortDirection::Descending => b.sort_cmp(a),
                }
            });
        }
        Some(Value::Array(
            hydrated.into_iter().map(Value::Resolved).collect(),
        ))
    }
}
