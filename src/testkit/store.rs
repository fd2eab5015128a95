//! In-memory [`StoreClient`] for tests.
//!
//! Evaluates the store filter syntax produced by the criteria translator
//! (equality, `$eq`, `$ne`, `$gt`, `$gte`, `$lt`, `$lte`, `$in`, `$nin`,
//! `$exists`, `$regex` as a plain substring match, and a top-level `$and`),
//! records every call, and can inject failures and latency per collection.

use std::cmp::Ordering as CmpOrdering;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::{Document, ObjectId, Value};
use crate::error::{Error, Result};
use crate::port::{Filter, FindOptions, StoreClient};

/// A call received by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    FindMany {
        collection: String,
        filter: Filter,
        options: FindOptions,
    },
    FindByIdIn {
        collection: String,
        ids: Vec<ObjectId>,
    },
    Count {
        collection: String,
        filter: Filter,
    },
    Upsert {
        collection: String,
        document: Document,
    },
    Delete {
        collection: String,
        id: ObjectId,
    },
}

impl StoreCall {
    #[must_use]
    pub fn collection(&self) -> &str {
        match self {
            StoreCall::FindMany { collection, .. }
            | StoreCall::FindByIdIn { collection, .. }
            | StoreCall::Count { collection, .. }
            | StoreCall::Upsert { collection, .. }
            | StoreCall::Delete { collection, .. } => collection,
        }
    }
}

/// Tracks concurrently running calls.
struct InFlight<'a> {
    current: &'a AtomicUsize,
}

impl<'a> InFlight<'a> {
    fn enter(current: &'a AtomicUsize, max: &AtomicUsize) -> Self {
        let now = current.fetch_add(1, Ordering::SeqCst) + 1;
        max.fetch_max(now, Ordering::SeqCst);
        Self { current }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Collections of documents held in memory.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<Document>>>,
    calls: Mutex<Vec<StoreCall>>,
    failing: Mutex<HashSet<String>>,
    latency: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed `collection` with `documents`.
    #[must_use]
    pub fn with_documents(self, collection: &str, documents: Vec<Document>) -> Self {
        self.collections
            .lock()
            .entry(collection.to_string())
            .or_default()
            .extend(documents);
        self
    }

    /// Delay every call by `latency` so concurrent calls overlap.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make every read against `collection` fail.
    #[must_use]
    pub fn failing(self, collection: &str) -> Self {
        self.failing.lock().insert(collection.to_string());
        self
    }

    pub fn insert(&self, collection: &str, document: Document) {
        self.collections
            .lock()
            .entry(collection.to_string())
            .or_default()
            .push(document);
    }

    #[must_use]
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.collections
            .lock()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Number of read round trips (find, batched find, count).
    #[must_use]
    pub fn reads(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| !matches!(c, StoreCall::Upsert { .. } | StoreCall::Delete { .. }))
            .count()
    }

    /// Id sets requested through `find_by_id_in` against `collection`.
    #[must_use]
    pub fn id_fetches(&self, collection: &str) -> Vec<Vec<ObjectId>> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                StoreCall::FindByIdIn { collection: col, ids } if col == collection => {
                    Some(ids.clone())
                }
                _ => None,
            })
            .collect()
    }

    /// Highest number of calls that were running at the same time.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn begin(&self, call: StoreCall) -> Result<InFlight<'_>> {
        let collection = call.collection().to_string();
        self.calls.lock().push(call);
        let guard = InFlight::enter(&self.in_flight, &self.max_in_flight);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.failing.lock().contains(&collection) {
            return Err(Error::Store(format!("injected failure reading {collection}")));
        }
        Ok(guard)
    }

    fn select(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>> {
        let collections = self.collections.lock();
        let mut selected = Vec::new();
        for doc in collections.get(collection).into_iter().flatten() {
            if matches(doc, filter)? {
                selected.push(doc.clone());
            }
        }
        Ok(selected)
    }
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn find_many(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>> {
        let _guard = self
            .begin(StoreCall::FindMany {
                collection: collection.to_string(),
                filter: filter.clone(),
                options: options.clone(),
            })
            .await?;

        let mut docs = self.select(collection, filter)?;
        if !options.sort.is_empty() {
            docs.sort_by(|a, b| compare_by(a, b, &options.sort));
        }
        let skip = usize::try_from(options.skip.unwrap_or(0)).unwrap_or(usize::MAX);
        let limit = options
            .limit
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));
        Ok(docs.into_iter().skip(skip).take(limit).collect())
    }

    async fn find_by_id_in(
        &self,
        collection: &str,
        id_field: &str,
        ids: &[ObjectId],
    ) -> Result<Vec<Document>> {
        let _guard = self
            .begin(StoreCall::FindByIdIn {
                collection: collection.to_string(),
                ids: ids.to_vec(),
            })
            .await?;

        let wanted: HashSet<&ObjectId> = ids.iter().collect();
        let collections = self.collections.lock();
        Ok(collections
            .get(collection)
            .into_iter()
            .flatten()
            .filter(|doc| {
                doc.get(id_field)
                    .and_then(Value::as_object_id)
                    .is_some_and(|id| wanted.contains(&id))
            })
            .cloned()
            .collect())
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64> {
        let _guard = self
            .begin(StoreCall::Count {
                collection: collection.to_string(),
                filter: filter.clone(),
            })
            .await?;
        Ok(self.select(collection, filter)?.len() as u64)
    }

    async fn upsert(&self, collection: &str, id_field: &str, document: Document) -> Result<()> {
        self.calls.lock().push(StoreCall::Upsert {
            collection: collection.to_string(),
            document: document.clone(),
        });
        let id = document.get(id_field).cloned();
        let mut collections = self.collections.lock();
        let docs = collections.entry(collection.to_string()).or_default();
        match docs.iter_mut().find(|d| id.is_some() && d.get(id_field) == id.as_ref()) {
            Some(existing) => *existing = document,
            None => docs.push(document),
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id_field: &str, id: &ObjectId) -> Result<bool> {
        self.calls.lock().push(StoreCall::Delete {
            collection: collection.to_string(),
            id: id.clone(),
        });
        let mut collections = self.collections.lock();
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|d| d.get(id_field).and_then(Value::as_object_id).as_ref() != Some(id));
        Ok(docs.len() != before)
    }
}

fn compare_by(a: &Document, b: &Document, sort: &[(String, i32)]) -> CmpOrdering {
    for (path, direction) in sort {
        let av = lookup(a, path).unwrap_or(&Value::Null);
        let bv = lookup(b, path).unwrap_or(&Value::Null);
        let ord = if *direction < 0 {
            bv.sort_cmp(av)
        } else {
            av.sort_cmp(bv)
        };
        if ord != CmpOrdering::Equal {
            return ord;
        }
    }
    CmpOrdering::Equal
}

fn lookup<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = doc.get(segments.next()?)?;
    for segment in segments {
        current = current.as_document()?.get(segment)?;
    }
    Some(current)
}

fn is_operator_set(doc: &Document) -> bool {
    !doc.is_empty() && doc.keys().all(|k| k.starts_with('$'))
}

fn matches(doc: &Document, filter: &Filter) -> Result<bool> {
    for (path, condition) in filter {
        if path == "$and" {
            let Some(clauses) = condition.as_array() else {
                return Err(Error::Store("$and expects an array of filters".to_string()));
            };
            for clause in clauses {
                let Some(clause) = clause.as_document() else {
                    return Err(Error::Store("$and expects an array of filters".to_string()));
                };
                if !matches(doc, clause)? {
                    return Ok(false);
                }
            }
            continue;
        }
        let actual = lookup(doc, path);
        let ok = match condition {
            Value::Document(ops) if is_operator_set(ops) => {
                let mut all = true;
                for (op, operand) in ops {
                    if !apply_operator(op, actual, operand)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            expected => equals(actual, expected),
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn equals(actual: Option<&Value>, expected: &Value) -> bool {
    match actual {
        None => expected.is_null(),
        Some(Value::Array(items)) if !matches!(expected, Value::Array(_)) => {
            items.contains(expected)
        }
        Some(value) => value == expected,
    }
}

fn compare(a: &Value, b: &Value) -> Option<CmpOrdering> {
    match (a, b) {
        (Value::Int(_) | Value::Double(_), Value::Int(_) | Value::Double(_))
        | (Value::String(_), Value::String(_))
        | (Value::DateTime(_), Value::DateTime(_))
        | (Value::ObjectId(_), Value::ObjectId(_)) => Some(a.sort_cmp(b)),
        _ => None,
    }
}

fn apply_operator(op: &str, actual: Option<&Value>, operand: &Value) -> Result<bool> {
    let ordered = |accept: fn(CmpOrdering) -> bool| {
        actual
            .and_then(|a| compare(a, operand))
            .is_some_and(accept)
    };
    Ok(match op {
        "$eq" => equals(actual, operand),
        "$ne" => !equals(actual, operand),
        "$gt" => ordered(|o| o == CmpOrdering::Greater),
        "$gte" => ordered(|o| o != CmpOrdering::Less),
        "$lt" => ordered(|o| o == CmpOrdering::Less),
        "$lte" => ordered(|o| o != CmpOrdering::Greater),
        "$in" => operand
            .as_array()
            .is_some_and(|list| list.iter().any(|e| equals(actual, e))),
        "$nin" => !operand
            .as_array()
            .is_some_and(|list| list.iter().any(|e| equals(actual, e))),
        "$exists" => matches!(operand, Value::Bool(true)) == actual.is_some(),
        "$regex" => match (actual.and_then(Value::as_str), operand.as_str()) {
            (Some(haystack), Some(needle)) => haystack.contains(needle),
            _ => false,
        },
        other => return Err(Error::Store(format!("unsupported operator {other}"))),
    })
}
