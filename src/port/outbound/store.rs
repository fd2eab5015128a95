//! Store client port.
//!
//! The driver behind this trait is a thin pass-through: filters arrive already
//! in store syntax and documents come back as raw wire values.

use async_trait::async_trait;

use crate::domain::{Document, ObjectId, Value};
use crate::error::Result;

/// Store-native filter document (`{field: value}` or `{field: {"$op": operand}}`).
pub type Filter = Document;

/// Sort, skip and limit applied by the store to a `find_many` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    /// Stored field name to `1` (ascending) or `-1` (descending).
    pub sort: Vec<(String, i32)>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

/// Operations consumed from the document store driver.
///
/// # Implementation Notes
///
/// - Implementations must be thread-safe (`Send + Sync`)
/// - `find_by_id_in` must answer a whole id set in one round trip
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Find documents in `collection` matching `filter`.
    async fn find_many(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>>;

    /// Fetch every document whose `id_field` is one of `ids`.
    ///
    /// Order of the returned documents is unspecified.
    async fn find_by_id_in(
        &self,
        collection: &str,
        id_field: &str,
        ids: &[ObjectId],
    ) -> Result<Vec<Document>> {
        let operand = Value::Array(ids.iter().cloned().map(Value::ObjectId).collect());
        let mut ops = Document::new();
        ops.insert("$in".to_string(), operand);
        let mut filter = Filter::new();
        filter.insert(id_field.to_string(), Value::Document(ops));
        self.find_many(collection, &filter, &FindOptions::default())
            .await
    }

    /// Count documents in `collection` matching `filter`.
    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64>;

    /// Insert or replace the document identified by its `id_field` value.
    async fn upsert(&self, collection: &str, id_field: &str, document: Document) -> Result<()>;

    /// Delete a document by id. Returns true if it existed.
    async fn delete(&self, collection: &str, id_field: &str, id: &ObjectId) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use parking_lot::Mutex;

    /// Client that only answers `find_many`, recording the filter.
    #[derive(Default)]
    struct FilterRecorder {
        seen: Mutex<Vec<Filter>>,
    }

    #[async_trait]
    impl StoreClient for FilterRecorder {
        async fn find_many(
            &self,
            _collection: &str,
            filter: &Filter,
            _options: &FindOptions,
        ) -> Result<Vec<Document>> {
            self.seen.lock().push(filter.clone());
            Ok(Vec::new())
        }

        async fn count(&self, _collection: &str, _filter: &Filter) -> Result<u64> {
            Ok(0)
        }

        async fn upsert(&self, _collection: &str, _id_field: &str, _document: Document) -> Result<()> {
            Ok(())
        }

        async fn delete(&self, _collection: &str, _id_field: &str, _id: &ObjectId) -> Result<bool> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn default_id_lookup_is_one_in_query() {
        let client = FilterRecorder::default();
        let ids = vec![ObjectId::new("C1"), ObjectId::new("C2")];

        client.find_by_id_in("customers", "_id", &ids).await.unwrap();

        let expected = doc! { "_id" => doc! { "$in" => ids } };
        assert_eq!(client.seen.lock().as_slice(), &[expected]);
    }
}
