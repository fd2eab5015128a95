//! Integration tests for the repository facade: translation, paging with
//! totals, hydration on read and reference collapsing on write.

use std::sync::Arc;

use docbridge::application::Repository;
use docbridge::doc;
use docbridge::domain::{Condition, ObjectId, Operator, Query, SortDirection, Value};
use docbridge::error::Error;
use docbridge::testkit::fixtures::{self, id, reference};
use docbridge::testkit::store::{MemoryStore, StoreCall};
use tokio_test::{assert_err, assert_ok};

fn repository(store: &Arc<MemoryStore>) -> Repository {
    Repository::new(store.clone(), fixtures::registry())
}

/// 100 people aged 19..=64 plus 30 outside the range.
fn population() -> MemoryStore {
    let adults = (0..100).map(|i| fixtures::person_doc(i, 19 + (i % 46) as i64));
    let others = (100..130).map(|i| fixtures::person_doc(i, if i % 2 == 0 { 12 } else { 70 }));
    MemoryStore::new().with_documents("people", adults.chain(others).collect())
}

// ---------------------------------------------------------------------------
// Paging with totals
// ---------------------------------------------------------------------------

#[tokio::test]
async fn page_with_total_ignores_skip_and_limit() {
    let store = Arc::new(population());
    let query = Query::new()
        .filter(
            "age",
            Condition::ops([("greaterThan", 18), ("lessThan", 65)]),
        )
        .sort_by("name", SortDirection::Ascending)
        .skip(10)
        .limit(5)
        .with_count();

    let page = assert_ok!(repository(&store).find("Person", &query).await);

    assert_eq!(page.total, Some(100));
    let names: Vec<&str> = page
        .documents
        .iter()
        .filter_map(|d| d.get("name").and_then(Value::as_str))
        .collect();
    assert_eq!(
        names,
        vec!["person-010", "person-011", "person-012", "person-013", "person-014"]
    );

    let expected = doc! { "age" => doc! { "$gt" => 18, "$lt" => 65 } };
    let calls = store.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().any(|c| matches!(
        c,
        StoreCall::FindMany { filter, options, .. }
            if *filter == expected && options.skip == Some(10) && options.limit == Some(5)
    )));
    assert!(calls
        .iter()
        .any(|c| matches!(c, StoreCall::Count { filter, .. } if *filter == expected)));
}

#[tokio::test]
async fn page_without_count_flag_has_no_total() {
    let store = Arc::new(population());
    let query = Query::new().where_eq("age", 70);

    let page = assert_ok!(repository(&store).find("Person", &query).await);

    assert_eq!(page.total, None);
    assert_eq!(page.documents.len(), 15);
    assert_eq!(store.reads(), 1);
}

#[tokio::test]
async fn count_applies_conditions_only() {
    let store = Arc::new(population());
    let query = Query::new()
        .where_op("age", Operator::LessThan, 18)
        .limit(1);

    assert_eq!(assert_ok!(repository(&store).count("Person", &query).await), 15);
}

#[tokio::test]
async fn embedded_path_conditions_reach_the_store() {
    let store = Arc::new(population());
    let query = Query::new()
        .where_eq("address.city", "Lima")
        .where_op("age", Operator::GreaterThanOrEqual, 65);

    let page = assert_ok!(repository(&store).find("Person", &query).await);

    assert_eq!(page.documents.len(), 15);
}

#[tokio::test]
async fn unknown_operator_is_rejected_by_the_store() {
    let store = Arc::new(population());
    let query = Query::new().filter("name", Condition::ops([("$near", "x")]));

    let err = assert_err!(repository(&store).find("Person", &query).await);
    assert!(matches!(err, Error::Store(_)));
}

#[tokio::test]
async fn equality_and_operator_on_one_field_both_apply() {
    let store = Arc::new(population());
    let contradictory = Query::new()
        .where_eq("age", 30)
        .where_op("age", Operator::LessThan, 18);
    let narrowed = Query::new()
        .where_op("age", Operator::GreaterThan, 60)
        .where_op("age", Operator::GreaterThan, 62)
        .with_count();

    let page = assert_ok!(repository(&store).find("Person", &contradictory).await);
    assert!(page.documents.is_empty());

    let page = assert_ok!(repository(&store).find("Person", &narrowed).await);
    let ages: Vec<i64> = page
        .documents
        .iter()
        .filter_map(|d| d.get("age").and_then(Value::as_i64))
        .collect();
    assert!(ages.iter().all(|age| *age > 62), "ages: {ages:?}");
    assert_eq!(page.total, Some(ages.len() as u64));
}

#[tokio::test]
async fn unknown_entity_is_reported() {
    let store = Arc::new(MemoryStore::new());
    let err = assert_err!(repository(&store).find("Invoice", &Query::new()).await);
    assert!(matches!(err, Error::UnknownEntity { ref entity } if entity == "Invoice"));
}

// ---------------------------------------------------------------------------
// Reads hydrate and decode
// ---------------------------------------------------------------------------

#[tokio::test]
async fn find_returns_decoded_hydrated_documents() {
    let store = Arc::new(fixtures::order_store());
    let query = Query::new().where_op("_id", Operator::In, vec!["O1", "O3"]);

    let page = assert_ok!(repository(&store).find("Order", &query).await);

    assert_eq!(page.documents.len(), 2);
    let order = &page.documents[0];
    assert_eq!(order.get("_id"), Some(&Value::from("O1")));
    assert!(matches!(order.get("placedAt"), Some(Value::DateTime(_))));
    assert!(!order.contains_key("placed_at"));
    let customer = order.get("customer").and_then(Value::as_resolved).unwrap();
    assert_eq!(customer.get("name"), Some(&Value::from("Ada")));
}

#[tokio::test]
async fn find_by_id_hydrates_one_document() {
    let store = Arc::new(fixtures::order_store());

    let order = assert_ok!(repository(&store).find_by_id("Order", "O2").await).unwrap();

    let lines = order.get("lines").and_then(Value::as_array).unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(store.id_fetches("orders"), vec![vec![id("O2")]]);
}

#[tokio::test]
async fn find_by_id_for_missing_document_is_none() {
    let store = Arc::new(fixtures::order_store());
    let found = assert_ok!(repository(&store).find_by_id("Order", "O404").await);
    assert!(found.is_none());
}

#[tokio::test]
async fn find_by_id_requires_identifier_field() {
    let store = Arc::new(MemoryStore::new());
    let err = assert_err!(repository(&store).find_by_id("AuditEntry", "A1").await);
    assert!(matches!(err, Error::MissingIdentifier { ref entity } if entity == "AuditEntry"));
    assert!(store.calls().is_empty());
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn save_collapses_relations_and_encodes() {
    let store = Arc::new(fixtures::order_store());
    let repo = repository(&store);
    let mut order = assert_ok!(repo.find_by_id("Order", "O1").await).unwrap();
    order.insert("total".to_string(), Value::from(42));

    assert_ok!(repo.save("Order", order).await);

    let stored = store
        .documents("orders")
        .into_iter()
        .find(|d| d.get("_id") == Some(&Value::ObjectId(ObjectId::new("O1"))))
        .unwrap();
    assert_eq!(stored.get("total"), Some(&Value::from(42)));
    assert_eq!(stored.get("customer"), Some(&reference("customers", "C1")));
    assert_eq!(
        stored.get("lines"),
        Some(&Value::Array(vec![
            reference("order_lines", "L2"),
            reference("order_lines", "L1"),
        ]))
    );
    assert!(matches!(stored.get("placed_at"), Some(Value::DateTime(_))));
    assert!(!stored.contains_key("placedAt"));
    assert_eq!(store.documents("orders").len(), 3);
}

#[tokio::test]
async fn save_requires_identifier_value() {
    let store = Arc::new(MemoryStore::new());
    let err = assert_err!(repository(&store).save("Order", doc! { "total" => 1 }).await);
    assert!(matches!(err, Error::MissingIdentifierValue { .. }));
    assert!(store.documents("orders").is_empty());
}

#[tokio::test]
async fn save_requires_identifier_field() {
    let store = Arc::new(MemoryStore::new());
    let err = assert_err!(
        repository(&store)
            .save("AuditEntry", doc! { "message" => "hi" })
            .await
    );
    assert!(matches!(err, Error::MissingIdentifier { .. }));
}

#[tokio::test]
async fn delete_removes_by_identifier() {
    let store = Arc::new(fixtures::order_store());
    let repo = repository(&store);

    assert!(assert_ok!(repo.delete("Order", "O2").await));
    assert!(!assert_ok!(repo.delete("Order", "O2").await));
    assert_eq!(store.documents("orders").len(), 2);

    let err = assert_err!(repo.delete("AuditEntry", "A1").await);
    assert!(matches!(err, Error::MissingIdentifier { .. }));
}

#[tokio::test]
async fn saved_back_pointer_resolves_inverse_relation() {
    let store = Arc::new(MemoryStore::new());
    let repo = Repository::new(store.clone(), fixtures::linked_registry());

    assert_ok!(repo.save("Customer", doc! { "_id" => "C1", "name" => "Ada" }).await);
    assert_ok!(
        repo.save(
            "Profile",
            doc! { "_id" => "PR1", "bio" => "regular", "customer" => "C1" },
        )
        .await
    );
    assert_eq!(
        store.documents("profiles")[0].get("customer"),
        Some(&reference("customers", "C1"))
    );

    let customer = assert_ok!(repo.find_by_id("Customer", "C1").await).unwrap();
    let profile = customer
        .get("profile")
        .and_then(Value::as_resolved)
        .unwrap_or_else(|| panic!("profile not hydrated: {:?}", customer.get("profile")));
    assert_eq!(profile.get("_id"), Some(&Value::from("PR1")));
    assert_eq!(profile.get("bio"), Some(&Value::from("regular")));

    let profile = assert_ok!(repo.find_by_id("Profile", "PR1").await).unwrap();
    let owner = profile.get("customer").and_then(Value::as_resolved).unwrap();
    assert_eq!(owner.get("name"), Some(&Value::from("Ada")));
}
