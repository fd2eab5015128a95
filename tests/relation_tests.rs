//! Integration tests for batched relation hydration against the in-memory
//! store.

use std::sync::Arc;

use docbridge::adapter::{RelationResolver, StaticRegistry};
use docbridge::doc;
use docbridge::domain::{Document, EntityMetadata, RelationMetadata, Value};
use docbridge::error::Error;
use docbridge::port::MetadataRegistry;
use docbridge::testkit::fixtures::{self, id, reference};
use docbridge::testkit::store::MemoryStore;

fn customer_of(order: &Document) -> Option<&Arc<Document>> {
    order.get("customer").and_then(Value::as_resolved)
}

#[tokio::test]
async fn orders_sharing_a_customer_share_one_instance() {
    let store = Arc::new(fixtures::order_store());
    let resolver = RelationResolver::new(store.clone(), fixtures::registry());

    let orders = resolver
        .resolve(&fixtures::order(), fixtures::orders())
        .await
        .unwrap();

    assert_eq!(store.id_fetches("customers").len(), 1);
    assert_eq!(store.id_fetches("customers")[0], vec![id("C1"), id("C2")]);
    let first = customer_of(&orders[0]).unwrap();
    let third = customer_of(&orders[2]).unwrap();
    assert!(Arc::ptr_eq(first, third));
    assert!(!Arc::ptr_eq(first, customer_of(&orders[1]).unwrap()));
}

#[tokio::test]
async fn missing_customer_is_absent_not_an_error() {
    let store = Arc::new(fixtures::order_store());
    let resolver = RelationResolver::new(store.clone(), fixtures::registry());
    let orders = vec![doc! { "_id" => id("O1"), "customer" => reference("customers", "C9") }];

    let orders = resolver.resolve(&fixtures::order(), orders).await.unwrap();

    assert_eq!(orders[0].get("customer"), Some(&Value::Null));
}

#[tokio::test]
async fn round_trips_do_not_grow_with_batch_size() {
    let customers: Vec<Document> = (0..50)
        .map(|i| doc! { "_id" => id(&format!("C{i}")), "name" => format!("customer-{i}") })
        .collect();
    let orders: Vec<Document> = (0..500)
        .map(|i| {
            doc! {
                "_id" => id(&format!("O{i}")),
                "customer" => reference("customers", &format!("C{}", i % 50)),
            }
        })
        .collect();
    let store = Arc::new(MemoryStore::new().with_documents("customers", customers));
    let registry = StaticRegistry::new()
        .with(
            EntityMetadata::new("Order", "orders")
                .with_id("_id")
                .with_relation(RelationMetadata::one("customer", "Customer")),
        )
        .with(EntityMetadata::new("Customer", "customers").with_id("_id"));
    let resolver = RelationResolver::new(store.clone(), Arc::new(registry));

    let meta = EntityMetadata::new("Order", "orders")
        .with_id("_id")
        .with_relation(RelationMetadata::one("customer", "Customer"));
    let orders = resolver.resolve(&meta, orders).await.unwrap();

    assert_eq!(store.reads(), 1);
    assert_eq!(store.id_fetches("customers")[0].len(), 50);
    assert!(orders.iter().all(|o| customer_of(o).is_some()));
}

#[tokio::test]
async fn registry_loaded_from_json_drives_resolution() {
    let json = r#"[
        {
            "name": "Order",
            "collection": "orders",
            "id_field": "_id",
            "relations": [{ "field": "customer", "target": "Customer", "kind": "one" }]
        },
        { "name": "Customer", "collection": "customers", "id_field": "_id" }
    ]"#;
    let registry = Arc::new(StaticRegistry::from_json(json).unwrap());
    let store = Arc::new(fixtures::order_store());
    let resolver = RelationResolver::new(store.clone(), registry.clone());

    let meta = registry.require("Order").unwrap();
    let orders = resolver.resolve(&meta, fixtures::orders()).await.unwrap();

    assert_eq!(
        customer_of(&orders[1]).unwrap().get("name"),
        Some(&Value::from("Bo"))
    );
}

#[tokio::test]
async fn failure_leaves_no_partial_result() {
    let store = Arc::new(fixtures::order_store().failing("order_lines"));
    let resolver = RelationResolver::new(store.clone(), fixtures::registry());

    let result = resolver.resolve(&fixtures::order(), fixtures::orders()).await;

    assert!(matches!(
        result,
        Err(Error::RelationResolution { ref field, .. }) if field == "lines"
    ));
}
