//! Entity metadata and seeded data for a small order schema.
//!
//! ```text
//! Order ──customer──▶ Customer ◀──customer── Profile   (inverse `profile`)
//!   │
//!   └──lines──▶ [OrderLine] ──product──▶ Product
//!
//! Employee ──manager──▶ Employee                       (self-reference)
//! ```

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use crate::adapter::StaticRegistry;
use crate::doc;
use crate::domain::{
    Document, EntityMetadata, FieldMetadata, FieldType, ObjectId, Reference, RelationMetadata,
    SortDirection, Value,
};

use super::store::MemoryStore;

pub fn id(raw: &str) -> ObjectId {
    ObjectId::new(raw)
}

/// Stored reference pair pointing at `collection`/`raw`.
pub fn reference(collection: &str, raw: &str) -> Value {
    Value::Reference(Reference::new(collection, raw))
}

pub fn order() -> EntityMetadata {
    EntityMetadata::new("Order", "orders")
        .with_id("_id")
        .with_version("version")
        .with_field(FieldMetadata::new("total", FieldType::Number))
        .with_field(FieldMetadata::new("placedAt", FieldType::Timestamp).stored_as("placed_at"))
        .with_relation(RelationMetadata::one("customer", "Customer"))
        .with_relation(RelationMetadata::many("lines", "OrderLine"))
}

pub fn customer() -> EntityMetadata {
    EntityMetadata::new("Customer", "customers")
        .with_id("_id")
        .with_field(FieldMetadata::new("name", FieldType::String))
        .with_relation(RelationMetadata::inverse("profile", "Profile", "customer"))
}

pub fn profile() -> EntityMetadata {
    EntityMetadata::new("Profile", "profiles")
        .with_id("_id")
        .with_field(FieldMetadata::new("bio", FieldType::String))
        .with_field(FieldMetadata::new("customer", FieldType::ObjectId).stored_as("customer_id"))
}

/// Profile whose back-pointer is a declared relation, saved as a reference
/// pair instead of a bare id.
pub fn linked_profile() -> EntityMetadata {
    EntityMetadata::new("Profile", "profiles")
        .with_id("_id")
        .with_field(FieldMetadata::new("bio", FieldType::String))
        .with_relation(RelationMetadata::one("customer", "Customer"))
}

pub fn order_line() -> EntityMetadata {
    EntityMetadata::new("OrderLine", "order_lines")
        .with_id("_id")
        .with_field(FieldMetadata::new("position", FieldType::Number))
        .with_relation(RelationMetadata::one("product", "Product"))
}

pub fn product() -> EntityMetadata {
    EntityMetadata::new("Product", "products")
        .with_id("_id")
        .with_field(FieldMetadata::new("name", FieldType::String))
}

/// Order variant whose lines are ordered by position.
pub fn order_with_sorted_lines() -> EntityMetadata {
    let mut meta = order();
    meta.name = "SortedOrder".to_string();
    meta.relations = vec![
        RelationMetadata::one("customer", "Customer"),
        RelationMetadata::many("lines", "OrderLine")
            .sorted_by("position", SortDirection::Ascending),
    ];
    meta
}

pub fn person() -> EntityMetadata {
    EntityMetadata::new("Person", "people")
        .with_id("_id")
        .with_field(FieldMetadata::new("name", FieldType::String))
        .with_field(FieldMetadata::new("age", FieldType::Number))
        .with_field(FieldMetadata::new(
            "address",
            FieldType::Embedded {
                fields: vec![
                    FieldMetadata::new("city", FieldType::String),
                    FieldMetadata::new("since", FieldType::Timestamp),
                ],
            },
        ))
}

pub fn employee() -> EntityMetadata {
    EntityMetadata::new("Employee", "employees")
        .with_id("_id")
        .with_field(FieldMetadata::new("name", FieldType::String))
        .with_relation(RelationMetadata::one("manager", "Employee"))
}

/// Entity with no identifier field.
pub fn audit_entry() -> EntityMetadata {
    EntityMetadata::new("AuditEntry", "audit")
        .with_field(FieldMetadata::new("message", FieldType::String))
}

/// Registry holding every entity of this module.
pub fn registry() -> Arc<StaticRegistry> {
    Arc::new(
        StaticRegistry::new()
            .with(order())
            .with(order_with_sorted_lines())
            .with(customer())
            .with(profile())
            .with(order_line())
            .with(product())
            .with(person())
            .with(employee())
            .with(audit_entry()),
    )
}

/// Customer and [`linked_profile`] only.
pub fn linked_registry() -> Arc<StaticRegistry> {
    Arc::new(StaticRegistry::new().with(customer()).with(linked_profile()))
}

/// Stored orders O1..O3; O1 and O3 share customer C1.
pub fn orders() -> Vec<Document> {
    let placed = Utc
        .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
        .single()
        .expect("fixture timestamp is unambiguous");
    vec![
        doc! {
            "_id" => id("O1"),
            "total" => 30,
            "placed_at" => placed,
            "customer" => reference("customers", "C1"),
            "lines" => vec![reference("order_lines", "L2"), reference("order_lines", "L1")],
        },
        doc! {
            "_id" => id("O2"),
            "total" => 5,
            "customer" => reference("customers", "C2"),
            "lines" => vec![reference("order_lines", "L3")],
        },
        doc! {
            "_id" => id("O3"),
            "total" => 12,
            "customer" => reference("customers", "C1"),
            "lines" => Vec::<Value>::new(),
        },
    ]
}

/// Store seeded with the order schema.
pub fn order_store() -> MemoryStore {
    MemoryStore::new()
        .with_documents("orders", orders())
        .with_documents(
            "customers",
            vec![
                doc! { "_id" => id("C1"), "name" => "Ada" },
                doc! { "_id" => id("C2"), "name" => "Bo" },
            ],
        )
        .with_documents(
            "profiles",
            vec![doc! { "_id" => id("PR1"), "bio" => "regular", "customer_id" => id("C1") }],
        )
        .with_documents(
            "order_lines",
            vec![
                doc! { "_id" => id("L1"), "position" => 1, "product" => reference("products", "P1") },
                doc! { "_id" => id("L2"), "position" => 2, "product" => reference("products", "P2") },
                doc! { "_id" => id("L3"), "position" => 3, "product" => reference("products", "P1") },
            ],
        )
        .with_documents(
            "products",
            vec![
                doc! { "_id" => id("P1"), "name" => "Widget" },
                doc! { "_id" => id("P2"), "name" => "Gadget" },
            ],
        )
}

/// Stored person `person-{index:03}` with the given age.
pub fn person_doc(index: usize, age: i64) -> Document {
    doc! {
        "_id" => id(&format!("P{index:03}")),
        "name" => format!("person-{index:03}"),
        "age" => age,
        "address" => doc! { "city" => if index % 2 == 0 { "Oslo" } else { "Lima" } },
    }
}
