//! Docbridge - persistence adapter between an in-memory object model and a
//! schemaless document store.
//!
//! # Architecture
//!
//! - **`adapter::codec`** - Idempotent coercion of wire values to domain
//!   values and back, per semantic field type.
//! - **`adapter::criteria`** - Translation of abstract query criteria into
//!   store filter syntax, sort and paging options.
//! - **`adapter::relation`** - Batched hydration of single and list
//!   references: one store round trip per relation field per level.
//! - **`infrastructure::pool`** - Connection pool manager that deduplicates
//!   concurrent opens per configuration fingerprint.
//!
//! # Modules
//!
//! - [`domain`] - Values, entity metadata, queries
//! - [`port`] - Store client, connector and metadata registry traits
//! - [`adapter`] - Codec, criteria translator, relation resolver, static registry
//! - [`application`] - The [`Repository`](application::Repository) facade
//! - [`infrastructure`] - Configuration, logging and the pool manager
//! - [`error`] - Error types for the crate
//!
//! # Features
//!
//! - `testkit` - In-memory store client, scripted connector and fixtures
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use docbridge::adapter::StaticRegistry;
//! use docbridge::application::Repository;
//! use docbridge::domain::{EntityMetadata, FieldMetadata, FieldType, Operator, Query};
//! use docbridge::port::StoreClient;
//!
//! async fn adults(store: Arc<dyn StoreClient>) -> docbridge::error::Result<()> {
//!     let registry = StaticRegistry::new().with(
//!         EntityMetadata::new("Person", "people")
//!             .with_id("_id")
//!             .with_field(FieldMetadata::new("age", FieldType::Number)),
//!     );
//!     let repo = Repository::new(store, Arc::new(registry));
//!     let page = repo
//!         .find("Person", &Query::new().where_op("age", Operator::GreaterThan, 18).with_count())
//!         .await?;
//!     println!("{} of {:?}", page.documents.len(), page.total);
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
