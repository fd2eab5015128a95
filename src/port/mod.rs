//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! ```text
//!        ┌───────────────────────────────┐
//!        │  Repository (session facade)  │
//!        └──────┬─────────────┬──────────┘
//!               │             │
//!               ▼             ▼
//!        ┌────────────┐ ┌──────────────┐ ┌────────────────┐
//!        │StoreClient │ │   Metadata   │ │ StoreConnector │
//!        │  (driver)  │ │   Registry   │ │ (pool opens)   │
//!        └────────────┘ └──────────────┘ └────────────────┘
//! ```
//!
//! - [`StoreClient`] - Query, batched id lookup, count and pass-through writes
//! - [`StoreConnector`] - Opens a live store connection for the pool
//! - [`MetadataRegistry`] - Entity metadata lookup by name

pub mod outbound;

pub use outbound::connector::StoreConnector;
pub use outbound::registry::MetadataRegistry;
pub use outbound::store::{Filter, FindOptions, StoreClient};
