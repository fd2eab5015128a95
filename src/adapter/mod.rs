//! Implementations of the adapter core (hexagonal adapters).
//!
//! - [`codec`] - Wire/domain value coercion per semantic field type
//! - [`criteria`] - Query criteria to store filter translation
//! - [`relation`] - Batched relation hydration
//! - [`registry`] - Static metadata registry

pub mod codec;
pub mod criteria;
pub mod registry;
pub mod relation;

pub use criteria::{translate, CriteriaTranslator, StoreQuery};
pub use registry::StaticRegistry;
pub use relation::RelationResolver;
