//! Store-agnostic domain types: values, entity metadata, queries.

pub mod id;
pub mod metadata;
pub mod query;
pub mod value;

pub use id::ObjectId;
pub use metadata::{
    EntityMetadata, FieldMetadata, FieldType, RelationKind, RelationMetadata, RelationSort,
    SortDirection,
};
pub use query::{Condition, Operator, Page, Query};
pub use value::{Binary, Document, Reference, Value};
