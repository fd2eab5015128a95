//! Entity metadata consumed from the schema registry.
//!
//! The registry itself lives outside this crate; these are the shapes it
//! hands over. All types deserialize with serde so a registry can be loaded
//! from JSON or TOML.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Sort order for queries and list-reference ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    #[serde(alias = "asc")]
    Ascending,
    #[serde(alias = "desc")]
    Descending,
}

impl SortDirection {
    /// Store sort key: `1` ascending, `-1` descending.
    #[must_use]
    pub fn as_store(self) -> i32 {
        match self {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        }
    }
}

/// Semantic type tag carried by each declared field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Number,
    ObjectId,
    Timestamp,
    Binary,
    /// Nested object; declared sub-fields are coerced like top-level ones.
    Embedded {
        #[serde(default)]
        fields: Vec<FieldMetadata>,
    },
}

/// A declared field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMetadata {
    pub name: String,
    /// Stored field name when it differs from `name`.
    #[serde(default)]
    pub column: Option<String>,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl FieldMetadata {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            column: None,
            field_type,
        }
    }

    #[must_use]
    pub fn stored_as(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Name the field is stored under.
    #[must_use]
    pub fn column(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.name)
    }

    /// Look up a declared sub-field of an embedded field.
    #[must_use]
    pub fn sub_field(&self, name: &str) -> Option<&FieldMetadata> {
        match &self.field_type {
            FieldType::Embedded { fields } => fields.iter().find(|f| f.name == name),
            _ => None,
        }
    }
}

/// Ordering applied to the hydrated elements of a list reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationSort {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

/// Cardinality of a relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RelationKind {
    /// Single reference. With `inverse` set, the target document holds the
    /// pointer back to the source in that column.
    One {
        #[serde(default)]
        inverse: Option<String>,
    },
    /// Ordered list of references.
    Many {
        #[serde(default)]
        sort: Option<RelationSort>,
    },
}

/// A declared relation field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationMetadata {
    pub field: String,
    /// Target entity name, looked up in the registry.
    pub target: String,
    #[serde(flatten)]
    pub kind: RelationKind,
}

impl RelationMetadata {
    pub fn one(field: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            target: target.into(),
            kind: RelationKind::One { inverse: None },
        }
    }

    pub fn inverse(
        field: impl Into<String>,
        target: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            target: target.into(),
            kind: RelationKind::One {
                inverse: Some(column.into()),
            },
        }
    }

    pub fn many(field: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            target: target.into(),
            kind: RelationKind::Many { sort: None },
        }
    }

    #[must_use]
    pub fn sorted_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        if let RelationKind::Many { sort } = &mut self.kind {
            *sort = Some(RelationSort {
                field: field.into(),
                direction,
            });
        }
        self
    }
}

/// Everything the adapter needs to know about one entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMetadata {
    pub name: String,
    pub collection: String,
    #[serde(default)]
    pub id_field: Option<String>,
    #[serde(default)]
    pub version_field: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldMetadata>,
    #[serde(default)]
    pub relations: Vec<RelationMetadata>,
}

impl EntityMetadata {
    pub fn new(name: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collection: collection.into(),
            id_field: None,
            version_field: None,
            fields: Vec::new(),
            relations: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_id(mut self, field: impl Into<String>) -> Self {
        self.id_field = Some(field.into());
        self
    }

    #[must_use]
    pub fn with_version(mut self, field: impl Into<String>) -> Self {
        self.version_field = Some(field.into());
        self
    }

    #[must_use]
    pub fn with_field(mut self, field: FieldMetadata) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn with_relation(mut self, relation: RelationMetadata) -> Self {
        self.relations.push(relation);
        self
    }

    /// Identifier field name, required by writes, deletes and id lookups.
    pub fn require_id(&self) -> Result<&str> {
        self.id_field
            .as_deref()
            .ok_or_else(|| Error::MissingIdentifier {
                entity: self.name.clone(),
            })
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldMetadata> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn relation(&self, field: &str) -> Option<&RelationMetadata> {
        self.relations.iter().find(|r| r.field == field)
    }

    #[must_use]
    pub fn is_id_field(&self, name: &str) -> bool {
        self.id_field.as_deref() == Some(name)
    }

    /// Stored name for a domain field; undeclared fields keep their name.
    #[must_use]
    pub fn column_of<'a>(&'a self, name: &'a str) -> &'a str {
        self.field(name).map_or(name, FieldMetadata::column)
    }
}
