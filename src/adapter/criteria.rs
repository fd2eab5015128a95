//! Criteria translation: abstract query conditions to store filter syntax.
//!
//! Field names are mapped to their stored columns and operands are coerced
//! through the [`codec`](super::codec) using the field's declared type.
//! Classification of a condition comes only from its [`Condition`] variant;
//! the shape of the operand is never inspected.

use crate::domain::{Condition, Document, EntityMetadata, FieldType, Query, Value};
use crate::port::{Filter, FindOptions};

use super::codec;

static IDENTIFIER_TYPE: FieldType = FieldType::ObjectId;

/// A query in store syntax, ready for the store client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreQuery {
    pub filter: Filter,
    pub options: FindOptions,
    /// Whether a total count must be fetched alongside the page.
    pub count: bool,
}

/// Translates [`Query`] values against one entity's metadata.
pub struct CriteriaTranslator<'a> {
    meta: &'a EntityMetadata,
}

impl<'a> CriteriaTranslator<'a> {
    #[must_use]
    pub fn new(meta: &'a EntityMetadata) -> Self {
        Self { meta }
    }

    /// Build the store filter, sort and paging for `query`.
    #[must_use]
    pub fn translate(&self, query: &Query) -> StoreQuery {
        StoreQuery {
            filter: self.filter(query),
            options: FindOptions {
                sort: query
                    .sort
                    .iter()
                    .map(|(field, direction)| (self.stored_path(field).0, direction.as_store()))
                    .collect(),
                skip: query.skip.filter(|skip| *skip > 0),
                limit: query.limit.map(std::num::NonZeroU64::get),
            },
            count: query.count,
        }
    }

    /// Build only the filter document.
    ///
    /// Conditions that land on the same stored path are combined. A lone
    /// equality stays a plain value; otherwise equalities become `$eq` and
    /// the operators are merged into one set. An operator repeated on a path
    /// moves to a further set under a top-level `$and`, so every condition
    /// still applies.
    #[must_use]
    pub fn filter(&self, query: &Query) -> Filter {
        let mut clauses: Vec<(String, Vec<(String, Value)>, bool)> = Vec::new();
        for (field, condition) in &query.conditions {
            let (path, field_type) = self.stored_path(field);
            let pairs = match condition {
                Condition::Equals(value) => {
                    vec![("$eq".to_string(), coerce(field_type, value.clone()))]
                }
                Condition::Operators(ops) => ops
                    .iter()
                    .map(|(op, operand)| {
                        let operand = if op.takes_field_value() {
                            coerce(field_type, operand.clone())
                        } else {
                            operand.clone()
                        };
                        (op.symbol().to_string(), operand)
                    })
                    .collect(),
            };
            let plain = matches!(condition, Condition::Equals(_));
            match clauses.iter_mut().find(|(p, _, _)| *p == path) {
                Some((_, existing, lone_equality)) => {
                    existing.extend(pairs);
                    *lone_equality = false;
                }
                None => clauses.push((path, pairs, plain)),
            }
        }

        let mut filter = Filter::new();
        let mut overflow = Vec::new();
        for (path, pairs, lone_equality) in clauses {
            if lone_equality {
                if let Some((_, value)) = pairs.into_iter().next() {
                    filter.insert(path, value);
                }
                continue;
            }
            let mut sets = operator_sets(pairs).into_iter();
            if let Some(first) = sets.next() {
                filter.insert(path.clone(), Value::Document(first));
            }
            for set in sets {
                let mut clause = Document::new();
                clause.insert(path.clone(), Value::Document(set));
                overflow.push(Value::Document(clause));
            }
        }
        if !overflow.is_empty() {
            filter.insert("$and".to_string(), Value::Array(overflow));
        }
        filter
    }

    /// Stored path and declared type for a domain field path.
    ///
    /// A dotted path whose head is an embedded field keeps its suffix
    /// untouched; only the head is renamed.
    fn stored_path(&self, path: &str) -> (String, Option<&'a FieldType>) {
        if self.meta.is_id_field(path) {
            return (path.to_string(), Some(&IDENTIFIER_TYPE));
        }
        if let Some(field) = self.meta.field(path) {
            return (field.column().to_string(), Some(&field.field_type));
        }
        if let Some((head, suffix)) = path.split_once('.') {
            if let Some(field) = self.meta.field(head) {
                if matches!(field.field_type, FieldType::Embedded { .. }) {
                    let mut declared = Some(field);
                    for segment in suffix.split('.') {
                        declared = declared.and_then(|f| f.sub_field(segment));
                    }
                    return (
                        format!("{}.{suffix}", field.column()),
                        declared.map(|f| &f.field_type),
                    );
                }
            }
        }
        (path.to_string(), None)
    }
}

/// Spread `(operator, operand)` pairs over as few sets as possible with no
/// operator repeated inside one set.
fn operator_sets(pairs: Vec<(String, Value)>) -> Vec<Document> {
    let mut sets: Vec<Document> = Vec::new();
    for (op, operand) in pairs {
        match sets.iter_mut().find(|set| !set.contains_key(&op)) {
            Some(set) => {
                set.insert(op, operand);
            }
            None => {
                let mut set = Document::new();
                set.insert(op, operand);
                sets.push(set);
            }
        }
    }
    sets
}

fn coerce(field_type: Option<&FieldType>, value: Value) -> Value {
    match field_type {
        Some(field_type) => codec::to_store(field_type, value),
        None => value,
    }
}

/// Translate `query` against `meta`.
#[must_use]
pub fn translate(meta: &EntityMetadata, query: &Query) -> StoreQuery {
    CriteriaTranslator::new(meta).translate(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::domain::{FieldMetadata, ObjectId, Operator, SortDirection};

    fn person() -> EntityMetadata {
        EntityMetadata::new("Person", "people")
            .with_id("_id")
            .with_field(FieldMetadata::new("name", FieldType::String))
            .with_field(FieldMetadata::new("age", FieldType::Number))
            .with_field(FieldMetadata::new("managerId", FieldType::ObjectId).stored_as("manager_id"))
            .with_field(
                FieldMetadata::new(
                    "address",
                    FieldType::Embedded {
                        fields: vec![FieldMetadata::new("since", FieldType::Timestamp)],
                    },
                )
                .stored_as("addr"),
            )
    }

    #[test]
    fn equality_passes_value_unchanged() {
        let q = Query::new().where_eq("age", 18);
        assert_eq!(translate(&person(), &q).filter, doc! { "age" => 18 });
    }

    #[test]
    fn operator_set_maps_to_store_symbols() {
        let q = Query::new().filter("age", Condition::ops([("greaterThan", 18), ("lessThan", 65)]));
        let expected = doc! { "age" => doc! { "$gt" => 18, "$lt" => 65 } };
        assert_eq!(translate(&person(), &q).filter, expected);
    }

    #[test]
    fn identifier_equality_is_not_an_operator_set() {
        let id = Value::ObjectId(ObjectId::new("M1"));
        let q = Query::new().filter("managerId", Condition::Equals(id.clone()));
        assert_eq!(translate(&person(), &q).filter, doc! { "manager_id" => id });
    }

    #[test]
    fn document_equality_is_not_an_operator_set() {
        let q = Query::new().where_eq("tags", doc! { "gt" => 1 });
        assert_eq!(
            translate(&person(), &q).filter,
            doc! { "tags" => doc! { "gt" => 1 } }
        );
    }

    #[test]
    fn id_field_operand_is_coerced() {
        let q = Query::new()
            .where_eq("_id", "P1")
            .where_op("managerId", Operator::In, vec!["M1", "M2"]);
        let filter = translate(&person(), &q).filter;
        assert_eq!(filter.get("_id"), Some(&Value::ObjectId(ObjectId::new("P1"))));
        assert_eq!(
            filter.get("manager_id"),
            Some(&Value::Document(doc! {
                "$in" => vec![ObjectId::new("M1"), ObjectId::new("M2")],
            }))
        );
    }

    #[test]
    fn dotted_embedded_path_keeps_suffix() {
        let q = Query::new()
            .where_op("address.since", Operator::GreaterThanOrEqual, "2020-01-01")
            .where_eq("address.zip", "12345");
        let filter = translate(&person(), &q).filter;

        match filter.get("addr.since") {
            Some(Value::Document(ops)) => assert!(matches!(ops.get("$gte"), Some(Value::DateTime(_)))),
            other => panic!("unexpected filter entry: {other:?}"),
        }
        assert_eq!(filter.get("addr.zip"), Some(&Value::from("12345")));
    }

    #[test]
    fn undeclared_dotted_path_is_untouched() {
        let q = Query::new().where_eq("meta.source", "import");
        assert_eq!(
            translate(&person(), &q).filter,
            doc! { "meta.source" => "import" }
        );
    }

    #[test]
    fn unknown_operator_passes_verbatim() {
        let q = Query::new().filter("name", Condition::ops([("$near", "x")]));
        assert_eq!(
            translate(&person(), &q).filter,
            doc! { "name" => doc! { "$near" => "x" } }
        );
    }

    #[test]
    fn equality_and_operator_on_same_field_are_merged() {
        let q = Query::new()
            .where_eq("age", 18)
            .where_op("age", Operator::GreaterThan, 10);
        assert_eq!(
            translate(&person(), &q).filter,
            doc! { "age" => doc! { "$eq" => 18, "$gt" => 10 } }
        );
    }

    #[test]
    fn field_name_and_column_name_share_one_path() {
        let q = Query::new()
            .where_op("managerId", Operator::NotEqual, "M1")
            .where_op("manager_id", Operator::Exists, true);
        assert_eq!(
            translate(&person(), &q).filter,
            doc! {
                "manager_id" => doc! { "$ne" => ObjectId::new("M1"), "$exists" => true },
            }
        );
    }

    #[test]
    fn repeated_operator_moves_to_and_clause() {
        let q = Query::new()
            .where_eq("name", "Ada")
            .where_eq("name", "Bo")
            .where_op("age", Operator::GreaterThan, 18);
        assert_eq!(
            translate(&person(), &q).filter,
            doc! {
                "name" => doc! { "$eq" => "Ada" },
                "age" => doc! { "$gt" => 18 },
                "$and" => vec![doc! { "name" => doc! { "$eq" => "Bo" } }],
            }
        );
    }

    #[test]
    fn sort_and_paging() {
        let q = Query::new()
            .sort_by("name", SortDirection::Ascending)
            .sort_by("managerId", SortDirection::Descending)
            .skip(10)
            .limit(5)
            .with_count();
        let sq = translate(&person(), &q);
        assert_eq!(
            sq.options.sort,
            vec![("name".to_string(), 1), ("manager_id".to_string(), -1)]
        );
        assert_eq!(sq.options.skip, Some(10));
        assert_eq!(sq.options.limit, Some(5));
        assert!(sq.count);
    }

    #[test]
    fn absent_paging_is_unrestricted() {
        let sq = translate(&person(), &Query::new().skip(0));
        assert_eq!(sq.options.skip, None);
        assert_eq!(sq.options.limit, None);
        assert!(!sq.count);
    }
}
