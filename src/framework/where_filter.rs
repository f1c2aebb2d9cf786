// Entity Filter (Where) Validator - the recursive per-entity predicate validator
// AND/OR/NOT of itself plus one scalar, list or relation filter per declared member

use super::context::ValidationContext;
use super::record::{expect_object, ClosedRecord, RecordEntry};
use super::registry::ValidatorRegistry;
use super::relation_filter::{RelationFilter, RelationFilterValidator};
use super::scalar::{ListFilter, ListValidator, ScalarFilter, ScalarValidator};
use crate::core::FieldPath;
use crate::ent_schema::EntityDescriptor;
use serde::Serialize;
use serde_json::Value;

/// Normalized filter over one entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FilterExpression {
    And(Vec<FilterExpression>),
    Or(Vec<FilterExpression>),
    Not(Vec<FilterExpression>),
    Scalar { field: String, filter: ScalarFilter },
    List { field: String, filter: ListFilter },
    Relation { relation: String, filter: RelationFilter },
}

impl FilterExpression {
    /// Member names referenced at this level, recursing through boolean nodes only.
    pub fn referenced_members(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_members(&mut out);
        out
    }

    fn collect_members<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            FilterExpression::And(children) | FilterExpression::Or(children) | FilterExpression::Not(children) => {
                for child in children {
                    child.collect_members(out);
                }
            }
            FilterExpression::Scalar { field, .. } | FilterExpression::List { field, .. } => out.push(field),
            FilterExpression::Relation { relation, .. } => out.push(relation),
        }
    }
}

#[derive(Debug)]
enum WhereSlot {
    Scalar(ScalarValidator),
    List(ListValidator),
    Relation(RelationFilterValidator),
}

/// Closed-record where validator built once per entity.
#[derive(Debug)]
pub struct WhereValidator {
    record: ClosedRecord<WhereSlot>,
}

impl WhereValidator {
    pub fn new(entity: &EntityDescriptor) -> Self {
        let mut record = ClosedRecord::new();
        for field in &entity.fields {
            let slot = if field.list {
                WhereSlot::List(ListValidator::new(field))
            } else {
                WhereSlot::Scalar(ScalarValidator::new(field))
            };
            record.insert(&field.name, slot);
        }
        for relation in &entity.relations {
            record.insert(&relation.name, WhereSlot::Relation(RelationFilterValidator::new(relation)));
        }
        Self { record }
    }

    pub fn validate(
        &self,
        registry: &ValidatorRegistry,
        ctx: &mut ValidationContext<'_>,
        path: &FieldPath,
        input: &Value,
    ) -> Option<FilterExpression> {
        let object = expect_object(ctx, path, input, "where object")?;
        let mut children = Vec::with_capacity(object.len());
        let mut ok = true;

        for entry in self.record.entries(object) {
            let child = match entry {
                RecordEntry::Slot { key, slot, value } => {
                    let member_path = path.key(key);
                    match slot {
                        WhereSlot::Scalar(v) => v.validate(ctx, &member_path, value).map(|filter| {
                            FilterExpression::Scalar {
                                field: key.to_string(),
                                filter,
                            }
                        }),
                        WhereSlot::List(v) => v.validate(ctx, &member_path, value).map(|filter| {
                            FilterExpression::List {
                                field: key.to_string(),
                                filter,
                            }
                        }),
                        WhereSlot::Relation(v) => v.validate(registry, ctx, &member_path, value).map(|filter| {
                            FilterExpression::Relation {
                                relation: key.to_string(),
                                filter,
                            }
                        }),
                    }
                }
                RecordEntry::Other { key: "AND", value } => self
                    .combinator(registry, ctx, &path.key("AND"), value, true)
                    .map(FilterExpression::And),
                RecordEntry::Other { key: "OR", value } => self
                    .combinator(registry, ctx, &path.key("OR"), value, false)
                    .map(FilterExpression::Or),
                RecordEntry::Other { key: "NOT", value } => self
                    .combinator(registry, ctx, &path.key("NOT"), value, true)
                    .map(FilterExpression::Not),
                RecordEntry::Other { key, .. } => {
                    ctx.unknown_field(path, key);
                    None
                }
            };
            match child {
                Some(c) => children.push(c),
                None => ok = false,
            }
        }

        ok.then_some(FilterExpression::And(children))
    }

    /// Operands of `AND`/`OR`/`NOT`. `OR` only accepts a list.
    fn combinator(
        &self,
        registry: &ValidatorRegistry,
        ctx: &mut ValidationContext<'_>,
        path: &FieldPath,
        value: &Value,
        accepts_single: bool,
    ) -> Option<Vec<FilterExpression>> {
        let operands: Vec<(FieldPath, &Value)> = match value {
            Value::Array(items) => items.iter().enumerate().map(|(i, v)| (path.index(i), v)).collect(),
            Value::Object(_) if accepts_single => vec![(path.clone(), value)],
            other => {
                let expected = if accepts_single {
                    "where object or array of where objects"
                } else {
                    "array of where objects"
                };
                ctx.type_mismatch(path, expected, other);
                return None;
            }
        };

        let mut out = Vec::with_capacity(operands.len());
        let mut ok = true;
        for (operand_path, operand) in operands {
            match ctx.nested_logical(&operand_path, |ctx| self.validate(registry, ctx, &operand_path, operand)) {
                Some(expr) => out.push(expr),
                None => ok = false,
            }
        }
        ok.then_some(out)
    }
}
