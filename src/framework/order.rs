// Ordering Validators - per-entity sort objects and the aggregate ordering variant
// Keys are taken in input order; to-one relations are ordered through recursively

use super::context::{one_or_many, ValidationContext};
use super::record::{expect_object, ClosedRecord, RecordEntry};
use super::registry::ValidatorRegistry;
use crate::core::{EntityId, FieldPath};
use crate::ent_schema::{Cardinality, EntityDescriptor};
use crate::error::ValidationErrorKind;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NullsPosition {
    First,
    Last,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AggregateFunction {
    Count,
    Avg,
    Sum,
    Min,
    Max,
}

impl AggregateFunction {
    pub const ALL: [AggregateFunction; 5] = [
        AggregateFunction::Count,
        AggregateFunction::Avg,
        AggregateFunction::Sum,
        AggregateFunction::Min,
        AggregateFunction::Max,
    ];

    pub fn key(self) -> &'static str {
        match self {
            AggregateFunction::Count => "_count",
            AggregateFunction::Avg => "_avg",
            AggregateFunction::Sum => "_sum",
            AggregateFunction::Min => "_min",
            AggregateFunction::Max => "_max",
        }
    }

    /// `_count` applies to any scalar; the rest need numbers.
    pub fn numeric_only(self) -> bool {
        self != AggregateFunction::Count
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SortTarget {
    Field(String),
    /// Number of rows behind a to-many relation.
    RelationCount(String),
    Aggregate {
        function: AggregateFunction,
        field: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortKey {
    /// To-one relations traversed before reaching `target`, outermost first.
    pub path: Vec<String>,
    pub target: SortTarget,
    pub direction: SortDirection,
    pub nulls: Option<NullsPosition>,
}

impl SortKey {
    fn new(target: SortTarget, direction: SortDirection, nulls: Option<NullsPosition>) -> Self {
        Self {
            path: Vec::new(),
            target,
            direction,
            nulls,
        }
    }
}

#[derive(Debug)]
enum OrderSlot {
    Field { nullable: bool },
    RelationCount,
    ToOne { target: EntityId },
    Aggregate { function: AggregateFunction, fields: Vec<String> },
}

/// Ordering over rows (`rows`) or over grouped results (`aggregate`).
#[derive(Debug)]
pub struct OrderValidator {
    record: ClosedRecord<OrderSlot>,
}

impl OrderValidator {
    pub fn rows(entity: &EntityDescriptor) -> Self {
        let mut record = ClosedRecord::new();
        for field in entity.fields.iter().filter(|f| !f.list) {
            record.insert(&field.name, OrderSlot::Field { nullable: field.nullable });
        }
        for relation in &entity.relations {
            let slot = match relation.cardinality {
                Cardinality::Many => OrderSlot::RelationCount,
                Cardinality::One => OrderSlot::ToOne { target: relation.target },
            };
            record.insert(&relation.name, slot);
        }
        Self { record }
    }

    pub fn aggregate(entity: &EntityDescriptor) -> Self {
        let mut record = ClosedRecord::new();
        let scalars: Vec<_> = entity.fields.iter().filter(|f| !f.list).collect();
        for field in &scalars {
            record.insert(&field.name, OrderSlot::Field { nullable: field.nullable });
        }
        for function in AggregateFunction::ALL {
            let fields = scalars
                .iter()
                .filter(|f| !function.numeric_only() || f.field_type.is_numeric())
                .map(|f| f.name.clone())
                .collect();
            record.insert(function.key(), OrderSlot::Aggregate { function, fields });
        }
        Self { record }
    }

    /// A single ordering object or a list of them.
    pub fn validate(
        &self,
        registry: &ValidatorRegistry,
        ctx: &mut ValidationContext<'_>,
        path: &FieldPath,
        input: &Value,
    ) -> Option<Vec<SortKey>> {
        if !matches!(input, Value::Object(_) | Value::Array(_)) {
            ctx.type_mismatch(path, "orderBy object or array of orderBy objects", input);
            return None;
        }
        let mut keys = Vec::new();
        let mut ok = true;
        for (item_path, item) in one_or_many(path, input) {
            match self.validate_object(registry, ctx, &item_path, item) {
                Some(mut more) => keys.append(&mut more),
                None => ok = false,
            }
        }
        ok.then_some(keys)
    }

    fn validate_object(
        &self,
        registry: &ValidatorRegistry,
        ctx: &mut ValidationContext<'_>,
        path: &FieldPath,
        input: &Value,
    ) -> Option<Vec<SortKey>> {
        let object = expect_object(ctx, path, input, "orderBy object")?;
        let mut keys = Vec::new();
        let mut ok = true;

        for entry in self.record.entries(object) {
            let (key, slot, value) = match entry {
                RecordEntry::Slot { key, slot, value } => (key, slot, value),
                RecordEntry::Other { key, .. } => {
                    ctx.unknown_field(path, key);
                    ok = false;
                    continue;
                }
            };
            let member_path = path.key(key);
            let produced = match slot {
                OrderSlot::Field { nullable } => {
                    field_order(ctx, &member_path, key, *nullable, value).map(|(direction, nulls)| {
                        vec![SortKey::new(SortTarget::Field(key.to_string()), direction, nulls)]
                    })
                }
                OrderSlot::RelationCount => relation_count(ctx, &member_path, value)
                    .map(|direction| vec![SortKey::new(SortTarget::RelationCount(key.to_string()), direction, None)]),
                OrderSlot::ToOne { target } => ctx
                    .nested_relation(&member_path, |ctx| {
                        registry
                            .validators(*target)
                            .order
                            .validate_object(registry, ctx, &member_path, value)
                    })
                    .map(|nested| {
                        nested
                            .into_iter()
                            .map(|mut sort_key| {
                                sort_key.path.insert(0, key.to_string());
                                sort_key
                            })
                            .collect()
                    }),
                OrderSlot::Aggregate { function, fields } => aggregate_order(ctx, &member_path, *function, fields, value),
            };
            match produced {
                Some(mut produced) => keys.append(&mut produced),
                None => ok = false,
            }
        }

        ok.then_some(keys)
    }
}

fn direction(ctx: &mut ValidationContext<'_>, path: &FieldPath, value: &Value) -> Option<SortDirection> {
    match value.as_str() {
        Some("asc") => Some(SortDirection::Asc),
        Some("desc") => Some(SortDirection::Desc),
        Some(other) => {
            ctx.report(
                path,
                ValidationErrorKind::InvalidEnumMember {
                    enum_name: "SortOrder".to_string(),
                    value: other.to_string(),
                },
            );
            None
        }
        None => {
            ctx.type_mismatch(path, "\"asc\" or \"desc\"", value);
            None
        }
    }
}

/// `asc | desc`, or `{sort, nulls?}` on nullable fields.
fn field_order(
    ctx: &mut ValidationContext<'_>,
    path: &FieldPath,
    field: &str,
    nullable: bool,
    value: &Value,
) -> Option<(SortDirection, Option<NullsPosition>)> {
    let Value::Object(object) = value else {
        return direction(ctx, path, value).map(|d| (d, None));
    };
    if !nullable {
        ctx.report(
            path,
            ValidationErrorKind::InvalidNullsPosition {
                field: field.to_string(),
            },
        );
        return None;
    }

    let mut ok = true;
    for key in object.keys().filter(|k| *k != "sort" && *k != "nulls") {
        ctx.unknown_field(path, key);
        ok = false;
    }
    let sort = match object.get("sort") {
        Some(v) => direction(ctx, &path.key("sort"), v),
        None => {
            ctx.report(
                &path.key("sort"),
                ValidationErrorKind::RequiredFieldMissing {
                    field: "sort".to_string(),
                },
            );
            None
        }
    };
    let nulls = match object.get("nulls") {
        None => Some(None),
        Some(v) => nulls_position(ctx, &path.key("nulls"), v).map(Some),
    };
    if !ok {
        return None;
    }
    Some((sort?, nulls?))
}

fn nulls_position(ctx: &mut ValidationContext<'_>, path: &FieldPath, value: &Value) -> Option<NullsPosition> {
    match value.as_str() {
        Some("first") => Some(NullsPosition::First),
        Some("last") => Some(NullsPosition::Last),
        _ => {
            ctx.report(
                path,
                ValidationErrorKind::InvalidEnumMember {
                    enum_name: "NullsOrder".to_string(),
                    value: value.to_string(),
                },
            );
            None
        }
    }
}

/// `{_count: asc | desc}` on a to-many relation.
fn relation_count(ctx: &mut ValidationContext<'_>, path: &FieldPath, value: &Value) -> Option<SortDirection> {
    let object = expect_object(ctx, path, value, "{ _count: asc | desc }")?;
    single_entry(ctx, path, object, "_count").and_then(|v| direction(ctx, &path.key("_count"), v))
}

fn single_entry<'v>(
    ctx: &mut ValidationContext<'_>,
    path: &FieldPath,
    object: &'v Map<String, Value>,
    key: &str,
) -> Option<&'v Value> {
    let mut ok = true;
    for other in object.keys().filter(|k| *k != key) {
        ctx.unknown_field(path, other);
        ok = false;
    }
    match object.get(key) {
        Some(v) if ok => Some(v),
        Some(_) => None,
        None => {
            ctx.report(
                &path.key(key),
                ValidationErrorKind::RequiredFieldMissing { field: key.to_string() },
            );
            None
        }
    }
}

/// `{_avg: {price: desc}}` and friends.
fn aggregate_order(
    ctx: &mut ValidationContext<'_>,
    path: &FieldPath,
    function: AggregateFunction,
    fields: &[String],
    value: &Value,
) -> Option<Vec<SortKey>> {
    let object = expect_object(ctx, path, value, &format!("{} object", function.key()))?;
    let mut keys = Vec::with_capacity(object.len());
    let mut ok = true;
    for (field, value) in object {
        if !fields.iter().any(|f| f == field) {
            ctx.unknown_field(path, field);
            ok = false;
            continue;
        }
        match direction(ctx, &path.key(field), value) {
            Some(direction) => keys.push(SortKey::new(
                SortTarget::Aggregate {
                    function,
                    field: field.clone(),
                },
                direction,
                None,
            )),
            None => ok = false,
        }
    }
    ok.then_some(keys)
}
