// Find-Many Arguments - where, orderBy, cursor, take, skip and distinct for list queries

use super::context::{one_or_many, ValidationContext};
use super::order::SortKey;
use super::record::expect_object;
use super::registry::{EntityValidators, ValidatorRegistry};
use super::unique::UniqueLookup;
use super::where_filter::FilterExpression;
use crate::core::FieldPath;
use crate::ent_schema::EntityDescriptor;
use crate::error::ValidationErrorKind;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FindManyArgs {
    pub filter: Option<FilterExpression>,
    pub order_by: Vec<SortKey>,
    pub cursor: Option<UniqueLookup>,
    /// Negative values page backwards from the cursor.
    pub take: Option<i64>,
    pub skip: Option<u64>,
    pub distinct: Vec<String>,
}

#[derive(Debug)]
pub struct FindManyValidator {
    distinct_fields: Vec<String>,
}

impl FindManyValidator {
    pub fn new(entity: &EntityDescriptor) -> Self {
        Self {
            distinct_fields: entity.fields.iter().filter(|f| !f.list).map(|f| f.name.clone()).collect(),
        }
    }

    pub(crate) fn validate(
        &self,
        registry: &ValidatorRegistry,
        ctx: &mut ValidationContext<'_>,
        path: &FieldPath,
        input: &Value,
        validators: &EntityValidators,
    ) -> Option<FindManyArgs> {
        let object = expect_object(ctx, path, input, "findMany arguments")?;
        let mut args = FindManyArgs::default();
        let mut ok = true;

        for (key, value) in object {
            let arg_path = path.key(key);
            let accepted = match key.as_str() {
                "where" => validators
                    .filter
                    .validate(registry, ctx, &arg_path, value)
                    .map(|filter| args.filter = Some(filter))
                    .is_some(),
                "orderBy" => validators
                    .order
                    .validate(registry, ctx, &arg_path, value)
                    .map(|keys| args.order_by = keys)
                    .is_some(),
                "cursor" => validators
                    .unique
                    .validate(registry, ctx, &arg_path, value, &validators.filter)
                    .map(|cursor| args.cursor = Some(cursor))
                    .is_some(),
                "take" => match value.as_i64() {
                    Some(take) => {
                        args.take = Some(take);
                        true
                    }
                    None => {
                        ctx.type_mismatch(&arg_path, "integer", value);
                        false
                    }
                },
                "skip" => match value.as_u64() {
                    Some(skip) => {
                        args.skip = Some(skip);
                        true
                    }
                    None => {
                        ctx.type_mismatch(&arg_path, "non-negative integer", value);
                        false
                    }
                },
                "distinct" => self
                    .distinct(ctx, &arg_path, value)
                    .map(|fields| args.distinct = fields)
                    .is_some(),
                other => {
                    ctx.unknown_field(path, other);
                    false
                }
            };
            ok &= accepted;
        }

        ok.then_some(args)
    }

    fn distinct(&self, ctx: &mut ValidationContext<'_>, path: &FieldPath, value: &Value) -> Option<Vec<String>> {
        let names = one_or_many(path, value);
        let mut out = Vec::with_capacity(names.len());
        let mut ok = true;
        for (name_path, name) in names {
            match name.as_str() {
                Some(field) if self.distinct_fields.iter().any(|f| f == field) => out.push(field.to_string()),
                Some(field) => {
                    ctx.report(&name_path, ValidationErrorKind::unknown_field(field));
                    ok = false;
                }
                None => {
                    ctx.type_mismatch(&name_path, "scalar field name", name);
                    ok = false;
                }
            }
        }
        ok.then_some(out)
    }
}
