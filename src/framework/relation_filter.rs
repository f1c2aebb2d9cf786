// Relation Filter Validators - is/isNot for to-one, every/some/none for to-many
// Targets are resolved through the registry on use, so cyclic relation graphs never recurse at build time

use super::context::ValidationContext;
use super::nullable::{lift, Nullability, Presence};
use super::record::expect_object;
use super::registry::ValidatorRegistry;
use super::where_filter::FilterExpression;
use crate::core::{EntityId, FieldPath};
use crate::ent_schema::{Cardinality, RelationDescriptor};
use serde::Serialize;
use serde_json::{Map, Value};

/// Condition on the related row of a to-one relation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RelationMatch {
    /// `null`: the relation is absent.
    Absent,
    Matches(Box<FilterExpression>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RelationFilter {
    ToOne {
        is: Option<RelationMatch>,
        is_not: Option<RelationMatch>,
    },
    ToMany {
        every: Option<Box<FilterExpression>>,
        some: Option<Box<FilterExpression>>,
        none: Option<Box<FilterExpression>>,
    },
}

#[derive(Debug, Clone)]
pub struct RelationFilterValidator {
    target: EntityId,
    target_name: String,
    cardinality: Cardinality,
    nullable: bool,
}

impl RelationFilterValidator {
    pub fn new(relation: &RelationDescriptor) -> Self {
        Self {
            target: relation.target,
            target_name: relation.target_name.clone(),
            cardinality: relation.cardinality,
            nullable: relation.nullable,
        }
    }

    pub fn validate(
        &self,
        registry: &ValidatorRegistry,
        ctx: &mut ValidationContext<'_>,
        path: &FieldPath,
        input: &Value,
    ) -> Option<RelationFilter> {
        ctx.nested_relation(path, |ctx| match self.cardinality {
            Cardinality::One => self.validate_to_one(registry, ctx, path, input),
            Cardinality::Many => self.validate_to_many(registry, ctx, path, input),
        })
    }

    fn target_filter(
        &self,
        registry: &ValidatorRegistry,
        ctx: &mut ValidationContext<'_>,
        path: &FieldPath,
        input: &Value,
    ) -> Option<FilterExpression> {
        registry
            .validators(self.target)
            .filter
            .validate(registry, ctx, path, input)
    }

    fn validate_to_one(
        &self,
        registry: &ValidatorRegistry,
        ctx: &mut ValidationContext<'_>,
        path: &FieldPath,
        input: &Value,
    ) -> Option<RelationFilter> {
        let expected = format!("{} where object", self.target_name);
        let nullability = Nullability::of(self.nullable);

        let object = match input {
            Value::Null if self.nullable => {
                return Some(RelationFilter::ToOne {
                    is: Some(RelationMatch::Absent),
                    is_not: None,
                });
            }
            other => expect_object(ctx, path, other, &expected)?,
        };

        // Anything but `is`/`isNot` keys is the target's where object used directly
        if !is_structured(object) {
            let matches = self.target_filter(registry, ctx, path, input)?;
            return Some(RelationFilter::ToOne {
                is: Some(RelationMatch::Matches(Box::new(matches))),
                is_not: None,
            });
        }

        let side = |key: &str, ctx: &mut ValidationContext<'_>| {
            let side_path = path.key(key);
            lift(ctx, &side_path, object.get(key), nullability, &expected, |ctx, value| {
                self.target_filter(registry, ctx, &side_path, value)
            })
            .map(|presence| match presence {
                Presence::Absent => None,
                Presence::Null => Some(RelationMatch::Absent),
                Presence::Value(expr) => Some(RelationMatch::Matches(Box::new(expr))),
            })
        };
        let is = side("is", ctx);
        let is_not = side("isNot", ctx);

        Some(RelationFilter::ToOne { is: is?, is_not: is_not? })
    }

    fn validate_to_many(
        &self,
        registry: &ValidatorRegistry,
        ctx: &mut ValidationContext<'_>,
        path: &FieldPath,
        input: &Value,
    ) -> Option<RelationFilter> {
        let object = expect_object(ctx, path, input, "every/some/none object")?;
        let mut every = None;
        let mut some = None;
        let mut none = None;
        let mut ok = true;

        for (key, value) in object {
            let slot = match key.as_str() {
                "every" => &mut every,
                "some" => &mut some,
                "none" => &mut none,
                other => {
                    ctx.unknown_field(path, other);
                    ok = false;
                    continue;
                }
            };
            match self.target_filter(registry, ctx, &path.key(key), value) {
                Some(expr) => *slot = Some(Box::new(expr)),
                None => ok = false,
            }
        }

        ok.then_some(RelationFilter::ToMany { every, some, none })
    }
}

fn is_structured(object: &Map<String, Value>) -> bool {
    object.keys().all(|k| k == "is" || k == "isNot")
}
