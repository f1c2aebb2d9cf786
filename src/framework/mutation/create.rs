// Create Payload Validator - required fields, literal values and nested relation links

use super::field_update::{create_value, FieldValue};
use super::relation_write::{RelationOperation, RelationWrite, WriteMode};
use super::{PayloadVariant, WriteScope, WriteShape, WriteSlot};
use crate::core::FieldPath;
use crate::ent_schema::EntityDescriptor;
use crate::error::ValidationErrorKind;
use crate::framework::context::ValidationContext;
use crate::framework::record::expect_object;
use crate::framework::registry::ValidatorRegistry;
use crate::framework::scalar::ScalarValue;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// A validated create body. Foreign key scalars appear as `Connect` operations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatePayload {
    pub entity: String,
    pub values: BTreeMap<String, FieldValue>,
    pub relations: BTreeMap<String, Vec<RelationOperation>>,
}

#[derive(Debug)]
pub struct CreateValidator {
    shape: WriteShape,
}

impl CreateValidator {
    pub fn new(entity: &EntityDescriptor) -> Self {
        Self {
            shape: WriteShape::new(entity),
        }
    }

    pub fn validate(
        &self,
        registry: &ValidatorRegistry,
        ctx: &mut ValidationContext<'_>,
        path: &FieldPath,
        input: &Value,
        scope: WriteScope<'_>,
    ) -> Option<CreatePayload> {
        let shape = &self.shape;
        let object = expect_object(ctx, path, input, &format!("{} create payload", shape.entity))?;
        let variant = shape.detect(object, scope);
        let mut values = BTreeMap::new();
        let mut relations = BTreeMap::new();
        let mut foreign_keys: HashMap<String, ScalarValue> = HashMap::new();
        let mut failed = Vec::new();
        let mut ok = true;

        for (key, value) in object {
            let member_path = path.key(key);
            let accepted = match shape.slot(key, scope, variant) {
                None => {
                    ctx.unknown_field(path, key);
                    false
                }
                Some(WriteSlot::Field(field)) => match create_value(ctx, &member_path, field, value) {
                    Some(v) => {
                        values.insert(key.clone(), v);
                        true
                    }
                    None => false,
                },
                Some(WriteSlot::ForeignKey(field)) => match create_value(ctx, &member_path, field, value) {
                    Some(FieldValue::Scalar(v)) => {
                        foreign_keys.insert(key.clone(), v);
                        true
                    }
                    Some(FieldValue::List(_)) => {
                        ctx.type_mismatch(&member_path, &field.field_type.label(), value);
                        false
                    }
                    None => false,
                },
                Some(WriteSlot::Relation(relation)) => match RelationWrite::new(registry, relation, WriteMode::Create)
                    .validate(ctx, &member_path, value)
                {
                    Some(ops) => {
                        relations.insert(key.clone(), ops);
                        true
                    }
                    None => false,
                },
            };
            if !accepted {
                failed.push(key.as_str());
                ok = false;
            }
        }

        for field in &shape.fields {
            if field.is_required_on_create()
                && !shape.is_foreign_key(&field.name)
                && !object.contains_key(&field.name)
            {
                ctx.report(
                    &path.key(&field.name),
                    ValidationErrorKind::RequiredFieldMissing {
                        field: field.name.clone(),
                    },
                );
                ok = false;
            }
        }

        match variant {
            PayloadVariant::Checked => {
                for relation in &shape.relations {
                    let required = relation.is_owning() && !relation.nullable;
                    if !required || shape.is_excluded(&relation.name, scope) || failed.contains(&relation.name.as_str()) {
                        continue;
                    }
                    let linked = relations
                        .get(&relation.name)
                        .is_some_and(|ops: &Vec<RelationOperation>| links_a_row(ops));
                    if !linked {
                        ctx.report(
                            &path.key(&relation.name),
                            ValidationErrorKind::RelationRequiredButAbsent {
                                relation: relation.name.clone(),
                            },
                        );
                        ok = false;
                    }
                }
            }
            PayloadVariant::Unchecked => {
                match shape.foreign_key_links(ctx, path, &foreign_keys, &failed, scope, WriteMode::Create) {
                    Some(links) => relations.extend(links),
                    None => ok = false,
                }
            }
        }

        ok.then(|| CreatePayload {
            entity: shape.entity.clone(),
            values,
            relations,
        })
    }
}

fn links_a_row(operations: &[RelationOperation]) -> bool {
    operations.iter().any(|op| {
        matches!(
            op,
            RelationOperation::Create(_) | RelationOperation::Connect(_) | RelationOperation::ConnectOrCreate { .. }
        )
    })
}
