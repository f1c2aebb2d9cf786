// Update Payload Validator - partial updates with three-state field semantics
// Omitted means unchanged, `{set: null}` clears, anything else writes

use super::field_update::{update_value, FieldUpdate};
use super::relation_write::{RelationOperation, RelationWrite, WriteMode};
use super::{WriteScope, WriteShape, WriteSlot};
use crate::core::FieldPath;
use crate::ent_schema::EntityDescriptor;
use crate::error::ValidationErrorKind;
use crate::framework::context::ValidationContext;
use crate::framework::nullable::Presence;
use crate::framework::record::expect_object;
use crate::framework::registry::ValidatorRegistry;
use crate::framework::scalar::ScalarValue;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdatePayload {
    pub entity: String,
    pub fields: BTreeMap<String, FieldUpdate>,
    pub relations: BTreeMap<String, Vec<RelationOperation>>,
}

impl UpdatePayload {
    /// What the update does to `field`: leave it, clear it, or write it.
    pub fn presence(&self, field: &str) -> Presence<&FieldUpdate> {
        match self.fields.get(field) {
            None => Presence::Absent,
            Some(update) if update.is_clear() => Presence::Null,
            Some(update) => Presence::Value(update),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.relations.is_empty()
    }
}

#[derive(Debug)]
pub struct UpdateValidator {
    shape: WriteShape,
}

impl UpdateValidator {
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
    ) -> Option<UpdatePayload> {
        let shape = &self.shape;
        let object = expect_object(ctx, path, input, &format!("{} update payload", shape.entity))?;
        let variant = shape.detect(object, scope);
        let mut fields = BTreeMap::new();
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
                Some(WriteSlot::Field(field)) => match update_value(ctx, &member_path, field, value) {
                    Some(update) => {
                        fields.insert(key.clone(), update);
                        true
                    }
                    None => false,
                },
                Some(WriteSlot::ForeignKey(field)) => match update_value(ctx, &member_path, field, value) {
                    Some(FieldUpdate::Set(v)) => {
                        foreign_keys.insert(key.clone(), v);
                        true
                    }
                    // Relative arithmetic on a reference is meaningless
                    Some(other) => {
                        let operation = other.operation();
                        ctx.report(
                            &member_path.key(operation),
                            ValidationErrorKind::invalid_operator(operation, "foreign key"),
                        );
                        false
                    }
                    None => false,
                },
                Some(WriteSlot::Relation(relation)) => match RelationWrite::new(registry, relation, WriteMode::Update)
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

        match shape.foreign_key_links(ctx, path, &foreign_keys, &failed, scope, WriteMode::Update) {
            Some(links) => relations.extend(links),
            None => ok = false,
        }

        ok.then(|| UpdatePayload {
            entity: shape.entity.clone(),
            fields,
            relations,
        })
    }
}
