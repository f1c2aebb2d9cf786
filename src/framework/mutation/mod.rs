// Mutation Payload Validators - create/update bodies in checked and unchecked variants
// Both variants project onto one relation-operation model, so equal intents validate to equal payloads

pub mod create;
pub mod field_update;
pub mod relation_write;
pub mod update;

pub use create::{CreatePayload, CreateValidator};
pub use field_update::{FieldUpdate, FieldValue};
pub use relation_write::{RelationOperation, WriteMode};
pub use update::{UpdatePayload, UpdateValidator};

use super::context::ValidationContext;
use super::record::ClosedRecord;
use super::scalar::ScalarValue;
use super::unique::{UniqueKeyValue, UniqueLookup};
use crate::core::FieldPath;
use crate::ent_schema::{EntityDescriptor, FieldDescriptor, RelationDescriptor};
use crate::error::ValidationErrorKind;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

/// How relations are written: structurally, or through raw foreign key scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PayloadVariant {
    Checked,
    Unchecked,
}

/// Where a payload sits inside a (possibly nested) write.
#[derive(Debug, Clone, Copy)]
pub struct WriteScope<'a> {
    /// Forced variant; `None` detects it from the keys present.
    pub variant: Option<PayloadVariant>,
    /// Relation back to the parent of a nested write, with its foreign keys.
    pub exclude: Option<&'a str>,
    pub allow_relations: bool,
}

impl<'a> WriteScope<'a> {
    pub fn root(variant: Option<PayloadVariant>) -> Self {
        Self {
            variant,
            exclude: None,
            allow_relations: true,
        }
    }

    pub(crate) fn nested(back_relation: &'a str) -> Self {
        Self {
            variant: None,
            exclude: Some(back_relation),
            allow_relations: true,
        }
    }

    /// `createMany` rows and `updateMany` data: scalars and foreign keys only.
    pub(crate) fn scalars_only(back_relation: &'a str) -> Self {
        Self {
            variant: Some(PayloadVariant::Unchecked),
            exclude: Some(back_relation),
            allow_relations: false,
        }
    }
}

#[derive(Debug)]
pub(crate) enum WriteSlot {
    Field(FieldDescriptor),
    /// Scalar half of an owning relation, writable in the unchecked variant.
    ForeignKey(FieldDescriptor),
    Relation(RelationDescriptor),
}

/// Writable shape of one entity, shared by its create and update validators.
#[derive(Debug)]
pub(crate) struct WriteShape {
    pub entity: String,
    pub fields: Vec<FieldDescriptor>,
    pub relations: Vec<RelationDescriptor>,
    record: ClosedRecord<WriteSlot>,
}

impl WriteShape {
    pub fn new(entity: &EntityDescriptor) -> Self {
        let mut record = ClosedRecord::new();
        for field in &entity.fields {
            let slot = match entity.foreign_key_owner(&field.name) {
                Some(_) => WriteSlot::ForeignKey(field.clone()),
                None => WriteSlot::Field(field.clone()),
            };
            record.insert(&field.name, slot);
        }
        for relation in &entity.relations {
            record.insert(&relation.name, WriteSlot::Relation(relation.clone()));
        }
        Self {
            entity: entity.name.clone(),
            fields: entity.fields.clone(),
            relations: entity.relations.clone(),
            record,
        }
    }

    fn relation(&self, name: &str) -> Option<&RelationDescriptor> {
        self.relations.iter().find(|r| r.name == name)
    }

    /// Back-relation keys that a nested write must not mention.
    pub fn is_excluded(&self, key: &str, scope: WriteScope<'_>) -> bool {
        let Some(back) = scope.exclude else {
            return false;
        };
        key == back
            || self
                .relation(back)
                .is_some_and(|r| r.is_owning() && r.foreign_keys.iter().any(|fk| fk == key))
    }

    pub fn is_foreign_key(&self, field: &str) -> bool {
        matches!(self.record.get(field), Some(WriteSlot::ForeignKey(_)))
    }

    pub fn detect(&self, object: &Map<String, Value>, scope: WriteScope<'_>) -> PayloadVariant {
        scope.variant.unwrap_or_else(|| {
            let unchecked = object
                .keys()
                .any(|key| self.is_foreign_key(key) && !self.is_excluded(key, scope));
            if unchecked {
                PayloadVariant::Unchecked
            } else {
                PayloadVariant::Checked
            }
        })
    }

    /// The slot a key writes to, or `None` when the key is not part of this shape.
    pub fn slot(&self, key: &str, scope: WriteScope<'_>, variant: PayloadVariant) -> Option<&WriteSlot> {
        if self.is_excluded(key, scope) {
            return None;
        }
        match self.record.get(key)? {
            WriteSlot::ForeignKey(_) if variant == PayloadVariant::Checked => None,
            WriteSlot::Relation(_) if !scope.allow_relations => None,
            WriteSlot::Relation(r) if variant == PayloadVariant::Unchecked && r.is_owning() => None,
            slot => Some(slot),
        }
    }

    /// Owning relations whose foreign keys this scope may set.
    fn owning_relations<'s>(&'s self, scope: WriteScope<'s>) -> impl Iterator<Item = &'s RelationDescriptor> + 's {
        self.relations
            .iter()
            .filter(move |r| r.is_owning() && scope.exclude != Some(r.name.as_str()))
    }

    /// Project supplied foreign key scalars onto `connect`/`disconnect` of their relations.
    pub fn foreign_key_links(
        &self,
        ctx: &mut ValidationContext<'_>,
        path: &FieldPath,
        supplied: &HashMap<String, ScalarValue>,
        rejected: &[&str],
        scope: WriteScope<'_>,
        mode: WriteMode,
    ) -> Option<BTreeMap<String, Vec<RelationOperation>>> {
        let mut links = BTreeMap::new();
        let mut ok = true;

        for relation in self.owning_relations(scope) {
            if relation.foreign_keys.iter().any(|fk| rejected.contains(&fk.as_str())) {
                continue;
            }
            let values: Vec<Option<&ScalarValue>> =
                relation.foreign_keys.iter().map(|fk| supplied.get(fk)).collect();
            let none_supplied = values.iter().all(Option::is_none);
            if none_supplied && (mode == WriteMode::Update || relation.nullable) {
                continue;
            }

            let mut missing = false;
            for (fk, value) in relation.foreign_keys.iter().zip(&values) {
                if value.is_none() {
                    ctx.report(
                        &path.key(fk),
                        ValidationErrorKind::RequiredFieldMissing { field: fk.clone() },
                    );
                    missing = true;
                }
            }
            if missing {
                ok = false;
                continue;
            }

            let values: Vec<&ScalarValue> = values.into_iter().flatten().collect();
            let nulls = values.iter().filter(|v| v.is_null()).count();
            if nulls == values.len() {
                // Clearing on create is the same as leaving the relation out
                if mode == WriteMode::Update {
                    links.insert(relation.name.clone(), vec![RelationOperation::Disconnect(None)]);
                }
            } else if nulls > 0 {
                ctx.report(
                    &path.key(&relation.foreign_keys[0]),
                    ValidationErrorKind::ConstraintViolation {
                        constraint: format!("foreign keys of `{}` are either all null or all set", relation.name),
                    },
                );
                ok = false;
            } else {
                links.insert(
                    relation.name.clone(),
                    vec![RelationOperation::Connect(referenced_lookup(relation, values))],
                );
            }
        }

        ok.then_some(links)
    }
}

/// The unique lookup a foreign key tuple points at on the relation's target.
fn referenced_lookup(relation: &RelationDescriptor, values: Vec<&ScalarValue>) -> UniqueLookup {
    let key = relation
        .referenced_key
        .clone()
        .unwrap_or_else(|| relation.references.join("_"));
    UniqueLookup::by_key(UniqueKeyValue {
        key,
        values: relation
            .references
            .iter()
            .cloned()
            .zip(values.into_iter().cloned())
            .collect(),
    })
}
