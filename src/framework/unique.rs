// Unique-Lookup Validator - "identifies exactly one row" filters
// A union of the declared unique keys, intersected with the entity's general where filter

use super::context::ValidationContext;
use super::record::expect_object;
use super::registry::ValidatorRegistry;
use super::scalar::{literal, ScalarValue};
use super::where_filter::{FilterExpression, WhereValidator};
use crate::core::FieldPath;
use crate::ent_schema::{EntityDescriptor, FieldType, UniqueKey};
use crate::error::ValidationErrorKind;
use serde::Serialize;
use serde_json::{Map, Value};

/// One supplied unique key with its component values in key order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UniqueKeyValue {
    pub key: String,
    pub values: Vec<(String, ScalarValue)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UniqueLookup {
    /// At least one entry.
    pub keys: Vec<UniqueKeyValue>,
    /// Extra non-unique constraints riding along.
    pub filter: Option<FilterExpression>,
}

impl UniqueLookup {
    pub fn by_key(key: UniqueKeyValue) -> Self {
        Self {
            keys: vec![key],
            filter: None,
        }
    }
}

/// One alternative of the key union.
#[derive(Debug, Clone)]
struct KeyAlternative {
    key: UniqueKey,
    components: Vec<(String, FieldType)>,
}

/// Derives the key union from the entity's declared unique keys.
fn one_of_keys(entity: &EntityDescriptor) -> Vec<KeyAlternative> {
    entity
        .unique_keys
        .iter()
        .map(|key| KeyAlternative {
            key: key.clone(),
            components: key
                .fields
                .iter()
                .filter_map(|name| entity.field(name).map(|f| (name.clone(), f.field_type.clone())))
                .collect(),
        })
        .collect()
}

#[derive(Debug)]
pub struct UniqueValidator {
    entity: String,
    alternatives: Vec<KeyAlternative>,
}

impl UniqueValidator {
    pub fn new(entity: &EntityDescriptor) -> Self {
        Self {
            entity: entity.name.clone(),
            alternatives: one_of_keys(entity),
        }
    }

    fn alternative(&self, name: &str) -> Option<&KeyAlternative> {
        self.alternatives.iter().find(|a| a.key.name == name)
    }

    pub fn key_names(&self) -> Vec<String> {
        self.alternatives.iter().map(|a| a.key.name.clone()).collect()
    }

    pub fn validate(
        &self,
        registry: &ValidatorRegistry,
        ctx: &mut ValidationContext<'_>,
        path: &FieldPath,
        input: &Value,
        entity_filter: &WhereValidator,
    ) -> Option<UniqueLookup> {
        let object = expect_object(ctx, path, input, &format!("{} unique lookup", self.entity))?;
        let mut keys = Vec::new();
        let mut rest = Map::new();
        let mut ok = true;

        for (key, value) in object {
            match self.alternative(key) {
                Some(alternative) => match self.key_value(ctx, &path.key(key), alternative, value) {
                    Some(kv) => keys.push(kv),
                    None => ok = false,
                },
                None => {
                    rest.insert(key.clone(), value.clone());
                }
            }
        }

        let filter = if rest.is_empty() {
            None
        } else {
            match entity_filter.validate(registry, ctx, path, &Value::Object(rest)) {
                Some(expr) => Some(expr),
                None => {
                    ok = false;
                    None
                }
            }
        };

        if keys.is_empty() && ok {
            ctx.report(
                path,
                ValidationErrorKind::NoUniqueKeySupplied {
                    entity: self.entity.clone(),
                    expected: self.key_names(),
                },
            );
            return None;
        }

        ok.then_some(UniqueLookup { keys, filter })
    }

    fn key_value(
        &self,
        ctx: &mut ValidationContext<'_>,
        path: &FieldPath,
        alternative: &KeyAlternative,
        value: &Value,
    ) -> Option<UniqueKeyValue> {
        if !alternative.key.is_compound() {
            let (name, field_type) = alternative.components.first()?;
            // Unique components take literals only; null identifies nothing
            let v = literal(ctx, path, field_type, value)?;
            return Some(UniqueKeyValue {
                key: alternative.key.name.clone(),
                values: vec![(name.clone(), v)],
            });
        }

        // Compound keys come nested under their `a_b` name, never as top-level keys
        let object = expect_object(ctx, path, value, &format!("{} object", alternative.key.name))?;
        let mut values = Vec::with_capacity(alternative.components.len());
        let mut ok = true;
        for (name, field_type) in &alternative.components {
            match object.get(name) {
                Some(v) => match literal(ctx, &path.key(name), field_type, v) {
                    Some(v) => values.push((name.clone(), v)),
                    None => ok = false,
                },
                None => {
                    ctx.report(
                        &path.key(name),
                        ValidationErrorKind::RequiredFieldMissing { field: name.clone() },
                    );
                    ok = false;
                }
            }
        }
        for key in object.keys() {
            if !alternative.components.iter().any(|(name, _)| name == key) {
                ctx.unknown_field(path, key);
                ok = false;
            }
        }
        ok.then_some(UniqueKeyValue {
            key: alternative.key.name.clone(),
            values,
        })
    }
}
