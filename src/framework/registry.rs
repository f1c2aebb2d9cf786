// Validator Registry - lazily built per-entity validator bundles and the public entry points
// Bundles are keyed by EntityId and built once on first use, so cyclic relation graphs resolve in one pass

use super::context::ValidationContext;
use super::find_args::{FindManyArgs, FindManyValidator};
use super::mutation::{
    CreatePayload, CreateValidator, PayloadVariant, UpdatePayload, UpdateValidator, WriteScope,
};
use super::order::{OrderValidator, SortKey};
use super::unique::{UniqueLookup, UniqueValidator};
use super::where_filter::{FilterExpression, WhereValidator};
use crate::config::ValidatorConfig;
use crate::core::{EntityId, FieldPath};
use crate::ent_schema::{EntityDescriptor, Schema};
use crate::error::{RegistryError, RegistryResult, ValidationErrors};
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Every validator derived from one entity descriptor.
#[derive(Debug)]
pub(crate) struct EntityValidators {
    pub filter: WhereValidator,
    pub unique: UniqueValidator,
    pub order: OrderValidator,
    pub aggregate_order: OrderValidator,
    pub create: CreateValidator,
    pub update: UpdateValidator,
    pub find_many: FindManyValidator,
}

impl EntityValidators {
    fn new(entity: &EntityDescriptor) -> Self {
        Self {
            filter: WhereValidator::new(entity),
            unique: UniqueValidator::new(entity),
            order: OrderValidator::rows(entity),
            aggregate_order: OrderValidator::aggregate(entity),
            create: CreateValidator::new(entity),
            update: UpdateValidator::new(entity),
            find_many: FindManyValidator::new(entity),
        }
    }
}

/// Shared, thread-safe entry point for validating request inputs against a frozen schema.
pub struct ValidatorRegistry {
    schema: Arc<Schema>,
    config: ValidatorConfig,
    bundles: Vec<OnceCell<EntityValidators>>,
}

impl ValidatorRegistry {
    pub fn new(schema: Arc<Schema>, config: ValidatorConfig) -> Self {
        let bundles = (0..schema.len()).map(|_| OnceCell::new()).collect();
        Self {
            schema,
            config,
            bundles,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Resolve a public entity name. Unknown names are caller misuse, not input errors.
    pub fn resolve(&self, entity: &str) -> RegistryResult<EntityId> {
        self.schema
            .lookup(entity)
            .ok_or_else(|| RegistryError::UnknownEntity(entity.to_string()))
    }

    pub(crate) fn validators(&self, id: EntityId) -> &EntityValidators {
        self.bundles[id.index()].get_or_init(|| {
            let entity = self.schema.entity(id);
            debug!(entity = %entity.name, "building validator bundle");
            EntityValidators::new(entity)
        })
    }

    fn run<T>(
        &self,
        entity: &str,
        operation: &'static str,
        validate: impl FnOnce(&EntityValidators, &mut ValidationContext<'_>) -> Option<T>,
    ) -> RegistryResult<T> {
        let id = self.resolve(entity)?;
        let validators = self.validators(id);
        let mut ctx = ValidationContext::new(&self.config);
        let out = validate(validators, &mut ctx);
        ctx.finish(out).map_err(|errors: ValidationErrors| {
            debug!(entity, operation, errors = errors.len(), "input rejected");
            RegistryError::Invalid(errors)
        })
    }

    pub fn validate_filter(&self, entity: &str, input: &Value) -> RegistryResult<FilterExpression> {
        self.run(entity, "filter", |v, ctx| {
            v.filter.validate(self, ctx, &FieldPath::root(), input)
        })
    }

    pub fn validate_unique_lookup(&self, entity: &str, input: &Value) -> RegistryResult<UniqueLookup> {
        self.run(entity, "unique_lookup", |v, ctx| {
            v.unique.validate(self, ctx, &FieldPath::root(), input, &v.filter)
        })
    }

    pub fn validate_order(&self, entity: &str, input: &Value) -> RegistryResult<Vec<SortKey>> {
        self.run(entity, "order", |v, ctx| v.order.validate(self, ctx, &FieldPath::root(), input))
    }

    pub fn validate_order_by_aggregate(&self, entity: &str, input: &Value) -> RegistryResult<Vec<SortKey>> {
        self.run(entity, "order_by_aggregate", |v, ctx| {
            v.aggregate_order.validate(self, ctx, &FieldPath::root(), input)
        })
    }

    /// Validate a create body, choosing the unchecked variant when a foreign key scalar is present.
    pub fn validate_create_payload(&self, entity: &str, input: &Value) -> RegistryResult<CreatePayload> {
        self.run(entity, "create", |v, ctx| {
            v.create.validate(self, ctx, &FieldPath::root(), input, WriteScope::root(None))
        })
    }

    pub fn validate_create_payload_as(
        &self,
        entity: &str,
        input: &Value,
        variant: PayloadVariant,
    ) -> RegistryResult<CreatePayload> {
        self.run(entity, "create", |v, ctx| {
            v.create.validate(self, ctx, &FieldPath::root(), input, WriteScope::root(Some(variant)))
        })
    }

    pub fn validate_update_payload(&self, entity: &str, input: &Value) -> RegistryResult<UpdatePayload> {
        self.run(entity, "update", |v, ctx| {
            v.update.validate(self, ctx, &FieldPath::root(), input, WriteScope::root(None))
        })
    }

    pub fn validate_update_payload_as(
        &self,
        entity: &str,
        input: &Value,
        variant: PayloadVariant,
    ) -> RegistryResult<UpdatePayload> {
        self.run(entity, "update", |v, ctx| {
            v.update.validate(self, ctx, &FieldPath::root(), input, WriteScope::root(Some(variant)))
        })
    }

    pub fn validate_find_many(&self, entity: &str, input: &Value) -> RegistryResult<FindManyArgs> {
        self.run(entity, "find_many", |v, ctx| {
            v.find_many.validate(self, ctx, &FieldPath::root(), input, v)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ent_schema::{FieldDefinition, FieldType, RelationDefinition, SchemaRegistry};
    use serde_json::json;

    fn registry() -> ValidatorRegistry {
        let mut schemas = SchemaRegistry::new();
        schemas
            .define(
                "Team",
                vec![
                    FieldDefinition::new("id", FieldType::String).id(),
                    FieldDefinition::new("name", FieldType::String),
                ],
                vec![RelationDefinition::to("players", "Player", "team")],
                vec![],
            )
            .define(
                "Player",
                vec![
                    FieldDefinition::new("id", FieldType::String).id(),
                    FieldDefinition::new("teamId", FieldType::String),
                ],
                vec![RelationDefinition::from("team", "Team", "players").references(&["teamId"], &["id"])],
                vec![],
            );
        let schema = schemas.freeze().expect("valid schema");
        ValidatorRegistry::new(Arc::new(schema), ValidatorConfig::default())
    }

    #[test]
    fn test_unknown_entity_is_misuse() {
        let registry = registry();
        let err = registry.validate_filter("Coach", &json!({})).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownEntity(name) if name == "Coach"));
    }

    #[test]
    fn test_bundles_are_built_once_and_lazily() {
        let registry = registry();
        assert!(registry.bundles.iter().all(|cell| cell.get().is_none()));
        let team = registry.resolve("Team").unwrap();
        let first = registry.validators(team) as *const EntityValidators;
        let second = registry.validators(team) as *const EntityValidators;
        assert_eq!(first, second);
        let player = registry.resolve("Player").unwrap();
        assert!(registry.bundles[player.index()].get().is_none());
    }

    #[test]
    fn test_cross_relation_filter_resolves_target() {
        let registry = registry();
        let filter = json!({"players": {"some": {"team": {"is": {"name": "Reds"}}}}});
        assert!(registry.validate_filter("Team", &filter).is_ok());
    }

    #[test]
    fn test_config_is_shared_by_every_call() {
        let config = ValidatorConfig::default().with_max_errors(1);
        let mut schemas = SchemaRegistry::new();
        schemas.define("Team", vec![FieldDefinition::new("id", FieldType::String).id()], vec![], vec![]);
        let registry = ValidatorRegistry::new(Arc::new(schemas.freeze().expect("valid schema")), config);
        assert_eq!(registry.config().max_errors, 1);
        let err = registry.validate_filter("Team", &json!({"a": 1, "b": 2})).unwrap_err();
        assert_eq!(err.validation_errors().map(|e| e.len()), Some(1));
    }
}
