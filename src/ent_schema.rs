// Ent Schema Framework - schema-as-code declarations for the relational entity graph
// Entities declare fields, relations and unique keys; the registry freezes them into a validated Schema

use crate::core::{is_member_name, EntityId, EntityName};
use crate::error::SchemaError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::info;

/// Names that would make a relation filter ambiguous with its shorthand form.
const RESERVED_NAMES: &[&str] = &["is", "isNot"];

/// Schema definition trait - one implementation per entity
pub trait EntSchema: Send + Sync {
    /// Entity name, PascalCase
    fn entity_name() -> &'static str
    where
        Self: Sized;

    /// Define scalar fields for this entity
    fn fields() -> Vec<FieldDefinition>
    where
        Self: Sized;

    /// Define relations to other entities
    fn relations() -> Vec<RelationDefinition>
    where
        Self: Sized,
    {
        Vec::new()
    }

    /// Define compound unique keys
    fn indexes() -> Vec<IndexDefinition>
    where
        Self: Sized,
    {
        Vec::new()
    }
}

/// A closed, named set of enum members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDefinition {
    pub name: String,
    pub members: Vec<String>,
}

impl EnumDefinition {
    pub fn new(name: &str, members: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            members: members.iter().map(|m| m.to_string()).collect(),
        }
    }

    pub fn contains(&self, value: &str) -> bool {
        self.members.iter().any(|m| m == value)
    }
}

/// Scalar kinds a field can hold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    String,
    Int,
    Float,
    Bool,
    DateTime,
    Enum(EnumDefinition),
}

impl FieldType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Int | FieldType::Float)
    }

    /// Supports `lt`/`lte`/`gt`/`gte`.
    pub fn is_orderable(&self) -> bool {
        matches!(
            self,
            FieldType::String | FieldType::Int | FieldType::Float | FieldType::DateTime
        )
    }

    pub fn is_text(&self) -> bool {
        matches!(self, FieldType::String)
    }

    /// Human-readable kind used in error messages.
    pub fn label(&self) -> String {
        match self {
            FieldType::String => "string".to_string(),
            FieldType::Int => "int".to_string(),
            FieldType::Float => "float".to_string(),
            FieldType::Bool => "bool".to_string(),
            FieldType::DateTime => "datetime".to_string(),
            FieldType::Enum(def) => format!("enum {}", def.name),
        }
    }
}

/// Field default values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldDefault {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Function(String), // Function name for dynamic defaults (now, cuid)
}

/// Constraints on literal values written through create and update payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValidator {
    MinLength(usize),
    MaxLength(usize),
    Pattern(String), // Regex pattern
    Range(f64, f64), // Min, Max for numeric types
}

/// Field definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub field_type: FieldType,
    pub nullable: bool,
    pub list: bool,
    pub id: bool,
    pub unique: bool,
    pub default: Option<FieldDefault>,
    pub validators: Vec<FieldValidator>,
}

impl FieldDefinition {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            nullable: false,
            list: false,
            id: false,
            unique: false,
            default: None,
            validators: Vec::new(),
        }
    }

    /// Mark field as the primary key
    pub fn id(mut self) -> Self {
        self.id = true;
        self
    }

    /// Mark field as optional (nullable in storage)
    pub fn optional(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Mark field as a scalar list
    pub fn list(mut self) -> Self {
        self.list = true;
        self
    }

    /// Mark field as unique
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Add default value
    pub fn default_value(mut self, default: FieldDefault) -> Self {
        self.default = Some(default);
        self
    }

    /// Add field validator
    pub fn validate(mut self, validator: FieldValidator) -> Self {
        self.validators.push(validator);
        self
    }
}

/// Relation cardinality from the declaring entity's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cardinality {
    One,
    Many,
}

/// Which side of a relation stores the foreign key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationSide {
    Owning,  // This entity holds the foreign key scalars
    Inverse, // The target entity holds them
}

/// Relation definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDefinition {
    pub name: String,
    pub target: String,
    pub cardinality: Cardinality,
    pub side: RelationSide,
    pub nullable: bool,
    pub inverse: String,
    pub fields: Vec<String>,
    pub references: Vec<String>,
}

impl RelationDefinition {
    /// Owning to-one relation (this entity references the target)
    pub fn from(name: &str, target: &str, inverse: &str) -> Self {
        Self {
            name: name.to_string(),
            target: target.to_string(),
            cardinality: Cardinality::One,
            side: RelationSide::Owning,
            nullable: false,
            inverse: inverse.to_string(),
            fields: Vec::new(),
            references: Vec::new(),
        }
    }

    /// Back-reference, to-many until marked unique
    pub fn to(name: &str, target: &str, inverse: &str) -> Self {
        Self {
            name: name.to_string(),
            target: target.to_string(),
            cardinality: Cardinality::Many,
            side: RelationSide::Inverse,
            nullable: false,
            inverse: inverse.to_string(),
            fields: Vec::new(),
            references: Vec::new(),
        }
    }

    /// Limit a back-reference to one row (one-to-one); the row may not exist
    pub fn unique(mut self) -> Self {
        if self.cardinality == Cardinality::Many {
            self.cardinality = Cardinality::One;
            self.nullable = true;
        }
        self
    }

    /// Mark an owning relation as optional
    pub fn optional(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Foreign key scalars on this entity and the target fields they reference
    pub fn references(mut self, fields: &[&str], references: &[&str]) -> Self {
        self.fields = fields.iter().map(|s| s.to_string()).collect();
        self.references = references.iter().map(|s| s.to_string()).collect();
        self
    }
}

/// Compound unique index definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub fields: Vec<String>,
}

impl IndexDefinition {
    pub fn unique(fields: &[&str]) -> Self {
        Self {
            fields: fields.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// A unique key; compound keys are addressed by the `a_b` convention.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UniqueKey {
    pub name: String,
    pub fields: Vec<String>,
}

impl UniqueKey {
    fn new(fields: Vec<String>) -> Self {
        Self {
            name: fields.join("_"),
            fields,
        }
    }

    pub fn is_compound(&self) -> bool {
        self.fields.len() > 1
    }
}

/// Compiled form of a `FieldValidator`
#[derive(Debug, Clone)]
pub enum Constraint {
    MinLength(usize),
    MaxLength(usize),
    Pattern(Regex),
    Range(f64, f64),
}

impl Constraint {
    pub fn describe(&self) -> String {
        match self {
            Constraint::MinLength(n) => format!("minLength({n})"),
            Constraint::MaxLength(n) => format!("maxLength({n})"),
            Constraint::Pattern(re) => format!("pattern({})", re.as_str()),
            Constraint::Range(min, max) => format!("range({min}, {max})"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: String,
    pub field_type: FieldType,
    pub nullable: bool,
    pub list: bool,
    pub has_default: bool,
    pub constraints: Vec<Constraint>,
}

impl FieldDescriptor {
    /// Must be supplied by every create payload.
    pub fn is_required_on_create(&self) -> bool {
        !self.nullable && !self.list && !self.has_default
    }

    pub fn kind_label(&self) -> String {
        if self.list {
            format!("{}[]", self.field_type.label())
        } else {
            self.field_type.label()
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelationDescriptor {
    pub name: String,
    pub target: EntityId,
    pub target_name: String,
    pub cardinality: Cardinality,
    pub side: RelationSide,
    pub nullable: bool,
    pub inverse: String,
    pub foreign_keys: Vec<String>,
    pub references: Vec<String>,
    /// Name of the target unique key the foreign keys point at.
    pub referenced_key: Option<String>,
}

impl RelationDescriptor {
    pub fn is_to_many(&self) -> bool {
        self.cardinality == Cardinality::Many
    }

    pub fn is_owning(&self) -> bool {
        self.side == RelationSide::Owning
    }
}

#[derive(Debug, Clone)]
pub struct EntityDescriptor {
    pub id: EntityId,
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
    pub relations: Vec<RelationDescriptor>,
    pub unique_keys: Vec<UniqueKey>,
}

impl EntityDescriptor {
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn relation(&self, name: &str) -> Option<&RelationDescriptor> {
        self.relations.iter().find(|r| r.name == name)
    }

    pub fn unique_key(&self, name: &str) -> Option<&UniqueKey> {
        self.unique_keys.iter().find(|k| k.name == name)
    }

    /// The owning relation a foreign key scalar belongs to, if any.
    pub fn foreign_key_owner(&self, field: &str) -> Option<&RelationDescriptor> {
        self.relations
            .iter()
            .find(|r| r.is_owning() && r.foreign_keys.iter().any(|fk| fk == field))
    }
}

/// Frozen, validated descriptor graph. Immutable after construction.
#[derive(Debug)]
pub struct Schema {
    entities: Vec<EntityDescriptor>,
    by_name: HashMap<String, EntityId>,
}

impl Schema {
    pub fn entity(&self, id: EntityId) -> &EntityDescriptor {
        &self.entities[id.index()]
    }

    pub fn lookup(&self, name: &str) -> Option<EntityId> {
        self.by_name.get(name).copied()
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityDescriptor> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[derive(Debug, Clone)]
struct EntityDefinition {
    name: String,
    fields: Vec<FieldDefinition>,
    relations: Vec<RelationDefinition>,
    indexes: Vec<IndexDefinition>,
}

impl EntityDefinition {
    fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    fn relation(&self, name: &str) -> Option<&RelationDefinition> {
        self.relations.iter().find(|r| r.name == name)
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        let mut keys: Vec<UniqueKey> = self
            .fields
            .iter()
            .filter(|f| f.id)
            .chain(self.fields.iter().filter(|f| f.unique && !f.id))
            .map(|f| UniqueKey::new(vec![f.name.clone()]))
            .collect();
        for index in &self.indexes {
            let key = UniqueKey::new(index.fields.clone());
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }
}

/// Schema registry - collects entity schemas before freezing
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    definitions: Vec<EntityDefinition>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema
    pub fn register<T: EntSchema + 'static>(&mut self) -> &mut Self {
        self.define(T::entity_name(), T::fields(), T::relations(), T::indexes())
    }

    /// Register an entity from raw definitions
    pub fn define(
        &mut self,
        name: &str,
        fields: Vec<FieldDefinition>,
        relations: Vec<RelationDefinition>,
        indexes: Vec<IndexDefinition>,
    ) -> &mut Self {
        self.definitions.push(EntityDefinition {
            name: name.to_string(),
            fields,
            relations,
            indexes,
        });
        self
    }

    /// Validate schema consistency
    pub fn validate(&self) -> Result<(), Vec<SchemaError>> {
        let mut errors = Vec::new();
        let mut enums: HashMap<&str, &EnumDefinition> = HashMap::new();
        let mut seen_entities = HashSet::new();

        for def in &self.definitions {
            if !seen_entities.insert(def.name.as_str()) {
                errors.push(SchemaError::DuplicateEntity(def.name.clone()));
            }
            if EntityName::new(&def.name).is_err() {
                errors.push(SchemaError::InvalidIdentifier {
                    entity: def.name.clone(),
                    name: def.name.clone(),
                });
            }
            self.validate_members(def, &mut errors);
            for field in &def.fields {
                validate_field(def, field, &mut enums, &mut errors);
            }
            validate_unique_keys(def, &mut errors);
            for relation in &def.relations {
                self.validate_relation(def, relation, &mut errors);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and build the immutable descriptor graph
    pub fn freeze(self) -> Result<Schema, Vec<SchemaError>> {
        self.validate()?;

        let by_name: HashMap<String, EntityId> = self
            .definitions
            .iter()
            .enumerate()
            .map(|(i, d)| (d.name.clone(), EntityId::new(i)))
            .collect();

        let mut entities = Vec::with_capacity(self.definitions.len());
        for (i, def) in self.definitions.iter().enumerate() {
            let fields = def.fields.iter().map(compile_field).collect();
            let relations = def
                .relations
                .iter()
                .map(|r| {
                    let target = self.definition(&r.target);
                    let referenced_key = target.and_then(|t| {
                        t.unique_keys()
                            .into_iter()
                            .find(|k| !r.references.is_empty() && k.fields == r.references)
                            .map(|k| k.name)
                    });
                    RelationDescriptor {
                        name: r.name.clone(),
                        target: by_name[&r.target],
                        target_name: r.target.clone(),
                        cardinality: r.cardinality,
                        side: r.side,
                        nullable: r.nullable,
                        inverse: r.inverse.clone(),
                        foreign_keys: r.fields.clone(),
                        references: r.references.clone(),
                        referenced_key,
                    }
                })
                .collect();
            entities.push(EntityDescriptor {
                id: EntityId::new(i),
                name: def.name.clone(),
                fields,
                relations,
                unique_keys: def.unique_keys(),
            });
        }

        info!(entities = entities.len(), "schema frozen");
        Ok(Schema { entities, by_name })
    }

    fn definition(&self, name: &str) -> Option<&EntityDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    fn validate_members(&self, def: &EntityDefinition, errors: &mut Vec<SchemaError>) {
        let mut seen = HashSet::new();
        let names = def
            .fields
            .iter()
            .map(|f| f.name.as_str())
            .chain(def.relations.iter().map(|r| r.name.as_str()));
        for name in names {
            if RESERVED_NAMES.contains(&name) {
                errors.push(SchemaError::ReservedName {
                    entity: def.name.clone(),
                    name: name.to_string(),
                });
            } else if !is_member_name(name) {
                errors.push(SchemaError::InvalidIdentifier {
                    entity: def.name.clone(),
                    name: name.to_string(),
                });
            }
            if !seen.insert(name) {
                errors.push(SchemaError::DuplicateName {
                    entity: def.name.clone(),
                    name: name.to_string(),
                });
            }
        }
    }

    fn validate_relation(
        &self,
        def: &EntityDefinition,
        relation: &RelationDefinition,
        errors: &mut Vec<SchemaError>,
    ) {
        let mismatch = |reason: &str| SchemaError::ForeignKeyMismatch {
            entity: def.name.clone(),
            relation: relation.name.clone(),
            reason: reason.to_string(),
        };

        if relation.cardinality == Cardinality::Many && relation.nullable {
            errors.push(SchemaError::NullableToMany {
                entity: def.name.clone(),
                relation: relation.name.clone(),
            });
        }

        let Some(target) = self.definition(&relation.target) else {
            errors.push(SchemaError::UnknownTarget {
                entity: def.name.clone(),
                relation: relation.name.clone(),
                target: relation.target.clone(),
            });
            return;
        };

        // Inverse symmetry: the target must declare the mirror relation
        match target.relation(&relation.inverse) {
            None => errors.push(SchemaError::MissingInverse {
                entity: def.name.clone(),
                relation: relation.name.clone(),
                target: relation.target.clone(),
                inverse: relation.inverse.clone(),
            }),
            Some(inverse) => {
                let reason = if inverse.target != def.name || inverse.inverse != relation.name {
                    Some("it points at a different relation")
                } else if inverse.side == relation.side {
                    Some("exactly one side must own the foreign key")
                } else {
                    None
                };
                if let Some(reason) = reason {
                    errors.push(SchemaError::InverseMismatch {
                        entity: def.name.clone(),
                        relation: relation.name.clone(),
                        inverse: relation.inverse.clone(),
                        reason: reason.to_string(),
                    });
                }
            }
        }

        match relation.side {
            RelationSide::Inverse => {
                if !relation.fields.is_empty() || !relation.references.is_empty() {
                    errors.push(mismatch("only the owning side declares foreign keys"));
                }
            }
            RelationSide::Owning => {
                if relation.cardinality != Cardinality::One {
                    errors.push(mismatch("an owning relation must be to-one"));
                }
                if relation.fields.is_empty() || relation.fields.len() != relation.references.len()
                {
                    errors.push(mismatch("foreign keys and references must pair up"));
                    return;
                }
                let referenced = target
                    .unique_keys()
                    .into_iter()
                    .any(|k| k.fields == relation.references);
                if !referenced {
                    errors.push(mismatch("references must match a unique key of the target"));
                }
                for (fk, reference) in relation.fields.iter().zip(&relation.references) {
                    let (Some(local), Some(remote)) = (def.field(fk), target.field(reference))
                    else {
                        errors.push(mismatch(&format!(
                            "foreign key `{fk}` or reference `{reference}` is not declared"
                        )));
                        continue;
                    };
                    if local.field_type != remote.field_type || local.list || remote.list {
                        errors.push(mismatch(&format!(
                            "foreign key `{fk}` does not match the kind of `{reference}`"
                        )));
                    }
                    if local.nullable != relation.nullable {
                        errors.push(mismatch(&format!(
                            "foreign key `{fk}` nullability must follow the relation"
                        )));
                    }
                }
                let one_to_one = target
                    .relation(&relation.inverse)
                    .is_some_and(|inv| inv.cardinality == Cardinality::One);
                if one_to_one && !def.unique_keys().iter().any(|k| k.fields == relation.fields) {
                    errors.push(mismatch("a one-to-one foreign key must be unique"));
                }
            }
        }
    }
}

fn validate_field<'a>(
    def: &EntityDefinition,
    field: &'a FieldDefinition,
    enums: &mut HashMap<&'a str, &'a EnumDefinition>,
    errors: &mut Vec<SchemaError>,
) {
    if field.list && field.nullable {
        errors.push(SchemaError::NullableList {
            entity: def.name.clone(),
            field: field.name.clone(),
        });
    }
    if let FieldType::Enum(enum_def) = &field.field_type {
        if enum_def.members.is_empty() {
            errors.push(SchemaError::EmptyEnum {
                entity: def.name.clone(),
                field: field.name.clone(),
                enum_name: enum_def.name.clone(),
            });
        }
        match enums.get(enum_def.name.as_str()) {
            Some(existing) if *existing != enum_def => {
                errors.push(SchemaError::ConflictingEnum(enum_def.name.clone()));
            }
            Some(_) => {}
            None => {
                enums.insert(&enum_def.name, enum_def);
            }
        }
    }
    for validator in &field.validators {
        if let FieldValidator::Pattern(pattern) = validator {
            if Regex::new(pattern).is_err() {
                errors.push(SchemaError::InvalidPattern {
                    entity: def.name.clone(),
                    field: field.name.clone(),
                    pattern: pattern.clone(),
                });
            }
        }
    }
}

fn validate_unique_keys(def: &EntityDefinition, errors: &mut Vec<SchemaError>) {
    let keys = def.unique_keys();
    if keys.is_empty() {
        errors.push(SchemaError::MissingUniqueKey {
            entity: def.name.clone(),
        });
    }
    for key in &keys {
        for component in &key.fields {
            let declared = def.field(component).is_some_and(|f| !f.list);
            if !declared {
                errors.push(SchemaError::UnknownKeyField {
                    entity: def.name.clone(),
                    key: key.name.clone(),
                    field: component.clone(),
                });
            }
        }
        if key.is_compound() && (def.field(&key.name).is_some() || def.relation(&key.name).is_some())
        {
            errors.push(SchemaError::KeyNameClash {
                entity: def.name.clone(),
                key: key.name.clone(),
            });
        }
    }
}

fn compile_field(field: &FieldDefinition) -> FieldDescriptor {
    // Patterns were checked by validate(), so compilation cannot fail here
    let constraints = field
        .validators
        .iter()
        .filter_map(|v| match v {
            FieldValidator::MinLength(n) => Some(Constraint::MinLength(*n)),
            FieldValidator::MaxLength(n) => Some(Constraint::MaxLength(*n)),
            FieldValidator::Pattern(p) => Regex::new(p).ok().map(Constraint::Pattern),
            FieldValidator::Range(min, max) => Some(Constraint::Range(*min, *max)),
        })
        .collect();
    FieldDescriptor {
        name: field.name.clone(),
        field_type: field.field_type.clone(),
        nullable: field.nullable,
        list: field.list,
        has_default: field.default.is_some(),
        constraints,
    }
}
