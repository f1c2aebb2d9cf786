// Error taxonomy - request validation errors and schema definition errors
// Validation errors are data returned to the caller; schema errors signal a broken descriptor graph

use crate::core::FieldPath;
use serde::Serialize;
use std::fmt;
use thiserror::Error as ThisError;

/// What went wrong at a single location of a validated input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ThisError)]
#[serde(tag = "code", rename_all = "camelCase")]
pub enum ValidationErrorKind {
    #[error("expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("operator `{operator}` is not valid for {kind}")]
    InvalidOperatorKind { operator: String, kind: String },

    #[error("`{value}` is not a member of enum {enum_name}")]
    InvalidEnumMember { enum_name: String, value: String },

    #[error("unknown field `{name}`")]
    UnknownField { name: String },

    #[error("nulls position is only valid on nullable fields, `{field}` is not nullable")]
    InvalidNullsPosition { field: String },

    #[error("no unique key of {entity} supplied, expected one of: {}", expected.join(", "))]
    NoUniqueKeySupplied { entity: String, expected: Vec<String> },

    #[error("nesting exceeds the limit of {limit} {scope} levels")]
    DepthLimitExceeded { scope: String, limit: usize },

    #[error("required field `{field}` is missing")]
    RequiredFieldMissing { field: String },

    #[error("required relation `{relation}` is absent")]
    RelationRequiredButAbsent { relation: String },

    #[error("value violates constraint {constraint}")]
    ConstraintViolation { constraint: String },
}

impl ValidationErrorKind {
    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn invalid_operator(operator: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::InvalidOperatorKind {
            operator: operator.into(),
            kind: kind.into(),
        }
    }

    pub fn unknown_field(name: impl Into<String>) -> Self {
        Self::UnknownField { name: name.into() }
    }

    /// Stable machine-readable code, matching the serialized `code` tag.
    pub fn code(&self) -> &'static str {
        match self {
            Self::TypeMismatch { .. } => "typeMismatch",
            Self::InvalidOperatorKind { .. } => "invalidOperatorKind",
            Self::InvalidEnumMember { .. } => "invalidEnumMember",
            Self::UnknownField { .. } => "unknownField",
            Self::InvalidNullsPosition { .. } => "invalidNullsPosition",
            Self::NoUniqueKeySupplied { .. } => "noUniqueKeySupplied",
            Self::DepthLimitExceeded { .. } => "depthLimitExceeded",
            Self::RequiredFieldMissing { .. } => "requiredFieldMissing",
            Self::RelationRequiredButAbsent { .. } => "relationRequiredButAbsent",
            Self::ConstraintViolation { .. } => "constraintViolation",
        }
    }
}

/// A validation error anchored at the path where it was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ThisError)]
#[error("{path}: {kind}")]
pub struct ValidationError {
    pub path: FieldPath,
    #[serde(flatten)]
    pub kind: ValidationErrorKind,
}

/// Every error found in one input. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub(crate) fn new(errors: Vec<ValidationError>) -> Self {
        debug_assert!(!errors.is_empty());
        Self(errors)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    /// True when some error at `path` has the given code.
    pub fn contains(&self, path: &str, code: &str) -> bool {
        self.0
            .iter()
            .any(|e| e.path.to_string() == path && e.kind.code() == code)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation error(s)", self.0.len())?;
        for error in &self.0 {
            write!(f, "\n  - {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A descriptor graph that violates a structural invariant.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum SchemaError {
    #[error("entity {0} is declared more than once")]
    DuplicateEntity(String),

    #[error("{entity}: `{name}` is not a valid identifier")]
    InvalidIdentifier { entity: String, name: String },

    #[error("{entity}: `{name}` is a reserved name")]
    ReservedName { entity: String, name: String },

    #[error("{entity}: `{name}` is declared more than once")]
    DuplicateName { entity: String, name: String },

    #[error("{entity}.{field}: list fields cannot be nullable")]
    NullableList { entity: String, field: String },

    #[error("{entity}: no id or unique key declared")]
    MissingUniqueKey { entity: String },

    #[error("{entity}: unique key `{key}` references undeclared or list field `{field}`")]
    UnknownKeyField {
        entity: String,
        key: String,
        field: String,
    },

    #[error("{entity}: compound key name `{key}` clashes with a field or relation")]
    KeyNameClash { entity: String, key: String },

    #[error("{entity}.{relation}: target entity {target} is not declared")]
    UnknownTarget {
        entity: String,
        relation: String,
        target: String,
    },

    #[error("{entity}.{relation}: inverse `{inverse}` is not declared on {target}")]
    MissingInverse {
        entity: String,
        relation: String,
        target: String,
        inverse: String,
    },

    #[error("{entity}.{relation}: inverse `{inverse}` does not mirror this relation ({reason})")]
    InverseMismatch {
        entity: String,
        relation: String,
        inverse: String,
        reason: String,
    },

    #[error("{entity}.{relation}: to-many relations cannot be nullable")]
    NullableToMany { entity: String, relation: String },

    #[error("{entity}.{relation}: {reason}")]
    ForeignKeyMismatch {
        entity: String,
        relation: String,
        reason: String,
    },

    #[error("{entity}.{field}: enum {enum_name} has no members")]
    EmptyEnum {
        entity: String,
        field: String,
        enum_name: String,
    },

    #[error("enum {0} is declared with different members in different places")]
    ConflictingEnum(String),

    #[error("{entity}.{field}: pattern `{pattern}` does not compile")]
    InvalidPattern {
        entity: String,
        field: String,
        pattern: String,
    },
}

/// Errors returned by the registry entry points.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum RegistryError {
    /// The caller named an entity the schema does not declare.
    #[error("entity {0} is not declared in the schema")]
    UnknownEntity(String),

    #[error(transparent)]
    Invalid(#[from] ValidationErrors),
}

impl RegistryError {
    /// The validation errors, when the input itself was rejected.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Invalid(errors) => Some(errors),
            Self::UnknownEntity(_) => None,
        }
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;
