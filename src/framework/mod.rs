// Predicate Framework - validators for filters, unique lookups, ordering and mutation payloads
// Built once per entity from the frozen schema and shared across threads

pub mod context;
pub mod find_args;
pub mod mutation;
pub mod nullable;
pub mod order;
pub mod record;
pub mod registry;
pub mod relation_filter;
pub mod scalar;
pub mod unique;
pub mod where_filter;

// Re-export the request-facing types for convenience
pub use context::ValidationContext;
pub use find_args::FindManyArgs;
pub use mutation::{
    CreatePayload, FieldUpdate, FieldValue, PayloadVariant, RelationOperation, UpdatePayload, WriteScope,
};
pub use nullable::{Nullability, Presence};
pub use order::{AggregateFunction, NullsPosition, SortDirection, SortKey, SortTarget};
pub use registry::ValidatorRegistry;
pub use relation_filter::{RelationFilter, RelationMatch};
pub use scalar::{
    FilterOperator, ListCondition, ListFilter, QueryMode, ScalarCondition, ScalarFilter, ScalarValue,
};
pub use unique::{UniqueKeyValue, UniqueLookup};
pub use where_filter::FilterExpression;
