// Ent Predicate - schema-driven validation of filters, ordering and mutation payloads

// Core types and primitives
pub mod core;

// Schema-as-code declarations and the frozen descriptor graph
pub mod ent_schema;

// Predicate Framework - validators derived from the schema
pub mod framework;

// Schema Definitions - the e-commerce entity graph
pub mod schemas;

// Common utilities
pub mod config;
pub mod error;

// Re-exports for convenience
pub use config::ValidatorConfig;
pub use ent_schema::{EntSchema, Schema, SchemaRegistry};
pub use error::{RegistryError, RegistryResult, SchemaError, ValidationError, ValidationErrorKind, ValidationErrors};
pub use framework::ValidatorRegistry;
