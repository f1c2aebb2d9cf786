// Core types - identities and paths shared by the schema and the validators

pub mod path;
pub mod strong_types;

pub use path::{FieldPath, PathSegment};
pub use strong_types::{is_member_name, EntityId, EntityName};
