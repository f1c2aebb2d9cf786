// Strong Types - newtypes for schema identities
// Entity handles are indexes into a frozen Schema, never raw names

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static ENTITY_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z][A-Za-z0-9]*$").expect("entity name pattern"));
static MEMBER_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z][A-Za-z0-9]*$").expect("member name pattern"));

/// Handle to an entity inside one frozen `Schema`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(usize);

impl EntityId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Position of the entity in declaration order
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Validated PascalCase entity name such as `OrderItem`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityName(String);

impl EntityName {
    /// Create a new entity name with validation
    pub fn new(name: &str) -> Result<Self, &'static str> {
        if name.is_empty() {
            return Err("Entity name cannot be empty");
        }
        if !ENTITY_NAME.is_match(name) {
            return Err("Entity name must be PascalCase alphanumerics");
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Field and relation names are camelCase alphanumerics.
pub fn is_member_name(name: &str) -> bool {
    MEMBER_NAME.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_name_validation() {
        assert!(EntityName::new("OrderItem").is_ok());
        assert!(EntityName::new("").is_err());
        assert!(EntityName::new("order_item").is_err());
        assert!(EntityName::new("Order-Item").is_err());
    }

    #[test]
    fn test_member_names() {
        assert!(is_member_name("totalCents"));
        assert!(is_member_name("id"));
        assert!(!is_member_name("AND"));
        assert!(!is_member_name("_count"));
        assert!(!is_member_name("order_id"));
    }
}
