use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;

/// Limits applied to every validation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Maximum nesting of `AND`/`OR`/`NOT` (and scalar `not`) inside one filter.
    pub max_logical_depth: usize,
    /// Maximum number of relation hops a filter, ordering or payload may take.
    pub max_relation_depth: usize,
    /// Errors collected before validation stops reporting.
    pub max_errors: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_logical_depth: 32,
            max_relation_depth: 8,
            max_errors: 100,
        }
    }
}

impl ValidatorConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            max_logical_depth: read_limit("ENT_MAX_LOGICAL_DEPTH", defaults.max_logical_depth)?,
            max_relation_depth: read_limit("ENT_MAX_RELATION_DEPTH", defaults.max_relation_depth)?,
            max_errors: read_limit("ENT_MAX_ERRORS", defaults.max_errors)?,
        })
    }

    pub fn with_max_logical_depth(mut self, depth: usize) -> Self {
        self.max_logical_depth = depth;
        self
    }

    pub fn with_max_relation_depth(mut self, depth: usize) -> Self {
        self.max_relation_depth = depth;
        self
    }

    pub fn with_max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = max_errors;
        self
    }
}

fn read_limit(key: &str, default: usize) -> anyhow::Result<usize> {
    match env::var(key) {
        Ok(raw) => {
            let value: usize = raw
                .trim()
                .parse()
                .with_context(|| format!("{key} must be a non-negative integer, got `{raw}`"))?;
            anyhow::ensure!(value > 0, "{key} must be greater than zero");
            Ok(value)
        }
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("{key} is not valid unicode")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides_defaults() {
        let config = ValidatorConfig::default()
            .with_max_logical_depth(4)
            .with_max_relation_depth(2);
        assert_eq!(config.max_logical_depth, 4);
        assert_eq!(config.max_relation_depth, 2);
        assert_eq!(config.max_errors, 100);
    }

    #[test]
    fn test_read_limit_rejects_garbage() {
        env::set_var("ENT_TEST_LIMIT_GARBAGE", "deep");
        assert!(read_limit("ENT_TEST_LIMIT_GARBAGE", 3).is_err());
        env::set_var("ENT_TEST_LIMIT_ZERO", "0");
        assert!(read_limit("ENT_TEST_LIMIT_ZERO", 3).is_err());
        env::set_var("ENT_TEST_LIMIT_OK", " 12 ");
        assert_eq!(read_limit("ENT_TEST_LIMIT_OK", 3).unwrap(), 12);
        assert_eq!(read_limit("ENT_TEST_LIMIT_UNSET", 3).unwrap(), 3);
    }
}
