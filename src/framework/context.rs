// Validation Context - per-call error accumulation and recursion accounting
// One context lives for exactly one validation call and is never shared

use crate::config::ValidatorConfig;
use crate::core::FieldPath;
use crate::error::{ValidationError, ValidationErrorKind, ValidationErrors};
use serde_json::Value;
use tracing::{error, warn};

pub struct ValidationContext<'c> {
    config: &'c ValidatorConfig,
    errors: Vec<ValidationError>,
    logical_depth: usize,
    relation_depth: usize,
    truncated: bool,
}

impl<'c> ValidationContext<'c> {
    pub fn new(config: &'c ValidatorConfig) -> Self {
        Self {
            config,
            errors: Vec::new(),
            logical_depth: 0,
            relation_depth: 0,
            truncated: false,
        }
    }

    pub fn report(&mut self, path: &FieldPath, kind: ValidationErrorKind) {
        // The first error is always kept so a rejected call never comes back empty
        if self.errors.len() >= self.config.max_errors.max(1) {
            if !self.truncated {
                warn!(limit = self.config.max_errors, "error limit reached, dropping further errors");
                self.truncated = true;
            }
            return;
        }
        self.errors.push(ValidationError {
            path: path.clone(),
            kind,
        });
    }

    pub fn unknown_field(&mut self, path: &FieldPath, key: &str) {
        self.report(&path.key(key), ValidationErrorKind::unknown_field(key));
    }

    pub fn type_mismatch(&mut self, path: &FieldPath, expected: &str, found: &Value) {
        self.report(path, ValidationErrorKind::type_mismatch(expected, json_kind(found)));
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Run `f` one boolean-combinator level deeper.
    pub fn nested_logical<T>(
        &mut self,
        path: &FieldPath,
        f: impl FnOnce(&mut Self) -> Option<T>,
    ) -> Option<T> {
        if self.truncated {
            return None;
        }
        if self.logical_depth >= self.config.max_logical_depth {
            self.depth_exceeded(path, "logical", self.config.max_logical_depth);
            return None;
        }
        self.logical_depth += 1;
        let out = f(self);
        self.logical_depth -= 1;
        out
    }

    /// Run `f` one relation hop deeper.
    pub fn nested_relation<T>(
        &mut self,
        path: &FieldPath,
        f: impl FnOnce(&mut Self) -> Option<T>,
    ) -> Option<T> {
        if self.truncated {
            return None;
        }
        if self.relation_depth >= self.config.max_relation_depth {
            self.depth_exceeded(path, "relation", self.config.max_relation_depth);
            return None;
        }
        self.relation_depth += 1;
        let out = f(self);
        self.relation_depth -= 1;
        out
    }

    fn depth_exceeded(&mut self, path: &FieldPath, scope: &str, limit: usize) {
        warn!(%path, scope, limit, "depth guard tripped");
        self.report(
            path,
            ValidationErrorKind::DepthLimitExceeded {
                scope: scope.to_string(),
                limit,
            },
        );
    }

    /// Once the error cap is hit, nested levels are no longer entered.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Close the call: the output is only returned when nothing was reported.
    pub fn finish<T>(mut self, out: Option<T>) -> Result<T, ValidationErrors> {
        match out {
            Some(value) if self.errors.is_empty() => Ok(value),
            _ if !self.errors.is_empty() => Err(ValidationErrors::new(self.errors)),
            _ => {
                // A validator rejected without reporting; never hand back an empty list
                error!("input rejected without a reported error");
                self.errors.push(ValidationError {
                    path: FieldPath::root(),
                    kind: ValidationErrorKind::type_mismatch("valid input", "rejected input"),
                });
                Err(ValidationErrors::new(self.errors))
            }
        }
    }
}

/// Name of a JSON value's shape, for `TypeMismatch` messages.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Accepts `x` or `[x, ...]`, yielding each element with its path.
pub fn one_or_many<'v>(path: &FieldPath, value: &'v Value) -> Vec<(FieldPath, &'v Value)> {
    match value {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| (path.index(i), item))
            .collect(),
        other => vec![(path.clone(), other)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_guard_reports_once_per_trip() {
        let config = ValidatorConfig::default().with_max_logical_depth(2);
        let mut ctx = ValidationContext::new(&config);
        let path = FieldPath::root();
        let out = ctx.nested_logical(&path, |ctx| {
            ctx.nested_logical(&path, |ctx| ctx.nested_logical(&path, |_| Some(())))
        });
        assert!(out.is_none());
        assert_eq!(ctx.error_count(), 1);
        let errors = ctx.finish(out).unwrap_err();
        assert!(errors.contains("$", "depthLimitExceeded"));
    }

    #[test]
    fn test_error_cap() {
        let config = ValidatorConfig::default().with_max_errors(3);
        let mut ctx = ValidationContext::new(&config);
        for i in 0..10 {
            ctx.unknown_field(&FieldPath::root(), &format!("k{i}"));
        }
        assert_eq!(ctx.error_count(), 3);
    }

    #[test]
    fn test_nesting_stops_after_error_cap() {
        let config = ValidatorConfig::default().with_max_errors(1);
        let mut ctx = ValidationContext::new(&config);
        let path = FieldPath::root();
        ctx.unknown_field(&path, "a");
        assert!(!ctx.is_truncated());
        ctx.unknown_field(&path, "b");
        assert!(ctx.is_truncated());

        let mut entered = false;
        let out = ctx.nested_relation(&path, |_| {
            entered = true;
            Some(())
        });
        assert!(out.is_none());
        assert!(!entered);
        assert!(ctx.nested_logical(&path, |_| Some(())).is_none());
        assert_eq!(ctx.error_count(), 1);
    }

    #[test]
    fn test_silent_rejection_still_reports() {
        let config = ValidatorConfig::default();
        let ctx = ValidationContext::new(&config);
        let errors = ctx.finish::<()>(None).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.contains("$", "typeMismatch"));
    }

    #[test]
    fn test_one_or_many_paths() {
        let path = FieldPath::root().key("connect");
        let many = serde_json::json!([{"id": "a"}, {"id": "b"}]);
        let items = one_or_many(&path, &many);
        assert_eq!(items[1].0.to_string(), "connect[1]");
        let single = serde_json::json!({"id": "a"});
        assert_eq!(one_or_many(&path, &single)[0].0.to_string(), "connect");
    }
}
