// Nullable/Optional Combinator - lifts any value validator over absence and null
// Absent and explicit null stay distinguishable: they carry different write intents

use super::context::ValidationContext;
use crate::core::FieldPath;
use serde::Serialize;
use serde_json::Value;

/// Three-state result of reading an optional, possibly-null key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Presence<T> {
    Absent,
    Null,
    Value(T),
}

impl<T> Presence<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Presence::Absent)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Presence::Null)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Presence::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// Whether explicit `null` is part of a slot's domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nullability {
    /// `V | undefined`
    Optional,
    /// `V | null | undefined`
    Nullable,
}

impl Nullability {
    pub fn of(nullable: bool) -> Self {
        if nullable {
            Nullability::Nullable
        } else {
            Nullability::Optional
        }
    }
}

/// Lift `inner` over an optional key. `None` means the input was rejected
/// and an error has been reported.
pub fn lift<T>(
    ctx: &mut ValidationContext<'_>,
    path: &FieldPath,
    input: Option<&Value>,
    nullability: Nullability,
    expected: &str,
    inner: impl FnOnce(&mut ValidationContext<'_>, &Value) -> Option<T>,
) -> Option<Presence<T>> {
    match (input, nullability) {
        (None, _) => Some(Presence::Absent),
        (Some(Value::Null), Nullability::Nullable) => Some(Presence::Null),
        (Some(Value::Null), Nullability::Optional) => {
            ctx.type_mismatch(path, expected, &Value::Null);
            None
        }
        (Some(value), _) => inner(ctx, value).map(Presence::Value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidatorConfig;
    use serde_json::json;

    fn parse_string(ctx: &mut ValidationContext<'_>, value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            other => {
                ctx.type_mismatch(&FieldPath::root(), "string", other);
                None
            }
        }
    }

    #[test]
    fn test_three_states_are_distinct() {
        let config = ValidatorConfig::default();
        let mut ctx = ValidationContext::new(&config);
        let path = FieldPath::root();
        let value = json!("x");

        let absent = lift(&mut ctx, &path, None, Nullability::Nullable, "string", parse_string);
        let null = lift(&mut ctx, &path, Some(&Value::Null), Nullability::Nullable, "string", parse_string);
        let present = lift(&mut ctx, &path, Some(&value), Nullability::Nullable, "string", parse_string);

        assert_eq!(absent, Some(Presence::Absent));
        assert_eq!(null, Some(Presence::Null));
        assert_eq!(present, Some(Presence::Value("x".to_string())));
        assert_eq!(ctx.error_count(), 0);
    }

    #[test]
    fn test_optional_rejects_null() {
        let config = ValidatorConfig::default();
        let mut ctx = ValidationContext::new(&config);
        let out = lift(
            &mut ctx,
            &FieldPath::root(),
            Some(&Value::Null),
            Nullability::Optional,
            "string",
            parse_string,
        );
        assert!(out.is_none());
        assert_eq!(ctx.error_count(), 1);
    }
}
