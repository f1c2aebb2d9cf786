// Field Writes - create values and update operations for scalar and list fields
// Literal values are checked against the field's declared constraints

use crate::core::FieldPath;
use crate::ent_schema::{Constraint, FieldDescriptor};
use crate::error::ValidationErrorKind;
use crate::framework::context::ValidationContext;
use crate::framework::scalar::{literal, literal_list, ScalarValue};
use serde::Serialize;
use serde_json::Value;

/// Value written by a create payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FieldValue {
    Scalar(ScalarValue),
    List(Vec<ScalarValue>),
}

/// One update operation on one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FieldUpdate {
    /// Full replace. `Set(Null)` clears a nullable field.
    Set(ScalarValue),
    Increment(ScalarValue),
    Decrement(ScalarValue),
    Multiply(ScalarValue),
    Divide(ScalarValue),
    SetList(Vec<ScalarValue>),
    Push(Vec<ScalarValue>),
}

impl FieldUpdate {
    pub fn operation(&self) -> &'static str {
        match self {
            FieldUpdate::Set(_) | FieldUpdate::SetList(_) => "set",
            FieldUpdate::Increment(_) => "increment",
            FieldUpdate::Decrement(_) => "decrement",
            FieldUpdate::Multiply(_) => "multiply",
            FieldUpdate::Divide(_) => "divide",
            FieldUpdate::Push(_) => "push",
        }
    }

    pub fn is_clear(&self) -> bool {
        matches!(self, FieldUpdate::Set(ScalarValue::Null))
    }
}

/// Report every constraint `value` violates. Null and non-applicable kinds pass.
pub(crate) fn check_constraints(
    ctx: &mut ValidationContext<'_>,
    path: &FieldPath,
    field: &FieldDescriptor,
    value: &ScalarValue,
) -> bool {
    let mut ok = true;
    for constraint in &field.constraints {
        let holds = match (constraint, value) {
            (Constraint::MinLength(n), ScalarValue::String(s)) => s.chars().count() >= *n,
            (Constraint::MaxLength(n), ScalarValue::String(s)) => s.chars().count() <= *n,
            (Constraint::Pattern(re), ScalarValue::String(s)) => re.is_match(s),
            (Constraint::Range(min, max), v) => v.as_f64().map_or(true, |x| x >= *min && x <= *max),
            _ => true,
        };
        if !holds {
            ctx.report(
                path,
                ValidationErrorKind::ConstraintViolation {
                    constraint: constraint.describe(),
                },
            );
            ok = false;
        }
    }
    ok
}

fn checked_literal(
    ctx: &mut ValidationContext<'_>,
    path: &FieldPath,
    field: &FieldDescriptor,
    value: &Value,
) -> Option<ScalarValue> {
    let v = literal(ctx, path, &field.field_type, value)?;
    check_constraints(ctx, path, field, &v).then_some(v)
}

fn checked_list(
    ctx: &mut ValidationContext<'_>,
    path: &FieldPath,
    field: &FieldDescriptor,
    value: &Value,
) -> Option<Vec<ScalarValue>> {
    let items = literal_list(ctx, path, &field.field_type, value)?;
    let mut ok = true;
    for (i, item) in items.iter().enumerate() {
        ok &= check_constraints(ctx, &path.index(i), field, item);
    }
    ok.then_some(items)
}

/// A create value: a literal, `null` on nullable fields, or a literal list.
pub(crate) fn create_value(
    ctx: &mut ValidationContext<'_>,
    path: &FieldPath,
    field: &FieldDescriptor,
    value: &Value,
) -> Option<FieldValue> {
    if field.list {
        return match value {
            Value::Object(object) if object.len() == 1 && object.contains_key("set") => {
                checked_list(ctx, &path.key("set"), field, &object["set"]).map(FieldValue::List)
            }
            _ => checked_list(ctx, path, field, value).map(FieldValue::List),
        };
    }
    match value {
        Value::Null if field.nullable => Some(FieldValue::Scalar(ScalarValue::Null)),
        Value::Null | Value::Object(_) => {
            ctx.type_mismatch(path, &field.kind_label(), value);
            None
        }
        _ => checked_literal(ctx, path, field, value).map(FieldValue::Scalar),
    }
}

/// An update value: a literal (replace) or an object holding exactly one operation.
pub(crate) fn update_value(
    ctx: &mut ValidationContext<'_>,
    path: &FieldPath,
    field: &FieldDescriptor,
    value: &Value,
) -> Option<FieldUpdate> {
    let object = match value {
        Value::Object(object) => object,
        Value::Array(_) if field.list => return checked_list(ctx, path, field, value).map(FieldUpdate::SetList),
        Value::Null => {
            // Clearing is only expressed as `{set: null}`
            ctx.type_mismatch(path, &format!("{} or update operation", field.kind_label()), value);
            return None;
        }
        _ if field.list => {
            ctx.type_mismatch(path, &field.kind_label(), value);
            return None;
        }
        _ => return checked_literal(ctx, path, field, value).map(FieldUpdate::Set),
    };

    let mut entries = object.iter();
    let (Some((op, operand)), None) = (entries.next(), entries.next()) else {
        ctx.report(
            path,
            ValidationErrorKind::type_mismatch(
                "object with exactly one update operation",
                format!("object with {} keys", object.len()),
            ),
        );
        return None;
    };
    let op_path = path.key(op);

    if field.list {
        return match op.as_str() {
            "set" => checked_list(ctx, &op_path, field, operand).map(FieldUpdate::SetList),
            "push" => match operand {
                Value::Array(_) => checked_list(ctx, &op_path, field, operand).map(FieldUpdate::Push),
                _ => checked_literal(ctx, &op_path, field, operand).map(|v| FieldUpdate::Push(vec![v])),
            },
            other => {
                ctx.unknown_field(path, other);
                None
            }
        };
    }

    match op.as_str() {
        "set" => match operand {
            Value::Null if field.nullable => Some(FieldUpdate::Set(ScalarValue::Null)),
            Value::Null => {
                ctx.type_mismatch(&op_path, &field.kind_label(), operand);
                None
            }
            _ => checked_literal(ctx, &op_path, field, operand).map(FieldUpdate::Set),
        },
        "increment" | "decrement" | "multiply" | "divide" => {
            if !field.field_type.is_numeric() {
                ctx.report(&op_path, ValidationErrorKind::invalid_operator(op.as_str(), field.kind_label()));
                return None;
            }
            let v = literal(ctx, &op_path, &field.field_type, operand)?;
            match op.as_str() {
                "increment" => Some(FieldUpdate::Increment(v)),
                "decrement" => Some(FieldUpdate::Decrement(v)),
                "multiply" => Some(FieldUpdate::Multiply(v)),
                _ if v.as_f64() == Some(0.0) => {
                    ctx.report(
                        &op_path,
                        ValidationErrorKind::ConstraintViolation {
                            constraint: "non-zero divisor".to_string(),
                        },
                    );
                    None
                }
                _ => Some(FieldUpdate::Divide(v)),
            }
        }
        other => {
            ctx.unknown_field(path, other);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidatorConfig;
    use crate::ent_schema::FieldType;
    use regex::Regex;
    use serde_json::json;

    fn field(field_type: FieldType, nullable: bool) -> FieldDescriptor {
        FieldDescriptor {
            name: "f".to_string(),
            field_type,
            nullable,
            list: false,
            has_default: false,
            constraints: Vec::new(),
        }
    }

    fn update(field: &FieldDescriptor, input: Value) -> Result<FieldUpdate, crate::error::ValidationErrors> {
        let config = ValidatorConfig::default();
        let mut ctx = ValidationContext::new(&config);
        let out = update_value(&mut ctx, &FieldPath::root().key("f"), field, &input);
        ctx.finish(out)
    }

    #[test]
    fn test_literal_and_set_are_the_same_update() {
        let f = field(FieldType::Int, false);
        assert_eq!(update(&f, json!(3)).unwrap(), update(&f, json!({"set": 3})).unwrap());
    }

    #[test]
    fn test_clearing_requires_set_null() {
        let f = field(FieldType::String, true);
        assert!(update(&f, json!({"set": null})).unwrap().is_clear());
        assert!(update(&f, json!(null)).unwrap_err().contains("f", "typeMismatch"));
        let required = field(FieldType::String, false);
        assert!(update(&required, json!({"set": null})).is_err());
    }

    #[test]
    fn test_numeric_operations() {
        let f = field(FieldType::Int, false);
        assert_eq!(update(&f, json!({"increment": 2})).unwrap(), FieldUpdate::Increment(ScalarValue::Int(2)));
        assert!(update(&f, json!({"divide": 0}))
            .unwrap_err()
            .contains("f.divide", "constraintViolation"));
        assert!(update(&f, json!({"increment": 1, "decrement": 1})).is_err());
        let text = field(FieldType::String, false);
        assert!(update(&text, json!({"increment": 1}))
            .unwrap_err()
            .contains("f.increment", "invalidOperatorKind"));
    }

    #[test]
    fn test_constraints_apply_to_literals() {
        let mut f = field(FieldType::String, false);
        f.constraints = vec![
            Constraint::MinLength(2),
            Constraint::Pattern(Regex::new("^[a-z]+$").unwrap()),
        ];
        assert!(update(&f, json!("ok")).is_ok());
        let errors = update(&f, json!("A")).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_list_push_accepts_single_element() {
        let mut f = field(FieldType::String, false);
        f.list = true;
        assert_eq!(
            update(&f, json!({"push": "new"})).unwrap(),
            FieldUpdate::Push(vec![ScalarValue::String("new".to_string())])
        );
        assert!(update(&f, json!(["a", "b"])).is_ok());
    }
}
