// Scalar Operator Validators - literal-or-operator filters per scalar kind
// Every accepted filter is normalized to the explicit operator form

use super::context::{json_kind, ValidationContext};
use super::record::expect_object;
use crate::core::FieldPath;
use crate::ent_schema::{FieldDescriptor, FieldType};
use crate::error::ValidationErrorKind;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// A validated literal, typed by the field it was checked against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ScalarValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(DateTime<Utc>),
    Enum(String),
    Null,
}

impl ScalarValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Int(i) => Some(*i as f64),
            ScalarValue::Float(f) => Some(*f),
            _ => None,
        }
    }
}

/// Parse a non-null literal of `field_type`.
pub fn parse_literal(field_type: &FieldType, value: &Value) -> Result<ScalarValue, ValidationErrorKind> {
    let mismatch = || ValidationErrorKind::type_mismatch(field_type.label(), json_kind(value));
    match (field_type, value) {
        (FieldType::String, Value::String(s)) => Ok(ScalarValue::String(s.clone())),
        (FieldType::Int, Value::Number(n)) => n.as_i64().map(ScalarValue::Int).ok_or_else(mismatch),
        (FieldType::Float, Value::Number(n)) => n.as_f64().map(ScalarValue::Float).ok_or_else(mismatch),
        (FieldType::Bool, Value::Bool(b)) => Ok(ScalarValue::Bool(*b)),
        (FieldType::DateTime, Value::String(s)) => DateTime::parse_from_rfc3339(s)
            .map(|dt| ScalarValue::DateTime(dt.with_timezone(&Utc)))
            .map_err(|_| ValidationErrorKind::type_mismatch("datetime (RFC 3339)", "string")),
        (FieldType::Enum(def), Value::String(s)) => {
            if def.contains(s) {
                Ok(ScalarValue::Enum(s.clone()))
            } else {
                Err(ValidationErrorKind::InvalidEnumMember {
                    enum_name: def.name.clone(),
                    value: s.clone(),
                })
            }
        }
        _ => Err(mismatch()),
    }
}

/// Report-and-continue wrapper around `parse_literal`.
pub fn literal(
    ctx: &mut ValidationContext<'_>,
    path: &FieldPath,
    field_type: &FieldType,
    value: &Value,
) -> Option<ScalarValue> {
    match parse_literal(field_type, value) {
        Ok(v) => Some(v),
        Err(kind) => {
            ctx.report(path, kind);
            None
        }
    }
}

/// Literal list, every element checked; `null` elements are rejected.
pub fn literal_list(
    ctx: &mut ValidationContext<'_>,
    path: &FieldPath,
    field_type: &FieldType,
    value: &Value,
) -> Option<Vec<ScalarValue>> {
    let Value::Array(items) = value else {
        ctx.type_mismatch(path, &format!("{}[]", field_type.label()), value);
        return None;
    };
    let mut out = Vec::with_capacity(items.len());
    let mut ok = true;
    for (i, item) in items.iter().enumerate() {
        match literal(ctx, &path.index(i), field_type, item) {
            Some(v) => out.push(v),
            None => ok = false,
        }
    }
    ok.then_some(out)
}

/// The closed set of filter operator keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FilterOperator {
    Equals,
    In,
    NotIn,
    Lt,
    Lte,
    Gt,
    Gte,
    Contains,
    StartsWith,
    EndsWith,
    Not,
    Mode,
}

impl FilterOperator {
    pub const ALL: [FilterOperator; 12] = [
        FilterOperator::Equals,
        FilterOperator::In,
        FilterOperator::NotIn,
        FilterOperator::Lt,
        FilterOperator::Lte,
        FilterOperator::Gt,
        FilterOperator::Gte,
        FilterOperator::Contains,
        FilterOperator::StartsWith,
        FilterOperator::EndsWith,
        FilterOperator::Not,
        FilterOperator::Mode,
    ];

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.key() == key)
    }

    pub fn key(self) -> &'static str {
        match self {
            FilterOperator::Equals => "equals",
            FilterOperator::In => "in",
            FilterOperator::NotIn => "notIn",
            FilterOperator::Lt => "lt",
            FilterOperator::Lte => "lte",
            FilterOperator::Gt => "gt",
            FilterOperator::Gte => "gte",
            FilterOperator::Contains => "contains",
            FilterOperator::StartsWith => "startsWith",
            FilterOperator::EndsWith => "endsWith",
            FilterOperator::Not => "not",
            FilterOperator::Mode => "mode",
        }
    }

    /// The legal operator set is a pure function of the scalar kind.
    pub fn is_legal_for(self, field_type: &FieldType) -> bool {
        match self {
            FilterOperator::Equals | FilterOperator::In | FilterOperator::NotIn | FilterOperator::Not => true,
            FilterOperator::Lt | FilterOperator::Lte | FilterOperator::Gt | FilterOperator::Gte => {
                field_type.is_orderable()
            }
            FilterOperator::Contains
            | FilterOperator::StartsWith
            | FilterOperator::EndsWith
            | FilterOperator::Mode => field_type.is_text(),
        }
    }

    /// Operators that `mode: insensitive` can modify.
    pub fn accepts_mode(self) -> bool {
        matches!(
            self,
            FilterOperator::Equals
                | FilterOperator::Contains
                | FilterOperator::StartsWith
                | FilterOperator::EndsWith
                | FilterOperator::In
                | FilterOperator::NotIn
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum QueryMode {
    #[default]
    Default,
    Insensitive,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ScalarCondition {
    Equals(ScalarValue),
    /// `in: []` matches nothing.
    In(Vec<ScalarValue>),
    /// `notIn: []` matches everything.
    NotIn(Vec<ScalarValue>),
    Lt(ScalarValue),
    Lte(ScalarValue),
    Gt(ScalarValue),
    Gte(ScalarValue),
    Contains(String),
    StartsWith(String),
    EndsWith(String),
    Not(Box<ScalarFilter>),
}

/// Conjunction of conditions on one field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScalarFilter {
    pub conditions: Vec<ScalarCondition>,
    pub mode: QueryMode,
}

impl ScalarFilter {
    pub fn equals(value: ScalarValue) -> Self {
        Self {
            conditions: vec![ScalarCondition::Equals(value)],
            mode: QueryMode::Default,
        }
    }
}

/// Filter validator for one non-list scalar field.
#[derive(Debug, Clone)]
pub struct ScalarValidator {
    pub field_type: FieldType,
    pub nullable: bool,
}

impl ScalarValidator {
    pub fn new(field: &FieldDescriptor) -> Self {
        Self {
            field_type: field.field_type.clone(),
            nullable: field.nullable,
        }
    }

    pub fn validate(
        &self,
        ctx: &mut ValidationContext<'_>,
        path: &FieldPath,
        input: &Value,
    ) -> Option<ScalarFilter> {
        match input {
            Value::Object(_) => self.validate_operators(ctx, path, input),
            other => self.equality_operand(ctx, path, other).map(ScalarFilter::equals),
        }
    }

    /// `equals` operand: a literal, or `null` on nullable fields.
    fn equality_operand(
        &self,
        ctx: &mut ValidationContext<'_>,
        path: &FieldPath,
        value: &Value,
    ) -> Option<ScalarValue> {
        if value.is_null() {
            if self.nullable {
                return Some(ScalarValue::Null);
            }
            ctx.type_mismatch(path, &self.field_type.label(), value);
            return None;
        }
        literal(ctx, path, &self.field_type, value)
    }

    fn text_operand(&self, ctx: &mut ValidationContext<'_>, path: &FieldPath, value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            other => {
                ctx.type_mismatch(path, "string", other);
                None
            }
        }
    }

    fn validate_operators(
        &self,
        ctx: &mut ValidationContext<'_>,
        path: &FieldPath,
        input: &Value,
    ) -> Option<ScalarFilter> {
        let object = expect_object(ctx, path, input, "operator object")?;
        let mut filter = ScalarFilter::default();
        let mut used = Vec::new();
        let mut mode_present = false;
        let mut ok = true;

        for (key, value) in object {
            let op_path = path.key(key);
            let Some(op) = FilterOperator::from_key(key) else {
                ctx.unknown_field(path, key);
                ok = false;
                continue;
            };
            if !op.is_legal_for(&self.field_type) {
                ctx.report(
                    &op_path,
                    ValidationErrorKind::invalid_operator(key.as_str(), self.field_type.label()),
                );
                ok = false;
                continue;
            }

            let condition = match op {
                FilterOperator::Equals => self
                    .equality_operand(ctx, &op_path, value)
                    .map(ScalarCondition::Equals),
                FilterOperator::In => literal_list(ctx, &op_path, &self.field_type, value).map(ScalarCondition::In),
                FilterOperator::NotIn => {
                    literal_list(ctx, &op_path, &self.field_type, value).map(ScalarCondition::NotIn)
                }
                FilterOperator::Lt => literal(ctx, &op_path, &self.field_type, value).map(ScalarCondition::Lt),
                FilterOperator::Lte => literal(ctx, &op_path, &self.field_type, value).map(ScalarCondition::Lte),
                FilterOperator::Gt => literal(ctx, &op_path, &self.field_type, value).map(ScalarCondition::Gt),
                FilterOperator::Gte => literal(ctx, &op_path, &self.field_type, value).map(ScalarCondition::Gte),
                FilterOperator::Contains => self
                    .text_operand(ctx, &op_path, value)
                    .map(ScalarCondition::Contains),
                FilterOperator::StartsWith => self
                    .text_operand(ctx, &op_path, value)
                    .map(ScalarCondition::StartsWith),
                FilterOperator::EndsWith => self
                    .text_operand(ctx, &op_path, value)
                    .map(ScalarCondition::EndsWith),
                FilterOperator::Not => ctx
                    .nested_logical(&op_path, |ctx| self.validate(ctx, &op_path, value))
                    .map(|inner| ScalarCondition::Not(Box::new(inner))),
                FilterOperator::Mode => {
                    mode_present = true;
                    match value.as_str() {
                        Some("default") => filter.mode = QueryMode::Default,
                        Some("insensitive") => filter.mode = QueryMode::Insensitive,
                        _ => {
                            ctx.report(
                                &op_path,
                                ValidationErrorKind::InvalidEnumMember {
                                    enum_name: "QueryMode".to_string(),
                                    value: value.to_string(),
                                },
                            );
                            ok = false;
                        }
                    }
                    continue;
                }
            };

            used.push(op);
            match condition {
                Some(c) => filter.conditions.push(c),
                None => ok = false,
            }
        }

        if mode_present {
            let mode_path = path.key(FilterOperator::Mode.key());
            if let Some(op) = used.iter().find(|op| !op.accepts_mode()) {
                ctx.report(
                    &mode_path,
                    ValidationErrorKind::invalid_operator("mode", format!("string filters using `{}`", op.key())),
                );
                ok = false;
            } else if used.is_empty() {
                ctx.report(
                    &mode_path,
                    ValidationErrorKind::invalid_operator("mode", "string filters without a text operator"),
                );
                ok = false;
            }
        }

        ok.then_some(filter)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ListCondition {
    Equals(Vec<ScalarValue>),
    Has(ScalarValue),
    HasEvery(Vec<ScalarValue>),
    HasSome(Vec<ScalarValue>),
    IsEmpty(bool),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListFilter {
    pub conditions: Vec<ListCondition>,
}

/// Filter validator for one scalar-list field.
#[derive(Debug, Clone)]
pub struct ListValidator {
    pub element_type: FieldType,
}

impl ListValidator {
    pub fn new(field: &FieldDescriptor) -> Self {
        Self {
            element_type: field.field_type.clone(),
        }
    }

    pub fn validate(
        &self,
        ctx: &mut ValidationContext<'_>,
        path: &FieldPath,
        input: &Value,
    ) -> Option<ListFilter> {
        let object = expect_object(ctx, path, input, "list filter object")?;
        let mut filter = ListFilter::default();
        let mut ok = true;

        for (key, value) in object {
            let op_path = path.key(key);
            let condition = match key.as_str() {
                "equals" => literal_list(ctx, &op_path, &self.element_type, value).map(ListCondition::Equals),
                "has" => literal(ctx, &op_path, &self.element_type, value).map(ListCondition::Has),
                "hasEvery" => literal_list(ctx, &op_path, &self.element_type, value).map(ListCondition::HasEvery),
                "hasSome" => literal_list(ctx, &op_path, &self.element_type, value).map(ListCondition::HasSome),
                "isEmpty" => match value {
                    Value::Bool(b) => Some(ListCondition::IsEmpty(*b)),
                    other => {
                        ctx.type_mismatch(&op_path, "bool", other);
                        None
                    }
                },
                other if FilterOperator::from_key(other).is_some() => {
                    ctx.report(
                        &op_path,
                        ValidationErrorKind::invalid_operator(other, format!("{}[]", self.element_type.label())),
                    );
                    None
                }
                other => {
                    ctx.unknown_field(path, other);
                    None
                }
            };
            match condition {
                Some(c) => filter.conditions.push(c),
                None => ok = false,
            }
        }

        ok.then_some(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidatorConfig;
    use crate::ent_schema::EnumDefinition;
    use serde_json::json;

    fn validator(field_type: FieldType, nullable: bool) -> ScalarValidator {
        ScalarValidator { field_type, nullable }
    }

    fn run(v: &ScalarValidator, input: Value) -> Result<ScalarFilter, crate::error::ValidationErrors> {
        let config = ValidatorConfig::default();
        let mut ctx = ValidationContext::new(&config);
        let out = v.validate(&mut ctx, &FieldPath::root().key("f"), &input);
        ctx.finish(out)
    }

    #[test]
    fn test_literal_and_equals_normalize_identically() {
        let v = validator(FieldType::String, false);
        assert_eq!(run(&v, json!("x")).unwrap(), run(&v, json!({"equals": "x"})).unwrap());
    }

    #[test]
    fn test_datetime_is_normalized_to_utc() {
        let v = validator(FieldType::DateTime, false);
        let a = run(&v, json!("2024-03-01T12:00:00+02:00")).unwrap();
        let b = run(&v, json!("2024-03-01T10:00:00Z")).unwrap();
        assert_eq!(a, b);
        let errors = run(&v, json!("yesterday")).unwrap_err();
        assert!(errors.contains("f", "typeMismatch"));
    }

    #[test]
    fn test_enum_membership() {
        let status = EnumDefinition::new("OrderStatus", &["PAYING", "SHIPPED"]);
        let v = validator(FieldType::Enum(status), false);
        assert!(run(&v, json!({"in": ["PAYING", "SHIPPED"]})).is_ok());
        let errors = run(&v, json!({"in": ["PAYING", "LOST"]})).unwrap_err();
        assert!(errors.contains("f.in[1]", "invalidEnumMember"));
    }

    #[test]
    fn test_int_rejects_fractional_literal() {
        let v = validator(FieldType::Int, false);
        assert!(run(&v, json!({"gt": 1.5})).unwrap_err().contains("f.gt", "typeMismatch"));
        let float = validator(FieldType::Float, false);
        assert!(run(&float, json!({"gt": 1})).is_ok());
    }

    #[test]
    fn test_null_only_on_nullable() {
        assert!(run(&validator(FieldType::String, true), json!(null)).is_ok());
        assert!(run(&validator(FieldType::String, true), json!({"not": null})).is_ok());
        assert!(run(&validator(FieldType::String, false), json!(null)).is_err());
    }

    #[test]
    fn test_mode_requires_case_aware_operator() {
        let v = validator(FieldType::String, false);
        let ok = run(&v, json!({"contains": "ab", "mode": "insensitive"})).unwrap();
        assert_eq!(ok.mode, QueryMode::Insensitive);
        assert!(run(&v, json!({"lt": "m", "mode": "insensitive"}))
            .unwrap_err()
            .contains("f.mode", "invalidOperatorKind"));
        assert!(run(&v, json!({"mode": "insensitive"})).is_err());
        assert!(run(&v, json!({"equals": "a", "mode": "shouting"}))
            .unwrap_err()
            .contains("f.mode", "invalidEnumMember"));
    }

    #[test]
    fn test_empty_in_lists_are_valid() {
        let v = validator(FieldType::Int, false);
        let filter = run(&v, json!({"in": [], "notIn": []})).unwrap();
        assert_eq!(
            filter.conditions,
            vec![ScalarCondition::In(vec![]), ScalarCondition::NotIn(vec![])]
        );
    }

    #[test]
    fn test_list_filters() {
        let config = ValidatorConfig::default();
        let mut ctx = ValidationContext::new(&config);
        let v = ListValidator { element_type: FieldType::String };
        let path = FieldPath::root().key("tags");
        let out = v.validate(&mut ctx, &path, &json!({"has": "sale", "isEmpty": false}));
        assert_eq!(out.unwrap().conditions.len(), 2);
        let bad = v.validate(&mut ctx, &path, &json!({"contains": "s"}));
        assert!(bad.is_none());
        let errors = ctx.finish(bad).unwrap_err();
        assert!(errors.contains("tags.contains", "invalidOperatorKind"));
    }
}
