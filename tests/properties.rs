mod common;

use ent_predicate::ent_schema::{FieldDefinition, FieldType, RelationDefinition, SchemaRegistry};
use ent_predicate::framework::FilterOperator;
use ent_predicate::{RegistryError, ValidatorConfig, ValidatorRegistry};
use once_cell::sync::Lazy;
use proptest::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;

static REGISTRY: Lazy<ValidatorRegistry> = Lazy::new(common::registry);

const ORDER_MEMBERS: &[&str] = &[
    "id", "number", "userId", "status", "totalCents", "couponId", "note", "placedAt", "user", "coupon",
    "orderItems", "payments", "shipment",
];

fn unknown_key() -> impl Strategy<Value = String> {
    "[a-z][a-zA-Z]{0,10}".prop_filter("declared member", |k| !ORDER_MEMBERS.contains(&k.as_str()))
}

proptest! {
    #[test]
    fn unknown_keys_never_validate(key in unknown_key(), nested in any::<bool>()) {
        let (filter, path) = if nested {
            (json!({"AND": [{"status": "PAYING"}, {key.clone(): 1}]}), format!("AND[1].{key}"))
        } else {
            (json!({key.clone(): 1}), key.clone())
        };
        match REGISTRY.validate_filter("Order", &filter) {
            Err(RegistryError::Invalid(errors)) => prop_assert!(errors.contains(&path, "unknownField"), "{errors}"),
            other => prop_assert!(false, "accepted {other:?}"),
        }
    }

    #[test]
    fn literals_normalize_to_equals(s in any::<String>(), n in any::<i64>()) {
        let short = REGISTRY.validate_filter("Order", &json!({"number": s, "totalCents": n})).unwrap();
        let explicit = REGISTRY
            .validate_filter("Order", &json!({"number": {"equals": s}, "totalCents": {"equals": n}}))
            .unwrap();
        prop_assert_eq!(short, explicit);
    }
}

fn legal_operators(kind: &str) -> &'static [&'static str] {
    match kind {
        "string" => &[
            "equals", "in", "notIn", "lt", "lte", "gt", "gte", "contains", "startsWith", "endsWith", "not", "mode",
        ],
        "int" | "float" | "datetime" => &["equals", "in", "notIn", "lt", "lte", "gt", "gte", "not"],
        _ => &["equals", "in", "notIn", "not"],
    }
}

#[test]
fn operator_legality_is_a_function_of_the_kind() {
    let samples = [
        ("User", "email", "string", json!("a@b.co")),
        ("Order", "totalCents", "int", json!(100)),
        ("Product", "weightKg", "float", json!(0.5)),
        ("Order", "placedAt", "datetime", json!("2024-01-01T00:00:00Z")),
        ("Product", "isActive", "bool", json!(true)),
        ("Order", "status", "enum", json!("PAYING")),
    ];
    for (entity, field, kind, sample) in samples {
        let legal = legal_operators(kind);
        for op in FilterOperator::ALL {
            let key = op.key();
            let operand: Value = match op {
                FilterOperator::In | FilterOperator::NotIn => json!([sample.clone()]),
                _ => sample.clone(),
            };
            let filter = match op {
                FilterOperator::Mode => json!({field: {"equals": sample.clone(), "mode": "insensitive"}}),
                _ => json!({field: {key: operand}}),
            };
            let result = REGISTRY.validate_filter(entity, &filter);
            if legal.contains(&key) {
                assert!(result.is_ok(), "{field} {key}: {result:?}");
            } else {
                let errors = common::rejected(result);
                common::assert_error(&errors, &format!("{field}.{key}"), "invalidOperatorKind");
            }
        }
    }
}

/// `A.b` is a nullable to-one and `B.as` its to-many inverse.
fn cyclic_registry(max_relation_depth: usize) -> ValidatorRegistry {
    let mut schemas = SchemaRegistry::new();
    schemas
        .define(
            "A",
            vec![
                FieldDefinition::new("id", FieldType::String).id(),
                FieldDefinition::new("bId", FieldType::String).optional(),
            ],
            vec![RelationDefinition::from("b", "B", "as")
                .optional()
                .references(&["bId"], &["id"])],
            vec![],
        )
        .define(
            "B",
            vec![FieldDefinition::new("id", FieldType::String).id()],
            vec![RelationDefinition::to("as", "A", "b")],
            vec![],
        );
    let schema = schemas.freeze().expect("cyclic schema is valid");
    ValidatorRegistry::new(
        Arc::new(schema),
        ValidatorConfig::default().with_max_relation_depth(max_relation_depth),
    )
}

/// A filter on `A` walking `hops` relations, alternating `b.is` and `as.some`.
fn walk(hops: usize) -> Value {
    let mut filter = json!({"id": "leaf"});
    for hop in (0..hops).rev() {
        filter = if hop % 2 == 0 {
            json!({"b": {"is": filter}})
        } else {
            json!({"as": {"some": filter}})
        };
    }
    filter
}

proptest! {
    #[test]
    fn cyclic_relations_terminate(max in 1usize..6, hops in 0usize..12) {
        let registry = cyclic_registry(max);
        match registry.validate_filter("A", &walk(hops)) {
            Ok(_) => prop_assert!(hops <= max, "{hops} hops accepted with limit {max}"),
            Err(RegistryError::Invalid(errors)) => {
                prop_assert!(hops > max, "{hops} hops rejected with limit {max}: {errors}");
                prop_assert!(errors.iter().all(|e| e.kind.code() == "depthLimitExceeded"), "{errors}");
            }
            Err(other) => prop_assert!(false, "{other}"),
        }
    }
}
