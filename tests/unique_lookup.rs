mod common;

use common::{assert_error, registry, rejected};
use ent_predicate::ent_schema::FieldType;
use ent_predicate::framework::{ScalarValue, UniqueKeyValue};
use serde_json::{json, Map, Value};

fn sample(field_type: &FieldType) -> Value {
    match field_type {
        FieldType::String => json!("key-1"),
        FieldType::Int => json!(7),
        FieldType::Float => json!(1.5),
        FieldType::Bool => json!(true),
        FieldType::DateTime => json!("2024-01-01T00:00:00Z"),
        FieldType::Enum(def) => json!(def.members[0]),
    }
}

#[test]
fn test_every_declared_key_identifies_a_row() {
    let registry = registry();
    let schema = registry.schema();
    for entity in schema.entities() {
        for key in &entity.unique_keys {
            let mut components = Map::new();
            for field in &key.fields {
                let descriptor = entity.field(field).unwrap();
                components.insert(field.clone(), sample(&descriptor.field_type));
            }
            let input = if key.is_compound() {
                json!({ key.name.clone(): Value::Object(components) })
            } else {
                Value::Object(components)
            };
            let lookup = registry
                .validate_unique_lookup(&entity.name, &input)
                .unwrap_or_else(|e| panic!("{}.{}: {e}", entity.name, key.name));
            assert_eq!(lookup.keys.len(), 1);
            assert_eq!(lookup.keys[0].key, key.name);
            assert!(lookup.filter.is_none());
        }
    }
}

#[test]
fn test_no_key_supplied() {
    let registry = registry();
    let errors = rejected(registry.validate_unique_lookup("Order", &json!({})));
    assert_error(&errors, "$", "noUniqueKeySupplied");

    // Non-key filters alone never identify a row
    let errors = rejected(registry.validate_unique_lookup("Order", &json!({"status": "PAYING"})));
    assert_error(&errors, "$", "noUniqueKeySupplied");
}

#[test]
fn test_compound_components_must_be_nested() {
    let registry = registry();
    let errors = rejected(
        registry.validate_unique_lookup("OrderItem", &json!({"orderId": "o1", "productId": "p1"})),
    );
    assert_error(&errors, "$", "noUniqueKeySupplied");

    let lookup = registry
        .validate_unique_lookup("OrderItem", &json!({"orderId_productId": {"productId": "p1", "orderId": "o1"}}))
        .unwrap();
    assert_eq!(
        lookup.keys,
        vec![UniqueKeyValue {
            key: "orderId_productId".to_string(),
            values: vec![
                ("orderId".to_string(), ScalarValue::String("o1".to_string())),
                ("productId".to_string(), ScalarValue::String("p1".to_string())),
            ],
        }]
    );
}

#[test]
fn test_compound_key_shape_errors() {
    let registry = registry();
    let errors = rejected(registry.validate_unique_lookup("CartItem", &json!({"cartId_productId": {"cartId": "c1"}})));
    assert_error(&errors, "cartId_productId.productId", "requiredFieldMissing");

    let errors = rejected(registry.validate_unique_lookup(
        "CartItem",
        &json!({"cartId_productId": {"cartId": "c1", "productId": "p1", "quantity": 1}}),
    ));
    assert_error(&errors, "cartId_productId.quantity", "unknownField");

    let errors = rejected(registry.validate_unique_lookup("CartItem", &json!({"cartId_productId": "c1:p1"})));
    assert_error(&errors, "cartId_productId", "typeMismatch");
}

#[test]
fn test_extra_constraints_ride_along() {
    let registry = registry();
    let lookup = registry
        .validate_unique_lookup("Order", &json!({"id": "o1", "status": {"not": "CANCELLED"}}))
        .unwrap();
    assert_eq!(lookup.keys.len(), 1);
    let filter = lookup.filter.expect("non-key constraint kept");
    assert_eq!(filter.referenced_members(), vec!["status"]);

    let errors = rejected(registry.validate_unique_lookup("Order", &json!({"id": "o1", "colour": "red"})));
    assert_error(&errors, "colour", "unknownField");
}

#[test]
fn test_key_values_are_literals() {
    let registry = registry();
    let errors = rejected(registry.validate_unique_lookup("User", &json!({"id": {"equals": "u1"}})));
    assert_error(&errors, "id", "typeMismatch");

    assert!(registry
        .validate_unique_lookup("Payment", &json!({"providerRef": "ch_123"}))
        .is_ok());
    let errors = rejected(registry.validate_unique_lookup("Payment", &json!({"providerRef": null})));
    assert_error(&errors, "providerRef", "typeMismatch");
}

#[test]
fn test_several_keys_at_once() {
    let registry = registry();
    let lookup = registry
        .validate_unique_lookup("User", &json!({"id": "u1", "email": "a@b.co"}))
        .unwrap();
    let names: Vec<&str> = lookup.keys.iter().map(|k| k.key.as_str()).collect();
    assert_eq!(names, vec!["id", "email"]);
}
