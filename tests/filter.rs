mod common;

use common::{assert_error, registry, registry_with, rejected};
use ent_predicate::framework::{
    FilterExpression, ListCondition, RelationFilter, RelationMatch, ScalarCondition, ScalarValue,
};
use ent_predicate::{RegistryError, ValidatorConfig};
use serde_json::json;

fn leaf(expr: &FilterExpression) -> &FilterExpression {
    match expr {
        FilterExpression::And(children) if children.len() == 1 => leaf(&children[0]),
        other => other,
    }
}

#[test]
fn test_order_scenario() {
    let registry = registry();

    let filter = json!({
        "AND": [
            {"status": {"in": ["PAYING", "PROCESSING"]}},
            {"orderItems": {"some": {"quantity": {"gt": 1}}}}
        ]
    });
    let expr = registry.validate_filter("Order", &filter).unwrap();
    let FilterExpression::And(top) = &expr else {
        panic!("where object normalizes to AND, got {expr:?}");
    };
    let FilterExpression::And(operands) = &top[0] else {
        panic!("AND key normalizes to AND, got {:?}", top[0]);
    };
    assert_eq!(operands.len(), 2);
    match leaf(&operands[1]) {
        FilterExpression::Relation {
            relation,
            filter: RelationFilter::ToMany { some: Some(inner), every: None, none: None },
        } => {
            assert_eq!(relation, "orderItems");
            assert_eq!(inner.referenced_members(), vec!["quantity"]);
        }
        other => panic!("unexpected relation node {other:?}"),
    }

    let errors = rejected(registry.validate_filter("Order", &json!({"status": {"contains": "PAY"}})));
    assert_error(&errors, "status.contains", "invalidOperatorKind");

    let errors = rejected(registry.validate_filter("Order", &json!({"totalCents": {"set": 500}})));
    assert_error(&errors, "totalCents.set", "unknownField");
}

#[test]
fn test_unknown_members_are_rejected_at_any_depth() {
    let registry = registry();
    let errors = rejected(registry.validate_filter("Order", &json!({"customer": {"is": {}}})));
    assert_error(&errors, "customer", "unknownField");

    let errors = rejected(registry.validate_filter("Order", &json!({"user": {"is": {"nickname": "x"}}})));
    assert_error(&errors, "user.is.nickname", "unknownField");

    let errors = rejected(registry.validate_filter("Order", &json!({"orderItems": {"any": {}}})));
    assert_error(&errors, "orderItems.any", "unknownField");

    let errors = rejected(registry.validate_filter("Order", &json!({"and": []})));
    assert_error(&errors, "and", "unknownField");
}

#[test]
fn test_error_paths_and_aggregation() {
    let registry = registry();
    let filter = json!({"OR": [{}, {}, {"user": {"is": {"email": 5}}}]});
    let errors = rejected(registry.validate_filter("Order", &filter));
    assert_error(&errors, "OR[2].user.is.email", "typeMismatch");

    let filter = json!({
        "status": {"contains": "x"},
        "totalCents": "a lot",
        "bogus": 1,
        "NOT": {"placedAt": {"gt": "last week"}}
    });
    let errors = rejected(registry.validate_filter("Order", &filter));
    assert_eq!(errors.len(), 4, "{errors}");
    assert_error(&errors, "status.contains", "invalidOperatorKind");
    assert_error(&errors, "totalCents", "typeMismatch");
    assert_error(&errors, "bogus", "unknownField");
    assert_error(&errors, "NOT.placedAt.gt", "typeMismatch");
}

#[test]
fn test_errors_serialize_with_path_and_code() {
    let registry = registry();
    let errors = rejected(registry.validate_filter("Order", &json!({"status": {"contains": "PAY"}})));
    let value = serde_json::to_value(&errors).unwrap();
    assert_eq!(
        value,
        json!([{
            "path": "status.contains",
            "code": "invalidOperatorKind",
            "operator": "contains",
            "kind": "enum OrderStatus"
        }])
    );
}

#[test]
fn test_literal_shorthand_matches_equals() {
    let registry = registry();
    let short = registry.validate_filter("Order", &json!({"number": "A-100"})).unwrap();
    let explicit = registry
        .validate_filter("Order", &json!({"number": {"equals": "A-100"}}))
        .unwrap();
    assert_eq!(short, explicit);
}

#[test]
fn test_combinator_shapes() {
    let registry = registry();
    assert!(registry.validate_filter("Order", &json!({"NOT": {"status": "CANCELLED"}})).is_ok());
    assert!(registry.validate_filter("Order", &json!({"AND": {"status": "CANCELLED"}})).is_ok());
    assert!(registry
        .validate_filter("Order", &json!({"OR": [{"status": "PAYING"}, {"totalCents": {"lte": 0}}]}))
        .is_ok());

    let errors = rejected(registry.validate_filter("Order", &json!({"OR": {"status": "PAYING"}})));
    assert_error(&errors, "OR", "typeMismatch");
}

#[test]
fn test_to_one_relation_forms() {
    let registry = registry();
    let shorthand = registry
        .validate_filter("Order", &json!({"user": {"email": "a@b.co"}}))
        .unwrap();
    let explicit = registry
        .validate_filter("Order", &json!({"user": {"is": {"email": "a@b.co"}}}))
        .unwrap();
    assert_eq!(shorthand, explicit);

    // Nullable to-one: null means the relation is absent
    let absent = registry.validate_filter("Order", &json!({"coupon": null})).unwrap();
    assert_eq!(
        leaf(&absent),
        &FilterExpression::Relation {
            relation: "coupon".to_string(),
            filter: RelationFilter::ToOne {
                is: Some(RelationMatch::Absent),
                is_not: None,
            },
        }
    );
    assert!(registry.validate_filter("Order", &json!({"coupon": {"isNot": null}})).is_ok());

    let errors = rejected(registry.validate_filter("Order", &json!({"user": null})));
    assert_error(&errors, "user", "typeMismatch");
    let errors = rejected(registry.validate_filter("Order", &json!({"user": {"is": null}})));
    assert_error(&errors, "user.is", "typeMismatch");
}

#[test]
fn test_nullable_scalar_filters() {
    let registry = registry();
    assert!(registry.validate_filter("Order", &json!({"note": null})).is_ok());
    assert!(registry.validate_filter("Order", &json!({"note": {"not": null}})).is_ok());
    let errors = rejected(registry.validate_filter("Order", &json!({"number": null})));
    assert_error(&errors, "number", "typeMismatch");
}

#[test]
fn test_list_and_datetime_filters() {
    let registry = registry();
    let expr = registry
        .validate_filter("Product", &json!({"tags": {"hasSome": ["sale", "new"]}}))
        .unwrap();
    match leaf(&expr) {
        FilterExpression::List { field, filter } => {
            assert_eq!(field, "tags");
            assert_eq!(
                filter.conditions,
                vec![ListCondition::HasSome(vec![
                    ScalarValue::String("sale".to_string()),
                    ScalarValue::String("new".to_string())
                ])]
            );
        }
        other => panic!("unexpected {other:?}"),
    }

    let expr = registry
        .validate_filter("Order", &json!({"placedAt": {"gte": "2024-05-01T00:00:00+02:00"}}))
        .unwrap();
    let FilterExpression::Scalar { filter, .. } = leaf(&expr) else {
        panic!("unexpected {expr:?}");
    };
    let ScalarCondition::Gte(ScalarValue::DateTime(at)) = &filter.conditions[0] else {
        panic!("unexpected {filter:?}");
    };
    assert_eq!(at.to_rfc3339(), "2024-04-30T22:00:00+00:00");
}

#[test]
fn test_empty_membership_lists() {
    let registry = registry();
    assert!(registry
        .validate_filter("Order", &json!({"status": {"in": []}, "number": {"notIn": []}}))
        .is_ok());
}

#[test]
fn test_case_insensitive_mode() {
    let registry = registry();
    assert!(registry
        .validate_filter("User", &json!({"email": {"endsWith": "@EXAMPLE.COM", "mode": "insensitive"}}))
        .is_ok());
    let errors = rejected(registry.validate_filter(
        "Order",
        &json!({"status": {"equals": "PAYING", "mode": "insensitive"}}),
    ));
    assert_error(&errors, "status.mode", "invalidOperatorKind");
}

#[test]
fn test_logical_depth_limit() {
    let registry = registry_with(ValidatorConfig::default().with_max_logical_depth(3));
    let mut filter = json!({"status": "PAYING"});
    for _ in 0..3 {
        filter = json!({"NOT": filter});
    }
    assert!(registry.validate_filter("Order", &filter).is_ok());

    let filter = json!({"NOT": filter});
    let errors = rejected(registry.validate_filter("Order", &filter));
    assert_eq!(errors.len(), 1);
    assert_error(&errors, "NOT.NOT.NOT.NOT", "depthLimitExceeded");
}

#[test]
fn test_relation_depth_limit_on_self_relation() {
    let registry = registry_with(ValidatorConfig::default().with_max_relation_depth(4));
    let nest = |hops: usize| {
        let mut filter = json!({"slug": "root"});
        for _ in 0..hops {
            filter = json!({"parent": {"is": filter}});
        }
        filter
    };
    assert!(registry.validate_filter("Category", &nest(4)).is_ok());
    let errors = rejected(registry.validate_filter("Category", &nest(5)));
    assert!(errors.iter().all(|e| e.kind.code() == "depthLimitExceeded"));
}

#[test]
fn test_list_conditions_keep_input_order() {
    let registry = registry();
    let expr = registry
        .validate_filter(
            "Product",
            &json!({"tags": {"equals": ["home"], "hasEvery": ["home", "sale"], "isEmpty": false}}),
        )
        .unwrap();
    let FilterExpression::List { field, filter } = leaf(&expr) else {
        panic!("unexpected {expr:?}");
    };
    assert_eq!(field, "tags");
    let s = |v: &str| ScalarValue::String(v.to_string());
    assert_eq!(
        filter.conditions,
        vec![
            ListCondition::Equals(vec![s("home")]),
            ListCondition::HasEvery(vec![s("home"), s("sale")]),
            ListCondition::IsEmpty(false),
        ]
    );

    let errors = rejected(registry.validate_filter("Product", &json!({"tags": {"isEmpty": "no"}})));
    assert_error(&errors, "tags.isEmpty", "typeMismatch");

    let errors = rejected(registry.validate_filter("Product", &json!({"tags": {"contains": "home"}})));
    assert_error(&errors, "tags.contains", "invalidOperatorKind");

    let errors = rejected(registry.validate_filter("Product", &json!({"tags": {"hasEvery": "home"}})));
    assert_error(&errors, "tags.hasEvery", "typeMismatch");
}

#[test]
fn test_error_cap() {
    let registry = registry_with(ValidatorConfig::default().with_max_errors(2));
    let filter = json!({"a": 1, "b": 2, "c": 3, "d": 4, "e": 5});
    let errors = rejected(registry.validate_filter("Order", &filter));
    assert_eq!(errors.len(), 2);
}

#[test]
fn test_unknown_entity_is_not_an_input_error() {
    let registry = registry();
    let err = registry.validate_filter("Invoice", &json!({})).unwrap_err();
    assert!(matches!(err, RegistryError::UnknownEntity(ref name) if name == "Invoice"));
    assert!(err.validation_errors().is_none());
}

#[test]
fn test_registry_is_shared_across_threads() {
    let registry = registry();
    let filter = json!({"orders": {"some": {"orderItems": {"every": {"product": {"is": {"isActive": true}}}}}}});
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| registry.validate_filter("User", &filter).is_ok()))
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    });
}
