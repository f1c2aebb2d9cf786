// Order Entity Schemas - orders, their line items, payments, shipment and coupons
// An order has many items and payments, at most one shipment and an optional coupon

use super::enums;
use crate::ent_schema::{
    EntSchema, FieldDefault, FieldDefinition, FieldType, FieldValidator, IndexDefinition,
    RelationDefinition,
};

/// Order entity schema
pub struct OrderSchema;

impl EntSchema for OrderSchema {
    fn entity_name() -> &'static str {
        "Order"
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("id", FieldType::String)
                .id()
                .default_value(FieldDefault::Function("cuid".to_string())),
            FieldDefinition::new("number", FieldType::String).unique(),
            FieldDefinition::new("userId", FieldType::String),
            FieldDefinition::new("status", FieldType::Enum(enums::order_status()))
                .default_value(FieldDefault::String("PAYING".to_string())),
            FieldDefinition::new("totalCents", FieldType::Int).validate(FieldValidator::Range(0.0, 1e12)),
            FieldDefinition::new("couponId", FieldType::String).optional(),
            FieldDefinition::new("note", FieldType::String)
                .optional()
                .validate(FieldValidator::MaxLength(500)),
            FieldDefinition::new("placedAt", FieldType::DateTime)
                .default_value(FieldDefault::Function("now".to_string())),
        ]
    }

    fn relations() -> Vec<RelationDefinition> {
        vec![
            RelationDefinition::from("user", "User", "orders").references(&["userId"], &["id"]),
            RelationDefinition::from("coupon", "Coupon", "orders")
                .optional()
                .references(&["couponId"], &["id"]),
            RelationDefinition::to("orderItems", "OrderItem", "order"),
            RelationDefinition::to("payments", "Payment", "order"),
            RelationDefinition::to("shipment", "Shipment", "order").unique(),
        ]
    }
}

/// OrderItem entity schema - one product line of an order
pub struct OrderItemSchema;

impl EntSchema for OrderItemSchema {
    fn entity_name() -> &'static str {
        "OrderItem"
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("id", FieldType::String)
                .id()
                .default_value(FieldDefault::Function("cuid".to_string())),
            FieldDefinition::new("orderId", FieldType::String),
            FieldDefinition::new("productId", FieldType::String),
            FieldDefinition::new("quantity", FieldType::Int).validate(FieldValidator::Range(1.0, 1000.0)),
            FieldDefinition::new("unitPriceCents", FieldType::Int).validate(FieldValidator::Range(0.0, 1e9)),
        ]
    }

    fn relations() -> Vec<RelationDefinition> {
        vec![
            RelationDefinition::from("order", "Order", "orderItems").references(&["orderId"], &["id"]),
            RelationDefinition::from("product", "Product", "orderItems").references(&["productId"], &["id"]),
        ]
    }

    fn indexes() -> Vec<IndexDefinition> {
        vec![IndexDefinition::unique(&["orderId", "productId"])]
    }
}

/// Payment entity schema
pub struct PaymentSchema;

impl EntSchema for PaymentSchema {
    fn entity_name() -> &'static str {
        "Payment"
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("id", FieldType::String)
                .id()
                .default_value(FieldDefault::Function("cuid".to_string())),
            FieldDefinition::new("orderId", FieldType::String),
            FieldDefinition::new("amountCents", FieldType::Int).validate(FieldValidator::Range(0.0, 1e12)),
            FieldDefinition::new("method", FieldType::Enum(enums::payment_method())),
            FieldDefinition::new("status", FieldType::Enum(enums::payment_status()))
                .default_value(FieldDefault::String("PENDING".to_string())),
            // Set once the provider acknowledges the charge
            FieldDefinition::new("providerRef", FieldType::String).optional().unique(),
            FieldDefinition::new("paidAt", FieldType::DateTime).optional(),
        ]
    }

    fn relations() -> Vec<RelationDefinition> {
        vec![RelationDefinition::from("order", "Order", "payments").references(&["orderId"], &["id"])]
    }
}

/// Shipment entity schema
pub struct ShipmentSchema;

impl EntSchema for ShipmentSchema {
    fn entity_name() -> &'static str {
        "Shipment"
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("id", FieldType::String)
                .id()
                .default_value(FieldDefault::Function("cuid".to_string())),
            FieldDefinition::new("orderId", FieldType::String).unique(),
            FieldDefinition::new("addressId", FieldType::String),
            FieldDefinition::new("carrier", FieldType::String),
            FieldDefinition::new("trackingNumber", FieldType::String).optional(),
            FieldDefinition::new("status", FieldType::Enum(enums::shipment_status()))
                .default_value(FieldDefault::String("PENDING".to_string())),
            FieldDefinition::new("shippedAt", FieldType::DateTime).optional(),
            FieldDefinition::new("deliveredAt", FieldType::DateTime).optional(),
        ]
    }

    fn relations() -> Vec<RelationDefinition> {
        vec![
            RelationDefinition::from("order", "Order", "shipment").references(&["orderId"], &["id"]),
            RelationDefinition::from("address", "Address", "shipments").references(&["addressId"], &["id"]),
        ]
    }
}

/// Coupon entity schema
pub struct CouponSchema;

impl EntSchema for CouponSchema {
    fn entity_name() -> &'static str {
        "Coupon"
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("id", FieldType::String)
                .id()
                .default_value(FieldDefault::Function("cuid".to_string())),
            FieldDefinition::new("code", FieldType::String)
                .unique()
                .validate(FieldValidator::Pattern("^[A-Z0-9]{4,16}$".to_string())),
            FieldDefinition::new("discountType", FieldType::Enum(enums::discount_type())),
            FieldDefinition::new("amount", FieldType::Float).validate(FieldValidator::Range(0.0, 1e9)),
            FieldDefinition::new("usageLimit", FieldType::Int).optional(),
            FieldDefinition::new("expiresAt", FieldType::DateTime).optional(),
        ]
    }

    fn relations() -> Vec<RelationDefinition> {
        vec![RelationDefinition::to("orders", "Order", "coupon")]
    }
}
