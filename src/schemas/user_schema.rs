// User Entity Schema - customers and their addresses
// A user owns addresses, orders, reviews, wishlist items and at most one cart

use super::enums;
use crate::ent_schema::{
    EntSchema, FieldDefault, FieldDefinition, FieldType, FieldValidator, RelationDefinition,
};

/// User entity schema
pub struct UserSchema;

impl EntSchema for UserSchema {
    fn entity_name() -> &'static str {
        "User"
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("id", FieldType::String)
                .id()
                .default_value(FieldDefault::Function("cuid".to_string())),
            // Required fields
            FieldDefinition::new("email", FieldType::String)
                .unique()
                .validate(FieldValidator::Pattern(r"^[^\s@]+@[^\s@]+\.[^\s@]+$".to_string())),
            // Optional fields
            FieldDefinition::new("name", FieldType::String)
                .optional()
                .validate(FieldValidator::MaxLength(100)),
            FieldDefinition::new("phone", FieldType::String).optional(),
            FieldDefinition::new("role", FieldType::Enum(enums::role()))
                .default_value(FieldDefault::String("CUSTOMER".to_string())),
            FieldDefinition::new("createdAt", FieldType::DateTime)
                .default_value(FieldDefault::Function("now".to_string())),
            FieldDefinition::new("updatedAt", FieldType::DateTime)
                .default_value(FieldDefault::Function("now".to_string())),
        ]
    }

    fn relations() -> Vec<RelationDefinition> {
        vec![
            RelationDefinition::to("addresses", "Address", "user"),
            RelationDefinition::to("orders", "Order", "user"),
            RelationDefinition::to("reviews", "Review", "user"),
            RelationDefinition::to("wishlistItems", "WishlistItem", "user"),
            // One-to-one: the cart holds the foreign key
            RelationDefinition::to("cart", "Cart", "user").unique(),
        ]
    }
}

/// Address entity schema
pub struct AddressSchema;

impl EntSchema for AddressSchema {
    fn entity_name() -> &'static str {
        "Address"
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("id", FieldType::String)
                .id()
                .default_value(FieldDefault::Function("cuid".to_string())),
            FieldDefinition::new("userId", FieldType::String),
            FieldDefinition::new("line1", FieldType::String).validate(FieldValidator::MinLength(1)),
            FieldDefinition::new("line2", FieldType::String).optional(),
            FieldDefinition::new("city", FieldType::String),
            FieldDefinition::new("postalCode", FieldType::String),
            // ISO 3166-1 alpha-2
            FieldDefinition::new("country", FieldType::String)
                .validate(FieldValidator::Pattern("^[A-Z]{2}$".to_string())),
            FieldDefinition::new("isDefault", FieldType::Bool).default_value(FieldDefault::Bool(false)),
        ]
    }

    fn relations() -> Vec<RelationDefinition> {
        vec![
            RelationDefinition::from("user", "User", "addresses").references(&["userId"], &["id"]),
            RelationDefinition::to("shipments", "Shipment", "address"),
        ]
    }
}
