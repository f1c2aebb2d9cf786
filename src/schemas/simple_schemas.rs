// Simple schemas for carts and wishlists

use crate::ent_schema::{
    EntSchema, FieldDefault, FieldDefinition, FieldType, FieldValidator, IndexDefinition,
    RelationDefinition,
};

pub struct CartSchema;

impl EntSchema for CartSchema {
    fn entity_name() -> &'static str {
        "Cart"
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("id", FieldType::String)
                .id()
                .default_value(FieldDefault::Function("cuid".to_string())),
            FieldDefinition::new("userId", FieldType::String).unique(),
            FieldDefinition::new("updatedAt", FieldType::DateTime)
                .default_value(FieldDefault::Function("now".to_string())),
        ]
    }

    fn relations() -> Vec<RelationDefinition> {
        vec![
            RelationDefinition::from("user", "User", "cart").references(&["userId"], &["id"]),
            RelationDefinition::to("items", "CartItem", "cart"),
        ]
    }
}

pub struct CartItemSchema;

impl EntSchema for CartItemSchema {
    fn entity_name() -> &'static str {
        "CartItem"
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("id", FieldType::String)
                .id()
                .default_value(FieldDefault::Function("cuid".to_string())),
            FieldDefinition::new("cartId", FieldType::String),
            FieldDefinition::new("productId", FieldType::String),
            FieldDefinition::new("quantity", FieldType::Int)
                .default_value(FieldDefault::Int(1))
                .validate(FieldValidator::Range(1.0, 99.0)),
        ]
    }

    fn relations() -> Vec<RelationDefinition> {
        vec![
            RelationDefinition::from("cart", "Cart", "items").references(&["cartId"], &["id"]),
            RelationDefinition::from("product", "Product", "cartItems").references(&["productId"], &["id"]),
        ]
    }

    fn indexes() -> Vec<IndexDefinition> {
        vec![IndexDefinition::unique(&["cartId", "productId"])]
    }
}

pub struct WishlistItemSchema;

impl EntSchema for WishlistItemSchema {
    fn entity_name() -> &'static str {
        "WishlistItem"
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("id", FieldType::String)
                .id()
                .default_value(FieldDefault::Function("cuid".to_string())),
            FieldDefinition::new("userId", FieldType::String),
            FieldDefinition::new("productId", FieldType::String),
            FieldDefinition::new("addedAt", FieldType::DateTime)
                .default_value(FieldDefault::Function("now".to_string())),
        ]
    }

    fn relations() -> Vec<RelationDefinition> {
        vec![
            RelationDefinition::from("user", "User", "wishlistItems").references(&["userId"], &["id"]),
            RelationDefinition::from("product", "Product", "wishlistItems").references(&["productId"], &["id"]),
        ]
    }

    fn indexes() -> Vec<IndexDefinition> {
        vec![IndexDefinition::unique(&["userId", "productId"])]
    }
}
