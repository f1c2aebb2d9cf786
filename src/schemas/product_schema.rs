// Product Entity Schemas - catalog categories, products and reviews
// Categories nest through a self relation; a user reviews a product at most once

use crate::ent_schema::{
    EntSchema, FieldDefault, FieldDefinition, FieldType, FieldValidator, IndexDefinition,
    RelationDefinition,
};

/// Category entity schema
pub struct CategorySchema;

impl EntSchema for CategorySchema {
    fn entity_name() -> &'static str {
        "Category"
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("id", FieldType::String)
                .id()
                .default_value(FieldDefault::Function("cuid".to_string())),
            FieldDefinition::new("name", FieldType::String).validate(FieldValidator::MaxLength(80)),
            FieldDefinition::new("slug", FieldType::String)
                .unique()
                .validate(FieldValidator::Pattern("^[a-z0-9]+(-[a-z0-9]+)*$".to_string())),
            FieldDefinition::new("parentId", FieldType::String).optional(),
        ]
    }

    fn relations() -> Vec<RelationDefinition> {
        vec![
            RelationDefinition::from("parent", "Category", "children")
                .optional()
                .references(&["parentId"], &["id"]),
            RelationDefinition::to("children", "Category", "parent"),
            RelationDefinition::to("products", "Product", "category"),
        ]
    }
}

/// Product entity schema
pub struct ProductSchema;

impl EntSchema for ProductSchema {
    fn entity_name() -> &'static str {
        "Product"
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("id", FieldType::String)
                .id()
                .default_value(FieldDefault::Function("cuid".to_string())),
            // Required fields
            FieldDefinition::new("sku", FieldType::String).unique(),
            FieldDefinition::new("name", FieldType::String)
                .validate(FieldValidator::MinLength(1))
                .validate(FieldValidator::MaxLength(200)),
            FieldDefinition::new("priceCents", FieldType::Int)
                .validate(FieldValidator::Range(0.0, 100_000_000.0)),
            // Optional fields
            FieldDefinition::new("description", FieldType::String).optional(),
            FieldDefinition::new("weightKg", FieldType::Float).optional(),
            FieldDefinition::new("tags", FieldType::String).list(),
            FieldDefinition::new("stock", FieldType::Int)
                .default_value(FieldDefault::Int(0))
                .validate(FieldValidator::Range(0.0, 1_000_000.0)),
            FieldDefinition::new("isActive", FieldType::Bool).default_value(FieldDefault::Bool(true)),
            FieldDefinition::new("categoryId", FieldType::String).optional(),
            FieldDefinition::new("createdAt", FieldType::DateTime)
                .default_value(FieldDefault::Function("now".to_string())),
        ]
    }

    fn relations() -> Vec<RelationDefinition> {
        vec![
            RelationDefinition::from("category", "Category", "products")
                .optional()
                .references(&["categoryId"], &["id"]),
            RelationDefinition::to("reviews", "Review", "product"),
            RelationDefinition::to("orderItems", "OrderItem", "product"),
            RelationDefinition::to("cartItems", "CartItem", "product"),
            RelationDefinition::to("wishlistItems", "WishlistItem", "product"),
        ]
    }
}

/// Review entity schema
pub struct ReviewSchema;

impl EntSchema for ReviewSchema {
    fn entity_name() -> &'static str {
        "Review"
    }

    fn fields() -> Vec<FieldDefinition> {
        vec![
            FieldDefinition::new("id", FieldType::String)
                .id()
                .default_value(FieldDefault::Function("cuid".to_string())),
            FieldDefinition::new("userId", FieldType::String),
            FieldDefinition::new("productId", FieldType::String),
            FieldDefinition::new("rating", FieldType::Int).validate(FieldValidator::Range(1.0, 5.0)),
            FieldDefinition::new("comment", FieldType::String)
                .optional()
                .validate(FieldValidator::MaxLength(2000)),
            FieldDefinition::new("createdAt", FieldType::DateTime)
                .default_value(FieldDefault::Function("now".to_string())),
        ]
    }

    fn relations() -> Vec<RelationDefinition> {
        vec![
            RelationDefinition::from("user", "User", "reviews").references(&["userId"], &["id"]),
            RelationDefinition::from("product", "Product", "reviews").references(&["productId"], &["id"]),
        ]
    }

    fn indexes() -> Vec<IndexDefinition> {
        vec![IndexDefinition::unique(&["userId", "productId"])]
    }
}
