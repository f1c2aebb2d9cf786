// Schema definitions module - centralized schema registry

pub mod enums;
pub mod order_schema;
pub mod product_schema;
pub mod simple_schemas;
pub mod user_schema;

use crate::ent_schema::{Schema, SchemaRegistry};
use crate::error::SchemaError;
use once_cell::sync::Lazy;
use std::sync::Arc;

pub use order_schema::{CouponSchema, OrderItemSchema, OrderSchema, PaymentSchema, ShipmentSchema};
pub use product_schema::{CategorySchema, ProductSchema, ReviewSchema};
pub use simple_schemas::{CartItemSchema, CartSchema, WishlistItemSchema};
pub use user_schema::{AddressSchema, UserSchema};

/// Initialize and register all schemas
pub fn create_schema_registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();

    // Register all entity schemas
    registry
        .register::<UserSchema>()
        .register::<AddressSchema>()
        .register::<CategorySchema>()
        .register::<ProductSchema>()
        .register::<ReviewSchema>()
        .register::<OrderSchema>()
        .register::<OrderItemSchema>()
        .register::<PaymentSchema>()
        .register::<ShipmentSchema>()
        .register::<CouponSchema>()
        .register::<CartSchema>()
        .register::<CartItemSchema>()
        .register::<WishlistItemSchema>();

    registry
}

/// Validate all registered schemas
pub fn validate_schemas() -> Result<(), Vec<SchemaError>> {
    create_schema_registry().validate()
}

static ECOMMERCE_SCHEMA: Lazy<Arc<Schema>> = Lazy::new(|| match create_schema_registry().freeze() {
    Ok(schema) => Arc::new(schema),
    Err(errors) => {
        let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
        panic!("built-in e-commerce schema is invalid:\n{}", details.join("\n"))
    }
});

/// The frozen e-commerce schema, built on first use.
pub fn ecommerce_schema() -> Arc<Schema> {
    Arc::clone(&ECOMMERCE_SCHEMA)
}
