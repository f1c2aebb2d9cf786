// Shared enum definitions for the e-commerce schemas

use crate::ent_schema::EnumDefinition;

pub fn role() -> EnumDefinition {
    EnumDefinition::new("Role", &["CUSTOMER", "ADMIN", "SUPPORT"])
}

pub fn order_status() -> EnumDefinition {
    EnumDefinition::new(
        "OrderStatus",
        &["PAYING", "PROCESSING", "SHIPPED", "DELIVERED", "CANCELLED", "REFUNDED"],
    )
}

pub fn payment_status() -> EnumDefinition {
    EnumDefinition::new("PaymentStatus", &["PENDING", "AUTHORIZED", "CAPTURED", "FAILED", "REFUNDED"])
}

pub fn payment_method() -> EnumDefinition {
    EnumDefinition::new("PaymentMethod", &["CARD", "PAYPAL", "BANK_TRANSFER", "GIFT_CARD"])
}

pub fn shipment_status() -> EnumDefinition {
    EnumDefinition::new("ShipmentStatus", &["PENDING", "IN_TRANSIT", "DELIVERED", "RETURNED", "LOST"])
}

pub fn discount_type() -> EnumDefinition {
    EnumDefinition::new("DiscountType", &["PERCENTAGE", "FIXED_AMOUNT", "FREE_SHIPPING"])
}
