//! Order and line-item domain models.

use chrono::{DateTime, Utc};
use orderline_core::{CustomerId, FulfillmentStatus, OrderId, OrderItemId, PaymentStatus,
    ProductId, StoreId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One customer purchase, scoped to exactly one store.
///
/// Orders are created outside the engine (at checkout time) in state
/// `{Pending, Processing}` and are mutated exclusively through the engine's
/// service operations. They are never physically deleted here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// Owning store. Immutable; every operation checks it.
    pub store_id: StoreId,
    /// Purchasing customer.
    pub customer_id: CustomerId,
    /// Sum of line-item prices at creation.
    pub subtotal: Decimal,
    /// Shipping charge at creation.
    pub shipping_cost: Decimal,
    /// `subtotal + shipping_cost` at creation; never recomputed here.
    pub total: Decimal,
    /// External payment-gateway correlation ID.
    pub payment_reference: Option<String>,
    /// External payment-gateway access code.
    pub payment_access_code: Option<String>,
    /// Money-collection state machine.
    pub payment_status: PaymentStatus,
    /// Physical-delivery state machine.
    pub fulfillment_status: FulfillmentStatus,
    /// Carrier tracking number, once assigned.
    pub tracking_number: Option<String>,
    /// Carrier name, once assigned.
    pub shipping_provider: Option<String>,
    /// Structured delivery address. Opaque to the engine.
    pub shipping_info: serde_json::Value,
    /// When the order was created. Immutable.
    pub created_at: DateTime<Utc>,
    /// Bumped on every mutation.
    pub updated_at: DateTime<Utc>,
    /// Stamped when the order first transitions to shipped. Never cleared.
    pub shipped_at: Option<DateTime<Utc>>,
    /// Stamped when the order transitions to delivered. Never cleared.
    pub delivered_at: Option<DateTime<Utc>>,
}

/// Immutable snapshot of a purchased line.
///
/// Created atomically with its order and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    /// Unique line-item ID.
    pub id: OrderItemId,
    /// Owning order.
    pub order_id: OrderId,
    /// Purchased product.
    pub product_id: ProductId,
    /// Units purchased. Always positive.
    pub quantity: i32,
    /// Product name at time of purchase.
    pub product_name: String,
    /// Variant description at time of purchase (e.g. "Size: M / Blue").
    pub variant_details: Option<String>,
    /// Unit price at time of purchase.
    pub price: Decimal,
}
