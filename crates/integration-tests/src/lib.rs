//! Integration tests for Orderline.
//!
//! The scenario tests under `tests/` drive the full [`OrderService`] surface
//! against the in-memory store, covering the paths a merchant dashboard
//! would take: status updates, tracking, cancellation, refunds, and bulk
//! operations.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p orderline-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `order_lifecycle` - status transitions and derived timestamps
//! - `tracking_flow` - tracking assignment, promotion, clearing
//! - `cancellation_refund` - cancellation, refunds, inventory restoration
//! - `bulk_operations` - batched operations and failure isolation

#![cfg_attr(not(test), forbid(unsafe_code))]

use chrono::{Duration, Utc};
use orderline_core::{
    CustomerId, FulfillmentStatus, OrderId, OrderItemId, PaymentStatus, ProductId, StoreId,
};
use orderline_engine::auth::FixedIdentity;
use orderline_engine::models::{Order, OrderItem};
use orderline_engine::services::OrderService;
use orderline_engine::store::MemoryOrderStore;
use rust_decimal::Decimal;
use serde_json::json;

/// One in-memory engine plus a tenant to run a scenario in.
pub struct TestHarness {
    pub service: OrderService<MemoryOrderStore, FixedIdentity>,
    pub store_id: StoreId,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    #[must_use]
    pub fn new() -> Self {
        Self {
            service: OrderService::new(MemoryOrderStore::new(), FixedIdentity::generate()),
            store_id: StoreId::generate(),
        }
    }

    /// Seed an order in this harness's store. Created an hour ago with a
    /// 49.99 + 5.00 = 54.99 total; timestamps are stamped to match the
    /// given fulfillment state.
    pub fn seed_order(&self, payment: PaymentStatus, fulfillment: FulfillmentStatus) -> OrderId {
        let created = Utc::now() - Duration::hours(1);
        let order = Order {
            id: OrderId::generate(),
            store_id: self.store_id,
            customer_id: CustomerId::generate(),
            subtotal: Decimal::new(4999, 2),
            shipping_cost: Decimal::new(500, 2),
            total: Decimal::new(5499, 2),
            payment_reference: Some("pay_ref_777".to_string()),
            payment_access_code: None,
            payment_status: payment,
            fulfillment_status: fulfillment,
            tracking_number: None,
            shipping_provider: None,
            shipping_info: json!({"line1": "12 Quay Street", "city": "Bristol"}),
            created_at: created,
            updated_at: created,
            shipped_at: matches!(
                fulfillment,
                FulfillmentStatus::Shipped | FulfillmentStatus::Delivered
            )
            .then(|| created + Duration::minutes(15)),
            delivered_at: matches!(fulfillment, FulfillmentStatus::Delivered)
                .then(|| created + Duration::minutes(45)),
        };
        let id = order.id;
        self.service.store().insert_order(order);
        id
    }

    /// Seed a product with a stock counter plus a line item on `order_id`
    /// consuming `quantity` of it.
    pub fn seed_line(&self, order_id: OrderId, quantity: i32, in_stock: i32) -> ProductId {
        let product_id = ProductId::generate();
        self.service.store().set_stock(product_id, in_stock);
        self.service.store().insert_item(OrderItem {
            id: OrderItemId::generate(),
            order_id,
            product_id,
            quantity,
            product_name: "Linen Throw".to_string(),
            variant_details: Some("Size: Large".to_string()),
            price: Decimal::new(4999, 2),
        });
        product_id
    }

    /// Snapshot an order straight from the store, bypassing tenant scoping.
    #[must_use]
    pub fn order(&self, order_id: OrderId) -> Order {
        self.service
            .store()
            .snapshot(order_id)
            .unwrap_or_else(|| panic!("order {order_id} should exist"))
    }

    /// Current stock counter for a seeded product.
    #[must_use]
    pub fn stock(&self, product_id: ProductId) -> i32 {
        self.service
            .store()
            .stock(product_id)
            .unwrap_or_else(|| panic!("product {product_id} should exist"))
    }
}
