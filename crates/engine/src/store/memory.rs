//! In-memory implementation of the order store.
//!
//! Backs the unit and integration tests, and lets the engine be embedded
//! without a database. A single mutex guards all tables, which also makes
//! the patch-plus-restock write trivially atomic: every mutation is checked
//! before anything is modified, so a failure leaves the tables untouched.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use orderline_core::{OrderId, ProductId, StoreId};

use crate::models::{Order, OrderItem};

use super::{ExpectedStatus, OrderPatch, OrderStore, StockReturn, StoreError};

#[derive(Debug, Default)]
struct Inner {
    orders: HashMap<OrderId, Order>,
    items: HashMap<OrderId, Vec<OrderItem>>,
    stock: HashMap<ProductId, i32>,
}

/// Order store held entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    inner: Mutex<Inner>,
}

impl MemoryOrderStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means another test thread panicked; the data
        // is still usable.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Seed an order.
    pub fn insert_order(&self, order: Order) {
        self.lock().orders.insert(order.id, order);
    }

    /// Seed a line item.
    pub fn insert_item(&self, item: OrderItem) {
        self.lock().items.entry(item.order_id).or_default().push(item);
    }

    /// Seed a product stock counter.
    pub fn set_stock(&self, product_id: ProductId, in_stock: i32) {
        self.lock().stock.insert(product_id, in_stock);
    }

    /// Current stock counter for a product.
    #[must_use]
    pub fn stock(&self, product_id: ProductId) -> Option<i32> {
        self.lock().stock.get(&product_id).copied()
    }

    /// Read an order without the store-ownership scoping, for assertions.
    #[must_use]
    pub fn snapshot(&self, order_id: OrderId) -> Option<Order> {
        self.lock().orders.get(&order_id).cloned()
    }

    fn apply(order: &mut Order, patch: &OrderPatch) {
        if let Some(status) = patch.payment_status {
            order.payment_status = status;
        }
        if let Some(status) = patch.fulfillment_status {
            order.fulfillment_status = status;
        }
        if let Some(stamp) = patch.shipped_at {
            order.shipped_at = Some(stamp);
        } else if order.shipped_at.is_none() {
            order.shipped_at = patch.backfill_shipped_at;
        }
        if order.delivered_at.is_none() {
            order.delivered_at = patch.delivered_at;
        }
        if patch.clear_tracking {
            order.tracking_number = None;
            order.shipping_provider = None;
        } else {
            if let Some(number) = &patch.tracking_number {
                order.tracking_number = Some(number.clone());
            }
            if let Some(provider) = &patch.shipping_provider {
                order.shipping_provider = Some(provider.clone());
            }
        }
        order.updated_at = patch.updated_at;
    }
}

impl OrderStore for MemoryOrderStore {
    async fn order(
        &self,
        order_id: OrderId,
        store_id: StoreId,
    ) -> Result<Option<Order>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .orders
            .get(&order_id)
            .filter(|order| order.store_id == store_id)
            .cloned())
    }

    async fn order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, StoreError> {
        let inner = self.lock();
        Ok(inner.items.get(&order_id).cloned().unwrap_or_default())
    }

    async fn orders_in_store(
        &self,
        order_ids: &[OrderId],
        store_id: StoreId,
    ) -> Result<Vec<Order>, StoreError> {
        let inner = self.lock();
        Ok(order_ids
            .iter()
            .filter_map(|id| inner.orders.get(id))
            .filter(|order| order.store_id == store_id)
            .cloned()
            .collect())
    }

    async fn apply_patch(
        &self,
        order_id: OrderId,
        store_id: StoreId,
        patch: &OrderPatch,
        expected: &ExpectedStatus,
    ) -> Result<Order, StoreError> {
        let mut inner = self.lock();
        let order = inner
            .orders
            .get_mut(&order_id)
            .filter(|order| order.store_id == store_id)
            .ok_or(StoreError::NotFound)?;

        if expected.payment.is_some_and(|p| p != order.payment_status)
            || expected
                .fulfillment
                .is_some_and(|f| f != order.fulfillment_status)
        {
            return Err(StoreError::Conflict(
                "order status changed concurrently".to_string(),
            ));
        }

        Self::apply(order, patch);
        Ok(order.clone())
    }

    async fn apply_patch_with_restock(
        &self,
        order_id: OrderId,
        store_id: StoreId,
        patch: &OrderPatch,
        restock: &[StockReturn],
    ) -> Result<Order, StoreError> {
        let mut inner = self.lock();

        // Check everything up front so a failure mutates nothing.
        if !inner
            .orders
            .get(&order_id)
            .is_some_and(|order| order.store_id == store_id)
        {
            return Err(StoreError::NotFound);
        }
        for item in restock {
            if !inner.stock.contains_key(&item.product_id) {
                return Err(StoreError::DataCorruption(format!(
                    "missing product {} during stock restoration",
                    item.product_id
                )));
            }
        }

        for item in restock {
            if let Some(count) = inner.stock.get_mut(&item.product_id) {
                *count += item.quantity;
            }
        }
        let order = inner
            .orders
            .get_mut(&order_id)
            .ok_or(StoreError::NotFound)?;
        Self::apply(order, patch);
        Ok(order.clone())
    }

    async fn apply_patch_bulk(
        &self,
        order_ids: &[OrderId],
        store_id: StoreId,
        patch: &OrderPatch,
    ) -> Result<u64, StoreError> {
        let mut inner = self.lock();
        let mut written = 0;
        for id in order_ids {
            if let Some(order) = inner
                .orders
                .get_mut(id)
                .filter(|order| order.store_id == store_id)
            {
                Self::apply(order, patch);
                written += 1;
            }
        }
        Ok(written)
    }
}
