//! Persistence contract for the order engine.
//!
//! The engine talks to storage through [`OrderStore`], which requires three
//! things of an implementation:
//!
//! - point reads and writes keyed by `(order_id, store_id)`
//! - a transaction primitive giving atomicity across one order-status write
//!   and zero-or-more product-stock increments
//! - an atomic "add N to counter" for stock restoration (never
//!   read-modify-write, so concurrent restorations touching the same product
//!   cannot lose updates)
//!
//! Two implementations ship with the crate: [`PgOrderStore`] backed by
//! `PostgreSQL` via sqlx, and [`MemoryOrderStore`] for tests and embedding
//! without a database.

pub mod memory;
pub mod postgres;

use std::time::Duration;

use chrono::{DateTime, Utc};
use orderline_core::{FulfillmentStatus, OrderId, PaymentStatus, ProductId, StoreId};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use crate::config::EngineConfig;
use crate::models::{Order, OrderItem};

pub use memory::MemoryOrderStore;
pub use postgres::PgOrderStore;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the store is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// The row no longer matches the caller's expected state.
    #[error("conflict: {0}")]
    Conflict(String),
}

/// The single write shape for order mutations.
///
/// `None` fields are left untouched. `clear_tracking` nulls both tracking
/// fields and wins over the tracking setters. `updated_at` is always
/// written; construct via [`OrderPatch::at`] and fill in the rest with
/// struct-update syntax.
#[derive(Debug, Clone)]
pub struct OrderPatch {
    /// New payment status.
    pub payment_status: Option<PaymentStatus>,
    /// New fulfillment status.
    pub fulfillment_status: Option<FulfillmentStatus>,
    /// Overwrite `shipped_at` with this instant (shipped transitions always
    /// re-stamp).
    pub shipped_at: Option<DateTime<Utc>>,
    /// Stamp `shipped_at` only when currently unset (delivered transitions
    /// back-fill an implicit shipment).
    pub backfill_shipped_at: Option<DateTime<Utc>>,
    /// Stamp `delivered_at` when currently unset; an existing stamp is never
    /// replaced.
    pub delivered_at: Option<DateTime<Utc>>,
    /// New tracking number.
    pub tracking_number: Option<String>,
    /// New shipping provider.
    pub shipping_provider: Option<String>,
    /// Null both tracking fields.
    pub clear_tracking: bool,
    /// Mutation timestamp; always written.
    pub updated_at: DateTime<Utc>,
}

impl OrderPatch {
    /// An empty patch that only bumps `updated_at`.
    #[must_use]
    pub const fn at(now: DateTime<Utc>) -> Self {
        Self {
            payment_status: None,
            fulfillment_status: None,
            shipped_at: None,
            backfill_shipped_at: None,
            delivered_at: None,
            tracking_number: None,
            shipping_provider: None,
            clear_tracking: false,
            updated_at: now,
        }
    }
}

/// Optimistic-concurrency guard for [`OrderStore::apply_patch`].
///
/// `None` fields are unchecked. When a set field no longer matches the
/// stored value, the write is refused with [`StoreError::Conflict`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpectedStatus {
    /// Payment status the caller last observed.
    pub payment: Option<PaymentStatus>,
    /// Fulfillment status the caller last observed.
    pub fulfillment: Option<FulfillmentStatus>,
}

impl ExpectedStatus {
    /// Whether any field is actually checked.
    #[must_use]
    pub const fn is_checked(&self) -> bool {
        self.payment.is_some() || self.fulfillment.is_some()
    }
}

/// One product-stock increment applied inside a restock transaction.
#[derive(Debug, Clone, Copy)]
pub struct StockReturn {
    /// Product whose counter to increment.
    pub product_id: ProductId,
    /// Units to add back. Always positive.
    pub quantity: i32,
}

/// Storage contract for order mutation.
///
/// Futures from these methods are awaited in place by the engine; none are
/// spawned, so no `Send` bound is imposed on them.
#[allow(async_fn_in_trait)]
pub trait OrderStore: Send + Sync {
    /// Point read of one order, scoped to its owning store.
    ///
    /// Returns `Ok(None)` both when the order does not exist and when it
    /// belongs to a different store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] / [`StoreError::DataCorruption`] on
    /// storage failure.
    async fn order(&self, order_id: OrderId, store_id: StoreId)
    -> Result<Option<Order>, StoreError>;

    /// All line items of an order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] / [`StoreError::DataCorruption`] on
    /// storage failure.
    async fn order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, StoreError>;

    /// One batched read of every requested order owned by `store_id`.
    ///
    /// IDs that are missing or foreign are simply absent from the result.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] / [`StoreError::DataCorruption`] on
    /// storage failure.
    async fn orders_in_store(
        &self,
        order_ids: &[OrderId],
        store_id: StoreId,
    ) -> Result<Vec<Order>, StoreError>;

    /// Apply a patch to one order, guarded by `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the order is absent or foreign,
    /// [`StoreError::Conflict`] if a checked expectation no longer holds,
    /// and [`StoreError::Database`] on storage failure.
    async fn apply_patch(
        &self,
        order_id: OrderId,
        store_id: StoreId,
        patch: &OrderPatch,
        expected: &ExpectedStatus,
    ) -> Result<Order, StoreError>;

    /// Apply a patch and a set of stock increments as one atomic unit.
    ///
    /// Either the order write and every increment commit together, or none
    /// of them do.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the order is absent or foreign,
    /// and [`StoreError::Database`] on storage failure; on any error the
    /// whole transaction rolls back.
    async fn apply_patch_with_restock(
        &self,
        order_id: OrderId,
        store_id: StoreId,
        patch: &OrderPatch,
        restock: &[StockReturn],
    ) -> Result<Order, StoreError>;

    /// Apply the same patch to many orders in one batched write.
    ///
    /// No per-order validation or expectation checking; returns the number
    /// of rows written.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on storage failure.
    async fn apply_patch_bulk(
        &self,
        order_ids: &[OrderId],
        store_id: StoreId,
        patch: &OrderPatch,
    ) -> Result<u64, StoreError>;
}

/// Create a `PostgreSQL` connection pool from engine configuration.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(config: &EngineConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(config.database_url.expose_secret())
        .await
}
