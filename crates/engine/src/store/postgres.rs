//! `PostgreSQL` implementation of the order store.
//!
//! Queries are runtime-checked (no compile-time macro verification) so the
//! crate builds without a live database. Statuses are stored as text and
//! parsed on read; an unknown value surfaces as
//! [`StoreError::DataCorruption`] rather than a panic.

use chrono::{DateTime, Utc};
use orderline_core::{CustomerId, OrderId, OrderItemId, ProductId, StoreId};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Order, OrderItem};

use super::{ExpectedStatus, OrderPatch, OrderStore, StockReturn, StoreError};

const SELECT_ORDER_COLUMNS: &str = r"
    id, store_id, customer_id,
    subtotal, shipping_cost, total,
    payment_reference, payment_access_code,
    payment_status, fulfillment_status,
    tracking_number, shipping_provider, shipping_info,
    created_at, updated_at, shipped_at, delivered_at
";

/// The one UPDATE shape used by every order mutation.
///
/// `$12`/`$13` are the optimistic-concurrency expectations; when NULL the
/// corresponding check is skipped. `$8` clears both tracking fields and wins
/// over the tracking setters. `shipped_at` overwrites via `$5` (shipped
/// transitions re-stamp) or back-fills via `$6`; `delivered_at` is only ever
/// stamped when unset.
const UPDATE_ORDER_SQL: &str = r"
    UPDATE orders SET
        payment_status = COALESCE($3, payment_status),
        fulfillment_status = COALESCE($4, fulfillment_status),
        shipped_at = CASE
            WHEN $5::timestamptz IS NOT NULL THEN $5
            ELSE COALESCE(shipped_at, $6)
        END,
        delivered_at = COALESCE(delivered_at, $7),
        tracking_number = CASE WHEN $8 THEN NULL ELSE COALESCE($9, tracking_number) END,
        shipping_provider = CASE WHEN $8 THEN NULL ELSE COALESCE($10, shipping_provider) END,
        updated_at = $11
    WHERE id = $1 AND store_id = $2
        AND ($12::text IS NULL OR payment_status = $12)
        AND ($13::text IS NULL OR fulfillment_status = $13)
    RETURNING
        id, store_id, customer_id,
        subtotal, shipping_cost, total,
        payment_reference, payment_access_code,
        payment_status, fulfillment_status,
        tracking_number, shipping_provider, shipping_info,
        created_at, updated_at, shipped_at, delivered_at
";

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for order queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    store_id: StoreId,
    customer_id: CustomerId,
    subtotal: Decimal,
    shipping_cost: Decimal,
    total: Decimal,
    payment_reference: Option<String>,
    payment_access_code: Option<String>,
    payment_status: String,
    fulfillment_status: String,
    tracking_number: Option<String>,
    shipping_provider: Option<String>,
    shipping_info: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    shipped_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let payment_status = row
            .payment_status
            .parse()
            .map_err(StoreError::DataCorruption)?;
        let fulfillment_status = row
            .fulfillment_status
            .parse()
            .map_err(StoreError::DataCorruption)?;

        Ok(Self {
            id: row.id,
            store_id: row.store_id,
            customer_id: row.customer_id,
            subtotal: row.subtotal,
            shipping_cost: row.shipping_cost,
            total: row.total,
            payment_reference: row.payment_reference,
            payment_access_code: row.payment_access_code,
            payment_status,
            fulfillment_status,
            tracking_number: row.tracking_number,
            shipping_provider: row.shipping_provider,
            shipping_info: row.shipping_info,
            created_at: row.created_at,
            updated_at: row.updated_at,
            shipped_at: row.shipped_at,
            delivered_at: row.delivered_at,
        })
    }
}

/// Internal row type for line-item queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    order_id: OrderId,
    product_id: ProductId,
    quantity: i32,
    product_name: String,
    variant_details: Option<String>,
    price: Decimal,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            quantity: row.quantity,
            product_name: row.product_name,
            variant_details: row.variant_details,
            price: row.price,
        }
    }
}

// =============================================================================
// Store
// =============================================================================

/// `PostgreSQL`-backed order store.
#[derive(Debug, Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn bind_patch<'q>(
        query: sqlx::query::QueryAs<'q, sqlx::Postgres, OrderRow, sqlx::postgres::PgArguments>,
        patch: &'q OrderPatch,
        expected: &ExpectedStatus,
    ) -> sqlx::query::QueryAs<'q, sqlx::Postgres, OrderRow, sqlx::postgres::PgArguments> {
        query
            .bind(patch.payment_status.map(|s| s.to_string()))
            .bind(patch.fulfillment_status.map(|s| s.to_string()))
            .bind(patch.shipped_at)
            .bind(patch.backfill_shipped_at)
            .bind(patch.delivered_at)
            .bind(patch.clear_tracking)
            .bind(patch.tracking_number.as_deref())
            .bind(patch.shipping_provider.as_deref())
            .bind(patch.updated_at)
            .bind(expected.payment.map(|s| s.to_string()))
            .bind(expected.fulfillment.map(|s| s.to_string()))
    }
}

impl OrderStore for PgOrderStore {
    async fn order(
        &self,
        order_id: OrderId,
        store_id: StoreId,
    ) -> Result<Option<Order>, StoreError> {
        let sql = format!("SELECT {SELECT_ORDER_COLUMNS} FROM orders WHERE id = $1 AND store_id = $2");
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(order_id)
            .bind(store_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Order::try_from).transpose()
    }

    async fn order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, StoreError> {
        let rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT id, order_id, product_id, quantity, product_name, variant_details, price
            FROM order_item
            WHERE order_id = $1
            ORDER BY id
            ",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn orders_in_store(
        &self,
        order_ids: &[OrderId],
        store_id: StoreId,
    ) -> Result<Vec<Order>, StoreError> {
        let ids: Vec<Uuid> = order_ids.iter().map(|id| id.as_uuid()).collect();
        let sql =
            format!("SELECT {SELECT_ORDER_COLUMNS} FROM orders WHERE id = ANY($1) AND store_id = $2");
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(&ids)
            .bind(store_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    async fn apply_patch(
        &self,
        order_id: OrderId,
        store_id: StoreId,
        patch: &OrderPatch,
        expected: &ExpectedStatus,
    ) -> Result<Order, StoreError> {
        let query = sqlx::query_as::<_, OrderRow>(UPDATE_ORDER_SQL)
            .bind(order_id)
            .bind(store_id);
        let row = Self::bind_patch(query, patch, expected)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => row.try_into(),
            None if expected.is_checked() => Err(StoreError::Conflict(
                "order status changed concurrently".to_string(),
            )),
            None => Err(StoreError::NotFound),
        }
    }

    async fn apply_patch_with_restock(
        &self,
        order_id: OrderId,
        store_id: StoreId,
        patch: &OrderPatch,
        restock: &[StockReturn],
    ) -> Result<Order, StoreError> {
        let mut tx = self.pool.begin().await?;

        let query = sqlx::query_as::<_, OrderRow>(UPDATE_ORDER_SQL)
            .bind(order_id)
            .bind(store_id);
        let row = Self::bind_patch(query, patch, &ExpectedStatus::default())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NotFound)?;

        for item in restock {
            // Atomic counter add at the storage layer; never read-modify-write.
            let result = sqlx::query("UPDATE product SET in_stock = in_stock + $1 WHERE id = $2")
                .bind(item.quantity)
                .bind(item.product_id)
                .execute(&mut *tx)
                .await?;

            if result.rows_affected() == 0 {
                // Dropping the transaction rolls everything back.
                return Err(StoreError::DataCorruption(format!(
                    "missing product {} during stock restoration",
                    item.product_id
                )));
            }
        }

        tx.commit().await?;

        row.try_into()
    }

    async fn apply_patch_bulk(
        &self,
        order_ids: &[OrderId],
        store_id: StoreId,
        patch: &OrderPatch,
    ) -> Result<u64, StoreError> {
        let ids: Vec<Uuid> = order_ids.iter().map(|id| id.as_uuid()).collect();
        let result = sqlx::query(
            r"
            UPDATE orders SET
                payment_status = COALESCE($3, payment_status),
                fulfillment_status = COALESCE($4, fulfillment_status),
                shipped_at = CASE
                    WHEN $5::timestamptz IS NOT NULL THEN $5
                    ELSE COALESCE(shipped_at, $6)
                END,
                delivered_at = COALESCE(delivered_at, $7),
                updated_at = $8
            WHERE id = ANY($1) AND store_id = $2
            ",
        )
        .bind(&ids)
        .bind(store_id)
        .bind(patch.payment_status.map(|s| s.to_string()))
        .bind(patch.fulfillment_status.map(|s| s.to_string()))
        .bind(patch.shipped_at)
        .bind(patch.backfill_shipped_at)
        .bind(patch.delivered_at)
        .bind(patch.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
