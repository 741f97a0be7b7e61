//! Batched operations with per-item failure isolation.
//!
//! A bulk call validates its inputs once, then treats every order
//! independently: one order failing never aborts the batch, and the
//! [`BulkReport`] carries a per-item verdict alongside aggregate counts.

use std::collections::HashSet;

use chrono::Utc;
use orderline_core::{FulfillmentStatus, OrderId, StoreId};
use tracing::{info, instrument};

use crate::auth::IdentityProvider;
use crate::error::OrderActionError;
use crate::models::{BulkItemOutcome, BulkReport, CancelRequest, StatusUpdate, TrackingAssignment};
use crate::store::{OrderPatch, OrderStore};

use super::OrderService;

impl<S: OrderStore, P: IdentityProvider> OrderService<S, P> {
    /// Set statuses on a batch of orders in one write.
    ///
    /// Unlike [`Self::update_status`], the bulk path force-sets the supplied
    /// statuses without consulting each order's current state; it exists for
    /// merchant corrections where per-order validation would defeat the
    /// point. Derived stamps still apply per row: a shipped target re-stamps
    /// `shipped_at` on every order, and a delivered target stamps
    /// `delivered_at` and back-fills `shipped_at` only where they are unset.
    /// The optimistic-concurrency fields of [`StatusUpdate`] are not
    /// supported here and are ignored.
    ///
    /// Orders that are absent or belong to another store show up as failed
    /// items in the report; they never abort the batch.
    ///
    /// # Errors
    ///
    /// - [`OrderActionError::Unauthorized`] without an authenticated actor
    /// - [`OrderActionError::InvalidArgument`] for an empty id list or an
    ///   update with no target status
    /// - [`OrderActionError::Store`] when the batched write itself fails
    #[instrument(skip(self, update), fields(store_id = %store_id, orders = order_ids.len()))]
    pub async fn bulk_update_status(
        &self,
        store_id: StoreId,
        order_ids: &[OrderId],
        update: StatusUpdate,
    ) -> Result<BulkReport, OrderActionError> {
        self.authorize()?;

        if order_ids.is_empty() {
            return Err(OrderActionError::InvalidArgument(
                "order id list must not be empty".to_string(),
            ));
        }
        if update.is_empty() {
            return Err(OrderActionError::InvalidArgument(
                "at least one of payment_status or fulfillment_status must be supplied".to_string(),
            ));
        }

        let found: HashSet<OrderId> = self
            .store
            .orders_in_store(order_ids, store_id)
            .await?
            .into_iter()
            .map(|order| order.id)
            .collect();

        let now = Utc::now();
        let mut patch = OrderPatch::at(now);
        patch.payment_status = update.payment_status;
        patch.fulfillment_status = update.fulfillment_status;
        match update.fulfillment_status {
            Some(FulfillmentStatus::Shipped) => patch.shipped_at = Some(now),
            Some(FulfillmentStatus::Delivered) => {
                patch.delivered_at = Some(now);
                patch.backfill_shipped_at = Some(now);
            }
            _ => {}
        }

        let targets: Vec<OrderId> = order_ids
            .iter()
            .copied()
            .filter(|id| found.contains(id))
            .collect();
        if !targets.is_empty() {
            self.store
                .apply_patch_bulk(&targets, store_id, &patch)
                .await?;
        }

        let results = order_ids
            .iter()
            .map(|&order_id| {
                if found.contains(&order_id) {
                    BulkItemOutcome {
                        order_id,
                        success: true,
                        message: "status updated".to_string(),
                    }
                } else {
                    BulkItemOutcome {
                        order_id,
                        success: false,
                        message: "order not found or access denied".to_string(),
                    }
                }
            })
            .collect();

        let report = BulkReport::from_results("bulk status update", results);
        info!(
            successful = report.summary.successful,
            failed = report.summary.failed,
            "bulk status update finished"
        );
        Ok(report)
    }

    /// Cancel a batch of orders, restoring inventory for each.
    ///
    /// Each order goes through the same checks as [`Self::cancel_order`]
    /// with inventory restoration enabled, one after another. An order that
    /// cannot be cancelled is recorded as a failed item and the batch moves
    /// on.
    ///
    /// # Errors
    ///
    /// - [`OrderActionError::Unauthorized`] without an authenticated actor
    /// - [`OrderActionError::InvalidArgument`] for an empty id list
    #[instrument(skip(self, reason), fields(store_id = %store_id, orders = order_ids.len()))]
    pub async fn bulk_cancel_orders(
        &self,
        store_id: StoreId,
        order_ids: &[OrderId],
        reason: Option<String>,
    ) -> Result<BulkReport, OrderActionError> {
        self.authorize()?;

        if order_ids.is_empty() {
            return Err(OrderActionError::InvalidArgument(
                "order id list must not be empty".to_string(),
            ));
        }

        let mut results = Vec::with_capacity(order_ids.len());
        for &order_id in order_ids {
            let request = CancelRequest {
                reason: reason.clone(),
                restore_inventory: true,
            };
            let outcome = match self.cancel_order(order_id, store_id, request).await {
                Ok(outcome) => BulkItemOutcome {
                    order_id,
                    success: true,
                    message: outcome.message,
                },
                Err(error) => BulkItemOutcome {
                    order_id,
                    success: false,
                    message: error.to_string(),
                },
            };
            results.push(outcome);
        }

        let report = BulkReport::from_results("bulk cancellation", results);
        info!(
            successful = report.summary.successful,
            failed = report.summary.failed,
            "bulk cancellation finished"
        );
        Ok(report)
    }

    /// Attach tracking numbers to a batch of orders.
    ///
    /// Each assignment goes through [`Self::add_tracking`], so blank numbers,
    /// unpaid orders and cancelled orders fail individually without touching
    /// the rest; eligible processing orders are promoted to shipped as usual.
    ///
    /// # Errors
    ///
    /// - [`OrderActionError::Unauthorized`] without an authenticated actor
    /// - [`OrderActionError::InvalidArgument`] for an empty assignment list
    #[instrument(skip(self, assignments), fields(store_id = %store_id, orders = assignments.len()))]
    pub async fn bulk_update_tracking(
        &self,
        store_id: StoreId,
        assignments: &[TrackingAssignment],
    ) -> Result<BulkReport, OrderActionError> {
        self.authorize()?;

        if assignments.is_empty() {
            return Err(OrderActionError::InvalidArgument(
                "assignment list must not be empty".to_string(),
            ));
        }

        let mut results = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            let outcome = match self
                .add_tracking(
                    assignment.order_id,
                    store_id,
                    &assignment.tracking_number,
                    assignment.shipping_provider.clone(),
                )
                .await
            {
                Ok(outcome) => BulkItemOutcome {
                    order_id: assignment.order_id,
                    success: true,
                    message: outcome.message,
                },
                Err(error) => BulkItemOutcome {
                    order_id: assignment.order_id,
                    success: false,
                    message: error.to_string(),
                },
            };
            results.push(outcome);
        }

        let report = BulkReport::from_results("bulk tracking update", results);
        info!(
            successful = report.summary.successful,
            failed = report.summary.failed,
            "bulk tracking update finished"
        );
        Ok(report)
    }
}
