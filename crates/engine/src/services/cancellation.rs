//! Cancellation and refunds, including inventory restoration.

use chrono::Utc;
use orderline_core::{FulfillmentStatus, OrderId, PaymentStatus, StoreId};
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use crate::auth::IdentityProvider;
use crate::error::OrderActionError;
use crate::models::{CancelOutcome, CancelRequest, CancellationKind, RefundOutcome, RefundRequest};
use crate::store::{OrderPatch, OrderStore, StockReturn};
use crate::transitions::validate_fulfillment_transition;

use super::OrderService;

impl<S: OrderStore, P: IdentityProvider> OrderService<S, P> {
    /// Cancel a processing order, optionally returning its stock.
    ///
    /// The status write and every stock increment commit as one atomic unit;
    /// a failure anywhere leaves the order and all counters untouched.
    ///
    /// # Errors
    ///
    /// Checked in order, first failure wins:
    ///
    /// - [`OrderActionError::Unauthorized`] without an authenticated actor
    /// - [`OrderActionError::NotFound`] for absent or foreign orders
    /// - [`OrderActionError::InvalidState`] for delivered orders, already
    ///   cancelled orders, and shipped orders (use a refund instead)
    #[instrument(skip(self, request), fields(order_id = %order_id, store_id = %store_id))]
    pub async fn cancel_order(
        &self,
        order_id: OrderId,
        store_id: StoreId,
        request: CancelRequest,
    ) -> Result<CancelOutcome, OrderActionError> {
        self.authorize()?;

        let order = self.load_order(order_id, store_id).await?;

        match order.fulfillment_status {
            FulfillmentStatus::Delivered => {
                return Err(OrderActionError::InvalidState(
                    "cannot cancel a delivered order".to_string(),
                ));
            }
            FulfillmentStatus::Cancelled => {
                return Err(OrderActionError::InvalidState(
                    "order is already cancelled".to_string(),
                ));
            }
            FulfillmentStatus::Shipped => {
                return Err(OrderActionError::InvalidState(
                    "use refund for shipped orders".to_string(),
                ));
            }
            FulfillmentStatus::Processing => {}
        }

        validate_fulfillment_transition(order.fulfillment_status, FulfillmentStatus::Cancelled)?;

        let restock = if request.restore_inventory {
            self.store
                .order_items(order_id)
                .await?
                .iter()
                .map(|item| StockReturn {
                    product_id: item.product_id,
                    quantity: item.quantity,
                })
                .collect()
        } else {
            Vec::new()
        };

        let patch = OrderPatch {
            fulfillment_status: Some(FulfillmentStatus::Cancelled),
            ..OrderPatch::at(Utc::now())
        };
        self.store
            .apply_patch_with_restock(order_id, store_id, &patch, &restock)
            .await?;

        let items_restored = restock.len();
        info!(items_restored, "order cancelled");

        let message = if request.restore_inventory {
            format!("order cancelled; {items_restored} line item(s) returned to stock")
        } else {
            "order cancelled; inventory left unchanged".to_string()
        };

        Ok(CancelOutcome {
            success: true,
            message,
            order_id,
            kind: CancellationKind::Requested,
            items_restored,
            reason: request.reason,
        })
    }

    /// Refund a paid order, fully or partially.
    ///
    /// A full refund (amount equal to the order total, or omitted) also
    /// cancels fulfillment as an engine-internal side effect and restores
    /// stock when asked to. A partial refund touches nothing but the payment
    /// status; the customer keeps the goods.
    ///
    /// # Errors
    ///
    /// - [`OrderActionError::Unauthorized`] without an authenticated actor
    /// - [`OrderActionError::NotFound`] for absent or foreign orders
    /// - [`OrderActionError::InvalidState`] for orders not currently paid
    /// - [`OrderActionError::InvalidArgument`] for a non-positive amount or
    ///   one exceeding the order total
    #[instrument(skip(self, request), fields(order_id = %order_id, store_id = %store_id))]
    pub async fn refund_order(
        &self,
        order_id: OrderId,
        store_id: StoreId,
        request: RefundRequest,
    ) -> Result<RefundOutcome, OrderActionError> {
        self.authorize()?;

        let order = self.load_order(order_id, store_id).await?;

        if order.payment_status != PaymentStatus::Paid {
            return Err(OrderActionError::InvalidState(format!(
                "can only refund paid orders (payment status is {})",
                order.payment_status
            )));
        }

        let refund_amount = request.refund_amount.unwrap_or(order.total);
        if refund_amount <= Decimal::ZERO || refund_amount > order.total {
            return Err(OrderActionError::InvalidArgument(format!(
                "refund amount must be positive and at most the order total of {}",
                order.total
            )));
        }
        let full_refund = refund_amount == order.total;

        let restock = if full_refund && request.restore_inventory {
            self.store
                .order_items(order_id)
                .await?
                .iter()
                .map(|item| StockReturn {
                    product_id: item.product_id,
                    quantity: item.quantity,
                })
                .collect()
        } else {
            Vec::new()
        };

        let mut patch = OrderPatch {
            payment_status: Some(PaymentStatus::Refunded),
            ..OrderPatch::at(Utc::now())
        };
        if full_refund {
            // Engine-internal cancellation. Deliberately not routed through
            // the transition validator: a full refund cancels fulfillment
            // from whatever state it is in, including states the explicit
            // status-update path would reject.
            patch.fulfillment_status = Some(FulfillmentStatus::Cancelled);
            if order.fulfillment_status != FulfillmentStatus::Processing {
                warn!(
                    prior_fulfillment = %order.fulfillment_status,
                    "system cancellation of a non-processing order via full refund"
                );
            }
        }

        self.store
            .apply_patch_with_restock(order_id, store_id, &patch, &restock)
            .await?;

        let items_restored = restock.len();
        info!(%refund_amount, full_refund, items_restored, "order refunded");

        let message = if full_refund {
            format!("order fully refunded ({refund_amount}); fulfillment cancelled")
        } else {
            format!("order partially refunded ({refund_amount})")
        };

        Ok(RefundOutcome {
            success: true,
            message,
            order_id,
            refund_amount,
            full_refund,
            cancellation: full_refund.then_some(CancellationKind::System),
            items_restored,
        })
    }
}
