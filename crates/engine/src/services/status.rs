//! Single-order status updates: the order mutation gateway.

use chrono::Utc;
use orderline_core::{FulfillmentStatus, OrderId, StoreId};
use tracing::{info, instrument};

use crate::auth::IdentityProvider;
use crate::error::OrderActionError;
use crate::models::{ChangedField, StatusUpdate, StatusUpdateOutcome};
use crate::store::{ExpectedStatus, OrderPatch, OrderStore};
use crate::transitions::validate_pair;

use super::OrderService;

impl<S: OrderStore, P: IdentityProvider> OrderService<S, P> {
    /// Apply a validated status change to one order.
    ///
    /// Each supplied field is validated against its state graph using the
    /// order's stored state; if either validation fails, neither change is
    /// applied. Derived stamps: a shipped transition always re-stamps
    /// `shipped_at`, and a delivered transition stamps `delivered_at` and
    /// back-fills `shipped_at` when the order never went through an explicit
    /// shipped step.
    ///
    /// When the update carries `expected_*` fields, the write only applies
    /// if the stored status still matches; a concurrent change surfaces as
    /// [`OrderActionError::Conflict`].
    ///
    /// # Errors
    ///
    /// - [`OrderActionError::Unauthorized`] without an authenticated actor
    /// - [`OrderActionError::InvalidArgument`] when no target field is given
    /// - [`OrderActionError::NotFound`] for absent or foreign orders
    /// - [`OrderActionError::InvalidTransition`] for non-edge transitions
    /// - [`OrderActionError::Conflict`] when an expectation no longer holds
    #[instrument(skip(self, update), fields(order_id = %order_id, store_id = %store_id))]
    pub async fn update_status(
        &self,
        order_id: OrderId,
        store_id: StoreId,
        update: StatusUpdate,
    ) -> Result<StatusUpdateOutcome, OrderActionError> {
        self.authorize()?;

        if update.is_empty() {
            return Err(OrderActionError::InvalidArgument(
                "at least one of payment_status or fulfillment_status must be supplied".to_string(),
            ));
        }

        let order = self.load_order(order_id, store_id).await?;

        validate_pair(
            update.payment_status.map(|to| (order.payment_status, to)),
            update
                .fulfillment_status
                .map(|to| (order.fulfillment_status, to)),
        )?;

        let now = Utc::now();
        let mut patch = OrderPatch::at(now);
        let mut changed = Vec::new();
        let mut parts = Vec::new();

        if let Some(to) = update.payment_status {
            patch.payment_status = Some(to);
            changed.push(ChangedField::PaymentStatus);
            parts.push(format!("payment {to}"));
        }
        if let Some(to) = update.fulfillment_status {
            patch.fulfillment_status = Some(to);
            changed.push(ChangedField::FulfillmentStatus);
            parts.push(format!("fulfillment {to}"));
            match to {
                FulfillmentStatus::Shipped => {
                    patch.shipped_at = Some(now);
                    changed.push(ChangedField::ShippedAt);
                }
                FulfillmentStatus::Delivered => {
                    patch.delivered_at = Some(now);
                    changed.push(ChangedField::DeliveredAt);
                    if order.shipped_at.is_none() {
                        // Marked delivered without an explicit shipped step:
                        // treated as having implicitly shipped at this instant.
                        patch.backfill_shipped_at = Some(now);
                        changed.push(ChangedField::ShippedAt);
                    }
                }
                FulfillmentStatus::Processing | FulfillmentStatus::Cancelled => {}
            }
        }

        let expected = ExpectedStatus {
            payment: update.expected_payment_status,
            fulfillment: update.expected_fulfillment_status,
        };
        let order = self
            .store
            .apply_patch(order_id, store_id, &patch, &expected)
            .await?;

        info!(changed = ?changed, "order status updated");

        Ok(StatusUpdateOutcome {
            message: format!("order status updated: {}", parts.join(", ")),
            order,
            changed,
        })
    }
}

#[cfg(test)]
mod tests {
    use orderline_core::{PaymentStatus, StoreId};

    use crate::auth::NoIdentity;
    use crate::services::support;
    use crate::store::MemoryOrderStore;
    use crate::transitions::TransitionError;

    use super::*;

    #[tokio::test]
    async fn test_rejects_unauthenticated_caller() {
        let service = OrderService::new(MemoryOrderStore::new(), NoIdentity);
        let result = service
            .update_status(
                OrderId::generate(),
                StoreId::generate(),
                StatusUpdate {
                    payment_status: Some(PaymentStatus::Paid),
                    ..StatusUpdate::default()
                },
            )
            .await;
        assert!(matches!(result, Err(OrderActionError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_rejects_empty_update() {
        let service = support::service();
        let result = service
            .update_status(
                OrderId::generate(),
                StoreId::generate(),
                StatusUpdate::default(),
            )
            .await;
        assert!(matches!(result, Err(OrderActionError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_wrong_store_is_not_found() {
        let service = support::service();
        let store_id = StoreId::generate();
        let order = support::order(
            store_id,
            PaymentStatus::Pending,
            FulfillmentStatus::Processing,
        );
        let order_id = order.id;
        service.store().insert_order(order);

        let result = service
            .update_status(
                order_id,
                StoreId::generate(),
                StatusUpdate {
                    payment_status: Some(PaymentStatus::Paid),
                    ..StatusUpdate::default()
                },
            )
            .await;
        assert!(matches!(result, Err(OrderActionError::NotFound)));
    }

    #[tokio::test]
    async fn test_processing_cannot_jump_to_delivered() {
        let service = support::service();
        let store_id = StoreId::generate();
        let order = support::order(
            store_id,
            PaymentStatus::Pending,
            FulfillmentStatus::Processing,
        );
        let order_id = order.id;
        service.store().insert_order(order);

        let result = service
            .update_status(
                order_id,
                store_id,
                StatusUpdate {
                    fulfillment_status: Some(FulfillmentStatus::Delivered),
                    ..StatusUpdate::default()
                },
            )
            .await;
        assert!(matches!(
            result,
            Err(OrderActionError::InvalidTransition(
                TransitionError::Fulfillment { .. }
            ))
        ));

        // The stored status is untouched.
        let stored = service.store().snapshot(order_id).expect("order kept");
        assert_eq!(stored.fulfillment_status, FulfillmentStatus::Processing);
        assert!(stored.delivered_at.is_none());
    }

    #[tokio::test]
    async fn test_invalid_half_of_pair_blocks_both_writes() {
        let service = support::service();
        let store_id = StoreId::generate();
        let order = support::order(
            store_id,
            PaymentStatus::Pending,
            FulfillmentStatus::Delivered,
        );
        let order_id = order.id;
        service.store().insert_order(order);

        // Payment half is valid, fulfillment half is not.
        let result = service
            .update_status(
                order_id,
                store_id,
                StatusUpdate {
                    payment_status: Some(PaymentStatus::Paid),
                    fulfillment_status: Some(FulfillmentStatus::Shipped),
                    ..StatusUpdate::default()
                },
            )
            .await;
        assert!(matches!(result, Err(OrderActionError::InvalidTransition(_))));

        let stored = service.store().snapshot(order_id).expect("order kept");
        assert_eq!(stored.payment_status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_shipped_transition_stamps_shipped_at() {
        let service = support::service();
        let store_id = StoreId::generate();
        let order = support::order(store_id, PaymentStatus::Paid, FulfillmentStatus::Processing);
        let order_id = order.id;
        service.store().insert_order(order);

        let outcome = service
            .update_status(
                order_id,
                store_id,
                StatusUpdate {
                    fulfillment_status: Some(FulfillmentStatus::Shipped),
                    ..StatusUpdate::default()
                },
            )
            .await
            .expect("valid transition");

        assert!(outcome.order.shipped_at.is_some());
        assert!(outcome.changed.contains(&ChangedField::FulfillmentStatus));
        assert!(outcome.changed.contains(&ChangedField::ShippedAt));
    }

    #[tokio::test]
    async fn test_delivered_keeps_existing_shipped_at() {
        let service = support::service();
        let store_id = StoreId::generate();
        let order = support::order(store_id, PaymentStatus::Paid, FulfillmentStatus::Shipped);
        let order_id = order.id;
        let shipped_at = order.shipped_at;
        service.store().insert_order(order);

        let outcome = service
            .update_status(
                order_id,
                store_id,
                StatusUpdate {
                    fulfillment_status: Some(FulfillmentStatus::Delivered),
                    ..StatusUpdate::default()
                },
            )
            .await
            .expect("valid transition");

        assert!(outcome.order.delivered_at.is_some());
        assert_eq!(outcome.order.shipped_at, shipped_at);
        assert!(!outcome.changed.contains(&ChangedField::ShippedAt));
    }

    #[tokio::test]
    async fn test_delivered_backfills_missing_shipped_at() {
        let service = support::service();
        let store_id = StoreId::generate();
        let mut order = support::order(store_id, PaymentStatus::Paid, FulfillmentStatus::Shipped);
        // Shipped state without a stamp (e.g. force-set by a bulk update).
        order.shipped_at = None;
        let order_id = order.id;
        service.store().insert_order(order);

        let outcome = service
            .update_status(
                order_id,
                store_id,
                StatusUpdate {
                    fulfillment_status: Some(FulfillmentStatus::Delivered),
                    ..StatusUpdate::default()
                },
            )
            .await
            .expect("valid transition");

        assert!(outcome.order.shipped_at.is_some());
        assert_eq!(outcome.order.shipped_at, outcome.order.delivered_at);
        assert!(outcome.changed.contains(&ChangedField::ShippedAt));
    }

    #[tokio::test]
    async fn test_expected_state_mismatch_is_conflict() {
        let service = support::service();
        let store_id = StoreId::generate();
        let order = support::order(store_id, PaymentStatus::Paid, FulfillmentStatus::Processing);
        let order_id = order.id;
        service.store().insert_order(order);

        let result = service
            .update_status(
                order_id,
                store_id,
                StatusUpdate {
                    payment_status: Some(PaymentStatus::Refunded),
                    expected_payment_status: Some(PaymentStatus::Pending),
                    ..StatusUpdate::default()
                },
            )
            .await;
        assert!(matches!(result, Err(OrderActionError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_both_machines_update_together() {
        let service = support::service();
        let store_id = StoreId::generate();
        let order = support::order(
            store_id,
            PaymentStatus::Pending,
            FulfillmentStatus::Processing,
        );
        let order_id = order.id;
        service.store().insert_order(order);

        let outcome = service
            .update_status(
                order_id,
                store_id,
                StatusUpdate {
                    payment_status: Some(PaymentStatus::Paid),
                    fulfillment_status: Some(FulfillmentStatus::Shipped),
                    ..StatusUpdate::default()
                },
            )
            .await
            .expect("both transitions valid");

        assert_eq!(outcome.order.payment_status, PaymentStatus::Paid);
        assert_eq!(outcome.order.fulfillment_status, FulfillmentStatus::Shipped);
    }
}
