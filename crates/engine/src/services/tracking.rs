//! Carrier tracking management.

use chrono::Utc;
use orderline_core::{FulfillmentStatus, OrderId, PaymentStatus, StoreId};
use tracing::{info, instrument};

use crate::auth::IdentityProvider;
use crate::error::OrderActionError;
use crate::models::{ChangedField, StatusUpdateOutcome, TrackingUpdate};
use crate::store::{ExpectedStatus, OrderPatch, OrderStore};
use crate::transitions::validate_fulfillment_transition;

use super::OrderService;

impl<S: OrderStore, P: IdentityProvider> OrderService<S, P> {
    /// Set tracking fields on an order.
    ///
    /// Tracking can only be attached to paid, non-cancelled orders. When a
    /// non-empty tracking number is set for the first time on an order still
    /// in processing, the order is promoted to shipped and `shipped_at` is
    /// stamped; the promotion still goes through the fulfillment state
    /// graph. Attaching tracking to an already-shipped order changes nothing
    /// but the tracking fields.
    ///
    /// # Errors
    ///
    /// - [`OrderActionError::Unauthorized`] without an authenticated actor
    /// - [`OrderActionError::InvalidArgument`] when neither field is given
    /// - [`OrderActionError::NotFound`] for absent or foreign orders
    /// - [`OrderActionError::InvalidState`] for unpaid or cancelled orders
    #[instrument(skip(self, update), fields(order_id = %order_id, store_id = %store_id))]
    pub async fn set_tracking(
        &self,
        order_id: OrderId,
        store_id: StoreId,
        update: TrackingUpdate,
    ) -> Result<StatusUpdateOutcome, OrderActionError> {
        self.authorize()?;

        if update.tracking_number.is_none() && update.shipping_provider.is_none() {
            return Err(OrderActionError::InvalidArgument(
                "at least one of tracking_number or shipping_provider must be supplied".to_string(),
            ));
        }

        let order = self.load_order(order_id, store_id).await?;

        if order.payment_status != PaymentStatus::Paid {
            return Err(OrderActionError::InvalidState(format!(
                "tracking can only be set on paid orders (payment status is {})",
                order.payment_status
            )));
        }
        if order.fulfillment_status == FulfillmentStatus::Cancelled {
            return Err(OrderActionError::InvalidState(
                "cannot set tracking on a cancelled order".to_string(),
            ));
        }

        let now = Utc::now();
        let mut patch = OrderPatch::at(now);
        let mut changed = Vec::new();

        if let Some(number) = &update.tracking_number {
            patch.tracking_number = Some(number.clone());
            changed.push(ChangedField::TrackingNumber);
        }
        if let Some(provider) = &update.shipping_provider {
            patch.shipping_provider = Some(provider.clone());
            changed.push(ChangedField::ShippingProvider);
        }

        // First non-empty tracking number on a processing order promotes it
        // to shipped.
        let promote = order.fulfillment_status == FulfillmentStatus::Processing
            && order.tracking_number.is_none()
            && update
                .tracking_number
                .as_ref()
                .is_some_and(|n| !n.trim().is_empty());
        if promote {
            validate_fulfillment_transition(order.fulfillment_status, FulfillmentStatus::Shipped)?;
            patch.fulfillment_status = Some(FulfillmentStatus::Shipped);
            patch.shipped_at = Some(now);
            changed.push(ChangedField::FulfillmentStatus);
            changed.push(ChangedField::ShippedAt);
        }

        let order = self
            .store
            .apply_patch(order_id, store_id, &patch, &ExpectedStatus::default())
            .await?;

        info!(promoted = promote, "tracking updated");

        let message = if promote {
            "tracking set; order marked as shipped".to_string()
        } else {
            "tracking updated".to_string()
        };

        Ok(StatusUpdateOutcome {
            message,
            order,
            changed,
        })
    }

    /// Attach a tracking number, rejecting blank input.
    ///
    /// Convenience wrapper over [`Self::set_tracking`].
    ///
    /// # Errors
    ///
    /// [`OrderActionError::InvalidArgument`] for an empty or whitespace-only
    /// tracking number, otherwise as [`Self::set_tracking`].
    pub async fn add_tracking(
        &self,
        order_id: OrderId,
        store_id: StoreId,
        tracking_number: &str,
        shipping_provider: Option<String>,
    ) -> Result<StatusUpdateOutcome, OrderActionError> {
        let trimmed = tracking_number.trim();
        if trimmed.is_empty() {
            return Err(OrderActionError::InvalidArgument(
                "tracking number must not be empty".to_string(),
            ));
        }

        self.set_tracking(
            order_id,
            store_id,
            TrackingUpdate {
                tracking_number: Some(trimmed.to_string()),
                shipping_provider,
            },
        )
        .await
    }

    /// Null both tracking fields.
    ///
    /// Refused for delivered orders, which keep their proof of shipment.
    /// The fulfillment status is not reverted.
    ///
    /// # Errors
    ///
    /// - [`OrderActionError::Unauthorized`] without an authenticated actor
    /// - [`OrderActionError::NotFound`] for absent or foreign orders
    /// - [`OrderActionError::InvalidState`] for delivered orders
    #[instrument(skip(self), fields(order_id = %order_id, store_id = %store_id))]
    pub async fn clear_tracking(
        &self,
        order_id: OrderId,
        store_id: StoreId,
    ) -> Result<StatusUpdateOutcome, OrderActionError> {
        self.authorize()?;

        let order = self.load_order(order_id, store_id).await?;

        if order.fulfillment_status == FulfillmentStatus::Delivered {
            return Err(OrderActionError::InvalidState(
                "cannot clear tracking on a delivered order".to_string(),
            ));
        }

        let mut changed = Vec::new();
        if order.tracking_number.is_some() {
            changed.push(ChangedField::TrackingNumber);
        }
        if order.shipping_provider.is_some() {
            changed.push(ChangedField::ShippingProvider);
        }

        let patch = OrderPatch {
            clear_tracking: true,
            ..OrderPatch::at(Utc::now())
        };
        let order = self
            .store
            .apply_patch(order_id, store_id, &patch, &ExpectedStatus::default())
            .await?;

        info!("tracking cleared");

        Ok(StatusUpdateOutcome {
            message: "tracking cleared".to_string(),
            order,
            changed,
        })
    }
}
