//! Tracking assignment scenarios: promotion to shipped, re-assignment,
//! and clearing.

use orderline_core::{FulfillmentStatus, PaymentStatus};
use orderline_engine::OrderActionError;
use orderline_engine::models::TrackingUpdate;
use orderline_integration_tests::TestHarness;

#[tokio::test]
async fn test_first_tracking_number_promotes_paid_order() {
    let h = TestHarness::new();
    let order_id = h.seed_order(PaymentStatus::Paid, FulfillmentStatus::Processing);

    let outcome = h
        .service
        .add_tracking(order_id, h.store_id, "1Z999AA10123456784", Some("UPS".to_string()))
        .await
        .expect("tracking accepted");

    assert_eq!(outcome.order.fulfillment_status, FulfillmentStatus::Shipped);
    assert!(outcome.order.shipped_at.is_some());
    assert_eq!(
        outcome.order.tracking_number.as_deref(),
        Some("1Z999AA10123456784")
    );
    assert_eq!(outcome.order.shipping_provider.as_deref(), Some("UPS"));
}

#[tokio::test]
async fn test_reassigning_tracking_does_not_restamp() {
    let h = TestHarness::new();
    let order_id = h.seed_order(PaymentStatus::Paid, FulfillmentStatus::Processing);

    let first = h
        .service
        .add_tracking(order_id, h.store_id, "TRACK-A", None)
        .await
        .expect("first tracking accepted");
    let shipped_at = first.order.shipped_at;

    // Carrier relabelled the parcel; the shipment instant is unchanged.
    let second = h
        .service
        .add_tracking(order_id, h.store_id, "TRACK-B", None)
        .await
        .expect("second tracking accepted");

    assert_eq!(second.order.tracking_number.as_deref(), Some("TRACK-B"));
    assert_eq!(second.order.shipped_at, shipped_at);
    assert_eq!(second.order.fulfillment_status, FulfillmentStatus::Shipped);
}

#[tokio::test]
async fn test_tracking_requires_payment() {
    let h = TestHarness::new();
    let order_id = h.seed_order(PaymentStatus::Pending, FulfillmentStatus::Processing);

    let result = h
        .service
        .add_tracking(order_id, h.store_id, "TRACK-1", None)
        .await;
    assert!(matches!(result, Err(OrderActionError::InvalidState(_))));

    let order = h.order(order_id);
    assert!(order.tracking_number.is_none());
    assert_eq!(order.fulfillment_status, FulfillmentStatus::Processing);
}

#[tokio::test]
async fn test_provider_only_update_leaves_state_alone() {
    let h = TestHarness::new();
    let order_id = h.seed_order(PaymentStatus::Paid, FulfillmentStatus::Processing);

    let outcome = h
        .service
        .set_tracking(
            order_id,
            h.store_id,
            TrackingUpdate {
                tracking_number: None,
                shipping_provider: Some("DHL".to_string()),
            },
        )
        .await
        .expect("provider accepted");

    assert_eq!(outcome.order.fulfillment_status, FulfillmentStatus::Processing);
    assert_eq!(outcome.order.shipping_provider.as_deref(), Some("DHL"));
}

#[tokio::test]
async fn test_clear_then_reassign_promotes_only_once() {
    let h = TestHarness::new();
    let order_id = h.seed_order(PaymentStatus::Paid, FulfillmentStatus::Processing);

    h.service
        .add_tracking(order_id, h.store_id, "TRACK-A", None)
        .await
        .expect("tracking accepted");
    let shipped_at = h.order(order_id).shipped_at;

    h.service
        .clear_tracking(order_id, h.store_id)
        .await
        .expect("clear accepted");
    let cleared = h.order(order_id);
    assert!(cleared.tracking_number.is_none());
    // Clearing tracking does not un-ship the order.
    assert_eq!(cleared.fulfillment_status, FulfillmentStatus::Shipped);
    assert_eq!(cleared.shipped_at, shipped_at);

    // Re-assigning on an already-shipped order changes only the tracking.
    let outcome = h
        .service
        .add_tracking(order_id, h.store_id, "TRACK-B", None)
        .await
        .expect("tracking accepted");
    assert_eq!(outcome.order.shipped_at, shipped_at);
}
