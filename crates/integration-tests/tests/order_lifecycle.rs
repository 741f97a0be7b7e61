//! End-to-end status lifecycle scenarios.
//!
//! Walks orders through the payment and fulfillment state machines the way
//! a merchant dashboard would, checking derived timestamps and the
//! optimistic-concurrency guard along the way.

use orderline_core::{FulfillmentStatus, PaymentStatus};
use orderline_engine::OrderActionError;
use orderline_engine::models::StatusUpdate;
use orderline_integration_tests::TestHarness;

// ============================================================================
// Happy Path
// ============================================================================

#[tokio::test]
async fn test_full_lifecycle_pending_to_delivered() {
    let h = TestHarness::new();
    let order_id = h.seed_order(PaymentStatus::Pending, FulfillmentStatus::Processing);

    // Payment clears.
    let outcome = h
        .service
        .update_status(
            order_id,
            h.store_id,
            StatusUpdate {
                payment_status: Some(PaymentStatus::Paid),
                ..StatusUpdate::default()
            },
        )
        .await
        .expect("pending -> paid");
    assert_eq!(outcome.order.payment_status, PaymentStatus::Paid);
    assert!(outcome.order.shipped_at.is_none());

    // Warehouse ships.
    let outcome = h
        .service
        .update_status(
            order_id,
            h.store_id,
            StatusUpdate {
                fulfillment_status: Some(FulfillmentStatus::Shipped),
                ..StatusUpdate::default()
            },
        )
        .await
        .expect("processing -> shipped");
    let shipped_at = outcome.order.shipped_at;
    assert!(shipped_at.is_some());
    assert!(outcome.order.delivered_at.is_none());

    // Carrier confirms delivery.
    let outcome = h
        .service
        .update_status(
            order_id,
            h.store_id,
            StatusUpdate {
                fulfillment_status: Some(FulfillmentStatus::Delivered),
                ..StatusUpdate::default()
            },
        )
        .await
        .expect("shipped -> delivered");
    assert_eq!(outcome.order.fulfillment_status, FulfillmentStatus::Delivered);
    assert!(outcome.order.delivered_at.is_some());
    // The original shipment stamp is preserved, not re-stamped.
    assert_eq!(outcome.order.shipped_at, shipped_at);
}

#[tokio::test]
async fn test_failed_payment_can_retry() {
    let h = TestHarness::new();
    let order_id = h.seed_order(PaymentStatus::Pending, FulfillmentStatus::Processing);

    for (to, label) in [
        (PaymentStatus::Failed, "pending -> failed"),
        (PaymentStatus::Pending, "failed -> pending (retry)"),
        (PaymentStatus::Paid, "pending -> paid"),
    ] {
        h.service
            .update_status(
                order_id,
                h.store_id,
                StatusUpdate {
                    payment_status: Some(to),
                    ..StatusUpdate::default()
                },
            )
            .await
            .expect(label);
    }

    assert_eq!(h.order(order_id).payment_status, PaymentStatus::Paid);
}

// ============================================================================
// Terminal States & Invalid Edges
// ============================================================================

#[tokio::test]
async fn test_refunded_is_terminal() {
    let h = TestHarness::new();
    let order_id = h.seed_order(PaymentStatus::Refunded, FulfillmentStatus::Cancelled);

    for to in [
        PaymentStatus::Pending,
        PaymentStatus::Paid,
        PaymentStatus::Failed,
    ] {
        let result = h
            .service
            .update_status(
                order_id,
                h.store_id,
                StatusUpdate {
                    payment_status: Some(to),
                    ..StatusUpdate::default()
                },
            )
            .await;
        assert!(
            matches!(result, Err(OrderActionError::InvalidTransition(_))),
            "REFUNDED -> {to} should be rejected"
        );
    }
}

#[tokio::test]
async fn test_delivered_order_cannot_regress() {
    let h = TestHarness::new();
    let order_id = h.seed_order(PaymentStatus::Paid, FulfillmentStatus::Delivered);

    for to in [
        FulfillmentStatus::Processing,
        FulfillmentStatus::Shipped,
        FulfillmentStatus::Cancelled,
    ] {
        let result = h
            .service
            .update_status(
                order_id,
                h.store_id,
                StatusUpdate {
                    fulfillment_status: Some(to),
                    ..StatusUpdate::default()
                },
            )
            .await;
        assert!(
            matches!(result, Err(OrderActionError::InvalidTransition(_))),
            "DELIVERED -> {to} should be rejected"
        );
    }
}

#[tokio::test]
async fn test_tenant_isolation() {
    let h = TestHarness::new();
    let other = TestHarness::new();
    let order_id = h.seed_order(PaymentStatus::Pending, FulfillmentStatus::Processing);

    // The same order id under a different store id does not exist.
    let result = h
        .service
        .update_status(
            order_id,
            other.store_id,
            StatusUpdate {
                payment_status: Some(PaymentStatus::Paid),
                ..StatusUpdate::default()
            },
        )
        .await;
    assert!(matches!(result, Err(OrderActionError::NotFound)));
    assert_eq!(h.order(order_id).payment_status, PaymentStatus::Pending);
}

// ============================================================================
// Optimistic Concurrency
// ============================================================================

#[tokio::test]
async fn test_stale_expectation_conflicts_without_write() {
    let h = TestHarness::new();
    let order_id = h.seed_order(PaymentStatus::Paid, FulfillmentStatus::Processing);

    // A caller acting on a stale read of PENDING loses.
    let result = h
        .service
        .update_status(
            order_id,
            h.store_id,
            StatusUpdate {
                payment_status: Some(PaymentStatus::Failed),
                expected_payment_status: Some(PaymentStatus::Pending),
                ..StatusUpdate::default()
            },
        )
        .await;
    assert!(matches!(result, Err(OrderActionError::Conflict(_))));
    assert_eq!(h.order(order_id).payment_status, PaymentStatus::Paid);
}

#[tokio::test]
async fn test_matching_expectation_writes() {
    let h = TestHarness::new();
    let order_id = h.seed_order(PaymentStatus::Paid, FulfillmentStatus::Processing);

    let outcome = h
        .service
        .update_status(
            order_id,
            h.store_id,
            StatusUpdate {
                fulfillment_status: Some(FulfillmentStatus::Shipped),
                expected_payment_status: Some(PaymentStatus::Paid),
                expected_fulfillment_status: Some(FulfillmentStatus::Processing),
                ..StatusUpdate::default()
            },
        )
        .await
        .expect("expectations hold");
    assert_eq!(outcome.order.fulfillment_status, FulfillmentStatus::Shipped);
}
