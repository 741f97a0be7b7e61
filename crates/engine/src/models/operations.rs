//! Operation inputs and structured outcomes for the order engine.

use orderline_core::{FulfillmentStatus, OrderId, PaymentStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Inputs
// =============================================================================

/// Requested status change for a single order.
///
/// At least one of the two target fields must be supplied. The `expected_*`
/// fields are an optional optimistic-concurrency guard: when present, the
/// write only applies if the stored status still matches, and a mismatch
/// fails with [`crate::OrderActionError::Conflict`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusUpdate {
    /// Target payment status, if changing.
    pub payment_status: Option<PaymentStatus>,
    /// Target fulfillment status, if changing.
    pub fulfillment_status: Option<FulfillmentStatus>,
    /// Payment status the caller last observed.
    pub expected_payment_status: Option<PaymentStatus>,
    /// Fulfillment status the caller last observed.
    pub expected_fulfillment_status: Option<FulfillmentStatus>,
}

impl StatusUpdate {
    /// Whether the update requests no change at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.payment_status.is_none() && self.fulfillment_status.is_none()
    }
}

/// Tracking fields to set on an order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackingUpdate {
    /// Carrier tracking number.
    pub tracking_number: Option<String>,
    /// Carrier name.
    pub shipping_provider: Option<String>,
}

/// Parameters for cancelling an order.
#[derive(Debug, Clone, Deserialize)]
pub struct CancelRequest {
    /// Merchant-supplied cancellation reason.
    pub reason: Option<String>,
    /// Whether to return the order's line-item quantities to stock.
    pub restore_inventory: bool,
}

impl Default for CancelRequest {
    fn default() -> Self {
        Self {
            reason: None,
            restore_inventory: true,
        }
    }
}

/// Parameters for refunding an order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefundRequest {
    /// Amount to refund. Defaults to the order total (a full refund).
    pub refund_amount: Option<Decimal>,
    /// Merchant-supplied refund reason.
    pub reason: Option<String>,
    /// Whether to return stock. Only honored for full refunds; a partial
    /// refund never restores inventory since the customer keeps the goods.
    pub restore_inventory: bool,
}

/// One entry in a bulk tracking assignment.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackingAssignment {
    /// Order to update.
    pub order_id: OrderId,
    /// Carrier tracking number to attach.
    pub tracking_number: String,
    /// Carrier name, if known.
    pub shipping_provider: Option<String>,
}

// =============================================================================
// Outcomes
// =============================================================================

/// A field touched by a status or tracking update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangedField {
    /// `payment_status` changed.
    PaymentStatus,
    /// `fulfillment_status` changed.
    FulfillmentStatus,
    /// `tracking_number` changed.
    TrackingNumber,
    /// `shipping_provider` changed.
    ShippingProvider,
    /// `shipped_at` was stamped.
    ShippedAt,
    /// `delivered_at` was stamped.
    DeliveredAt,
}

/// Result of a single-order status or tracking update.
#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdateOutcome {
    /// Human-readable summary of what happened.
    pub message: String,
    /// The order after the write.
    pub order: super::Order,
    /// Fields actually changed by this call.
    pub changed: Vec<ChangedField>,
}

/// How a fulfillment cancellation came about.
///
/// A `System` cancellation is an engine-internal side effect (full refund)
/// that deliberately does not route through the transition validator; keeping
/// the two distinguishable lets audits tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancellationKind {
    /// The merchant explicitly asked to cancel.
    Requested,
    /// The engine cancelled as a side effect of another operation.
    System,
}

/// Result of a cancellation.
#[derive(Debug, Clone, Serialize)]
pub struct CancelOutcome {
    /// Whether the cancellation was applied.
    pub success: bool,
    /// Human-readable summary, including the restored-item count.
    pub message: String,
    /// The cancelled order.
    pub order_id: OrderId,
    /// How the cancellation came about.
    pub kind: CancellationKind,
    /// Number of line items whose stock was restored.
    pub items_restored: usize,
    /// Merchant-supplied reason, echoed back.
    pub reason: Option<String>,
}

/// Result of a refund.
#[derive(Debug, Clone, Serialize)]
pub struct RefundOutcome {
    /// Whether the refund was applied.
    pub success: bool,
    /// Human-readable summary.
    pub message: String,
    /// The refunded order.
    pub order_id: OrderId,
    /// Amount actually refunded.
    pub refund_amount: Decimal,
    /// Whether the refund covered the full order total.
    pub full_refund: bool,
    /// Set when the refund also cancelled fulfillment (full refunds only).
    pub cancellation: Option<CancellationKind>,
    /// Number of line items whose stock was restored.
    pub items_restored: usize,
}

// =============================================================================
// Bulk reports
// =============================================================================

/// Aggregate counts for a bulk operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BulkSummary {
    /// Items requested.
    pub total: usize,
    /// Items that succeeded.
    pub successful: usize,
    /// Items that failed.
    pub failed: usize,
}

/// Per-item outcome inside a bulk report.
#[derive(Debug, Clone, Serialize)]
pub struct BulkItemOutcome {
    /// The order this entry describes.
    pub order_id: OrderId,
    /// Whether this item succeeded.
    pub success: bool,
    /// Per-item summary or failure reason.
    pub message: String,
}

/// Per-item failure inside a bulk report.
#[derive(Debug, Clone, Serialize)]
pub struct BulkItemError {
    /// The order that failed.
    pub order_id: OrderId,
    /// Why it failed. Safe to display.
    pub error: String,
}

/// Result of a bulk operation.
///
/// `success` reflects that the batch itself ran to completion; callers must
/// inspect `summary.failed` / `errors` to learn about individual items. One
/// bad order never blocks the rest.
#[derive(Debug, Clone, Serialize)]
pub struct BulkReport {
    /// Whether the batch ran to completion.
    pub success: bool,
    /// Human-readable summary with counts.
    pub message: String,
    /// Per-item outcomes, in input order.
    pub results: Vec<BulkItemOutcome>,
    /// Failures only, with reasons.
    pub errors: Vec<BulkItemError>,
    /// Aggregate counts.
    pub summary: BulkSummary,
}

impl BulkReport {
    /// Assemble a report from per-item outcomes.
    #[must_use]
    pub fn from_results(operation: &str, results: Vec<BulkItemOutcome>) -> Self {
        let total = results.len();
        let successful = results.iter().filter(|r| r.success).count();
        let failed = total - successful;
        let errors = results
            .iter()
            .filter(|r| !r.success)
            .map(|r| BulkItemError {
                order_id: r.order_id,
                error: r.message.clone(),
            })
            .collect();

        Self {
            success: true,
            message: format!("{operation}: {successful} of {total} orders processed ({failed} failed)"),
            results,
            errors,
            summary: BulkSummary {
                total,
                successful,
                failed,
            },
        }
    }
}
