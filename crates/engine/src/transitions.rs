//! Pure transition validators for the two order state machines.
//!
//! Payment and fulfillment are independent directed graphs. Each is encoded
//! as a total `match` over enum variants, so an invalid pair is rejected by
//! exhaustive pattern matching rather than a runtime table lookup miss.
//!
//! These functions have no side effects. Every status-changing service
//! operation calls into this module before any write occurs.

use orderline_core::{FulfillmentStatus, PaymentStatus};
use thiserror::Error;

/// A requested status change rejected by its state graph.
///
/// Carries the machine, the stored state, and the requested state so the
/// caller can produce a precise user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The payment graph has no edge from `from` to `to`.
    #[error("invalid payment status transition: {from} -> {to}")]
    Payment {
        /// Stored payment status.
        from: PaymentStatus,
        /// Requested payment status.
        to: PaymentStatus,
    },

    /// The fulfillment graph has no edge from `from` to `to`.
    #[error("invalid fulfillment status transition: {from} -> {to}")]
    Fulfillment {
        /// Stored fulfillment status.
        from: FulfillmentStatus,
        /// Requested fulfillment status.
        to: FulfillmentStatus,
    },
}

/// Check whether the payment graph permits `from -> to`.
#[must_use]
pub const fn is_valid_payment_transition(from: PaymentStatus, to: PaymentStatus) -> bool {
    matches!(
        (from, to),
        (
            PaymentStatus::Pending,
            PaymentStatus::Paid | PaymentStatus::Failed | PaymentStatus::Refunded
        ) | (PaymentStatus::Paid, PaymentStatus::Refunded)
            | (PaymentStatus::Failed, PaymentStatus::Pending)
    )
}

/// Check whether the fulfillment graph permits `from -> to`.
#[must_use]
pub const fn is_valid_fulfillment_transition(
    from: FulfillmentStatus,
    to: FulfillmentStatus,
) -> bool {
    matches!(
        (from, to),
        (
            FulfillmentStatus::Processing,
            FulfillmentStatus::Shipped | FulfillmentStatus::Cancelled
        ) | (
            FulfillmentStatus::Shipped,
            FulfillmentStatus::Delivered | FulfillmentStatus::Cancelled
        )
    )
}

/// Validate a payment status transition.
///
/// # Errors
///
/// Returns [`TransitionError::Payment`] if the payment graph has no edge
/// from `from` to `to`.
pub const fn validate_payment_transition(
    from: PaymentStatus,
    to: PaymentStatus,
) -> Result<(), TransitionError> {
    if is_valid_payment_transition(from, to) {
        Ok(())
    } else {
        Err(TransitionError::Payment { from, to })
    }
}

/// Validate a fulfillment status transition.
///
/// # Errors
///
/// Returns [`TransitionError::Fulfillment`] if the fulfillment graph has no
/// edge from `from` to `to`.
pub const fn validate_fulfillment_transition(
    from: FulfillmentStatus,
    to: FulfillmentStatus,
) -> Result<(), TransitionError> {
    if is_valid_fulfillment_transition(from, to) {
        Ok(())
    } else {
        Err(TransitionError::Fulfillment { from, to })
    }
}

/// Validate a payment and/or fulfillment change as one unit.
///
/// Both machines are checked against their own graphs before either write is
/// applied; if either check fails, the caller must apply neither side effect.
///
/// # Errors
///
/// Returns the first failing [`TransitionError`], payment checked first.
pub fn validate_pair(
    payment: Option<(PaymentStatus, PaymentStatus)>,
    fulfillment: Option<(FulfillmentStatus, FulfillmentStatus)>,
) -> Result<(), TransitionError> {
    if let Some((from, to)) = payment {
        validate_payment_transition(from, to)?;
    }
    if let Some((from, to)) = fulfillment {
        validate_fulfillment_transition(from, to)?;
    }
    Ok(())
}

/// All payment states reachable in one step from `from`.
#[must_use]
pub fn payment_next_states(from: PaymentStatus) -> Vec<PaymentStatus> {
    match from {
        PaymentStatus::Pending => vec![
            PaymentStatus::Paid,
            PaymentStatus::Failed,
            PaymentStatus::Refunded,
        ],
        PaymentStatus::Paid => vec![PaymentStatus::Refunded],
        PaymentStatus::Failed => vec![PaymentStatus::Pending],
        // Terminal
        PaymentStatus::Refunded => vec![],
    }
}

/// All fulfillment states reachable in one step from `from`.
#[must_use]
pub fn fulfillment_next_states(from: FulfillmentStatus) -> Vec<FulfillmentStatus> {
    match from {
        FulfillmentStatus::Processing => {
            vec![FulfillmentStatus::Shipped, FulfillmentStatus::Cancelled]
        }
        FulfillmentStatus::Shipped => {
            vec![FulfillmentStatus::Delivered, FulfillmentStatus::Cancelled]
        }
        // Terminal
        FulfillmentStatus::Delivered | FulfillmentStatus::Cancelled => vec![],
    }
}
