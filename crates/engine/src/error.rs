//! Unified error handling for the order engine.
//!
//! Every public operation returns either a structured outcome or an
//! [`OrderActionError`]. Messages are safe to display to a merchant
//! directly; raw storage errors are wrapped and never surfaced.

use thiserror::Error;

use crate::store::StoreError;
use crate::transitions::TransitionError;

/// Public error taxonomy for order operations.
#[derive(Debug, Error)]
pub enum OrderActionError {
    /// No authenticated actor for this call.
    #[error("unauthorized: no authenticated actor")]
    Unauthorized,

    /// Missing or contradictory input.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Order absent, or not owned by the given store.
    ///
    /// Deliberately does not distinguish "wrong store" from "nonexistent"
    /// to avoid leaking order existence across tenants.
    #[error("order not found or access denied")]
    NotFound,

    /// A precondition on the order's current state was violated.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The requested status is not reachable from the stored status.
    #[error("{0}")]
    InvalidTransition(#[from] TransitionError),

    /// The order's stored state no longer matches the caller's expectation.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Storage-layer failure. The underlying error is attached as a source
    /// but kept out of the display text.
    #[error("storage operation failed")]
    Store(#[source] StoreError),
}

impl From<StoreError> for OrderActionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound,
            StoreError::Conflict(message) => Self::Conflict(message),
            err => Self::Store(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use orderline_core::FulfillmentStatus;

    use super::*;

    #[test]
    fn test_error_display() {
        let err = OrderActionError::InvalidState("cannot cancel a delivered order".to_string());
        assert_eq!(
            err.to_string(),
            "invalid state: cannot cancel a delivered order"
        );

        let err = OrderActionError::NotFound;
        assert_eq!(err.to_string(), "order not found or access denied");
    }

    #[test]
    fn test_store_error_text_not_exposed() {
        let inner = StoreError::DataCorruption("payment_status column held 'AUTHORIZED'".into());
        let err = OrderActionError::from(inner);
        assert_eq!(err.to_string(), "storage operation failed");
    }

    #[test]
    fn test_store_not_found_maps_to_not_found() {
        let err = OrderActionError::from(StoreError::NotFound);
        assert!(matches!(err, OrderActionError::NotFound));
    }

    #[test]
    fn test_transition_error_converts() {
        let err: OrderActionError = TransitionError::Fulfillment {
            from: FulfillmentStatus::Delivered,
            to: FulfillmentStatus::Shipped,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "invalid fulfillment status transition: DELIVERED -> SHIPPED"
        );
    }
}
