//! Status enums for the order lifecycle.
//!
//! An order carries two independent state machines: [`PaymentStatus`] for
//! money collection and [`FulfillmentStatus`] for physical delivery. The
//! permitted transitions between states live in the engine crate; this
//! module only defines the states themselves and their wire/database
//! representations.

use serde::{Deserialize, Serialize};

/// Payment lifecycle status for an order.
///
/// Stored as text in `PostgreSQL` via [`std::fmt::Display`] / [`std::str::FromStr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Payment has not been captured yet.
    #[default]
    Pending,
    /// Payment captured successfully.
    Paid,
    /// Payment attempt failed; may be retried.
    Failed,
    /// Payment was returned to the customer. Terminal.
    Refunded,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Paid => write!(f, "PAID"),
            Self::Failed => write!(f, "FAILED"),
            Self::Refunded => write!(f, "REFUNDED"),
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PAID" => Ok(Self::Paid),
            "FAILED" => Ok(Self::Failed),
            "REFUNDED" => Ok(Self::Refunded),
            _ => Err(format!("invalid payment status: {s}")),
        }
    }
}

/// Fulfillment lifecycle status for an order.
///
/// Stored as text in `PostgreSQL` via [`std::fmt::Display`] / [`std::str::FromStr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FulfillmentStatus {
    /// Order accepted, not yet handed to a carrier.
    #[default]
    Processing,
    /// Order handed to a carrier.
    Shipped,
    /// Order arrived at the customer. Terminal.
    Delivered,
    /// Order cancelled before delivery. Terminal.
    Cancelled,
}

impl std::fmt::Display for FulfillmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Processing => write!(f, "PROCESSING"),
            Self::Shipped => write!(f, "SHIPPED"),
            Self::Delivered => write!(f, "DELIVERED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl std::str::FromStr for FulfillmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PROCESSING" => Ok(Self::Processing),
            "SHIPPED" => Ok(Self::Shipped),
            "DELIVERED" => Ok(Self::Delivered),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(format!("invalid fulfillment status: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_status_text_round_trip() {
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::Paid,
            PaymentStatus::Failed,
            PaymentStatus::Refunded,
        ] {
            let parsed: PaymentStatus = status.to_string().parse().expect("round trip");
            assert_eq!(status, parsed);
        }
    }

    #[test]
    fn test_fulfillment_status_text_round_trip() {
        for status in [
            FulfillmentStatus::Processing,
            FulfillmentStatus::Shipped,
            FulfillmentStatus::Delivered,
            FulfillmentStatus::Cancelled,
        ] {
            let parsed: FulfillmentStatus = status.to_string().parse().expect("round trip");
            assert_eq!(status, parsed);
        }
    }

    #[test]
    fn test_unknown_status_text_rejected() {
        assert!("AUTHORIZED".parse::<PaymentStatus>().is_err());
        assert!("RETURNED".parse::<FulfillmentStatus>().is_err());
    }

    #[test]
    fn test_serde_screaming_snake_case() {
        let json = serde_json::to_string(&PaymentStatus::Paid).expect("serialize");
        assert_eq!(json, "\"PAID\"");

        let status: FulfillmentStatus = serde_json::from_str("\"SHIPPED\"").expect("deserialize");
        assert_eq!(status, FulfillmentStatus::Shipped);
    }
}
