//! Domain models for the order engine.

pub mod operations;
pub mod order;

pub use operations::{
    BulkItemError, BulkItemOutcome, BulkReport, BulkSummary, CancelOutcome, CancelRequest,
    CancellationKind, ChangedField, RefundOutcome, RefundRequest, StatusUpdate,
    StatusUpdateOutcome, TrackingAssignment, TrackingUpdate,
};
pub use order::{Order, OrderItem};
