//! Orderline Engine - Order lifecycle and fulfillment engine.
//!
//! This crate owns the rules governing how an order's payment and
//! fulfillment status may change, how cancellation and refund interact with
//! inventory, how tracking-number assignment triggers state transitions, and
//! how batched operations over many orders report partial success.
//!
//! # Architecture
//!
//! The engine is invoked as in-process operations by a caller that has
//! already authenticated the actor and resolved a store ID. It has no wire
//! protocol of its own.
//!
//! - [`transitions`] - Pure validators for the two order state machines
//! - [`models`] - Order/line-item models, operation inputs, and outcomes
//! - [`store`] - Persistence contract plus `PostgreSQL` and in-memory stores
//! - [`services`] - The public operation surface ([`services::OrderService`])
//! - [`auth`] - Caller identity contract
//! - [`config`] - Environment-based configuration
//! - [`error`] - Public error taxonomy
//!
//! Every status-changing operation consults the transition validator before
//! any write occurs, with two documented exceptions: the forced cancellation
//! performed by a full refund, and the bulk status force-set. Both are
//! called out where they happen.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
pub mod transitions;

pub use error::OrderActionError;
pub use services::OrderService;
