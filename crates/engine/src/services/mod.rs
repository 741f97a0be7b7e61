//! The public operation surface of the order engine.
//!
//! [`OrderService`] is one struct whose operations are split across files by
//! concern:
//!
//! - [`status`] - single-order status updates (the mutation gateway)
//! - [`tracking`] - tracking-number management
//! - [`cancellation`] - cancellation and refunds
//! - [`bulk`] - batched operations with per-item failure isolation
//!
//! Every operation takes an explicit `StoreId` for tenant isolation, checks
//! the caller identity first, and returns a structured outcome or a typed
//! [`OrderActionError`]. Raw store errors never cross this boundary.

pub mod bulk;
pub mod cancellation;
pub mod status;
pub mod tracking;

use orderline_core::{OrderId, StoreId};

use crate::auth::{Identity, IdentityProvider};
use crate::error::OrderActionError;
use crate::models::Order;
use crate::store::OrderStore;

/// Order lifecycle service.
///
/// Generic over the storage backend and the identity source so the same
/// operations run against `PostgreSQL` in production and the in-memory
/// store in tests.
pub struct OrderService<S, P> {
    store: S,
    identity: P,
}

impl<S: OrderStore, P: IdentityProvider> OrderService<S, P> {
    /// Create a service over a store and an identity source.
    pub const fn new(store: S, identity: P) -> Self {
        Self { store, identity }
    }

    /// Access the underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Resolve the current actor or refuse the operation.
    fn authorize(&self) -> Result<Identity, OrderActionError> {
        self.identity
            .current_actor()
            .ok_or(OrderActionError::Unauthorized)
    }

    /// Load one order, enforcing store ownership.
    ///
    /// An absent order and a foreign order are deliberately the same error.
    async fn load_order(
        &self,
        order_id: OrderId,
        store_id: StoreId,
    ) -> Result<Order, OrderActionError> {
        self.store
            .order(order_id, store_id)
            .await?
            .ok_or(OrderActionError::NotFound)
    }
}
