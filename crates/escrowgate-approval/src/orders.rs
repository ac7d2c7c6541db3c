//! Order store — the approval flow's view of escrowed trades.
//!
//! Orders are created by the marketplace; the approval flow only reads
//! their fee terms and flips their escrow status inside the atomic unit.

use std::collections::HashMap;

use escrowgate_types::{EscrowError, EscrowStatus, Order, OrderId, Result};

/// Holds the orders the approval flow may touch.
pub struct OrderStore {
    orders: HashMap<OrderId, Order>,
}

impl OrderStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            orders: HashMap::new(),
        }
    }

    /// Register an order (idempotent on re-registration of the same ID:
    /// the newer record wins).
    pub fn insert(&mut self, order: Order) -> OrderId {
        let id = order.id;
        self.orders.insert(id, order);
        id
    }

    /// Look up an order.
    ///
    /// # Errors
    /// Returns `OrderNotFound` if absent.
    pub fn get(&self, id: OrderId) -> Result<&Order> {
        self.orders.get(&id).ok_or(EscrowError::OrderNotFound(id))
    }

    /// Flip an order's escrow status, enforcing the HELD → RELEASED /
    /// REFUNDED transition rule.
    ///
    /// # Errors
    /// - `OrderNotFound` if absent
    /// - `InvalidEscrowState` if the transition is not allowed
    pub fn set_escrow_status(&mut self, id: OrderId, target: EscrowStatus) -> Result<()> {
        let order = self
            .orders
            .get_mut(&id)
            .ok_or(EscrowError::OrderNotFound(id))?;
        if !order.escrow_status.can_transition_to(target) {
            return Err(EscrowError::InvalidEscrowState {
                current: order.escrow_status,
                target,
            });
        }
        order.escrow_status = target;
        Ok(())
    }

    /// Number of registered orders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

impl Default for OrderStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use escrowgate_types::{AccountId, FeePayer, SettlementChannel};
    use rust_decimal::Decimal;

    fn make_order() -> Order {
        Order::new(
            AccountId::new(),
            AccountId::new(),
            Decimal::new(10000, 2),
            Decimal::new(500, 2),
            FeePayer::Buyer,
            SettlementChannel::Online,
            None,
            None,
        )
    }

    #[test]
    fn insert_and_get() {
        let mut store = OrderStore::new();
        let id = store.insert(make_order());
        assert_eq!(store.get(id).unwrap().id, id);
    }

    #[test]
    fn missing_order_errors() {
        let store = OrderStore::new();
        assert!(matches!(
            store.get(OrderId::new()).unwrap_err(),
            EscrowError::OrderNotFound(_)
        ));
    }

    #[test]
    fn escrow_release_then_refund_blocked() {
        let mut store = OrderStore::new();
        let id = store.insert(make_order());
        store.set_escrow_status(id, EscrowStatus::Released).unwrap();

        let err = store
            .set_escrow_status(id, EscrowStatus::Refunded)
            .unwrap_err();
        assert!(matches!(err, EscrowError::InvalidEscrowState { .. }));
        assert_eq!(store.get(id).unwrap().escrow_status, EscrowStatus::Released);
    }
}
