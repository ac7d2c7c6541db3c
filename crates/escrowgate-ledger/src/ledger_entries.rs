//! Merchant fee-split ledger — one entry per completed partner-store
//! trade, ever.
//!
//! The confirm step that writes an entry can in principle be retried, so
//! this store is the idempotency guard: entries are keyed by order, and a
//! second write for the same order returns
//! [`EscrowError::LedgerEntryExists`]. Entry IDs are derived from the
//! order ID, so a retry produces the identical ID rather than a new one.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use escrowgate_types::{AccountId, EscrowError, LedgerEntryId, OrderId, Result};
use rust_decimal::Decimal;

use crate::fee_split::FeeSplit;

/// Derived record of how one completed trade's fee was divided.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    pub order_id: OrderId,
    /// The hub that brokered the trade, if any.
    pub hub_id: Option<AccountId>,
    /// The partner store the trade went through.
    pub merchant_id: AccountId,
    pub fee_amount: Decimal,
    pub platform_cut: Decimal,
    pub merchant_cut: Decimal,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Build the entry for an order from its computed split.
    #[must_use]
    pub fn from_split(
        order_id: OrderId,
        hub_id: Option<AccountId>,
        merchant_id: AccountId,
        fee_amount: Decimal,
        split: FeeSplit,
    ) -> Self {
        Self {
            id: LedgerEntryId::for_order(order_id),
            order_id,
            hub_id,
            merchant_id,
            fee_amount,
            platform_cut: split.platform_cut,
            merchant_cut: split.merchant_cut,
            created_at: Utc::now(),
        }
    }
}

/// Stores fee-split ledger entries keyed by order.
pub struct MerchantLedger {
    entries: HashMap<OrderId, LedgerEntry>,
}

impl MerchantLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Record an entry. Exactly one entry may ever exist per order.
    ///
    /// # Errors
    /// Returns [`EscrowError::LedgerEntryExists`] if the order already has
    /// an entry (idempotency violation — typically a retried confirm).
    pub fn record(&mut self, entry: LedgerEntry) -> Result<LedgerEntryId> {
        if self.entries.contains_key(&entry.order_id) {
            return Err(EscrowError::LedgerEntryExists(entry.order_id));
        }
        tracing::info!(
            order = %entry.order_id,
            merchant = %entry.merchant_id,
            platform_cut = %entry.platform_cut,
            merchant_cut = %entry.merchant_cut,
            "fee split recorded"
        );
        let id = entry.id;
        self.entries.insert(entry.order_id, entry);
        Ok(id)
    }

    /// Look up the entry for an order.
    #[must_use]
    pub fn get(&self, order_id: OrderId) -> Option<&LedgerEntry> {
        self.entries.get(&order_id)
    }

    /// Whether an order already has its entry.
    #[must_use]
    pub fn contains(&self, order_id: OrderId) -> bool {
        self.entries.contains_key(&order_id)
    }

    /// Number of entries recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ledger is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MerchantLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fee_split::split_fee;

    fn make_entry(order_id: OrderId) -> LedgerEntry {
        let fee = Decimal::new(500, 2);
        let split = split_fee(fee, Decimal::new(30, 0)).unwrap();
        LedgerEntry::from_split(order_id, None, AccountId::new(), fee, split)
    }

    #[test]
    fn first_record_ok() {
        let mut ledger = MerchantLedger::new();
        let order = OrderId::new();
        let id = ledger.record(make_entry(order)).unwrap();
        assert_eq!(id, LedgerEntryId::for_order(order));
        assert!(ledger.contains(order));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn duplicate_record_blocked() {
        let mut ledger = MerchantLedger::new();
        let order = OrderId::new();
        ledger.record(make_entry(order)).unwrap();

        let err = ledger.record(make_entry(order)).unwrap_err();
        assert!(
            matches!(err, EscrowError::LedgerEntryExists(id) if id == order),
            "Expected LedgerEntryExists, got: {err:?}"
        );
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn different_orders_ok() {
        let mut ledger = MerchantLedger::new();
        ledger.record(make_entry(OrderId::new())).unwrap();
        ledger.record(make_entry(OrderId::new())).unwrap();
        ledger.record(make_entry(OrderId::new())).unwrap();
        assert_eq!(ledger.len(), 3);
    }

    #[test]
    fn entry_preserves_split() {
        let mut ledger = MerchantLedger::new();
        let order = OrderId::new();
        ledger.record(make_entry(order)).unwrap();

        let entry = ledger.get(order).unwrap();
        assert_eq!(entry.platform_cut + entry.merchant_cut, entry.fee_amount);
    }
}
