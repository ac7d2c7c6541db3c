//! The originating marketplace order, modelled to the extent the approval
//! flow must touch it: escrow status, fee terms, and partner-store routing.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AccountId, OrderId};

/// Where the escrowed funds of an order currently stand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EscrowStatus {
    /// Funds held in trust; the trade is not yet settled.
    Held,
    /// Funds released to the seller.
    Released,
    /// Funds returned to the buyer.
    Refunded,
}

impl EscrowStatus {
    /// HELD may move to RELEASED or REFUNDED; both targets are final.
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!((self, target), (Self::Held, Self::Released | Self::Refunded))
    }
}

impl std::fmt::Display for EscrowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Held => write!(f, "HELD"),
            Self::Released => write!(f, "RELEASED"),
            Self::Refunded => write!(f, "REFUNDED"),
        }
    }
}

/// Which party the platform fee is charged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeePayer {
    Buyer,
    Seller,
}

/// How the trade was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SettlementChannel {
    /// Paid online; all fund movement happens in platform wallets.
    Online,
    /// Handed over at a physical partner store.
    InStore,
}

impl std::fmt::Display for SettlementChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Online => write!(f, "ONLINE"),
            Self::InStore => write!(f, "IN_STORE"),
        }
    }
}

/// An escrowed trade between a buyer and a seller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub buyer: AccountId,
    pub seller: AccountId,
    /// Trade amount held in escrow.
    pub amount: Decimal,
    /// Platform fee for this trade.
    pub fee_amount: Decimal,
    pub fee_payer: FeePayer,
    pub escrow_status: EscrowStatus,
    pub channel: SettlementChannel,
    /// The hub that brokered the trade, if any.
    pub hub_id: Option<AccountId>,
    /// The physical partner store involved, if any.
    pub merchant_id: Option<AccountId>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// A fresh order with funds held in escrow.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        buyer: AccountId,
        seller: AccountId,
        amount: Decimal,
        fee_amount: Decimal,
        fee_payer: FeePayer,
        channel: SettlementChannel,
        hub_id: Option<AccountId>,
        merchant_id: Option<AccountId>,
    ) -> Self {
        Self {
            id: OrderId::new(),
            buyer,
            seller,
            amount,
            fee_amount,
            fee_payer,
            escrow_status: EscrowStatus::Held,
            channel,
            hub_id,
            merchant_id,
            created_at: Utc::now(),
        }
    }

    /// Whether the trade went through a physical partner store.
    #[must_use]
    pub fn has_partner_merchant(&self) -> bool {
        self.merchant_id.is_some()
    }

    /// What the seller is owed on release: the escrowed amount, minus the
    /// fee when the seller is the fee payer.
    #[must_use]
    pub fn seller_proceeds(&self) -> Decimal {
        match self.fee_payer {
            FeePayer::Seller => self.amount - self.fee_amount,
            FeePayer::Buyer => self.amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_order(fee_payer: FeePayer) -> Order {
        Order::new(
            AccountId::new(),
            AccountId::new(),
            Decimal::new(10000, 2),
            Decimal::new(500, 2),
            fee_payer,
            SettlementChannel::Online,
            None,
            None,
        )
    }

    #[test]
    fn escrow_transitions() {
        assert!(EscrowStatus::Held.can_transition_to(EscrowStatus::Released));
        assert!(EscrowStatus::Held.can_transition_to(EscrowStatus::Refunded));
        assert!(!EscrowStatus::Released.can_transition_to(EscrowStatus::Refunded));
        assert!(!EscrowStatus::Refunded.can_transition_to(EscrowStatus::Held));
    }

    #[test]
    fn seller_pays_fee_out_of_proceeds() {
        let order = make_order(FeePayer::Seller);
        assert_eq!(order.seller_proceeds(), Decimal::new(9500, 2));
    }

    #[test]
    fn buyer_paid_fee_leaves_proceeds_whole() {
        let order = make_order(FeePayer::Buyer);
        assert_eq!(order.seller_proceeds(), Decimal::new(10000, 2));
    }

    #[test]
    fn new_order_holds_escrow() {
        let order = make_order(FeePayer::Buyer);
        assert_eq!(order.escrow_status, EscrowStatus::Held);
        assert!(!order.has_partner_merchant());
    }
}
