//! Wallet and wallet-transaction types for the EscrowGate ledger.
//!
//! A wallet's `balance` is a cached projection of its append-only
//! transaction log: at any time it equals the sum of the wallet's
//! transactions' signed amounts. The projection is updated only inside the
//! same atomic unit that appends the transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AccountId, OrderId, ReleaseId, TxId};

/// Whether a transaction adds to or subtracts from the wallet balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxDirection {
    Credit,
    Debit,
}

impl TxDirection {
    /// Sign multiplier applied to the (positive) amount.
    #[must_use]
    pub fn sign(&self) -> Decimal {
        match self {
            Self::Credit => Decimal::ONE,
            Self::Debit => Decimal::NEGATIVE_ONE,
        }
    }
}

/// What kind of movement produced a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxKind {
    /// Escrowed funds released to a seller.
    EscrowRelease,
    /// Escrowed funds refunded to a buyer.
    EscrowRefund,
    /// Hub commission payout.
    HubCommission,
    /// Partner merchant's share of a trade fee.
    MerchantShare,
    /// Balance withdrawn out of the platform.
    Withdrawal,
    /// Funds deposited into the wallet.
    Deposit,
}

impl std::fmt::Display for TxKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EscrowRelease => write!(f, "ESCROW_RELEASE"),
            Self::EscrowRefund => write!(f, "ESCROW_REFUND"),
            Self::HubCommission => write!(f, "HUB_COMMISSION"),
            Self::MerchantShare => write!(f, "MERCHANT_SHARE"),
            Self::Withdrawal => write!(f, "WITHDRAWAL"),
            Self::Deposit => write!(f, "DEPOSIT"),
        }
    }
}

/// One immutable ledger line. Append-only: never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletTransaction {
    /// Globally unique transaction identifier.
    pub id: TxId,
    /// The wallet this line belongs to.
    pub account_id: AccountId,
    /// Movement amount. Strictly positive; direction carries the sign.
    pub amount: Decimal,
    /// Credit or debit.
    pub direction: TxDirection,
    /// What produced this movement.
    pub kind: TxKind,
    /// Human-readable description.
    pub description: String,
    /// The originating order, if any.
    pub order_id: Option<OrderId>,
    /// The release whose approval produced this line, if any.
    pub release_id: Option<ReleaseId>,
    /// Balance snapshot before this line was applied.
    pub balance_before: Decimal,
    /// Balance snapshot after. Tamper evidence: must equal
    /// `balance_before + signed_amount()`.
    pub balance_after: Decimal,
    /// When this line was appended.
    pub created_at: DateTime<Utc>,
}

impl WalletTransaction {
    /// The amount with its direction applied.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        self.amount * self.direction.sign()
    }

    /// Snapshot consistency check: `balance_after = balance_before + signed`.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.balance_after == self.balance_before + self.signed_amount()
    }
}

/// One balance per wallet-owning identity. Created lazily on first credit,
/// never deleted, never negative by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub account_id: AccountId,
    pub balance: Decimal,
}

impl Wallet {
    /// A fresh zero-balance wallet.
    #[must_use]
    pub fn new(account_id: AccountId) -> Self {
        Self {
            account_id,
            balance: Decimal::ZERO,
        }
    }
}
