//! Dispute types. Disputes are raised and argued elsewhere in the
//! marketplace; this subsystem only consumes their resolution as the
//! trigger for creating a refund or release.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AccountId, DisputeId, OrderId};

/// Lifecycle state of a dispute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisputeStatus {
    Open,
    UnderReview,
    Resolved,
}

impl DisputeStatus {
    /// A resolution may be applied only while the dispute is still live.
    #[must_use]
    pub fn is_resolvable(&self) -> bool {
        matches!(self, Self::Open | Self::UnderReview)
    }
}

impl std::fmt::Display for DisputeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::UnderReview => write!(f, "UNDER_REVIEW"),
            Self::Resolved => write!(f, "RESOLVED"),
        }
    }
}

/// The outcome a dispute was resolved with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisputeResolution {
    RefundFull,
    RefundPartial,
    InFavorBuyer,
    InFavorSeller,
}

impl std::fmt::Display for DisputeResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RefundFull => write!(f, "REFUND_FULL"),
            Self::RefundPartial => write!(f, "REFUND_PARTIAL"),
            Self::InFavorBuyer => write!(f, "IN_FAVOR_BUYER"),
            Self::InFavorSeller => write!(f, "IN_FAVOR_SELLER"),
        }
    }
}

/// A dispute raised against an escrowed order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dispute {
    pub id: DisputeId,
    pub order_id: OrderId,
    pub buyer: AccountId,
    pub seller: AccountId,
    /// The amount held in escrow for the disputed order. Partial refunds
    /// are bounded by this.
    pub escrowed_amount: Decimal,
    pub status: DisputeStatus,
    pub resolution: Option<DisputeResolution>,
    pub opened_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Dispute {
    /// Open a new dispute over an escrowed order.
    #[must_use]
    pub fn open(
        order_id: OrderId,
        buyer: AccountId,
        seller: AccountId,
        escrowed_amount: Decimal,
    ) -> Self {
        Self {
            id: DisputeId::new(),
            order_id,
            buyer,
            seller,
            escrowed_amount,
            status: DisputeStatus::Open,
            resolution: None,
            opened_at: Utc::now(),
            resolved_at: None,
        }
    }
}
