//! # PendingRelease — the unit of escrow fund movement
//!
//! A `PendingRelease` is a proposed, not-yet-executed fund movement awaiting
//! human confirmation. It is created by an upstream event (trade completion,
//! dispute resolution, withdrawal request, hub commission) and mutated only
//! by the initiate/confirm protocol — never edited directly, never deleted.
//!
//! ## State Machine
//!
//! ```text
//!   ┌─────────┐ confirm  ┌──────────┐ payout  ┌──────┐
//!   │ PENDING ├─────────▶│ APPROVED ├────────▶│ PAID │   (WITHDRAWAL only)
//!   └───┬─────┘          └───┬──┬───┘         └──────┘
//!       │ reject             │  │ completion
//!       ▼                    │  ▼
//!   ┌──────────┐             │ ┌───────────┐
//!   │ REJECTED │             │ │ COMPLETED │
//!   └──────────┘             ▼ └───────────┘
//!                      ┌───────────┐
//!     (administrative) │ CANCELLED │
//!                      └───────────┘
//! ```
//!
//! Only `PENDING` accepts a confirm or reject. Once a release leaves
//! `PENDING` its confirmation token is cleared and the record is terminal
//! for approval purposes — it cannot be re-approved.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AccountId, ActorRole, DisputeId, OrderId, ReleaseId};

/// What kind of fund movement this release performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReleaseKind {
    /// Escrowed funds move to the seller after a completed trade.
    ReleaseToSeller,
    /// The full escrowed amount returns to the buyer.
    RefundFull,
    /// Part of the escrowed amount returns to the buyer.
    RefundPartial,
    /// Commission payout to a hub operator.
    HubCommission,
    /// A user withdraws wallet balance out of the platform.
    Withdrawal,
}

impl std::fmt::Display for ReleaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReleaseToSeller => write!(f, "RELEASE_TO_SELLER"),
            Self::RefundFull => write!(f, "REFUND_FULL"),
            Self::RefundPartial => write!(f, "REFUND_PARTIAL"),
            Self::HubCommission => write!(f, "HUB_COMMISSION"),
            Self::Withdrawal => write!(f, "WITHDRAWAL"),
        }
    }
}

/// The lifecycle state of a release.
///
/// Transitions are **monotonic** (never go backwards); see the module docs
/// for the full diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReleaseStatus {
    /// Awaiting the two-step human confirmation.
    Pending,
    /// A reviewer confirmed; funds have moved. **Irreversible.**
    Approved,
    /// A reviewer rejected; no funds moved. Terminal.
    Rejected,
    /// External payout executed (WITHDRAWAL kind only). Terminal.
    Paid,
    /// Post-approval bookkeeping finished. Terminal.
    Completed,
    /// Administratively withdrawn. Terminal.
    Cancelled,
}

impl ReleaseStatus {
    /// Can this release transition to the given target state?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (
                Self::Pending,
                Self::Approved | Self::Rejected | Self::Cancelled
            ) | (
                Self::Approved,
                Self::Paid | Self::Completed | Self::Cancelled
            )
        )
    }

    /// No further transitions are possible from this state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Rejected | Self::Paid | Self::Completed | Self::Cancelled
        )
    }
}

impl std::fmt::Display for ReleaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Approved => write!(f, "APPROVED"),
            Self::Rejected => write!(f, "REJECTED"),
            Self::Paid => write!(f, "PAID"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Who receives the funds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecipientKind {
    Buyer,
    Seller,
    Hub,
    Merchant,
}

impl std::fmt::Display for RecipientKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buyer => write!(f, "BUYER"),
            Self::Seller => write!(f, "SELLER"),
            Self::Hub => write!(f, "HUB"),
            Self::Merchant => write!(f, "MERCHANT"),
        }
    }
}

/// The upstream event that created this release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerSource {
    TradeCompleted,
    DisputeResolved,
    WithdrawalRequested,
    HubCommission,
    Manual,
}

impl std::fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TradeCompleted => write!(f, "TRADE_COMPLETED"),
            Self::DisputeResolved => write!(f, "DISPUTE_RESOLVED"),
            Self::WithdrawalRequested => write!(f, "WITHDRAWAL_REQUESTED"),
            Self::HubCommission => write!(f, "HUB_COMMISSION"),
            Self::Manual => write!(f, "MANUAL"),
        }
    }
}

/// A short-lived, single-use credential proving a human re-reviewed the
/// release before it executes.
///
/// Not a cryptographic authorization primitive — authorization is the role
/// check at the boundary. The token only proves the two-step read-back
/// happened. Re-initiating replaces the token, so only the most recent one
/// is ever valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationToken {
    /// Random 128-bit token material, hex-encoded.
    pub token: String,
    /// When the reviewer initiated (the audit trail's `first_click_at`).
    pub issued_at: DateTime<Utc>,
    /// Hard expiry; compared against the clock at the moment of confirm.
    pub expires_at: DateTime<Utc>,
}

impl ConfirmationToken {
    /// Whether the token has expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Constant-shape comparison against a presented token string.
    #[must_use]
    pub fn matches(&self, presented: &str) -> bool {
        self.token == presented
    }
}

/// A request to move funds held in escrow, awaiting double confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingRelease {
    /// Globally unique release identifier.
    pub id: ReleaseId,
    /// What kind of movement this is.
    pub kind: ReleaseKind,
    /// Amount to move. Strictly positive.
    pub amount: Decimal,
    /// The account receiving (or, for WITHDRAWAL, paying out of) the funds.
    pub recipient_id: AccountId,
    /// The recipient's role in the trade.
    pub recipient_kind: RecipientKind,
    /// The originating order, if any.
    pub order_id: Option<OrderId>,
    /// The originating dispute, if any.
    pub dispute_id: Option<DisputeId>,
    /// Current lifecycle state.
    pub status: ReleaseStatus,
    /// Outstanding confirmation token. Present only between initiate and
    /// the terminal decision.
    pub confirmation: Option<ConfirmationToken>,
    /// The upstream event that created this release.
    pub triggered_by: TriggerSource,
    /// Human-readable origin note.
    pub reason: String,
    /// When this release was created.
    pub created_at: DateTime<Utc>,
    /// When this release was approved, once it is.
    pub approved_at: Option<DateTime<Utc>>,
    /// Who approved it.
    pub approved_by: Option<AccountId>,
    /// The approver's role, captured for the audit trail.
    pub approved_by_role: Option<ActorRole>,
}

impl PendingRelease {
    /// Whether the release can still accept a confirm/reject.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == ReleaseStatus::Pending
    }
}

impl std::fmt::Display for PendingRelease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Release[{}] {} {} -> {} ({})",
            self.id, self.kind, self.amount, self.recipient_id, self.status,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_accepts_decisions() {
        assert!(ReleaseStatus::Pending.can_transition_to(ReleaseStatus::Approved));
        assert!(ReleaseStatus::Pending.can_transition_to(ReleaseStatus::Rejected));
        assert!(ReleaseStatus::Pending.can_transition_to(ReleaseStatus::Cancelled));
    }

    #[test]
    fn approved_moves_forward_only() {
        assert!(ReleaseStatus::Approved.can_transition_to(ReleaseStatus::Paid));
        assert!(ReleaseStatus::Approved.can_transition_to(ReleaseStatus::Completed));
        assert!(ReleaseStatus::Approved.can_transition_to(ReleaseStatus::Cancelled));
        assert!(!ReleaseStatus::Approved.can_transition_to(ReleaseStatus::Pending));
        assert!(!ReleaseStatus::Approved.can_transition_to(ReleaseStatus::Rejected));
    }

    #[test]
    fn terminal_states_accept_nothing() {
        for terminal in [
            ReleaseStatus::Rejected,
            ReleaseStatus::Paid,
            ReleaseStatus::Completed,
            ReleaseStatus::Cancelled,
        ] {
            assert!(terminal.is_terminal());
            for target in [
                ReleaseStatus::Pending,
                ReleaseStatus::Approved,
                ReleaseStatus::Rejected,
                ReleaseStatus::Paid,
                ReleaseStatus::Completed,
                ReleaseStatus::Cancelled,
            ] {
                assert!(
                    !terminal.can_transition_to(target),
                    "{terminal} -> {target} must be rejected"
                );
            }
        }
    }

    #[test]
    fn token_expiry_uses_presented_clock() {
        let issued = Utc::now();
        let token = ConfirmationToken {
            token: "ab".repeat(16),
            issued_at: issued,
            expires_at: issued + chrono::Duration::minutes(5),
        };
        assert!(!token.is_expired(issued + chrono::Duration::minutes(4)));
        assert!(token.is_expired(issued + chrono::Duration::minutes(6)));
    }

    #[test]
    fn token_match_is_exact() {
        let token = ConfirmationToken {
            token: "deadbeef".into(),
            issued_at: Utc::now(),
            expires_at: Utc::now() + chrono::Duration::minutes(5),
        };
        assert!(token.matches("deadbeef"));
        assert!(!token.matches("DEADBEEF"));
        assert!(!token.matches("deadbeef "));
    }

    #[test]
    fn kind_display() {
        assert_eq!(ReleaseKind::ReleaseToSeller.to_string(), "RELEASE_TO_SELLER");
        assert_eq!(ReleaseKind::Withdrawal.to_string(), "WITHDRAWAL");
        assert_eq!(TriggerSource::DisputeResolved.to_string(), "DISPUTE_RESOLVED");
    }

    #[test]
    fn status_serde_roundtrip() {
        let s = ReleaseStatus::Approved;
        let json = serde_json::to_string(&s).unwrap();
        let back: ReleaseStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(s, back);
    }
}
