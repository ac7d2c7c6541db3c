//! Financial audit log types.
//!
//! Every terminal approval decision (approve, reject, administrative cancel)
//! produces exactly one [`FinancialAuditEntry`]. Entries are append-only and
//! never mutated; the initiate-to-confirm latency they capture is retained
//! for fraud review.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AccountId, ActorRole, AuditId, OrderId, ReleaseId, ReleaseKind};

/// The terminal decision an audit entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditOutcome {
    Approved,
    Rejected,
    Cancelled,
}

impl std::fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approved => write!(f, "APPROVED"),
            Self::Rejected => write!(f, "REJECTED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Release kind + outcome suffix, e.g. `RELEASE_TO_SELLER_APPROVED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditAction {
    pub kind: ReleaseKind,
    pub outcome: AuditOutcome,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.kind, self.outcome)
    }
}

/// One immutable record per terminal decision on a release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialAuditEntry {
    /// Globally unique audit entry identifier.
    pub id: AuditId,
    /// What was decided, e.g. `REFUND_FULL_REJECTED`.
    pub action: AuditAction,
    /// The release this decision was made on.
    pub release_id: ReleaseId,
    /// The originating order, if any.
    pub order_id: Option<OrderId>,
    /// The amount at stake.
    pub amount: Decimal,
    /// Who would have received (or did receive) the funds.
    pub recipient_id: AccountId,
    /// The reviewer who made the decision.
    pub performed_by: AccountId,
    /// The reviewer's role at decision time.
    pub performed_by_role: ActorRole,
    /// Client address of the reviewer's session, when known.
    pub ip_address: Option<IpAddr>,
    /// Client user agent, when known.
    pub user_agent: Option<String>,
    /// When the reviewer initiated (minted the confirmation token).
    /// Absent for decisions that need no token (reject, cancel).
    pub first_click_at: Option<DateTime<Utc>>,
    /// When the reviewer confirmed.
    pub confirm_click_at: DateTime<Utc>,
    /// Free-text reviewer notes.
    pub notes: String,
    /// When this entry was appended.
    pub created_at: DateTime<Utc>,
}

impl FinancialAuditEntry {
    /// How long the reviewer spent between initiate and confirm.
    ///
    /// The delta is the human confirmation latency; implausibly short
    /// values are a fraud signal.
    #[must_use]
    pub fn confirmation_latency(&self) -> Option<chrono::Duration> {
        self.first_click_at
            .map(|first| self.confirm_click_at - first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_entry(first_click: Option<DateTime<Utc>>) -> FinancialAuditEntry {
        FinancialAuditEntry {
            id: AuditId::new(),
            action: AuditAction {
                kind: ReleaseKind::ReleaseToSeller,
                outcome: AuditOutcome::Approved,
            },
            release_id: ReleaseId::new(),
            order_id: Some(OrderId::new()),
            amount: Decimal::new(10000, 2),
            recipient_id: AccountId::new(),
            performed_by: AccountId::new(),
            performed_by_role: ActorRole::Admin,
            ip_address: Some("10.1.2.3".parse().unwrap()),
            user_agent: Some("Mozilla/5.0".into()),
            first_click_at: first_click,
            confirm_click_at: Utc::now(),
            notes: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn action_display_joins_kind_and_outcome() {
        let action = AuditAction {
            kind: ReleaseKind::ReleaseToSeller,
            outcome: AuditOutcome::Approved,
        };
        assert_eq!(action.to_string(), "RELEASE_TO_SELLER_APPROVED");

        let action = AuditAction {
            kind: ReleaseKind::RefundPartial,
            outcome: AuditOutcome::Rejected,
        };
        assert_eq!(action.to_string(), "REFUND_PARTIAL_REJECTED");
    }

    #[test]
    fn latency_from_first_click() {
        let confirm = Utc::now();
        let mut entry = make_entry(Some(confirm - chrono::Duration::seconds(42)));
        entry.confirm_click_at = confirm;
        assert_eq!(
            entry.confirmation_latency(),
            Some(chrono::Duration::seconds(42))
        );
    }

    #[test]
    fn latency_absent_without_initiate() {
        let entry = make_entry(None);
        assert_eq!(entry.confirmation_latency(), None);
    }

    #[test]
    fn entry_serde_roundtrip() {
        let entry = make_entry(Some(Utc::now()));
        let json = serde_json::to_string(&entry).unwrap();
        let back: FinancialAuditEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry.id, back.id);
        assert_eq!(entry.action, back.action);
        assert_eq!(entry.ip_address, back.ip_address);
    }
}
