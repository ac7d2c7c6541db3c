//! Request and response types, one struct per operation.
//!
//! Every request is deserialized with `deny_unknown_fields`: a malformed
//! or mistyped payload is rejected at the boundary instead of silently
//! defaulting, and `validate()` bounds the free-text fields before any
//! domain logic runs.

use chrono::{DateTime, Utc};
use escrowgate_types::constants::MAX_NOTES_LEN;
use escrowgate_types::{
    Actor, AuditId, AccountId, ClientInfo, DisputeId, DisputeResolution, DisputeStatus,
    EscrowError, ReleaseId, ReleaseStatus, Result,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

fn check_len(field: &'static str, value: &str) -> Result<()> {
    if value.len() > MAX_NOTES_LEN {
        return Err(EscrowError::InvalidField {
            field,
            reason: format!("exceeds {MAX_NOTES_LEN} bytes"),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// InitiateApproval
// ---------------------------------------------------------------------------

/// First click: ask for a confirmation token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InitiateApprovalRequest {
    pub release_id: ReleaseId,
    /// The resolved auth identity; absent means unauthenticated.
    pub actor: Option<Actor>,
    #[serde(default)]
    pub client: ClientInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiateApprovalResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// ConfirmApproval
// ---------------------------------------------------------------------------

/// Second click: present the token back and execute the release.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfirmApprovalRequest {
    pub release_id: ReleaseId,
    /// The token minted by initiate. Absent fails `MissingToken`.
    pub token: Option<String>,
    pub actor: Option<Actor>,
    #[serde(default)]
    pub client: ClientInfo,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ConfirmApprovalRequest {
    /// Boundary validation, before any domain logic.
    pub fn validate(&self) -> Result<()> {
        if let Some(notes) = &self.notes {
            check_len("notes", notes)?;
        }
        Ok(())
    }
}

/// What happened to the fee-ledger step of an approval, in wire form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LedgerStepStatus {
    /// Nothing to record for this release.
    NotApplicable,
    /// Fee split recorded (and merchant credited, for online trades).
    Recorded,
    /// The payout committed but the fee step failed; needs manual
    /// reconciliation.
    Degraded { reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmApprovalResponse {
    pub status: ReleaseStatus,
    pub amount_released: Decimal,
    pub recipient: AccountId,
    pub approved_by: AccountId,
    pub approved_at: DateTime<Utc>,
    pub audit_log_id: AuditId,
    pub ledger: LedgerStepStatus,
    /// Human-readable outcome line (amount, recipient).
    pub message: String,
}

// ---------------------------------------------------------------------------
// RejectRelease
// ---------------------------------------------------------------------------

/// Decline a pending release. No funds move.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RejectReleaseRequest {
    pub release_id: ReleaseId,
    pub actor: Option<Actor>,
    #[serde(default)]
    pub client: ClientInfo,
    pub reason: String,
}

impl RejectReleaseRequest {
    /// Boundary validation, before any domain logic.
    pub fn validate(&self) -> Result<()> {
        check_len("reason", &self.reason)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectReleaseResponse {
    pub status: ReleaseStatus,
    pub audit_log_id: AuditId,
    pub message: String,
}

// ---------------------------------------------------------------------------
// ResolveDispute
// ---------------------------------------------------------------------------

/// Apply a dispute resolution, creating the matching pending release.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolveDisputeRequest {
    pub dispute_id: DisputeId,
    pub resolution: DisputeResolution,
    /// Required for partial refunds; bounded by the escrowed amount.
    pub resolution_amount: Option<Decimal>,
    pub actor: Option<Actor>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ResolveDisputeRequest {
    /// Boundary validation, before any domain logic.
    pub fn validate(&self) -> Result<()> {
        if let Some(notes) = &self.notes {
            check_len("notes", notes)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveDisputeResponse {
    pub dispute_status: DisputeStatus,
    pub resolution: DisputeResolution,
    pub created_release_id: Option<ReleaseId>,
}
