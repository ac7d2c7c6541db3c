//! The role-gated service facade.
//!
//! Auth gates run first, in a fixed order: `Unauthenticated` (no actor)
//! before `Forbidden` (wrong role) before anything that would reveal
//! whether the target exists. Approval operations accept ADMIN and
//! MODERATOR; dispute resolution is ADMIN only.

use escrowgate_approval::{DisputeDesk, FeeLedgerOutcome, ReleaseManager};
use escrowgate_types::{Actor, EngineConfig, EscrowError, Result};

use crate::requests::{
    ConfirmApprovalRequest, ConfirmApprovalResponse, InitiateApprovalRequest,
    InitiateApprovalResponse, LedgerStepStatus, RejectReleaseRequest, RejectReleaseResponse,
    ResolveDisputeRequest, ResolveDisputeResponse,
};

/// Owns the Approval Plane and exposes the external contract.
pub struct ApprovalService {
    manager: ReleaseManager,
    disputes: DisputeDesk,
}

impl ApprovalService {
    /// Create a service with empty stores.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            manager: ReleaseManager::new(config),
            disputes: DisputeDesk::new(),
        }
    }

    fn require_reviewer(actor: Option<Actor>) -> Result<Actor> {
        let actor = actor.ok_or(EscrowError::Unauthenticated)?;
        if !actor.role.can_review() {
            return Err(EscrowError::Forbidden { role: actor.role });
        }
        Ok(actor)
    }

    fn require_admin(actor: Option<Actor>) -> Result<Actor> {
        let actor = actor.ok_or(EscrowError::Unauthenticated)?;
        if actor.role != escrowgate_types::ActorRole::Admin {
            return Err(EscrowError::Forbidden { role: actor.role });
        }
        Ok(actor)
    }

    /// First step of the two-step protocol: mint a confirmation token.
    ///
    /// # Errors
    /// `Unauthenticated`, `Forbidden`, `ReleaseNotFound`,
    /// `InvalidReleaseState`.
    pub fn initiate_approval(
        &mut self,
        req: &InitiateApprovalRequest,
    ) -> Result<InitiateApprovalResponse> {
        let actor = Self::require_reviewer(req.actor)?;
        let (token, expires_at) = self.manager.initiate(req.release_id, &actor)?;
        Ok(InitiateApprovalResponse { token, expires_at })
    }

    /// Second step: execute the release.
    ///
    /// # Errors
    /// `Unauthenticated`, `Forbidden`, `ReleaseNotFound`, `MissingToken`,
    /// `InvalidToken`, `TokenExpired`, `InvalidReleaseState`, plus the
    /// wallet preconditions for withdrawals.
    pub fn confirm_approval(
        &mut self,
        req: &ConfirmApprovalRequest,
    ) -> Result<ConfirmApprovalResponse> {
        let actor = Self::require_reviewer(req.actor)?;
        req.validate()?;
        let token = req.token.as_deref().ok_or(EscrowError::MissingToken)?;
        let notes = req.notes.as_deref().unwrap_or_default();

        let outcome = self
            .manager
            .confirm(req.release_id, token, &actor, &req.client, notes)?;

        let ledger = match outcome.fee_ledger {
            FeeLedgerOutcome::NotApplicable => LedgerStepStatus::NotApplicable,
            FeeLedgerOutcome::Recorded { .. } => LedgerStepStatus::Recorded,
            FeeLedgerOutcome::Failed { reason } => {
                tracing::warn!(release = %req.release_id, %reason, "approval returned degraded ledger step");
                LedgerStepStatus::Degraded { reason }
            }
        };
        Ok(ConfirmApprovalResponse {
            status: outcome.status,
            amount_released: outcome.amount_released,
            recipient: outcome.recipient,
            approved_by: outcome.approved_by,
            approved_at: outcome.approved_at,
            audit_log_id: outcome.audit_id,
            ledger,
            message: outcome.message,
        })
    }

    /// Decline a pending release.
    ///
    /// # Errors
    /// `Unauthenticated`, `Forbidden`, `ReleaseNotFound`,
    /// `InvalidReleaseState`.
    pub fn reject_release(
        &mut self,
        req: &RejectReleaseRequest,
    ) -> Result<RejectReleaseResponse> {
        let actor = Self::require_reviewer(req.actor)?;
        req.validate()?;
        let outcome = self
            .manager
            .reject(req.release_id, &actor, &req.client, &req.reason)?;
        Ok(RejectReleaseResponse {
            status: outcome.status,
            audit_log_id: outcome.audit_id,
            message: outcome.message,
        })
    }

    /// Apply a dispute resolution. ADMIN only.
    ///
    /// # Errors
    /// `Unauthenticated`, `Forbidden`, `DisputeNotFound`,
    /// `DisputeNotResolvable`, `MissingResolutionAmount`,
    /// `ResolutionAmountOutOfBounds`, `DuplicateRelease`.
    pub fn resolve_dispute(
        &mut self,
        req: &ResolveDisputeRequest,
    ) -> Result<ResolveDisputeResponse> {
        Self::require_admin(req.actor)?;
        req.validate()?;
        let notes = req.notes.as_deref().unwrap_or_default();
        let outcome = self.disputes.resolve(
            &mut self.manager,
            req.dispute_id,
            req.resolution,
            req.resolution_amount,
            notes,
        )?;
        Ok(ResolveDisputeResponse {
            dispute_status: outcome.status,
            resolution: outcome.resolution,
            created_release_id: Some(outcome.release_id),
        })
    }

    // -----------------------------------------------------------------
    // Host access: the marketplace seeds orders, disputes, and wallets,
    // and drains notifications, through these.
    // -----------------------------------------------------------------

    /// The underlying release manager.
    #[must_use]
    pub fn manager(&self) -> &ReleaseManager {
        &self.manager
    }

    /// Mutable access for upstream events (order registration, trade
    /// completion, deposits, withdrawal requests).
    pub fn manager_mut(&mut self) -> &mut ReleaseManager {
        &mut self.manager
    }

    /// The dispute desk.
    #[must_use]
    pub fn disputes(&self) -> &DisputeDesk {
        &self.disputes
    }

    /// Mutable access for registering disputes raised elsewhere.
    pub fn disputes_mut(&mut self) -> &mut DisputeDesk {
        &mut self.disputes
    }
}
