//! Dispute resolution driver.
//!
//! A resolved dispute is an upstream trigger, not a fund movement: the
//! driver creates exactly one PENDING release matching the outcome and
//! hands the rest to the two-step confirmation protocol. Re-resolving an
//! already-resolved dispute is rejected here; the one-release-per-dispute
//! rule is additionally enforced by the release store.

use chrono::Utc;
use escrowgate_types::{
    Dispute, DisputeId, DisputeResolution, DisputeStatus, EscrowError, RecipientKind, ReleaseId,
    ReleaseKind, Result, TriggerSource,
};
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::manager::{NewRelease, ReleaseManager};

/// Result of applying a resolution.
#[derive(Debug, Clone)]
pub struct DisputeOutcome {
    pub dispute_id: DisputeId,
    pub status: DisputeStatus,
    pub resolution: DisputeResolution,
    /// The release the resolution created.
    pub release_id: ReleaseId,
}

/// Holds disputes and applies resolutions to them.
pub struct DisputeDesk {
    disputes: HashMap<DisputeId, Dispute>,
}

impl DisputeDesk {
    /// Create an empty desk.
    #[must_use]
    pub fn new() -> Self {
        Self {
            disputes: HashMap::new(),
        }
    }

    /// Register a dispute raised elsewhere in the marketplace.
    pub fn register(&mut self, dispute: Dispute) -> DisputeId {
        let id = dispute.id;
        self.disputes.insert(id, dispute);
        id
    }

    /// Look up a dispute.
    ///
    /// # Errors
    /// Returns `DisputeNotFound` if absent.
    pub fn get(&self, id: DisputeId) -> Result<&Dispute> {
        self.disputes
            .get(&id)
            .ok_or(EscrowError::DisputeNotFound(id))
    }

    /// Apply a resolution: create the matching release and mark the
    /// dispute resolved.
    ///
    /// The release is created first; only when that succeeds is the
    /// dispute mutated, so a failed creation leaves the dispute
    /// resolvable.
    ///
    /// # Errors
    /// - `DisputeNotFound` if absent
    /// - `DisputeNotResolvable` unless OPEN or UNDER_REVIEW
    /// - `MissingResolutionAmount` for a partial refund without an amount
    /// - `InvalidAmount` / `ResolutionAmountOutOfBounds` for a partial
    ///   refund outside `0 < amount <= escrowed`
    /// - `DuplicateRelease` if a release already exists for this dispute
    pub fn resolve(
        &mut self,
        manager: &mut ReleaseManager,
        dispute_id: DisputeId,
        resolution: DisputeResolution,
        resolution_amount: Option<Decimal>,
        notes: &str,
    ) -> Result<DisputeOutcome> {
        let dispute = self
            .disputes
            .get(&dispute_id)
            .ok_or(EscrowError::DisputeNotFound(dispute_id))?;
        if !dispute.status.is_resolvable() {
            return Err(EscrowError::DisputeNotResolvable {
                current: dispute.status,
            });
        }

        let (kind, recipient_id, recipient_kind, amount) = match resolution {
            DisputeResolution::RefundFull | DisputeResolution::InFavorBuyer => (
                ReleaseKind::RefundFull,
                dispute.buyer,
                RecipientKind::Buyer,
                dispute.escrowed_amount,
            ),
            DisputeResolution::RefundPartial => {
                let amount =
                    resolution_amount.ok_or(EscrowError::MissingResolutionAmount)?;
                if amount <= Decimal::ZERO {
                    return Err(EscrowError::InvalidAmount(amount));
                }
                if amount > dispute.escrowed_amount {
                    return Err(EscrowError::ResolutionAmountOutOfBounds {
                        amount,
                        escrowed: dispute.escrowed_amount,
                    });
                }
                (
                    ReleaseKind::RefundPartial,
                    dispute.buyer,
                    RecipientKind::Buyer,
                    amount,
                )
            }
            DisputeResolution::InFavorSeller => (
                ReleaseKind::ReleaseToSeller,
                dispute.seller,
                RecipientKind::Seller,
                dispute.escrowed_amount,
            ),
        };

        let reason = if notes.is_empty() {
            format!("Dispute {dispute_id} resolved {resolution}")
        } else {
            notes.to_string()
        };
        let release_id = manager.create(NewRelease {
            kind,
            amount,
            recipient_id,
            recipient_kind,
            order_id: Some(dispute.order_id),
            dispute_id: Some(dispute_id),
            triggered_by: TriggerSource::DisputeResolved,
            reason,
        })?;

        let dispute = self
            .disputes
            .get_mut(&dispute_id)
            .ok_or(EscrowError::DisputeNotFound(dispute_id))?;
        dispute.status = DisputeStatus::Resolved;
        dispute.resolution = Some(resolution);
        dispute.resolved_at = Some(Utc::now());

        tracing::info!(
            dispute = %dispute_id,
            %resolution,
            release = %release_id,
            "dispute resolved"
        );

        Ok(DisputeOutcome {
            dispute_id,
            status: DisputeStatus::Resolved,
            resolution,
            release_id,
        })
    }

    /// Number of registered disputes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.disputes.len()
    }

    /// Whether the desk is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.disputes.is_empty()
    }
}

impl Default for DisputeDesk {
    fn default() -> Self {
        Self::new()
    }
}
