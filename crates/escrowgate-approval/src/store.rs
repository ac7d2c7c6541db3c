//! Pending-release store.
//!
//! Releases are retained forever for audit: there is no delete surface.
//! The store also enforces the one-release-per-dispute rule at insertion
//! time, so a re-resolved dispute can never mint a second payout request.

use std::collections::HashMap;

use escrowgate_types::{
    DisputeId, EscrowError, PendingRelease, ReleaseId, ReleaseStatus, Result,
};
use rust_decimal::Decimal;

/// Holds every [`PendingRelease`] ever created.
pub struct ReleaseStore {
    releases: HashMap<ReleaseId, PendingRelease>,
    /// Dispute → release back-index for the one-per-dispute guard.
    by_dispute: HashMap<DisputeId, ReleaseId>,
}

impl ReleaseStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            releases: HashMap::new(),
            by_dispute: HashMap::new(),
        }
    }

    /// Insert a new release.
    ///
    /// # Errors
    /// - `InvalidAmount` if the amount is not strictly positive
    /// - `DuplicateRelease` if the release's dispute already has one
    pub fn insert(&mut self, release: PendingRelease) -> Result<ReleaseId> {
        if release.amount <= Decimal::ZERO {
            return Err(EscrowError::InvalidAmount(release.amount));
        }
        if let Some(dispute_id) = release.dispute_id {
            if self.by_dispute.contains_key(&dispute_id) {
                return Err(EscrowError::DuplicateRelease(dispute_id));
            }
            self.by_dispute.insert(dispute_id, release.id);
        }
        let id = release.id;
        self.releases.insert(id, release);
        Ok(id)
    }

    /// Look up a release.
    ///
    /// # Errors
    /// Returns `ReleaseNotFound` if absent.
    pub fn get(&self, id: ReleaseId) -> Result<&PendingRelease> {
        self.releases
            .get(&id)
            .ok_or(EscrowError::ReleaseNotFound(id))
    }

    /// Mutable lookup, for the manager's atomic unit only.
    ///
    /// # Errors
    /// Returns `ReleaseNotFound` if absent.
    pub fn get_mut(&mut self, id: ReleaseId) -> Result<&mut PendingRelease> {
        self.releases
            .get_mut(&id)
            .ok_or(EscrowError::ReleaseNotFound(id))
    }

    /// The release created for a dispute, if one exists.
    #[must_use]
    pub fn for_dispute(&self, dispute_id: DisputeId) -> Option<ReleaseId> {
        self.by_dispute.get(&dispute_id).copied()
    }

    /// Number of releases in the given status.
    #[must_use]
    pub fn count_in(&self, status: ReleaseStatus) -> usize {
        self.releases.values().filter(|r| r.status == status).count()
    }

    /// Total number of releases ever created.
    #[must_use]
    pub fn len(&self) -> usize {
        self.releases.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }
}

impl Default for ReleaseStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use escrowgate_types::{AccountId, RecipientKind, ReleaseKind, TriggerSource};

    fn make_release(dispute_id: Option<DisputeId>, amount: Decimal) -> PendingRelease {
        PendingRelease {
            id: ReleaseId::new(),
            kind: ReleaseKind::RefundFull,
            amount,
            recipient_id: AccountId::new(),
            recipient_kind: RecipientKind::Buyer,
            order_id: None,
            dispute_id,
            status: ReleaseStatus::Pending,
            confirmation: None,
            triggered_by: TriggerSource::DisputeResolved,
            reason: "test".into(),
            created_at: Utc::now(),
            approved_at: None,
            approved_by: None,
            approved_by_role: None,
        }
    }

    #[test]
    fn insert_and_get() {
        let mut store = ReleaseStore::new();
        let id = store
            .insert(make_release(None, Decimal::new(100, 0)))
            .unwrap();
        assert_eq!(store.get(id).unwrap().id, id);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn missing_release_errors() {
        let store = ReleaseStore::new();
        let err = store.get(ReleaseId::new()).unwrap_err();
        assert!(matches!(err, EscrowError::ReleaseNotFound(_)));
    }

    #[test]
    fn non_positive_amount_rejected() {
        let mut store = ReleaseStore::new();
        let err = store
            .insert(make_release(None, Decimal::ZERO))
            .unwrap_err();
        assert!(matches!(err, EscrowError::InvalidAmount(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn one_release_per_dispute() {
        let mut store = ReleaseStore::new();
        let dispute = DisputeId::new();
        let first = store
            .insert(make_release(Some(dispute), Decimal::new(50, 0)))
            .unwrap();
        assert_eq!(store.for_dispute(dispute), Some(first));

        let err = store
            .insert(make_release(Some(dispute), Decimal::new(50, 0)))
            .unwrap_err();
        assert!(matches!(err, EscrowError::DuplicateRelease(d) if d == dispute));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn count_in_by_status() {
        let mut store = ReleaseStore::new();
        store
            .insert(make_release(None, Decimal::new(10, 0)))
            .unwrap();
        store
            .insert(make_release(None, Decimal::new(20, 0)))
            .unwrap();
        assert_eq!(store.count_in(ReleaseStatus::Pending), 2);
        assert_eq!(store.count_in(ReleaseStatus::Approved), 0);
    }
}
