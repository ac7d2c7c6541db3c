//! The financial audit log — append-only record of every terminal
//! approval decision.
//!
//! There is deliberately no update or delete surface on this type. An
//! entry, once appended, is history.

use escrowgate_types::{AuditId, FinancialAuditEntry, ReleaseId};

/// Append-only store of [`FinancialAuditEntry`] records.
pub struct AuditLog {
    entries: Vec<FinancialAuditEntry>,
}

impl AuditLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append one entry and return its ID.
    pub fn append(&mut self, entry: FinancialAuditEntry) -> AuditId {
        tracing::info!(
            action = %entry.action,
            release = %entry.release_id,
            amount = %entry.amount,
            performed_by = %entry.performed_by,
            "audit entry recorded"
        );
        let id = entry.id;
        self.entries.push(entry);
        id
    }

    /// Look up an entry by ID.
    #[must_use]
    pub fn get(&self, id: AuditId) -> Option<&FinancialAuditEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// All entries for a release, oldest first.
    pub fn for_release(&self, release_id: ReleaseId) -> impl Iterator<Item = &FinancialAuditEntry> {
        self.entries.iter().filter(move |e| e.release_id == release_id)
    }

    /// All entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[FinancialAuditEntry] {
        &self.entries
    }

    /// Number of entries recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use escrowgate_types::{
        AccountId, ActorRole, AuditAction, AuditOutcome, OrderId, ReleaseKind,
    };
    use rust_decimal::Decimal;

    fn make_entry(release_id: ReleaseId) -> FinancialAuditEntry {
        FinancialAuditEntry {
            id: AuditId::new(),
            action: AuditAction {
                kind: ReleaseKind::RefundFull,
                outcome: AuditOutcome::Approved,
            },
            release_id,
            order_id: Some(OrderId::new()),
            amount: Decimal::new(2500, 2),
            recipient_id: AccountId::new(),
            performed_by: AccountId::new(),
            performed_by_role: ActorRole::Moderator,
            ip_address: None,
            user_agent: None,
            first_click_at: Some(Utc::now()),
            confirm_click_at: Utc::now(),
            notes: "ok".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn append_and_get() {
        let mut log = AuditLog::new();
        assert!(log.is_empty());

        let entry = make_entry(ReleaseId::new());
        let id = log.append(entry);
        assert_eq!(log.len(), 1);
        assert!(log.get(id).is_some());
    }

    #[test]
    fn for_release_filters() {
        let mut log = AuditLog::new();
        let release = ReleaseId::new();
        log.append(make_entry(release));
        log.append(make_entry(ReleaseId::new()));
        log.append(make_entry(release));

        assert_eq!(log.for_release(release).count(), 2);
    }

    #[test]
    fn unknown_id_is_none() {
        let log = AuditLog::new();
        assert!(log.get(AuditId::new()).is_none());
    }
}
