//! Notification outbox.
//!
//! Delivery is an external collaborator's job; the approval flow only
//! queues what should be said, to whom, inside the same atomic unit that
//! decided it. The host drains the queue.

use chrono::{DateTime, Utc};
use escrowgate_types::{AccountId, ReleaseId};

/// What happened to the release the notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    ReleaseApproved,
    ReleaseRejected,
    ReleaseCancelled,
}

/// One queued notification.
#[derive(Debug, Clone)]
pub struct Notification {
    pub recipient: AccountId,
    pub kind: NotificationKind,
    pub release_id: ReleaseId,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// FIFO queue of notifications awaiting delivery.
pub struct Outbox {
    queue: Vec<Notification>,
}

impl Outbox {
    /// Create an empty outbox.
    #[must_use]
    pub fn new() -> Self {
        Self { queue: Vec::new() }
    }

    /// Queue a notification.
    pub fn push(
        &mut self,
        recipient: AccountId,
        kind: NotificationKind,
        release_id: ReleaseId,
        message: impl Into<String>,
    ) {
        self.queue.push(Notification {
            recipient,
            kind,
            release_id,
            message: message.into(),
            created_at: Utc::now(),
        });
    }

    /// Take everything queued so far, oldest first.
    pub fn drain(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.queue)
    }

    /// Peek at the queue without draining it.
    #[must_use]
    pub fn pending(&self) -> &[Notification] {
        &self.queue
    }

    /// Number of queued notifications.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Default for Outbox {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_drain_fifo() {
        let mut outbox = Outbox::new();
        let account = AccountId::new();
        outbox.push(account, NotificationKind::ReleaseApproved, ReleaseId::new(), "first");
        outbox.push(account, NotificationKind::ReleaseRejected, ReleaseId::new(), "second");

        assert_eq!(outbox.len(), 2);
        let drained = outbox.drain();
        assert_eq!(drained[0].message, "first");
        assert_eq!(drained[1].message, "second");
        assert!(outbox.is_empty());
    }

    #[test]
    fn drain_empties_once() {
        let mut outbox = Outbox::new();
        outbox.push(
            AccountId::new(),
            NotificationKind::ReleaseApproved,
            ReleaseId::new(),
            "only",
        );
        assert_eq!(outbox.drain().len(), 1);
        assert!(outbox.drain().is_empty());
    }
}
