//! # escrowgate-approval
//!
//! **Approval Plane**: the confirmation token service, the pending-release
//! state machine, the dispute-resolution driver, and the notification
//! outbox.
//!
//! ## Architecture
//!
//! The Approval Plane sits between the API boundary and the Ledger Plane:
//! 1. **TokenService**: mints and validates short-lived, single-use
//!    confirmation tokens
//! 2. **ReleaseStore**: holds every [`PendingRelease`] ever created
//!    (releases are never deleted)
//! 3. **ReleaseManager**: the authoritative state machine — initiate,
//!    confirm, reject, payout, cancel — and the owner of the atomic unit
//!    that moves money
//! 4. **DisputeDesk**: turns dispute resolutions into pending releases
//! 5. **Outbox**: queues recipient notifications for the host to deliver
//!
//! ## Approval Flow
//!
//! ```text
//! upstream event → ReleaseManager.create() → PENDING
//! reviewer       → initiate()  → token minted (5-minute window)
//! reviewer       → confirm()   → preconditions, then one atomic unit:
//!                  APPROVED + audit entry + wallet movement
//!                  + escrow flip + fee split + notification
//! ```
//!
//! Every precondition is checked before the first mutation: a returned
//! error implies zero partial effect. The single deliberate exception is
//! the fee-split step, whose failure degrades the outcome instead of
//! rolling back the already-committed payout.
//!
//! [`PendingRelease`]: escrowgate_types::PendingRelease

pub mod disputes;
pub mod manager;
pub mod orders;
pub mod outbox;
pub mod store;
pub mod token;

pub use disputes::{DisputeDesk, DisputeOutcome};
pub use manager::{
    ApprovalOutcome, FeeLedgerOutcome, NewRelease, RejectionOutcome, ReleaseManager,
};
pub use orders::OrderStore;
pub use outbox::{Notification, NotificationKind, Outbox};
pub use store::ReleaseStore;
pub use token::TokenService;
