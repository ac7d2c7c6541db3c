//! # escrowgate-types
//!
//! Shared types, errors, and configuration for the **EscrowGate** escrow
//! release engine.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`ReleaseId`], [`AccountId`], [`OrderId`], [`DisputeId`], [`TxId`], [`AuditId`], [`LedgerEntryId`]
//! - **Release model**: [`PendingRelease`], [`ReleaseKind`], [`ReleaseStatus`], [`RecipientKind`], [`TriggerSource`], [`ConfirmationToken`]
//! - **Wallet model**: [`Wallet`], [`WalletTransaction`], [`TxDirection`], [`TxKind`]
//! - **Audit model**: [`FinancialAuditEntry`], [`AuditAction`], [`AuditOutcome`]
//! - **Order model**: [`Order`], [`EscrowStatus`], [`FeePayer`], [`SettlementChannel`]
//! - **Dispute model**: [`Dispute`], [`DisputeStatus`], [`DisputeResolution`]
//! - **Actors**: [`Actor`], [`ActorRole`], [`ClientInfo`]
//! - **Configuration**: [`EngineConfig`], [`ApprovalConfig`], [`FeeConfig`]
//! - **Errors**: [`EscrowError`] with `EG_ERR_` prefix codes

pub mod actor;
pub mod audit;
pub mod config;
pub mod constants;
pub mod dispute;
pub mod error;
pub mod ids;
pub mod order;
pub mod release;
pub mod wallet;

// Re-export all primary types at crate root for ergonomic imports:
//   use escrowgate_types::{PendingRelease, ReleaseStatus, WalletTransaction, ...};

pub use actor::*;
pub use audit::*;
pub use config::*;
pub use dispute::*;
pub use error::*;
pub use ids::*;
pub use order::*;
pub use release::*;
pub use wallet::*;

// Constants are accessed via `escrowgate_types::constants::FOO`
// (not re-exported to avoid name collisions).
