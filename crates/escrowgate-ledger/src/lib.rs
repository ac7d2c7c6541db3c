//! # escrowgate-ledger
//!
//! **Ledger Plane**: durable record of wallets, wallet transactions, the
//! financial audit log, and merchant fee splits.
//!
//! ## Architecture
//!
//! 1. **WalletStore**: per-account balances as a cached projection of an
//!    append-only transaction log — every mutation appends a line with
//!    before/after snapshots in the same exclusive borrow
//! 2. **AuditLog**: one immutable entry per terminal approval decision
//! 3. **Fee split**: pure division of a trade fee into platform and
//!    merchant cuts, exact to the money scale
//! 4. **MerchantLedger**: one fee-split entry per order, ever — the
//!    idempotency guard for retried confirms
//!
//! Nothing in this crate decides anything: the Approval Plane drives it
//! and owns the atomic-unit boundaries.

pub mod audit_log;
pub mod fee_split;
pub mod ledger_entries;
pub mod wallet_store;

pub use audit_log::AuditLog;
pub use fee_split::{FeeSplit, split_fee};
pub use ledger_entries::{LedgerEntry, MerchantLedger};
pub use wallet_store::{Posting, WalletStore};
