//! Error types for the EscrowGate release engine.
//!
//! All errors use the `EG_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Release / state-machine errors
//! - 2xx: Confirmation protocol errors
//! - 3xx: Wallet / ledger errors
//! - 4xx: Dispute errors
//! - 5xx: Auth errors
//! - 6xx: Fee-ledger errors
//! - 9xx: General / internal errors

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    AccountId, ActorRole, DisputeId, DisputeStatus, OrderId, ReleaseId, ReleaseStatus,
};

/// Central error enum for all EscrowGate operations.
#[derive(Debug, Error)]
pub enum EscrowError {
    // =================================================================
    // Release / State Errors (1xx)
    // =================================================================
    /// The requested release does not exist.
    #[error("EG_ERR_100: Release not found: {0}")]
    ReleaseNotFound(ReleaseId),

    /// The release is not in a state that accepts this operation.
    /// Carries the conflicting current status so the caller can decide
    /// whether to re-initiate.
    #[error("EG_ERR_101: Operation not permitted while release is {current}")]
    InvalidReleaseState { current: ReleaseStatus },

    /// A release for this dispute already exists.
    #[error("EG_ERR_102: Release already exists for dispute {0}")]
    DuplicateRelease(DisputeId),

    /// The amount is not strictly positive.
    #[error("EG_ERR_103: Invalid amount: {0} (must be > 0)")]
    InvalidAmount(Decimal),

    /// The referenced order does not exist.
    #[error("EG_ERR_104: Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The order's escrow is not in the state this release requires.
    #[error("EG_ERR_105: Order escrow is {current}, cannot move to {target}")]
    InvalidEscrowState {
        current: crate::EscrowStatus,
        target: crate::EscrowStatus,
    },

    // =================================================================
    // Confirmation Protocol Errors (2xx)
    // =================================================================
    /// No confirmation token was presented, or none was ever issued.
    #[error("EG_ERR_200: Missing confirmation token")]
    MissingToken,

    /// The presented token does not match the outstanding one.
    #[error("EG_ERR_201: Invalid confirmation token")]
    InvalidToken,

    /// The token matched but its window has passed.
    #[error("EG_ERR_202: Confirmation token expired")]
    TokenExpired,

    // =================================================================
    // Wallet / Ledger Errors (3xx)
    // =================================================================
    /// Not enough wallet balance to perform the debit.
    #[error("EG_ERR_300: Insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Decimal, available: Decimal },

    /// A balance operation would produce a negative value.
    #[error("EG_ERR_301: Balance underflow")]
    BalanceUnderflow,

    /// The cached wallet balance disagrees with its transaction log —
    /// reconciliation invariant violated, critical safety alert.
    #[error("EG_ERR_302: Ledger drift on {account}: cached {cached}, derived {derived}")]
    LedgerDrift {
        account: AccountId,
        cached: Decimal,
        derived: Decimal,
    },

    // =================================================================
    // Dispute Errors (4xx)
    // =================================================================
    /// The requested dispute does not exist.
    #[error("EG_ERR_400: Dispute not found: {0}")]
    DisputeNotFound(DisputeId),

    /// The dispute is not in a resolvable status.
    #[error("EG_ERR_401: Dispute is {current}, not resolvable")]
    DisputeNotResolvable { current: DisputeStatus },

    /// A partial refund was requested without a resolution amount.
    #[error("EG_ERR_402: Partial refund requires a resolution amount")]
    MissingResolutionAmount,

    /// The resolution amount exceeds what is held in escrow.
    #[error("EG_ERR_403: Resolution amount {amount} exceeds escrowed {escrowed}")]
    ResolutionAmountOutOfBounds { amount: Decimal, escrowed: Decimal },

    // =================================================================
    // Auth Errors (5xx)
    // =================================================================
    /// No authenticated actor on the request.
    #[error("EG_ERR_500: Unauthenticated")]
    Unauthenticated,

    /// The actor's role does not permit this operation.
    #[error("EG_ERR_501: Forbidden for role {role}")]
    Forbidden { role: ActorRole },

    // =================================================================
    // Fee-Ledger Errors (6xx)
    // =================================================================
    /// A fee-split ledger entry already exists for this order
    /// (idempotency guard — the confirm that wrote it was retried).
    #[error("EG_ERR_600: Fee ledger entry already exists for order {0}")]
    LedgerEntryExists(OrderId),

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("EG_ERR_900: Internal error: {0}")]
    Internal(String),

    /// A request field failed boundary validation.
    #[error("EG_ERR_901: Invalid request field `{field}`: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, EscrowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = EscrowError::ReleaseNotFound(ReleaseId::new());
        let msg = format!("{err}");
        assert!(msg.starts_with("EG_ERR_100"), "Got: {msg}");
    }

    #[test]
    fn invalid_state_carries_current_status() {
        let err = EscrowError::InvalidReleaseState {
            current: ReleaseStatus::Approved,
        };
        let msg = format!("{err}");
        assert!(msg.contains("EG_ERR_101"));
        assert!(msg.contains("APPROVED"));
    }

    #[test]
    fn insufficient_balance_display() {
        let err = EscrowError::InsufficientBalance {
            needed: Decimal::new(100, 0),
            available: Decimal::new(50, 0),
        };
        let msg = format!("{err}");
        assert!(msg.contains("EG_ERR_300"));
        assert!(msg.contains("100"));
        assert!(msg.contains("50"));
    }

    #[test]
    fn all_errors_have_eg_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(EscrowError::MissingToken),
            Box::new(EscrowError::InvalidToken),
            Box::new(EscrowError::TokenExpired),
            Box::new(EscrowError::Unauthenticated),
            Box::new(EscrowError::Forbidden {
                role: ActorRole::User,
            }),
            Box::new(EscrowError::LedgerEntryExists(OrderId::new())),
            Box::new(EscrowError::Internal("test".into())),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("EG_ERR_"),
                "Error missing EG_ERR_ prefix: {msg}"
            );
        }
    }
}
