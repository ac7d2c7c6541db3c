//! Configuration types for the EscrowGate engine.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants;

/// Confirmation-protocol configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalConfig {
    /// Confirmation token time-to-live in milliseconds.
    pub token_ttl_ms: u64,
}

impl ApprovalConfig {
    /// The token TTL as a chrono duration.
    #[must_use]
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(i64::try_from(self.token_ttl_ms).unwrap_or(i64::MAX))
    }
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            token_ttl_ms: constants::CONFIRM_TOKEN_TTL_MS,
        }
    }
}

/// Fee-split configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeConfig {
    /// Merchant revenue share of the platform fee, as a percentage
    /// (e.g. `30.00` for 30%). Bounded to `0..=100`.
    pub merchant_share_pct: Decimal,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            // basis points -> percent with money scale
            merchant_share_pct: Decimal::new(constants::DEFAULT_MERCHANT_SHARE_BPS, 2),
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub approval: ApprovalConfig,
    pub fees: FeeConfig,
}
