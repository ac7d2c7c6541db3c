//! Fee-split computation.
//!
//! Pure: divides a trade's platform fee between the platform and the
//! partner merchant such that `platform_cut + merchant_cut == fee_amount`
//! exactly. The merchant cut rounds *down* to the money scale; any
//! remainder from the division goes to the platform, so no sub-cent value
//! is ever minted or lost.

use escrowgate_types::constants::MONEY_SCALE;
use escrowgate_types::{EscrowError, Result};
use rust_decimal::{Decimal, RoundingStrategy};

/// How one trade's fee divides between the stakeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSplit {
    pub platform_cut: Decimal,
    pub merchant_cut: Decimal,
}

impl FeeSplit {
    /// Total of both cuts; always equals the input fee.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.platform_cut + self.merchant_cut
    }
}

/// Split `fee_amount` according to the merchant's revenue-share percentage.
///
/// # Errors
/// Returns `InvalidAmount` if the fee is negative or the share percentage
/// falls outside `0..=100`.
pub fn split_fee(fee_amount: Decimal, merchant_share_pct: Decimal) -> Result<FeeSplit> {
    if fee_amount < Decimal::ZERO {
        return Err(EscrowError::InvalidAmount(fee_amount));
    }
    if merchant_share_pct < Decimal::ZERO || merchant_share_pct > Decimal::ONE_HUNDRED {
        return Err(EscrowError::InvalidAmount(merchant_share_pct));
    }

    let merchant_cut = (fee_amount * merchant_share_pct / Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::ToZero);
    let platform_cut = fee_amount - merchant_cut;

    Ok(FeeSplit {
        platform_cut,
        merchant_cut,
    })
}
