//! System-wide constants for the EscrowGate release engine.

/// Confirmation token time-to-live in milliseconds (5 minutes).
pub const CONFIRM_TOKEN_TTL_MS: u64 = 300_000;

/// Random bytes of confirmation-token material (hex-encoded on the wire).
pub const TOKEN_BYTES: usize = 16;

/// Decimal places for money amounts.
pub const MONEY_SCALE: u32 = 2;

/// Default merchant revenue share of the platform fee, in basis points (30%).
pub const DEFAULT_MERCHANT_SHARE_BPS: i64 = 3000;

/// Maximum length accepted for reviewer notes and reasons at the boundary.
pub const MAX_NOTES_LEN: usize = 2_000;
