//! Confirmation token service.
//!
//! Gates a sensitive financial action behind a two-step human
//! confirmation: *initiate* mints a token, *confirm* must present it back
//! within the window. The token proves a human re-read the request; it is
//! not an authorization primitive — the role check at the boundary is.
//!
//! Re-initiating replaces the outstanding token, so a reviewer who changes
//! their mind cannot have the stale token replayed against them.

use chrono::{DateTime, Utc};
use escrowgate_types::constants::TOKEN_BYTES;
use escrowgate_types::{ApprovalConfig, ConfirmationToken, EscrowError, PendingRelease, Result};

/// Mints and validates confirmation tokens.
pub struct TokenService {
    ttl: chrono::Duration,
}

impl TokenService {
    /// Create a service with the configured token window.
    #[must_use]
    pub fn new(config: &ApprovalConfig) -> Self {
        Self {
            ttl: config.token_ttl(),
        }
    }

    /// Mint a fresh token issued at `now`.
    #[must_use]
    pub fn issue(&self, now: DateTime<Utc>) -> ConfirmationToken {
        let material: [u8; TOKEN_BYTES] = rand::random();
        ConfirmationToken {
            token: hex::encode(material),
            issued_at: now,
            expires_at: now + self.ttl,
        }
    }

    /// Validate a presented token against the release's outstanding one.
    /// Pure check, no side effects.
    ///
    /// Expiry is evaluated against `now` — the clock at the moment of
    /// confirm, not at initiate.
    ///
    /// # Errors
    /// - `MissingToken` if no token was ever issued for this release
    /// - `InvalidToken` if the presented string does not match
    /// - `TokenExpired` if it matches but the window has passed
    pub fn validate(release: &PendingRelease, presented: &str, now: DateTime<Utc>) -> Result<()> {
        let Some(token) = release.confirmation.as_ref() else {
            return Err(EscrowError::MissingToken);
        };
        if !token.matches(presented) {
            return Err(EscrowError::InvalidToken);
        }
        if token.is_expired(now) {
            return Err(EscrowError::TokenExpired);
        }
        Ok(())
    }
}
