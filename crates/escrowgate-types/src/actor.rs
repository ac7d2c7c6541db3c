//! Actor identity as resolved by the external auth collaborator.
//!
//! This subsystem never authenticates anyone; it consumes the resolved
//! `{actor_id, role}` pair and enforces the role requirement on approval
//! operations.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::AccountId;

/// Role claim attached to an authenticated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorRole {
    Admin,
    Moderator,
    User,
}

impl ActorRole {
    /// Approval operations (initiate/confirm/reject) require ADMIN or
    /// MODERATOR.
    #[must_use]
    pub fn can_review(&self) -> bool {
        matches!(self, Self::Admin | Self::Moderator)
    }
}

impl std::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "ADMIN"),
            Self::Moderator => write!(f, "MODERATOR"),
            Self::User => write!(f, "USER"),
        }
    }
}

/// An authenticated actor performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: AccountId,
    pub role: ActorRole,
}

/// Client session details captured into the audit trail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub ip_address: Option<IpAddr>,
    pub user_agent: Option<String>,
}
