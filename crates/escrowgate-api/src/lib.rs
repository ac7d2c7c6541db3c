//! # escrowgate-api
//!
//! The externally visible contract of the release engine, transport-
//! agnostic: strongly-typed request structs validated at the boundary, and
//! a role-gated service facade over the Approval Plane.
//!
//! Identity and authorization come from an external auth collaborator;
//! requests carry the resolved `{actor_id, role}` pair (or nothing, which
//! fails `Unauthenticated` before any domain logic runs). Unknown or
//! malformed request fields are rejected at deserialization — never
//! silently defaulted.

pub mod requests;
pub mod service;

pub use requests::{
    ConfirmApprovalRequest, ConfirmApprovalResponse, InitiateApprovalRequest,
    InitiateApprovalResponse, LedgerStepStatus, RejectReleaseRequest, RejectReleaseResponse,
    ResolveDisputeRequest, ResolveDisputeResponse,
};
pub use service::ApprovalService;
