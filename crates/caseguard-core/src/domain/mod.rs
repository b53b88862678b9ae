//! Domain module
//!
//! Contains all domain logic following DDD principles.

pub mod value_objects;
pub mod rbac;
pub mod aggregates;
pub mod events;
pub mod services;

pub use value_objects::*;
pub use rbac::*;
pub use aggregates::*;
pub use events::*;
pub use services::*;

/// Errors raised when an entity invariant would be broken
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("invalid field '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("evidence of type '{0}' requires a file")]
    FileRequired(String),

    #[error("evidence must carry a file or content")]
    EmptyEvidence,

    #[error("evidence {0} is immutable")]
    EvidenceImmutable(u64),

    #[error("case {0} is closed; only reopening is allowed")]
    CaseClosed(u64),

    #[error("no changes to apply")]
    NoChanges,

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}
