//! Error types for CaseGuard

use thiserror::Error;

use crate::audit::AuditError;
use crate::domain::events::EventError;
use crate::domain::rbac::RbacError;
use crate::domain::value_objects::{EmailError, EvidenceTypeError, PasswordError};
use crate::domain::DomainError;
use crate::ports::inbound::UseCaseError;
use crate::ports::outbound::RepositoryError;

/// CaseGuard error type
#[derive(Error, Debug)]
pub enum CaseguardError {
    /// Invalid email
    #[error("invalid email: {0}")]
    Email(#[from] EmailError),

    /// Password policy violation
    #[error("invalid password: {0}")]
    Password(#[from] PasswordError),

    /// Unknown evidence type or rejected upload
    #[error("invalid evidence: {0}")]
    EvidenceType(#[from] EvidenceTypeError),

    /// RBAC administration error
    #[error("rbac error: {0}")]
    Rbac(#[from] RbacError),

    /// Entity invariant violation
    #[error("invariant violation: {0}")]
    Domain(#[from] DomainError),

    /// Event payload error
    #[error("event error: {0}")]
    Event(#[from] EventError),

    /// Audit ledger error
    #[error("audit error: {0}")]
    Audit(#[from] AuditError),

    /// Outbound port error
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Use case rejected
    #[error("use case error: {0}")]
    UseCase(#[from] UseCaseError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),
}

/// Result type for CaseGuard
pub type CaseguardResult<T> = Result<T, CaseguardError>;
