//! Inbound ports (Use case traits)
//!
//! Hexagonal architecture: application service interfaces. Every
//! state-changing use case authorizes the actor first; a denial surfaces
//! as [`UseCaseError::Forbidden`] and nothing is written.

use async_trait::async_trait;
use thiserror::Error;

use crate::application::dto::*;
use crate::domain::aggregates::{Case, Evidence, User};
use crate::domain::DomainError;
use crate::ports::outbound::RepositoryError;

/// Identity use cases
#[async_trait]
pub trait IdentityUseCases: Send + Sync {
    /// Register a user. `actor` is `None` for self-registration.
    async fn register_user(&self, actor: Option<u64>, command: RegisterUserCommand) -> Result<User, UseCaseError>;

    /// Record a login for an already authenticated user
    async fn record_login(&self, command: LoginCommand) -> Result<LoginOutcome, UseCaseError>;

    /// Close a session
    async fn record_logout(&self, user_id: u64, session_id: &str) -> Result<(), UseCaseError>;
}

/// Case management use cases
#[async_trait]
pub trait CaseUseCases: Send + Sync {
    async fn create_case(&self, actor: u64, command: CreateCaseCommand) -> Result<Case, UseCaseError>;

    async fn update_case(&self, actor: u64, command: UpdateCaseCommand) -> Result<Case, UseCaseError>;

    async fn get_case(&self, actor: u64, case_id: u64) -> Result<Case, UseCaseError>;
}

/// Evidence custody use cases
#[async_trait]
pub trait EvidenceUseCases: Send + Sync {
    async fn upload_evidence(&self, actor: u64, command: UploadEvidenceCommand) -> Result<Evidence, UseCaseError>;

    /// Store a correcting record; the original is kept
    async fn supersede_evidence(&self, actor: u64, command: SupersedeEvidenceCommand) -> Result<Evidence, UseCaseError>;

    async fn list_evidence(&self, actor: u64, case_id: u64) -> Result<Vec<Evidence>, UseCaseError>;
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum UseCaseError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
