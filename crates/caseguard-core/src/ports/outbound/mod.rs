//! Outbound ports (Repository traits)
//!
//! Hexagonal architecture: these are the interfaces that infrastructure must implement.
//! Reads go through the repositories; every write goes through
//! [`AggregateStore::commit`] together with the event that describes it.

use async_trait::async_trait;
use thiserror::Error;

use crate::audit::{AuditError, AuditRecord};
use crate::domain::aggregates::{Case, Evidence, Session, User};
use crate::domain::events::DomainEvent;
use crate::domain::rbac::Role;
use crate::domain::value_objects::Email;

/// Role snapshot port
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Find role by ID
    async fn find_by_id(&self, id: u64) -> Result<Option<Role>, RepositoryError>;

    /// Find roles by ID; unknown ids are skipped
    async fn find_by_ids(&self, ids: &[u64]) -> Result<Vec<Role>, RepositoryError>;

    /// Find role by unique name
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, RepositoryError>;

    /// All roles
    async fn find_all(&self) -> Result<Vec<Role>, RepositoryError>;
}

/// User read port
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: u64) -> Result<Option<User>, RepositoryError>;

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// Open session by id
    async fn find_session(&self, session_id: &str) -> Result<Option<Session>, RepositoryError>;
}

/// Case read port
#[async_trait]
pub trait CaseRepository: Send + Sync {
    async fn find_by_id(&self, id: u64) -> Result<Option<Case>, RepositoryError>;
}

/// Evidence read port. There is no write method; records are inserted
/// once through [`AggregateStore::commit`].
#[async_trait]
pub trait EvidenceRepository: Send + Sync {
    async fn find_by_id(&self, id: u64) -> Result<Option<Evidence>, RepositoryError>;

    /// Evidence of a case, oldest first
    async fn find_by_case(&self, case_id: u64) -> Result<Vec<Evidence>, RepositoryError>;
}

/// Aggregate kinds with store-issued ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateKind {
    User,
    Case,
    Evidence,
}

/// State change committed together with its event
#[derive(Debug, Clone)]
pub enum Mutation {
    /// Insert or replace a user
    PutUser(User),
    /// Record a login: new user state plus the opened session
    Login { user: User, session: Session },
    /// Close a session
    Logout { session_id: String },
    /// Insert or replace a case
    PutCase(Case),
    /// Insert a new evidence record; existing ids are never overwritten
    InsertEvidence(Evidence),
}

/// Unit of work: state change and ledger append succeed or fail together
#[async_trait]
pub trait AggregateStore: Send + Sync {
    /// Issue a fresh id; ids are never reused
    async fn next_id(&self, kind: AggregateKind) -> Result<u64, RepositoryError>;

    /// Apply `mutation` and append `event` atomically
    async fn commit(&self, mutation: Mutation, event: DomainEvent) -> Result<AuditRecord, RepositoryError>;
}

/// Event publisher port
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish committed domain events
    async fn publish(&self, events: Vec<DomainEvent>) -> Result<(), RepositoryError>;
}

/// Event consumer routed by event name
#[async_trait]
pub trait EventSubscriber: Send + Sync {
    /// Subscriber name for diagnostics
    fn name(&self) -> &str;

    /// Event names this subscriber wants
    fn event_names(&self) -> Vec<&'static str>;

    async fn handle(&self, event: &DomainEvent) -> Result<(), RepositoryError>;
}

/// Repository error type
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RepositoryError {
    #[error("entity not found: {0}")]
    NotFound(String),

    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    #[error("{0} is immutable")]
    Immutable(String),

    #[error("commit rejected: {0}")]
    Conflict(String),

    #[error("audit append failed: {0}")]
    Audit(#[from] AuditError),

    #[error("publish failed: {0}")]
    Publish(String),
}
