//! CaseGuard Core
//!
//! Authorization and audit-integrity core of the case-management platform,
//! following Domain-Driven Design and a hexagonal layout.
//!
//! ## Architecture
//!
//! - **Domain Layer**: value objects, RBAC model, aggregates, domain events
//! - **Audit Layer**: append-only, hash-chained ledger contract
//! - **Application Layer**: use case orchestration, commands
//! - **Ports Layer**: hexagonal architecture interfaces
//! - **Infrastructure Layer**: in-memory adapters
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  use case: authorize ─► validate/construct ─► build ONE event    │
//! │                                                  │               │
//! │                         AggregateStore::commit(mutation, event)  │
//! │                         (state change + ledger append, atomic)   │
//! │                                                  │               │
//! │                         EventPublisher ─► subscribers by name    │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//!
//! - Authorization is a pure function of the current role/permission state.
//! - Value objects validate on every construction and never mutate.
//! - Evidence is immutable once persisted; corrections supersede.
//! - Events are append-only and never mutated after emission.

#![warn(clippy::all)]

pub mod domain;
pub mod audit;
pub mod application;
pub mod ports;
pub mod infrastructure;
pub mod config;
pub mod error;

pub use domain::value_objects::{
    Email, EmailError, EvidenceType, EvidenceTypeError, Password, PasswordError,
    PasswordStrength,
};
pub use domain::rbac::{Permission, Role, RbacError};
pub use domain::aggregates::{Case, CaseChanges, CaseStatus, Evidence, NewEvidence, Session, User};
pub use domain::events::{AggregateId, DomainEvent, EventError};
pub use domain::services::{AuthorizationEngine, PermissionCheckResult};
pub use audit::{AuditError, AuditRecord, AuditTrail, IntegrityReport};
pub use application::{AuthorizationService, CaseService, EvidenceService, IdentityService};
pub use ports::inbound::{CaseUseCases, EvidenceUseCases, IdentityUseCases, UseCaseError};
pub use ports::outbound::{AggregateStore, EventPublisher, Mutation, RepositoryError};
pub use config::CoreConfig;
pub use error::{CaseguardError, CaseguardResult};
