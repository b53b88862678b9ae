//! Application layer
//!
//! Orchestrates use cases and coordinates domain objects.

pub mod authorization;
pub mod commands;
pub mod dto;

pub use authorization::{permissions, AuthorizationService};
pub use commands::{CaseService, EvidenceService, IdentityService};
pub use dto::*;
