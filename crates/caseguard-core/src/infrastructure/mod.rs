//! Infrastructure layer
//!
//! Adapters implementing the outbound ports.

pub mod messaging;
pub mod persistence;

pub use messaging::{InMemoryEventBus, TracingAuditSubscriber};
pub use persistence::{InMemoryRoleRepository, InMemoryStore};
