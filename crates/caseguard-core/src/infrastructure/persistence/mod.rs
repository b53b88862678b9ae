//! In-memory repository implementations
//!
//! Used by tests and the offline CLI; no durable storage engine is provided.

mod roles;
mod store;

pub use roles::InMemoryRoleRepository;
pub use store::InMemoryStore;
