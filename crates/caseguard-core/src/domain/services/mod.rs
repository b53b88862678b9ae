//! Domain services module

pub mod authorization;

pub use authorization::{AuthorizationEngine, PermissionCheckResult};
