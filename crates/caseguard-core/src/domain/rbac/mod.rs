//! RBAC model
//!
//! Roles own a set of permissions; a permission is an exact
//! `(resource, action)` pair. Snapshots of both are administered
//! externally and consumed read-only by the authorization engine.

pub mod permission;
pub mod role;

pub use permission::Permission;
pub use role::Role;

/// RBAC administration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RbacError {
    #[error("{field} cannot be empty")]
    EmptyField { field: &'static str },

    #[error("system role '{0}' cannot be renamed")]
    SystemRoleRename(String),

    #[error("system role '{0}' cannot be deleted")]
    SystemRoleDelete(String),

    #[error("system role '{0}' must keep at least one permission")]
    SystemRoleEmptied(String),

    #[error("role '{role}' does not hold permission {permission_id}")]
    PermissionNotHeld { role: String, permission_id: u64 },

    #[error("role {0} not found")]
    RoleNotFound(u64),

    #[error("role name '{0}' is already taken")]
    DuplicateName(String),
}
