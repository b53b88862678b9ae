//! Live authorization
//!
//! Resolves the actor's roles from the repositories on every call and hands
//! them to [`AuthorizationEngine`]. Nothing is cached.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::domain::rbac::Role;
use crate::domain::services::{AuthorizationEngine, PermissionCheckResult};
use crate::ports::inbound::UseCaseError;
use crate::ports::outbound::{RoleRepository, UserRepository};

/// `(resource, action)` pairs guarding the use cases
pub mod permissions {
    pub type Pair = (&'static str, &'static str);

    pub const USER_CREATE: Pair = ("user", "create");
    pub const CASE_CREATE: Pair = ("case", "create");
    pub const CASE_READ: Pair = ("case", "read");
    pub const CASE_UPDATE: Pair = ("case", "update");
    pub const CASE_CLOSE: Pair = ("case", "close");
    pub const EVIDENCE_CREATE: Pair = ("evidence", "create");
    pub const EVIDENCE_READ: Pair = ("evidence", "read");
    pub const EVIDENCE_SUPERSEDE: Pair = ("evidence", "supersede");
}

/// Authorization service over the current role snapshot
pub struct AuthorizationService {
    users: Arc<dyn UserRepository>,
    roles: Arc<dyn RoleRepository>,
}

impl AuthorizationService {
    pub fn new(users: Arc<dyn UserRepository>, roles: Arc<dyn RoleRepository>) -> Self {
        Self { users, roles }
    }

    /// Roles currently assigned to an active user; empty otherwise
    pub async fn roles_of(&self, user_id: u64) -> Result<Vec<Role>, UseCaseError> {
        match self.users.find_by_id(user_id).await? {
            Some(user) if user.is_active() => Ok(self.roles.find_by_ids(user.role_ids()).await?),
            _ => Ok(Vec::new()),
        }
    }

    pub async fn check(&self, user_id: u64, resource: &str, action: &str) -> Result<PermissionCheckResult, UseCaseError> {
        let user = match self.users.find_by_id(user_id).await? {
            Some(user) => user,
            None => {
                return Ok(PermissionCheckResult::deny(format!(
                    "unknown user {user_id}; missing permission {resource}:{action}"
                )))
            }
        };
        if !user.is_active() {
            return Ok(PermissionCheckResult::deny(format!(
                "user {user_id} is inactive; missing permission {resource}:{action}"
            )));
        }

        let roles = self.roles.find_by_ids(user.role_ids()).await?;
        Ok(AuthorizationEngine::check(&roles, resource, action))
    }

    /// Turn a denial into [`UseCaseError::Forbidden`]
    pub async fn authorize(&self, user_id: u64, (resource, action): permissions::Pair) -> Result<(), UseCaseError> {
        let result = self.check(user_id, resource, action).await?;
        if result.allowed {
            Ok(())
        } else {
            Err(UseCaseError::Forbidden(
                result
                    .reason
                    .unwrap_or_else(|| format!("missing permission {resource}:{action}")),
            ))
        }
    }

    pub async fn effective_permissions(&self, user_id: u64) -> Result<BTreeSet<String>, UseCaseError> {
        let roles = self.roles_of(user_id).await?;
        Ok(AuthorizationEngine::effective_permissions(&roles))
    }
}
