//! In-memory role snapshot with administrative operations

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::info;

use crate::domain::rbac::{Permission, RbacError, Role};
use crate::ports::outbound::{RepositoryError, RoleRepository};

/// Role repository; every read sees the latest administrative change
#[derive(Default)]
pub struct InMemoryRoleRepository {
    roles: RwLock<BTreeMap<u64, Role>>,
}

impl InMemoryRoleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot, rejecting invalid or duplicate roles
    pub fn from_snapshot(roles: Vec<Role>) -> Result<Self, RbacError> {
        let repo = Self::new();
        for role in roles {
            repo.upsert(role)?;
        }
        Ok(repo)
    }

    /// Insert or replace a role.
    ///
    /// A stored system role keeps its name and protected status.
    pub fn upsert(&self, role: Role) -> Result<(), RbacError> {
        role.validate()?;
        let mut roles = self.roles.write();

        if let Some(taken) = roles.values().find(|r| r.name() == role.name() && r.id() != role.id()) {
            return Err(RbacError::DuplicateName(taken.name().to_string()));
        }
        if let Some(existing) = roles.get(&role.id()) {
            if existing.is_system_role() && (existing.name() != role.name() || !role.is_system_role()) {
                return Err(RbacError::SystemRoleRename(existing.name().to_string()));
            }
        }

        info!(role = role.name(), permissions = role.permissions().len(), "Role stored");
        roles.insert(role.id(), role);
        Ok(())
    }

    pub fn delete(&self, role_id: u64) -> Result<Role, RbacError> {
        let mut roles = self.roles.write();
        let role = roles.get(&role_id).ok_or(RbacError::RoleNotFound(role_id))?;
        role.ensure_deletable()?;
        info!(role = role.name(), "Role deleted");
        roles.remove(&role_id).ok_or(RbacError::RoleNotFound(role_id))
    }

    pub fn grant(&self, role_id: u64, permission: Permission) -> Result<(), RbacError> {
        let mut roles = self.roles.write();
        let role = roles.get_mut(&role_id).ok_or(RbacError::RoleNotFound(role_id))?;
        info!(role = role.name(), permission = %permission.key(), "Permission granted");
        role.grant(permission);
        Ok(())
    }

    pub fn revoke(&self, role_id: u64, permission_id: u64) -> Result<Permission, RbacError> {
        let mut roles = self.roles.write();
        let role = roles.get_mut(&role_id).ok_or(RbacError::RoleNotFound(role_id))?;
        let revoked = role.revoke(permission_id)?;
        info!(role = role.name(), permission = %revoked.key(), "Permission revoked");
        Ok(revoked)
    }

    /// Remove a permission from every role holding it, all or nothing.
    ///
    /// Fails without changes if a system role would be left empty.
    pub fn remove_permission(&self, permission_id: u64) -> Result<usize, RbacError> {
        let mut roles = self.roles.write();
        let mut updated = Vec::new();
        for role in roles.values() {
            if role.permissions().iter().any(|p| p.id() == permission_id) {
                let mut next = role.clone();
                next.revoke(permission_id)?;
                updated.push(next);
            }
        }

        let count = updated.len();
        for role in updated {
            roles.insert(role.id(), role);
        }
        info!(permission_id, roles = count, "Permission removed");
        Ok(count)
    }

    pub fn len(&self) -> usize {
        self.roles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.read().is_empty()
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn find_by_id(&self, id: u64) -> Result<Option<Role>, RepositoryError> {
        Ok(self.roles.read().get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[u64]) -> Result<Vec<Role>, RepositoryError> {
        let roles = self.roles.read();
        Ok(ids.iter().filter_map(|id| roles.get(id).cloned()).collect())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, RepositoryError> {
        Ok(self.roles.read().values().find(|r| r.name() == name).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Role>, RepositoryError> {
        Ok(self.roles.read().values().cloned().collect())
    }
}
