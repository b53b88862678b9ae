//! Role entity

use serde::{Deserialize, Serialize};

use super::{Permission, RbacError};

/// A named set of permissions.
///
/// System roles cannot be renamed or deleted and their permission set
/// can never become empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RoleData")]
pub struct Role {
    id: u64,
    name: String,
    display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default)]
    is_system_role: bool,
    #[serde(default)]
    permissions: Vec<Permission>,
}

/// Wire form. Field checks run on the way in; the system-role invariant is
/// left to [`Role::validate`] so a snapshot can still be inspected.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoleData {
    id: u64,
    name: String,
    display_name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    is_system_role: bool,
    #[serde(default)]
    permissions: Vec<Permission>,
}

impl TryFrom<RoleData> for Role {
    type Error = RbacError;

    fn try_from(data: RoleData) -> Result<Self, Self::Error> {
        let mut role = Self::new(data.id, data.name, data.display_name)?;
        role.description = data.description;
        role.is_system_role = data.is_system_role;
        for permission in data.permissions {
            role.grant(permission);
        }
        Ok(role)
    }
}

impl Role {
    /// Create a custom (administrable) role
    pub fn new(
        id: u64,
        name: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Result<Self, RbacError> {
        let name = name.into();
        let display_name = display_name.into();
        if name.trim().is_empty() {
            return Err(RbacError::EmptyField { field: "role name" });
        }
        if display_name.trim().is_empty() {
            return Err(RbacError::EmptyField { field: "display name" });
        }
        Ok(Self {
            id,
            name,
            display_name,
            description: None,
            is_system_role: false,
            permissions: Vec::new(),
        })
    }

    /// Create a protected system role; it must start with permissions
    pub fn system(
        id: u64,
        name: impl Into<String>,
        display_name: impl Into<String>,
        permissions: Vec<Permission>,
    ) -> Result<Self, RbacError> {
        let mut role = Self::new(id, name, display_name)?;
        role.is_system_role = true;
        role.replace_permissions(permissions)?;
        Ok(role)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_permissions(mut self, permissions: Vec<Permission>) -> Result<Self, RbacError> {
        self.replace_permissions(permissions)?;
        Ok(self)
    }

    pub fn id(&self) -> u64 { self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn display_name(&self) -> &str { &self.display_name }
    pub fn description(&self) -> Option<&str> { self.description.as_deref() }
    pub fn is_system_role(&self) -> bool { self.is_system_role }
    pub fn permissions(&self) -> &[Permission] { &self.permissions }

    /// Whether this role directly holds `(resource, action)`
    pub fn grants(&self, resource: &str, action: &str) -> bool {
        self.permissions.iter().any(|p| p.matches(resource, action))
    }

    /// Add a permission; a permission id already held is a no-op
    pub fn grant(&mut self, permission: Permission) {
        if !self.permissions.iter().any(|p| p.id() == permission.id()) {
            self.permissions.push(permission);
        }
    }

    /// Remove a permission by id
    pub fn revoke(&mut self, permission_id: u64) -> Result<Permission, RbacError> {
        let index = self
            .permissions
            .iter()
            .position(|p| p.id() == permission_id)
            .ok_or_else(|| RbacError::PermissionNotHeld {
                role: self.name.clone(),
                permission_id,
            })?;

        if self.is_system_role && self.permissions.len() == 1 {
            return Err(RbacError::SystemRoleEmptied(self.name.clone()));
        }

        Ok(self.permissions.remove(index))
    }

    /// Replace the whole permission set (deduplicated by id)
    pub fn replace_permissions(&mut self, permissions: Vec<Permission>) -> Result<(), RbacError> {
        if self.is_system_role && permissions.is_empty() {
            return Err(RbacError::SystemRoleEmptied(self.name.clone()));
        }
        self.permissions.clear();
        for permission in permissions {
            self.grant(permission);
        }
        Ok(())
    }

    pub fn rename(&mut self, name: impl Into<String>) -> Result<(), RbacError> {
        if self.is_system_role {
            return Err(RbacError::SystemRoleRename(self.name.clone()));
        }
        let name = name.into();
        if name.trim().is_empty() {
            return Err(RbacError::EmptyField { field: "role name" });
        }
        self.name = name;
        Ok(())
    }

    pub fn set_display_name(&mut self, display_name: impl Into<String>) -> Result<(), RbacError> {
        let display_name = display_name.into();
        if display_name.trim().is_empty() {
            return Err(RbacError::EmptyField { field: "display name" });
        }
        self.display_name = display_name;
        Ok(())
    }

    pub fn ensure_deletable(&self) -> Result<(), RbacError> {
        if self.is_system_role {
            return Err(RbacError::SystemRoleDelete(self.name.clone()));
        }
        Ok(())
    }

    /// Check the invariants on a role loaded from an external snapshot
    pub fn validate(&self) -> Result<(), RbacError> {
        if self.is_system_role && self.permissions.is_empty() {
            return Err(RbacError::SystemRoleEmptied(self.name.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perm(id: u64, resource: &str, action: &str) -> Permission {
        Permission::for_pair(id, resource, action).unwrap()
    }

    #[test]
    fn test_grant_is_set_semantics() {
        let mut role = Role::new(1, "investigator", "Investigator").unwrap();
        role.grant(perm(1, "case", "read"));
        role.grant(perm(1, "case", "read"));
        role.grant(perm(2, "case", "update"));
        assert_eq!(role.permissions().len(), 2);
        assert!(role.grants("case", "update"));
        assert!(!role.grants("case", "delete"));
    }

    #[test]
    fn test_system_role_cannot_be_emptied() {
        let mut admin = Role::system(1, "admin", "Administrator", vec![perm(1, "case", "read")]).unwrap();
        assert_eq!(admin.revoke(1), Err(RbacError::SystemRoleEmptied("admin".into())));
        assert_eq!(
            admin.replace_permissions(vec![]),
            Err(RbacError::SystemRoleEmptied("admin".into()))
        );
        assert!(Role::system(2, "auditor", "Auditor", vec![]).is_err());
    }

    #[test]
    fn test_system_role_protected_from_rename_and_delete() {
        let mut admin = Role::system(1, "admin", "Administrator", vec![perm(1, "case", "read")]).unwrap();
        assert!(admin.rename("root").is_err());
        assert!(admin.ensure_deletable().is_err());
        assert!(admin.set_display_name("Admins").is_ok());
    }

    #[test]
    fn test_custom_role_lifecycle() {
        let mut role = Role::new(5, "clerk", "Clerk")
            .unwrap()
            .with_permissions(vec![perm(1, "case", "read")])
            .unwrap();
        assert_eq!(role.revoke(1).unwrap().key(), "case:read");
        assert!(role.permissions().is_empty());
        assert!(role.validate().is_ok());
        assert!(role.rename("records-clerk").is_ok());
        assert!(role.ensure_deletable().is_ok());
        assert!(matches!(role.revoke(9), Err(RbacError::PermissionNotHeld { .. })));
    }

    #[test]
    fn test_snapshot_validation() {
        let json = r#"{"id":1,"name":"admin","displayName":"Administrator","isSystemRole":true,"permissions":[]}"#;
        let role: Role = serde_json::from_str(json).unwrap();
        assert_eq!(role.validate(), Err(RbacError::SystemRoleEmptied("admin".into())));

        let blank = r#"{"id":2,"name":" ","displayName":"Nobody"}"#;
        let err = serde_json::from_str::<Role>(blank).unwrap_err();
        assert!(err.to_string().contains("role name cannot be empty"));

        let blank_permission = r#"{"id":3,"name":"clerk","displayName":"Clerk","permissions":[{"id":1,"name":"x","resource":"case","action":" "}]}"#;
        assert!(serde_json::from_str::<Role>(blank_permission).is_err());
    }
}
