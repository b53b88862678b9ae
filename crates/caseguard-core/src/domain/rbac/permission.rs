//! Permission entity

use serde::{Deserialize, Serialize};

use super::RbacError;

/// A grant of one action on one resource kind.
///
/// Immutable once created; matching is exact and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "PermissionData")]
pub struct Permission {
    id: u64,
    name: String,
    resource: String,
    action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

/// Wire form; goes through [`Permission::new`] on the way in
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PermissionData {
    id: u64,
    name: String,
    resource: String,
    action: String,
    #[serde(default)]
    description: Option<String>,
}

impl TryFrom<PermissionData> for Permission {
    type Error = RbacError;

    fn try_from(data: PermissionData) -> Result<Self, Self::Error> {
        let permission = Self::new(data.id, data.name, data.resource, data.action)?;
        Ok(match data.description {
            Some(description) => permission.with_description(description),
            None => permission,
        })
    }
}

impl Permission {
    pub fn new(
        id: u64,
        name: impl Into<String>,
        resource: impl Into<String>,
        action: impl Into<String>,
    ) -> Result<Self, RbacError> {
        let name = name.into();
        let resource = resource.into();
        let action = action.into();

        if name.trim().is_empty() {
            return Err(RbacError::EmptyField { field: "permission name" });
        }
        if resource.trim().is_empty() {
            return Err(RbacError::EmptyField { field: "resource" });
        }
        if action.trim().is_empty() {
            return Err(RbacError::EmptyField { field: "action" });
        }

        Ok(Self {
            id,
            name,
            resource,
            action,
            description: None,
        })
    }

    /// Shorthand naming the permission `resource:action`
    pub fn for_pair(id: u64, resource: &str, action: &str) -> Result<Self, RbacError> {
        Self::new(id, format!("{resource}:{action}"), resource, action)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn id(&self) -> u64 { self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn resource(&self) -> &str { &self.resource }
    pub fn action(&self) -> &str { &self.action }
    pub fn description(&self) -> Option<&str> { self.description.as_deref() }

    /// `resource:action`
    pub fn key(&self) -> String {
        format!("{}:{}", self.resource, self.action)
    }

    pub fn matches(&self, resource: &str, action: &str) -> bool {
        self.resource == resource && self.action == action
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_case_sensitive_match() {
        let permission = Permission::for_pair(1, "case", "read").unwrap();
        assert!(permission.matches("case", "read"));
        assert!(!permission.matches("Case", "read"));
        assert!(!permission.matches("case", "READ"));
        assert!(!permission.matches("case", "*"));
        assert_eq!(permission.key(), "case:read");
        assert_eq!(permission.name(), "case:read");
    }

    #[test]
    fn test_rejects_blank_fields() {
        assert_eq!(
            Permission::new(1, "x", " ", "read"),
            Err(RbacError::EmptyField { field: "resource" })
        );
        assert_eq!(
            Permission::new(1, "x", "case", ""),
            Err(RbacError::EmptyField { field: "action" })
        );
    }

    #[test]
    fn test_snapshot_rejects_blank_fields() {
        let json = r#"{"id":1,"name":"case:read","resource":"","action":"read"}"#;
        let err = serde_json::from_str::<Permission>(json).unwrap_err();
        assert!(err.to_string().contains("resource cannot be empty"));

        let json = r#"{"id":1,"name":"case:read","resource":"case","action":"read"}"#;
        assert_eq!(serde_json::from_str::<Permission>(json).unwrap().key(), "case:read");
    }

    #[test]
    fn test_serialized_shape() {
        let permission = Permission::for_pair(3, "evidence", "create")
            .unwrap()
            .with_description("Upload evidence");
        let json = serde_json::to_value(&permission).unwrap();
        assert_eq!(json["resource"], "evidence");
        assert_eq!(json["description"], "Upload evidence");
    }
}
