//! Authorization Engine
//!
//! Role-based access decisions over exact `(resource, action)` pairs.
//!
//! The engine holds no state: the effective permission set is recomputed
//! from the roles passed in on every call, so a revocation applies to the
//! very next check.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::rbac::Role;

/// Outcome of a permission check.
///
/// A denial is an expected result, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionCheckResult {
    pub allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Name of the first role (in input order) holding the permission
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granted_by: Option<String>,
}

impl PermissionCheckResult {
    fn allow(role: &Role) -> Self {
        Self {
            allowed: true,
            reason: None,
            granted_by: Some(role.name().to_string()),
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
            granted_by: None,
        }
    }
}

/// Stateless RBAC decision procedure
pub struct AuthorizationEngine;

impl AuthorizationEngine {
    /// Decide whether any of `roles` grants `(resource, action)`.
    ///
    /// Deterministic and side-effect free apart from tracing. A system role
    /// with no permissions is a configuration error and contributes nothing.
    pub fn check(roles: &[Role], resource: &str, action: &str) -> PermissionCheckResult {
        if roles.is_empty() {
            tracing::warn!(resource, action, "permission denied: no roles assigned");
            return PermissionCheckResult::deny(format!(
                "no roles assigned; missing permission {resource}:{action}"
            ));
        }

        let mut misconfigured = Vec::new();
        for role in roles {
            if role.validate().is_err() {
                misconfigured.push(role.name());
                continue;
            }
            if role.grants(resource, action) {
                tracing::debug!(resource, action, role = role.name(), "permission granted");
                return PermissionCheckResult::allow(role);
            }
        }

        let mut reason = format!("missing permission {resource}:{action}");
        if !misconfigured.is_empty() {
            tracing::warn!(
                roles = ?misconfigured,
                "system role without permissions ignored"
            );
            reason.push_str(&format!(
                "; misconfigured system role(s) without permissions: {}",
                misconfigured.join(", ")
            ));
        }

        tracing::warn!(resource, action, "permission denied");
        PermissionCheckResult::deny(reason)
    }

    /// Union of `resource:action` keys granted by well-formed roles
    pub fn effective_permissions(roles: &[Role]) -> BTreeSet<String> {
        roles
            .iter()
            .filter(|role| role.validate().is_ok())
            .flat_map(|role| role.permissions().iter().map(|p| p.key()))
            .collect()
    }

    /// Allowed only if every `(resource, action)` pair is granted
    pub fn check_all(roles: &[Role], requests: &[(&str, &str)]) -> PermissionCheckResult {
        let mut granted_by = None;
        for (resource, action) in requests {
            let result = Self::check(roles, resource, action);
            if !result.allowed {
                return result;
            }
            granted_by = granted_by.or(result.granted_by);
        }
        PermissionCheckResult {
            allowed: !requests.is_empty(),
            reason: requests.is_empty().then(|| "no permissions requested".to_string()),
            granted_by,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rbac::Permission;
    use proptest::prelude::*;

    fn perm(id: u64, resource: &str, action: &str) -> Permission {
        Permission::for_pair(id, resource, action).unwrap()
    }

    fn viewer() -> Role {
        Role::new(10, "viewer", "Viewer")
            .unwrap()
            .with_permissions(vec![perm(1, "case", "read"), perm(2, "evidence", "read")])
            .unwrap()
    }

    fn editor() -> Role {
        Role::new(11, "editor", "Editor")
            .unwrap()
            .with_permissions(vec![perm(3, "case", "update")])
            .unwrap()
    }

    #[test]
    fn test_read_allowed_delete_denied() {
        let roles = vec![viewer()];

        let read = AuthorizationEngine::check(&roles, "case", "read");
        assert!(read.allowed);
        assert_eq!(read.granted_by.as_deref(), Some("viewer"));
        assert!(read.reason.is_none());

        let delete = AuthorizationEngine::check(&roles, "case", "delete");
        assert!(!delete.allowed);
        assert!(delete.reason.unwrap().contains("case:delete"));
    }

    #[test]
    fn test_zero_roles_denied() {
        let result = AuthorizationEngine::check(&[], "case", "read");
        assert!(!result.allowed);
        assert!(result.reason.unwrap().contains("no roles assigned"));
    }

    #[test]
    fn test_union_of_roles() {
        let roles = vec![viewer(), editor()];
        assert!(AuthorizationEngine::check(&roles, "case", "update").allowed);
        assert!(AuthorizationEngine::check(&roles, "evidence", "read").allowed);
        assert_eq!(
            AuthorizationEngine::effective_permissions(&roles).into_iter().collect::<Vec<_>>(),
            vec!["case:read", "case:update", "evidence:read"]
        );
    }

    #[test]
    fn test_no_wildcards_or_case_folding() {
        let roles = vec![Role::new(1, "odd", "Odd")
            .unwrap()
            .with_permissions(vec![perm(1, "*", "*")])
            .unwrap()];
        assert!(!AuthorizationEngine::check(&roles, "case", "read").allowed);
        assert!(!AuthorizationEngine::check(&[viewer()], "Case", "read").allowed);
    }

    #[test]
    fn test_empty_system_role_grants_nothing() {
        let json = r#"{"id":1,"name":"admin","displayName":"Administrator","isSystemRole":true}"#;
        let broken: Role = serde_json::from_str(json).unwrap();
        let result = AuthorizationEngine::check(&[broken], "case", "read");
        assert!(!result.allowed);
        assert!(result.reason.unwrap().contains("misconfigured system role(s) without permissions: admin"));
    }

    #[test]
    fn test_revocation_applies_on_next_check() {
        let mut role = viewer();
        assert!(AuthorizationEngine::check(std::slice::from_ref(&role), "case", "read").allowed);
        role.revoke(1).unwrap();
        assert!(!AuthorizationEngine::check(std::slice::from_ref(&role), "case", "read").allowed);
    }

    #[test]
    fn test_check_all() {
        let roles = vec![viewer(), editor()];
        assert!(AuthorizationEngine::check_all(&roles, &[("case", "read"), ("case", "update")]).allowed);
        let denied = AuthorizationEngine::check_all(&roles, &[("case", "read"), ("case", "delete")]);
        assert!(!denied.allowed);
        assert!(!AuthorizationEngine::check_all(&roles, &[]).allowed);
    }

    #[test]
    fn test_result_wire_shape() {
        let denied = AuthorizationEngine::check(&[viewer()], "case", "delete");
        let json = serde_json::to_value(&denied).unwrap();
        assert_eq!(json["allowed"], false);
        assert!(json.get("grantedBy").is_none());
        assert!(json["reason"].as_str().unwrap().contains("case:delete"));
    }

    proptest! {
        #[test]
        fn check_is_deterministic(
            grants in proptest::collection::vec(("[a-c]{1,2}", "[r-u]{1,2}"), 0..6),
            resource in "[a-c]{1,2}",
            action in "[r-u]{1,2}",
        ) {
            let permissions = grants
                .iter()
                .enumerate()
                .map(|(i, (r, a))| Permission::for_pair(i as u64, r, a).unwrap())
                .collect();
            let roles = vec![Role::new(1, "generated", "Generated").unwrap().with_permissions(permissions).unwrap()];

            let first = AuthorizationEngine::check(&roles, &resource, &action);
            let second = AuthorizationEngine::check(&roles, &resource, &action);
            prop_assert_eq!(&first, &second);

            let expected = grants.iter().any(|(r, a)| r == &resource && a == &action);
            prop_assert_eq!(first.allowed, expected);
        }
    }
}
