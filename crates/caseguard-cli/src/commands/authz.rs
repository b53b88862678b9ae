//! Authorization commands

use std::path::PathBuf;

use anyhow::{anyhow, bail};
use colored::Colorize;
use serde::Serialize;
use tabled::Tabled;

use caseguard_core::{AuthorizationEngine, Role};

use super::read_document;
use crate::config::Config;
use crate::output::{or_dash, Field, OutputFormat};
use crate::AuthzCommands;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EffectivePermissions {
    roles: Vec<String>,
    permissions: Vec<String>,
}

#[derive(Tabled)]
struct PermissionRow {
    #[tabled(rename = "Permission")]
    key: String,
}

#[derive(Clone, Serialize, Tabled)]
#[serde(rename_all = "camelCase")]
struct RoleRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Display Name")]
    display_name: String,
    #[tabled(rename = "System")]
    system: bool,
    #[tabled(rename = "Permissions")]
    permissions: usize,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&Role> for RoleRow {
    fn from(role: &Role) -> Self {
        Self {
            id: role.id(),
            name: role.name().to_string(),
            display_name: role.display_name().to_string(),
            system: role.is_system_role(),
            permissions: role.permissions().len(),
            status: match role.validate() {
                Ok(()) => "ok".into(),
                Err(e) => e.to_string(),
            },
        }
    }
}

pub async fn handle(action: AuthzCommands, config: &Config, format: OutputFormat) -> anyhow::Result<()> {
    match action {
        AuthzCommands::Check { resource, action, roles, role_names } => {
            let snapshot = load_roles(roles, config).await?;
            let held = select(&snapshot, &role_names)?;
            let result = AuthorizationEngine::check(&held, &resource, &action);

            format.print(&result, || {
                let verdict = if result.allowed { "ALLOWED".green() } else { "DENIED".red() };
                vec![
                    Field::new("permission", format!("{resource}:{action}")),
                    Field::new("verdict", verdict),
                    Field::new("granted by", or_dash(result.granted_by.as_deref())),
                    Field::new("reason", or_dash(result.reason.as_deref())),
                ]
            })
        }
        AuthzCommands::Permissions { roles, role_names } => {
            let snapshot = load_roles(roles, config).await?;
            let held = select(&snapshot, &role_names)?;
            let effective = EffectivePermissions {
                roles: held.iter().map(|r| r.name().to_string()).collect(),
                permissions: AuthorizationEngine::effective_permissions(&held).into_iter().collect(),
            };

            format.print(&effective, || {
                effective
                    .permissions
                    .iter()
                    .map(|key| PermissionRow { key: key.clone() })
                    .collect()
            })
        }
        AuthzCommands::Roles { roles } => {
            let snapshot = load_roles(roles, config).await?;
            let rows: Vec<RoleRow> = snapshot.iter().map(RoleRow::from).collect();
            format.print(&rows, || rows.clone())
        }
    }
}

async fn load_roles(path: Option<PathBuf>, config: &Config) -> anyhow::Result<Vec<Role>> {
    let path = path
        .or_else(|| config.role_snapshot.as_ref().map(PathBuf::from))
        .ok_or_else(|| anyhow!("no role snapshot: pass --roles or set role_snapshot"))?;
    read_document(&path).await
}

/// Roles held by the actor, in the order given; all roles when none are named
fn select(snapshot: &[Role], names: &[String]) -> anyhow::Result<Vec<Role>> {
    if names.is_empty() {
        return Ok(snapshot.to_vec());
    }
    let mut held = Vec::with_capacity(names.len());
    for name in names {
        match snapshot.iter().find(|r| r.name() == name) {
            Some(role) => held.push(role.clone()),
            None => bail!("role '{}' not found in snapshot", name),
        }
    }
    Ok(held)
}
