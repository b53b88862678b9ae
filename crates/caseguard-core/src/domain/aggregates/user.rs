//! User Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::{Email, Password};
use crate::domain::DomainError;

/// User aggregate root
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: u64,
    email: Email,
    full_name: String,
    password_hash: String,
    role_ids: Vec<u64>,
    is_active: bool,
    created_at: DateTime<Utc>,
    last_login_at: Option<DateTime<Utc>>,
    last_user_agent: Option<String>,
}

impl User {
    /// Register a user, hashing the already-validated password
    pub fn register(
        id: u64,
        email: Email,
        full_name: impl Into<String>,
        password: &Password,
        role_ids: Vec<u64>,
    ) -> Result<Self, DomainError> {
        let password_hash = password
            .hash()
            .map_err(|e| DomainError::Hashing(e.to_string()))?;
        Self::with_hash(id, email, full_name, password_hash, role_ids)
    }

    /// Rebuild a user around an existing credential hash
    pub fn with_hash(
        id: u64,
        email: Email,
        full_name: impl Into<String>,
        password_hash: impl Into<String>,
        mut role_ids: Vec<u64>,
    ) -> Result<Self, DomainError> {
        let full_name = full_name.into().trim().to_string();
        if full_name.is_empty() {
            return Err(DomainError::InvalidField {
                field: "fullName",
                reason: "cannot be empty".into(),
            });
        }
        role_ids.sort_unstable();
        role_ids.dedup();

        Ok(Self {
            id,
            email,
            full_name,
            password_hash: password_hash.into(),
            role_ids,
            is_active: true,
            created_at: Utc::now(),
            last_login_at: None,
            last_user_agent: None,
        })
    }

    pub fn id(&self) -> u64 { self.id }
    pub fn email(&self) -> &Email { &self.email }
    pub fn full_name(&self) -> &str { &self.full_name }
    pub fn password_hash(&self) -> &str { &self.password_hash }
    pub fn role_ids(&self) -> &[u64] { &self.role_ids }
    pub fn is_active(&self) -> bool { self.is_active }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn last_login_at(&self) -> Option<DateTime<Utc>> { self.last_login_at }
    pub fn last_user_agent(&self) -> Option<&str> { self.last_user_agent.as_deref() }

    /// New state after a successful login
    pub fn logged_in(&self, at: DateTime<Utc>, user_agent: Option<&str>) -> Self {
        let mut next = self.clone();
        next.last_login_at = Some(at);
        if let Some(agent) = user_agent {
            next.last_user_agent = Some(agent.to_string());
        }
        next
    }

    pub fn deactivated(&self) -> Self {
        let mut next = self.clone();
        next.is_active = false;
        next
    }
}

/// Open login session
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub user_id: u64,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub opened_at: DateTime<Utc>,
}

impl Session {
    pub fn open(user: &User, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user.id(),
            ip_address,
            user_agent,
            opened_at: Utc::now(),
        }
    }
}
