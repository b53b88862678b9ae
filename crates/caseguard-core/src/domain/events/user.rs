//! User lifecycle events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::AggregateId;
use crate::domain::aggregates::User;

/// A user account was created. Never carries the credential hash.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRegistered {
    pub user_id: u64,
    pub email: String,
    pub full_name: String,
    pub role_ids: Vec<u64>,
    /// `None` for self-registration
    pub registered_by: Option<u64>,
    pub occurred_at: DateTime<Utc>,
}

impl UserRegistered {
    pub fn from_entity(user: &User, registered_by: Option<u64>) -> Self {
        Self {
            user_id: user.id(),
            email: user.email().to_string(),
            full_name: user.full_name().to_string(),
            role_ids: user.role_ids().to_vec(),
            registered_by,
            occurred_at: Utc::now(),
        }
    }

    pub fn aggregate_id(&self) -> AggregateId {
        AggregateId::user(self.user_id)
    }
}

/// A user authenticated and a session was opened
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLoggedIn {
    pub user_id: u64,
    pub email: String,
    pub session_id: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl UserLoggedIn {
    pub fn from_entity(
        user: &User,
        session_id: impl Into<String>,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Self {
        Self {
            user_id: user.id(),
            email: user.email().to_string(),
            session_id: session_id.into(),
            ip_address,
            user_agent,
            occurred_at: Utc::now(),
        }
    }

    pub fn aggregate_id(&self) -> AggregateId {
        AggregateId::user(self.user_id)
    }

    pub fn session_aggregate_id(&self) -> AggregateId {
        AggregateId::session(&self.session_id)
    }

    /// True when no previous user-agent is known or it differs from this one
    pub fn is_new_device(&self, previous_user_agent: Option<&str>) -> bool {
        match previous_user_agent {
            None => true,
            Some(previous) => self.user_agent.as_deref() != Some(previous),
        }
    }
}

/// A session was closed
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLoggedOut {
    pub user_id: u64,
    pub session_id: String,
    pub occurred_at: DateTime<Utc>,
}

impl UserLoggedOut {
    pub fn from_entity(user: &User, session_id: impl Into<String>) -> Self {
        Self {
            user_id: user.id(),
            session_id: session_id.into(),
            occurred_at: Utc::now(),
        }
    }

    pub fn aggregate_id(&self) -> AggregateId {
        AggregateId::user(self.user_id)
    }

    pub fn session_aggregate_id(&self) -> AggregateId {
        AggregateId::session(&self.session_id)
    }
}
