//! Domain Events
//!
//! Closed family of immutable records describing every state change to
//! users, cases and evidence. Events are:
//! - Immutable records of past occurrences, named in past tense
//! - Tagged by a literal `eventType`, which is also the routing key
//! - Correlated to one primary aggregate (`"<kind>-<id>"`)
//! - Serialized to a flat, round-trippable JSON payload

mod user;
mod case;
mod evidence;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

pub use user::{UserLoggedIn, UserLoggedOut, UserRegistered};
pub use case::{CaseCreated, CaseUpdated};
pub use evidence::{EvidenceMetadata, EvidenceSuperseded, EvidenceUploaded};

/// Kinds of aggregate an event can correlate to
pub const AGGREGATE_KINDS: &[&str] = &["user", "case", "evidence", "session"];

/// Canonical aggregate correlation key, e.g. `case-42`
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AggregateId(String);

impl AggregateId {
    pub fn user(id: u64) -> Self {
        Self(format!("user-{id}"))
    }

    pub fn case(id: u64) -> Self {
        Self(format!("case-{id}"))
    }

    pub fn evidence(id: u64) -> Self {
        Self(format!("evidence-{id}"))
    }

    pub fn session(id: &str) -> Self {
        Self(format!("session-{id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Aggregate kind (`user`, `case`, ...)
    pub fn kind(&self) -> &str {
        self.0.split_once('-').map(|(kind, _)| kind).unwrap_or_default()
    }
}

impl FromStr for AggregateId {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('-') {
            Some((kind, id)) if AGGREGATE_KINDS.contains(&kind) && !id.is_empty() => {
                Ok(Self(format!("{kind}-{id}")))
            }
            _ => Err(EventError::InvalidAggregateId(s.to_string())),
        }
    }
}

impl TryFrom<String> for AggregateId {
    type Error = EventError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AggregateId> for String {
    fn from(id: AggregateId) -> Self {
        id.0
    }
}

impl fmt::Display for AggregateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// All domain events, keyed by `eventType`.
///
/// Match exhaustively: adding a variant must break every subscriber that
/// does not handle it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "eventType")]
pub enum DomainEvent {
    UserRegistered(UserRegistered),
    UserLoggedIn(UserLoggedIn),
    UserLoggedOut(UserLoggedOut),
    CaseCreated(CaseCreated),
    CaseUpdated(CaseUpdated),
    EvidenceUploaded(EvidenceUploaded),
    EvidenceSuperseded(EvidenceSuperseded),
}

impl DomainEvent {
    /// Every event name, in declaration order
    pub const NAMES: [&'static str; 7] = [
        "UserRegistered",
        "UserLoggedIn",
        "UserLoggedOut",
        "CaseCreated",
        "CaseUpdated",
        "EvidenceUploaded",
        "EvidenceSuperseded",
    ];

    /// Literal `eventType`, used as the subscriber routing key
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::UserRegistered(_) => "UserRegistered",
            Self::UserLoggedIn(_) => "UserLoggedIn",
            Self::UserLoggedOut(_) => "UserLoggedOut",
            Self::CaseCreated(_) => "CaseCreated",
            Self::CaseUpdated(_) => "CaseUpdated",
            Self::EvidenceUploaded(_) => "EvidenceUploaded",
            Self::EvidenceSuperseded(_) => "EvidenceSuperseded",
        }
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            Self::UserRegistered(e) => e.occurred_at,
            Self::UserLoggedIn(e) => e.occurred_at,
            Self::UserLoggedOut(e) => e.occurred_at,
            Self::CaseCreated(e) => e.occurred_at,
            Self::CaseUpdated(e) => e.occurred_at,
            Self::EvidenceUploaded(e) => e.occurred_at,
            Self::EvidenceSuperseded(e) => e.occurred_at,
        }
    }

    /// Primary aggregate correlation key
    pub fn aggregate_id(&self) -> AggregateId {
        match self {
            Self::UserRegistered(e) => e.aggregate_id(),
            Self::UserLoggedIn(e) => e.aggregate_id(),
            Self::UserLoggedOut(e) => e.aggregate_id(),
            Self::CaseCreated(e) => e.aggregate_id(),
            Self::CaseUpdated(e) => e.aggregate_id(),
            Self::EvidenceUploaded(e) => e.aggregate_id(),
            Self::EvidenceSuperseded(e) => e.aggregate_id(),
        }
    }

    /// Other aggregates touched by the same event
    pub fn secondary_aggregate_ids(&self) -> Vec<AggregateId> {
        match self {
            Self::UserLoggedIn(e) => vec![e.session_aggregate_id()],
            Self::UserLoggedOut(e) => vec![e.session_aggregate_id()],
            Self::EvidenceUploaded(e) => vec![e.case_aggregate_id()],
            Self::EvidenceSuperseded(e) => e.secondary_aggregate_ids(),
            Self::UserRegistered(_) | Self::CaseCreated(_) | Self::CaseUpdated(_) => Vec::new(),
        }
    }

    /// User who caused the event, when one is recorded
    pub fn actor_id(&self) -> Option<u64> {
        match self {
            Self::UserRegistered(e) => e.registered_by,
            Self::UserLoggedIn(e) => Some(e.user_id),
            Self::UserLoggedOut(e) => Some(e.user_id),
            Self::CaseCreated(e) => Some(e.created_by),
            Self::CaseUpdated(e) => Some(e.updated_by),
            Self::EvidenceUploaded(e) => Some(e.uploaded_by),
            Self::EvidenceSuperseded(e) => Some(e.superseded_by),
        }
    }

    /// Flat JSON payload: `eventType`, ISO-8601 `occurredAt`, domain fields
    pub fn payload(&self) -> Result<Value, EventError> {
        serde_json::to_value(self).map_err(|e| EventError::Serialization(e.to_string()))
    }

    /// Rebuild an event from a payload produced by [`DomainEvent::payload`]
    pub fn from_payload(payload: &Value) -> Result<Self, EventError> {
        Self::deserialize(payload).map_err(|e| EventError::Deserialization(e.to_string()))
    }
}

macro_rules! impl_from_variant {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for DomainEvent {
                fn from(event: $variant) -> Self {
                    DomainEvent::$variant(event)
                }
            }
        )*
    };
}

impl_from_variant!(
    UserRegistered,
    UserLoggedIn,
    UserLoggedOut,
    CaseCreated,
    CaseUpdated,
    EvidenceUploaded,
    EvidenceSuperseded,
);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventError {
    #[error("event serialization failed: {0}")]
    Serialization(String),

    #[error("event payload is invalid: {0}")]
    Deserialization(String),

    #[error("invalid aggregate id '{0}'")]
    InvalidAggregateId(String),

    #[error("update of {0} changes nothing")]
    NoChanges(String),
}
