//! Case lifecycle events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{AggregateId, EventError};
use crate::domain::aggregates::{Case, CaseStatus};

/// A case was opened
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseCreated {
    pub case_id: u64,
    pub title: String,
    pub description: Option<String>,
    pub case_type: String,
    pub status: CaseStatus,
    pub created_by: u64,
    pub assigned_to: Option<u64>,
    pub occurred_at: DateTime<Utc>,
}

impl CaseCreated {
    pub fn from_entity(case: &Case) -> Self {
        Self {
            case_id: case.id(),
            title: case.title().to_string(),
            description: case.description().map(str::to_string),
            case_type: case.case_type().to_string(),
            status: case.status(),
            created_by: case.created_by(),
            assigned_to: case.assigned_to(),
            occurred_at: Utc::now(),
        }
    }

    pub fn aggregate_id(&self) -> AggregateId {
        AggregateId::case(self.case_id)
    }
}

/// Fields of a case changed.
///
/// `changes` holds the new values, `previous_values` the old ones, keyed
/// by the same wire field names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseUpdated {
    pub case_id: u64,
    pub updated_by: u64,
    pub changes: Map<String, Value>,
    pub previous_values: Map<String, Value>,
    pub occurred_at: DateTime<Utc>,
}

impl CaseUpdated {
    pub fn new(
        case_id: u64,
        updated_by: u64,
        changes: Map<String, Value>,
        previous_values: Map<String, Value>,
    ) -> Self {
        Self {
            case_id,
            updated_by,
            changes,
            previous_values,
            occurred_at: Utc::now(),
        }
    }

    /// Diff two states of the same case
    pub fn from_entities(before: &Case, after: &Case, updated_by: u64) -> Result<Self, EventError> {
        let old = before.audit_fields();
        let new = after.audit_fields();

        let mut changes = Map::new();
        let mut previous_values = Map::new();
        for (field, value) in new {
            let previous = old.get(&field).cloned().unwrap_or(Value::Null);
            if previous != value {
                previous_values.insert(field.clone(), previous);
                changes.insert(field, value);
            }
        }

        if changes.is_empty() {
            return Err(EventError::NoChanges(AggregateId::case(before.id()).to_string()));
        }
        Ok(Self::new(after.id(), updated_by, changes, previous_values))
    }

    pub fn aggregate_id(&self) -> AggregateId {
        AggregateId::case(self.case_id)
    }

    /// True when `status` is among the changes and differs from its previous value
    pub fn is_status_change(&self) -> bool {
        match self.changes.get("status") {
            Some(status) => self.previous_values.get("status") != Some(status),
            None => false,
        }
    }

    /// True when the case moved into `closed`
    pub fn is_case_closed(&self) -> bool {
        self.is_status_change()
            && self.changes.get("status").and_then(Value::as_str) == Some(CaseStatus::Closed.as_str())
    }
}
