//! Case Aggregate
//!
//! Updates never mutate in place: [`Case::apply`] returns the next state so
//! the previous one stays available for the audit diff.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::domain::DomainError;

/// Case aggregate root
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    id: u64,
    title: String,
    description: Option<String>,
    case_type: String,
    status: CaseStatus,
    created_by: u64,
    assigned_to: Option<u64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Case {
    /// Open a new case
    pub fn open(
        id: u64,
        title: impl Into<String>,
        case_type: impl Into<String>,
        created_by: u64,
    ) -> Result<Self, DomainError> {
        let title = non_blank("title", title.into())?;
        let case_type = non_blank("caseType", case_type.into())?;
        let now = Utc::now();

        Ok(Self {
            id,
            title,
            description: None,
            case_type,
            status: CaseStatus::Open,
            created_by,
            assigned_to: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_assignee(mut self, user_id: u64) -> Self {
        self.assigned_to = Some(user_id);
        self
    }

    pub fn id(&self) -> u64 { self.id }
    pub fn title(&self) -> &str { &self.title }
    pub fn description(&self) -> Option<&str> { self.description.as_deref() }
    pub fn case_type(&self) -> &str { &self.case_type }
    pub fn status(&self) -> CaseStatus { self.status }
    pub fn created_by(&self) -> u64 { self.created_by }
    pub fn assigned_to(&self) -> Option<u64> { self.assigned_to }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }
    pub fn is_closed(&self) -> bool { self.status == CaseStatus::Closed }

    /// Produce the next state.
    ///
    /// Fields equal to the current value are ignored; an update that changes
    /// nothing is rejected. A closed case only accepts a status change away
    /// from `closed`.
    pub fn apply(&self, changes: &CaseChanges) -> Result<Case, DomainError> {
        let mut next = self.clone();

        if let Some(title) = &changes.title {
            next.title = non_blank("title", title.clone())?;
        }
        if let Some(description) = &changes.description {
            next.description = Some(description.clone());
        }
        if let Some(status) = changes.status {
            next.status = status;
        }
        if let Some(assignee) = changes.assigned_to {
            next.assigned_to = Some(assignee);
        }

        if next == *self {
            return Err(DomainError::NoChanges);
        }

        if self.is_closed() {
            let reopening = next.status != CaseStatus::Closed;
            let only_status = next.title == self.title
                && next.description == self.description
                && next.assigned_to == self.assigned_to;
            if !(reopening && only_status) {
                return Err(DomainError::CaseClosed(self.id));
            }
        }

        next.updated_at = Utc::now().max(self.updated_at);
        Ok(next)
    }

    /// Audit-relevant fields as a flat map keyed by wire name
    pub(crate) fn audit_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("title".into(), Value::from(self.title.clone()));
        fields.insert(
            "description".into(),
            self.description.clone().map(Value::from).unwrap_or(Value::Null),
        );
        fields.insert("status".into(), Value::from(self.status.as_str()));
        fields.insert(
            "assignedTo".into(),
            self.assigned_to.map(Value::from).unwrap_or(Value::Null),
        );
        fields
    }
}

/// Partial update of a case
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CaseStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<u64>,
}

/// Case lifecycle status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Open,
    InProgress,
    OnHold,
    Closed,
}

impl CaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::OnHold => "on_hold",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn non_blank(field: &'static str, value: String) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::InvalidField {
            field,
            reason: "cannot be empty".into(),
        });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case() -> Case {
        Case::open(42, "Harassment complaint", "hr", 1).unwrap()
    }

    #[test]
    fn test_case_creation() {
        let case = case();
        assert_eq!(case.status(), CaseStatus::Open);
        assert_eq!(case.title(), "Harassment complaint");
        assert!(Case::open(1, " ", "hr", 1).is_err());
    }

    #[test]
    fn test_apply_returns_new_state() {
        let before = case();
        let after = before
            .apply(&CaseChanges {
                status: Some(CaseStatus::InProgress),
                assigned_to: Some(9),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(before.status(), CaseStatus::Open);
        assert_eq!(after.status(), CaseStatus::InProgress);
        assert_eq!(after.assigned_to(), Some(9));
        assert!(after.updated_at() >= before.updated_at());
    }

    #[test]
    fn test_no_op_update_rejected() {
        let before = case();
        let same = CaseChanges {
            title: Some("Harassment complaint".into()),
            ..Default::default()
        };
        assert_eq!(before.apply(&same), Err(DomainError::NoChanges));
        assert_eq!(before.apply(&CaseChanges::default()), Err(DomainError::NoChanges));
    }

    #[test]
    fn test_closed_case_only_reopens() {
        let closed = case()
            .apply(&CaseChanges { status: Some(CaseStatus::Closed), ..Default::default() })
            .unwrap();

        let retitle = CaseChanges { title: Some("New".into()), ..Default::default() };
        assert_eq!(closed.apply(&retitle), Err(DomainError::CaseClosed(42)));

        let reopen = CaseChanges { status: Some(CaseStatus::Open), ..Default::default() };
        assert_eq!(closed.apply(&reopen).unwrap().status(), CaseStatus::Open);
    }

    #[test]
    fn test_audit_fields() {
        let fields = case().audit_fields();
        assert_eq!(fields["status"], "open");
        assert_eq!(fields["assignedTo"], Value::Null);
    }
}
