//! Evidence custody events

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::AggregateId;
use crate::domain::aggregates::Evidence;
use crate::domain::value_objects::EvidenceType;
use crate::domain::DomainError;

/// File and provenance facts recorded at upload. Content is never copied.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceMetadata {
    pub file_path: Option<String>,
    pub file_size: Option<u64>,
    pub obtained_date: NaiveDate,
    pub has_content: bool,
}

impl EvidenceMetadata {
    fn of(evidence: &Evidence) -> Self {
        Self {
            file_path: evidence.file_path().map(str::to_string),
            file_size: evidence.file_size(),
            obtained_date: evidence.obtained_date(),
            has_content: evidence.content().is_some(),
        }
    }
}

/// Evidence was added to a case
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceUploaded {
    pub evidence_id: u64,
    pub case_id: u64,
    pub evidence_type: EvidenceType,
    pub title: String,
    pub uploaded_by: u64,
    pub metadata: EvidenceMetadata,
    pub occurred_at: DateTime<Utc>,
}

impl EvidenceUploaded {
    pub fn from_entity(evidence: &Evidence) -> Self {
        Self {
            evidence_id: evidence.id(),
            case_id: evidence.case_id(),
            evidence_type: evidence.evidence_type(),
            title: evidence.title().to_string(),
            uploaded_by: evidence.collected_by(),
            metadata: EvidenceMetadata::of(evidence),
            occurred_at: Utc::now(),
        }
    }

    pub fn aggregate_id(&self) -> AggregateId {
        AggregateId::evidence(self.evidence_id)
    }

    pub fn case_aggregate_id(&self) -> AggregateId {
        AggregateId::case(self.case_id)
    }

    pub fn has_file(&self) -> bool {
        self.metadata.file_path.is_some()
    }
}

/// A correcting record replaced an earlier one. The original stays stored.
///
/// Keyed to the original evidence, so it extends the original's chain. The
/// replacement only appears as a secondary key: its `history` is empty and
/// its creation is found with `related(evidence-<replacement_id>)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceSuperseded {
    pub evidence_id: u64,
    pub replacement_id: u64,
    pub case_id: u64,
    pub evidence_type: EvidenceType,
    pub title: String,
    pub reason: String,
    pub superseded_by: u64,
    pub metadata: EvidenceMetadata,
    pub occurred_at: DateTime<Utc>,
}

impl EvidenceSuperseded {
    /// `replacement` must be the record produced by [`Evidence::supersede`] on `original`
    pub fn from_entities(
        original: &Evidence,
        replacement: &Evidence,
        reason: impl Into<String>,
        superseded_by: u64,
    ) -> Result<Self, DomainError> {
        if replacement.supersedes() != Some(original.id()) {
            return Err(DomainError::InvariantViolation(format!(
                "evidence {} does not supersede evidence {}",
                replacement.id(),
                original.id()
            )));
        }
        let reason = reason.into().trim().to_string();
        if reason.is_empty() {
            return Err(DomainError::InvalidField {
                field: "reason",
                reason: "cannot be empty".into(),
            });
        }

        Ok(Self {
            evidence_id: original.id(),
            replacement_id: replacement.id(),
            case_id: replacement.case_id(),
            evidence_type: replacement.evidence_type(),
            title: replacement.title().to_string(),
            reason,
            superseded_by,
            metadata: EvidenceMetadata::of(replacement),
            occurred_at: Utc::now(),
        })
    }

    pub fn aggregate_id(&self) -> AggregateId {
        AggregateId::evidence(self.evidence_id)
    }

    pub fn secondary_aggregate_ids(&self) -> Vec<AggregateId> {
        vec![
            AggregateId::evidence(self.replacement_id),
            AggregateId::case(self.case_id),
        ]
    }
}
