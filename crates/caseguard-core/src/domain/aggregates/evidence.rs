//! Evidence Aggregate
//!
//! Evidence is immutable once created. There are no setters; a correction
//! is a new record that references the one it supersedes, and the original
//! stays in place for chain of custody.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::EvidenceType;
use crate::domain::DomainError;

/// Input for a new evidence record
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvidence {
    pub case_id: u64,
    pub evidence_type: EvidenceType,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    /// Ciphertext produced by the external encryption service
    #[serde(default)]
    pub content: Option<String>,
    pub obtained_date: NaiveDate,
}

/// Evidence record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    id: u64,
    case_id: u64,
    evidence_type: EvidenceType,
    title: String,
    description: Option<String>,
    file_path: Option<String>,
    file_size: Option<u64>,
    content: Option<String>,
    obtained_date: NaiveDate,
    collected_by: u64,
    created_at: DateTime<Utc>,
    supersedes: Option<u64>,
}

impl Evidence {
    /// Build a record; the upload itself must already be validated
    pub fn create(id: u64, input: NewEvidence, collected_by: u64) -> Result<Self, DomainError> {
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(DomainError::InvalidField {
                field: "title",
                reason: "cannot be empty".into(),
            });
        }

        let file_path = input.file_path.filter(|p| !p.trim().is_empty());
        let content = input.content.filter(|c| !c.is_empty());

        if input.evidence_type.requires_file() && file_path.is_none() {
            return Err(DomainError::FileRequired(input.evidence_type.to_string()));
        }
        if file_path.is_none() && content.is_none() {
            return Err(DomainError::EmptyEvidence);
        }
        if let Some(size) = input.file_size {
            if size > input.evidence_type.max_file_size() {
                return Err(DomainError::InvalidField {
                    field: "fileSize",
                    reason: format!(
                        "{size} bytes exceeds the {} byte limit",
                        input.evidence_type.max_file_size()
                    ),
                });
            }
        }

        Ok(Self {
            id,
            case_id: input.case_id,
            evidence_type: input.evidence_type,
            title,
            description: input.description,
            file_size: file_path.as_ref().and(input.file_size),
            file_path,
            content,
            obtained_date: input.obtained_date,
            collected_by,
            created_at: Utc::now(),
            supersedes: None,
        })
    }

    /// Build the correcting record that supersedes `self`
    pub fn supersede(&self, new_id: u64, input: NewEvidence, collected_by: u64) -> Result<Self, DomainError> {
        if new_id == self.id {
            return Err(DomainError::EvidenceImmutable(self.id));
        }
        if input.case_id != self.case_id {
            return Err(DomainError::InvariantViolation(format!(
                "correction of evidence {} must stay on case {}",
                self.id, self.case_id
            )));
        }
        let mut corrected = Self::create(new_id, input, collected_by)?;
        corrected.supersedes = Some(self.id);
        Ok(corrected)
    }

    pub fn id(&self) -> u64 { self.id }
    pub fn case_id(&self) -> u64 { self.case_id }
    pub fn evidence_type(&self) -> EvidenceType { self.evidence_type }
    pub fn title(&self) -> &str { &self.title }
    pub fn description(&self) -> Option<&str> { self.description.as_deref() }
    pub fn file_path(&self) -> Option<&str> { self.file_path.as_deref() }
    pub fn file_size(&self) -> Option<u64> { self.file_size }
    pub fn content(&self) -> Option<&str> { self.content.as_deref() }
    pub fn obtained_date(&self) -> NaiveDate { self.obtained_date }
    pub fn collected_by(&self) -> u64 { self.collected_by }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn supersedes(&self) -> Option<u64> { self.supersedes }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo_input() -> NewEvidence {
        NewEvidence {
            case_id: 42,
            evidence_type: EvidenceType::Photo,
            title: "Scene photo".into(),
            description: None,
            file_path: Some("cases/42/scene.jpg".into()),
            file_size: Some(2048),
            content: None,
            obtained_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        }
    }

    #[test]
    fn test_create_photo() {
        let evidence = Evidence::create(15, photo_input(), 7).unwrap();
        assert_eq!(evidence.id(), 15);
        assert_eq!(evidence.file_path(), Some("cases/42/scene.jpg"));
        assert_eq!(evidence.supersedes(), None);
    }

    #[test]
    fn test_file_required() {
        let input = NewEvidence { file_path: None, content: Some("x".into()), ..photo_input() };
        assert_eq!(
            Evidence::create(1, input, 7),
            Err(DomainError::FileRequired("photo".into()))
        );
    }

    #[test]
    fn test_note_without_file() {
        let input = NewEvidence {
            evidence_type: EvidenceType::Note,
            file_path: None,
            file_size: None,
            content: Some("ciphertext".into()),
            ..photo_input()
        };
        let note = Evidence::create(2, input, 7).unwrap();
        assert!(note.file_path().is_none());

        let empty = NewEvidence {
            evidence_type: EvidenceType::Note,
            file_path: None,
            content: None,
            ..photo_input()
        };
        assert_eq!(Evidence::create(3, empty, 7), Err(DomainError::EmptyEvidence));
    }

    #[test]
    fn test_oversize_rejected() {
        let input = NewEvidence { file_size: Some(6 * 1024 * 1024), ..photo_input() };
        assert!(matches!(
            Evidence::create(1, input, 7),
            Err(DomainError::InvalidField { field: "fileSize", .. })
        ));
    }

    #[test]
    fn test_supersede_preserves_original() {
        let original = Evidence::create(15, photo_input(), 7).unwrap();
        let corrected_input = NewEvidence { title: "Scene photo (rotated)".into(), ..photo_input() };
        let corrected = original.supersede(16, corrected_input, 7).unwrap();

        assert_eq!(corrected.supersedes(), Some(15));
        assert_eq!(original.title(), "Scene photo");
        assert_eq!(
            original.supersede(15, photo_input(), 7),
            Err(DomainError::EvidenceImmutable(15))
        );
        let other_case = NewEvidence { case_id: 99, ..photo_input() };
        assert!(original.supersede(17, other_case, 7).is_err());
    }
}
