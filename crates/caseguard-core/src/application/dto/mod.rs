//! Data Transfer Objects (DTOs)
//!
//! Objects for transferring data across boundaries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::audit::AuditRecord;
use crate::domain::aggregates::{CaseChanges, Session, User};

// =============================================================================
// Identity Commands
// =============================================================================

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserCommand {
    pub email: String,
    pub full_name: String,
    pub password: String,
    #[serde(default)]
    pub role_ids: Vec<u64>,
}

/// Login bookkeeping for a user the caller has already authenticated
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginCommand {
    pub email: String,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

#[derive(Clone, Debug)]
pub struct LoginOutcome {
    pub user: User,
    pub session: Session,
    /// User-agent differs from the previous login, or none was known
    pub new_device: bool,
    pub record: AuditRecord,
}

// =============================================================================
// Case Commands
// =============================================================================

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCaseCommand {
    pub title: String,
    pub case_type: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<u64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCaseCommand {
    pub case_id: u64,
    #[serde(flatten)]
    pub changes: CaseChanges,
}

// =============================================================================
// Evidence Commands
// =============================================================================

/// Evidence fields as submitted by the uploader
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceInput {
    pub evidence_type: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Original file name; defaults to the last segment of `file_path`
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    /// Ciphertext from the encryption service
    #[serde(default)]
    pub content: Option<String>,
    pub obtained_date: NaiveDate,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadEvidenceCommand {
    pub case_id: u64,
    #[serde(flatten)]
    pub evidence: EvidenceInput,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupersedeEvidenceCommand {
    pub evidence_id: u64,
    pub reason: String,
    pub replacement: EvidenceInput,
}
