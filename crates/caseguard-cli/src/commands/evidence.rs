//! Evidence commands

use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use tabled::Tabled;

use caseguard_core::EvidenceType;

use crate::output::{or_dash, Field, OutputFormat};
use crate::EvidenceCommands;

#[derive(Clone, Serialize, Tabled)]
#[serde(rename_all = "camelCase")]
struct TypeRow {
    #[tabled(rename = "Type")]
    name: &'static str,
    #[tabled(rename = "Display Name")]
    display_name: &'static str,
    #[tabled(rename = "File Required")]
    requires_file: bool,
    #[tabled(rename = "Max Bytes")]
    max_file_size: u64,
    #[tabled(rename = "Extensions")]
    extensions: String,
}

impl From<EvidenceType> for TypeRow {
    fn from(t: EvidenceType) -> Self {
        Self {
            name: t.as_str(),
            display_name: t.display_name(),
            requires_file: t.requires_file(),
            max_file_size: t.max_file_size(),
            extensions: t.allowed_extensions().join(", "),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadCheck {
    evidence_type: EvidenceType,
    file_name: String,
    size_bytes: u64,
    accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

impl UploadCheck {
    fn run(evidence_type: EvidenceType, file_name: String, size_bytes: u64) -> Self {
        let outcome = evidence_type.validate_upload(&file_name, size_bytes);
        Self {
            evidence_type,
            file_name,
            size_bytes,
            accepted: outcome.is_ok(),
            reason: outcome.err().map(|e| e.to_string()),
        }
    }
}

pub async fn handle(action: EvidenceCommands, format: OutputFormat) -> anyhow::Result<()> {
    match action {
        EvidenceCommands::Types => {
            let rows: Vec<TypeRow> = EvidenceType::ALL.into_iter().map(TypeRow::from).collect();
            format.print(&rows, || rows.clone())
        }
        EvidenceCommands::Check { evidence_type, file, size } => {
            let evidence_type = EvidenceType::new(&evidence_type)?;
            let size = match size {
                Some(size) => size,
                None => tokio::fs::metadata(&file)
                    .await
                    .with_context(|| format!("cannot stat {}", file.display()))?
                    .len(),
            };
            let check = UploadCheck::run(evidence_type, file_name(&file), size);

            format.print(&check, || {
                vec![
                    Field::new("type", check.evidence_type),
                    Field::new("file", &check.file_name),
                    Field::new("size", check.size_bytes),
                    Field::new("accepted", check.accepted),
                    Field::new("reason", or_dash(check.reason.as_deref())),
                ]
            })
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
