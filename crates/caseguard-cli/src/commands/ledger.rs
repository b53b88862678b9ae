//! Audit ledger commands

use std::path::Path;

use anyhow::bail;
use colored::Colorize;
use tabled::Tabled;

use caseguard_core::audit::{AuditFilter, ExportFormat};
use caseguard_core::{AggregateId, AuditRecord, AuditTrail, CoreConfig, IntegrityReport};

use super::read_document;
use crate::output::{or_dash, Field, OutputFormat};
use crate::LedgerCommands;

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "Seq")]
    sequence: u64,
    #[tabled(rename = "Aggregate")]
    aggregate: String,
    #[tabled(rename = "Ver")]
    version: u64,
    #[tabled(rename = "Event")]
    event: String,
    #[tabled(rename = "Occurred At")]
    occurred_at: String,
    #[tabled(rename = "Actor")]
    actor: String,
    #[tabled(rename = "Hash")]
    hash: String,
}

impl From<&AuditRecord> for RecordRow {
    fn from(r: &AuditRecord) -> Self {
        Self {
            sequence: r.sequence,
            aggregate: r.aggregate_id.to_string(),
            version: r.version,
            event: r.event_name.clone(),
            occurred_at: r.occurred_at.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
            actor: or_dash(r.actor_id()),
            hash: r.hash.chars().take(12).collect(),
        }
    }
}

pub async fn handle(action: LedgerCommands, core: &CoreConfig, format: OutputFormat) -> anyhow::Result<()> {
    match action {
        LedgerCommands::Verify { file, aggregate } => {
            let trail = load(&file, core).await?;
            let report = match aggregate {
                Some(id) => trail.verify_aggregate(&id.parse()?),
                None => trail.verify_integrity(),
            };
            format.print(&report, || report_fields(&report))?;
            if !report.valid {
                bail!("ledger integrity check failed");
            }
            Ok(())
        }
        LedgerCommands::History { file, aggregate } => {
            let trail = load(&file, core).await?;
            let id: AggregateId = aggregate.parse()?;
            print_records(&trail.history(&id), format)
        }
        LedgerCommands::Related { file, aggregate } => {
            let trail = load(&file, core).await?;
            let id: AggregateId = aggregate.parse()?;
            print_records(&trail.related(&id), format)
        }
        LedgerCommands::Export { file, event, kind, actor, csv } => {
            let trail = load(&file, core).await?;
            let filter = AuditFilter {
                event_name: event,
                aggregate_kind: kind,
                actor_id: actor,
                ..Default::default()
            };
            let selected = AuditTrail::from_records(trail.get_records(Some(filter)), &core.audit);
            let out = selected.export(if csv { ExportFormat::Csv } else { ExportFormat::Json })?;
            print!("{out}");
            Ok(())
        }
    }
}

async fn load(path: &Path, core: &CoreConfig) -> anyhow::Result<AuditTrail> {
    let records: Vec<AuditRecord> = read_document(path).await?;
    tracing::debug!(records = records.len(), path = %path.display(), "Ledger loaded");
    Ok(AuditTrail::from_records(records, &core.audit))
}

fn print_records(records: &[AuditRecord], format: OutputFormat) -> anyhow::Result<()> {
    format.print(&records, || records.iter().map(RecordRow::from).collect())
}

fn report_fields(report: &IntegrityReport) -> Vec<Field> {
    let verdict = if report.valid { "VALID".green() } else { "BROKEN".red() };
    vec![
        Field::new("integrity", verdict),
        Field::new("records checked", report.checked_count),
        Field::new("aggregates", report.aggregate_count),
        Field::new("failed sequence", or_dash(report.failed_sequence)),
        Field::new("error", or_dash(report.error.as_deref())),
    ]
}
