//! Audit Trail (Tamper-Evident)
//!
//! Append-only ledger with one SHA-256 hash chain per aggregate.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

use super::{AuditError, AuditRecord};
use crate::config::AuditConfig;
use crate::domain::events::{AggregateId, DomainEvent};

/// Tail of one aggregate's chain
#[derive(Debug, Clone)]
struct ChainHead {
    version: u64,
    hash: String,
    occurred_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Ledger {
    records: Vec<AuditRecord>,
    heads: HashMap<AggregateId, ChainHead>,
}

/// Audit trail with per-aggregate hash chains
pub struct AuditTrail {
    ledger: RwLock<Ledger>,
    genesis_hash: String,
    enforce_monotonic_time: bool,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::with_config(&AuditConfig::default())
    }

    pub fn with_config(config: &AuditConfig) -> Self {
        Self {
            ledger: RwLock::new(Ledger::default()),
            genesis_hash: config.genesis_hash.clone(),
            enforce_monotonic_time: config.enforce_monotonic_time,
        }
    }

    /// Load exported records as-is for offline verification.
    ///
    /// Nothing is checked here; call [`AuditTrail::verify_integrity`].
    pub fn from_records(records: Vec<AuditRecord>, config: &AuditConfig) -> Self {
        let mut ledger = Ledger::default();
        for record in &records {
            ledger.heads.insert(
                record.aggregate_id.clone(),
                ChainHead {
                    version: record.version,
                    hash: record.hash.clone(),
                    occurred_at: record.occurred_at,
                },
            );
        }
        ledger.records = records;

        Self {
            ledger: RwLock::new(ledger),
            genesis_hash: config.genesis_hash.clone(),
            enforce_monotonic_time: config.enforce_monotonic_time,
        }
    }

    pub fn genesis_hash(&self) -> &str {
        &self.genesis_hash
    }

    /// Append one event to its primary aggregate's chain.
    ///
    /// Only the aggregate store writes here, together with the state change.
    pub(crate) fn append(&self, event: &DomainEvent) -> Result<AuditRecord, AuditError> {
        let mut ledger = self.ledger.write();
        let aggregate_id = event.aggregate_id();
        let head = ledger.heads.get(&aggregate_id).cloned();

        if let Some(head) = &head {
            if self.enforce_monotonic_time && event.occurred_at() < head.occurred_at {
                warn!(
                    aggregate = %aggregate_id,
                    event = event.event_name(),
                    occurred_at = %event.occurred_at(),
                    last = %head.occurred_at,
                    "Rejected out-of-order audit append"
                );
                return Err(AuditError::OutOfOrder {
                    aggregate_id: aggregate_id.to_string(),
                    occurred_at: event.occurred_at(),
                    last: head.occurred_at,
                });
            }
        }

        let sequence = ledger.records.len() as u64 + 1;
        let (version, prev_hash) = match &head {
            Some(head) => (head.version + 1, head.hash.as_str()),
            None => (1, self.genesis_hash.as_str()),
        };
        let record = AuditRecord::new(event, sequence, version, prev_hash)?;

        ledger.heads.insert(
            aggregate_id,
            ChainHead {
                version,
                hash: record.hash.clone(),
                occurred_at: record.occurred_at,
            },
        );
        ledger.records.push(record.clone());

        debug!(
            aggregate = %record.aggregate_id,
            event = %record.event_name,
            sequence = record.sequence,
            version = record.version,
            "Appended audit record"
        );
        Ok(record)
    }

    pub fn len(&self) -> usize {
        self.ledger.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ledger.read().records.is_empty()
    }

    /// All records in append order
    pub fn records(&self) -> Vec<AuditRecord> {
        self.ledger.read().records.clone()
    }

    pub fn get_records(&self, filter: Option<AuditFilter>) -> Vec<AuditRecord> {
        let ledger = self.ledger.read();
        match filter {
            Some(f) => ledger.records.iter().filter(|r| f.matches(r)).cloned().collect(),
            None => ledger.records.clone(),
        }
    }

    /// Current version of an aggregate, 0 if it has no history
    pub fn version_of(&self, aggregate_id: &AggregateId) -> u64 {
        self.ledger
            .read()
            .heads
            .get(aggregate_id)
            .map(|h| h.version)
            .unwrap_or(0)
    }

    /// Records whose primary key is `aggregate_id`, oldest first
    pub fn history(&self, aggregate_id: &AggregateId) -> Vec<AuditRecord> {
        let ledger = self.ledger.read();
        let mut history: Vec<AuditRecord> = ledger
            .records
            .iter()
            .filter(|r| r.aggregate_id == *aggregate_id)
            .cloned()
            .collect();
        history.sort_by(|a, b| a.occurred_at.cmp(&b.occurred_at).then(a.version.cmp(&b.version)));
        history
    }

    /// Records touching `aggregate_id` as primary or secondary key, in append order
    pub fn related(&self, aggregate_id: &AggregateId) -> Vec<AuditRecord> {
        self.ledger
            .read()
            .records
            .iter()
            .filter(|r| r.touches(aggregate_id))
            .cloned()
            .collect()
    }

    /// Replay an aggregate's history as typed events
    pub fn reconstruct(&self, aggregate_id: &AggregateId) -> Result<Vec<DomainEvent>, AuditError> {
        self.history(aggregate_id)
            .iter()
            .map(|record| {
                let event = record.event()?;
                if event.aggregate_id() != record.aggregate_id {
                    return Err(AuditError::Corrupted {
                        sequence: record.sequence,
                        reason: format!("payload belongs to {}", event.aggregate_id()),
                    });
                }
                Ok(event)
            })
            .collect()
    }

    /// Verify every chain in the ledger
    pub fn verify_integrity(&self) -> IntegrityReport {
        let ledger = self.ledger.read();
        self.verify(ledger.records.iter(), true)
    }

    /// Verify a single aggregate's chain
    pub fn verify_aggregate(&self, aggregate_id: &AggregateId) -> IntegrityReport {
        let ledger = self.ledger.read();
        self.verify(
            ledger.records.iter().filter(|r| r.aggregate_id == *aggregate_id),
            false,
        )
    }

    fn verify<'a>(
        &self,
        records: impl Iterator<Item = &'a AuditRecord>,
        check_sequence: bool,
    ) -> IntegrityReport {
        let mut heads: HashMap<&AggregateId, (u64, &str, DateTime<Utc>)> = HashMap::new();
        let mut checked_count = 0;
        let mut last_sequence = 0;

        for record in records {
            if let Err(reason) = self.verify_record(record, &heads, check_sequence, last_sequence) {
                warn!(
                    sequence = record.sequence,
                    aggregate = %record.aggregate_id,
                    %reason,
                    "Audit integrity check failed"
                );
                return IntegrityReport {
                    valid: false,
                    checked_count,
                    aggregate_count: heads.len(),
                    failed_sequence: Some(record.sequence),
                    error: Some(reason),
                };
            }
            heads.insert(
                &record.aggregate_id,
                (record.version, record.hash.as_str(), record.occurred_at),
            );
            last_sequence = record.sequence;
            checked_count += 1;
        }

        IntegrityReport {
            valid: true,
            checked_count,
            aggregate_count: heads.len(),
            failed_sequence: None,
            error: None,
        }
    }

    fn verify_record(
        &self,
        record: &AuditRecord,
        heads: &HashMap<&AggregateId, (u64, &str, DateTime<Utc>)>,
        check_sequence: bool,
        last_sequence: u64,
    ) -> Result<(), String> {
        if check_sequence && record.sequence != last_sequence + 1 {
            return Err(format!(
                "sequence gap: expected {}, found {}",
                last_sequence + 1,
                record.sequence
            ));
        }

        let (expected_version, expected_prev) = match heads.get(&record.aggregate_id) {
            Some((version, hash, occurred_at)) => {
                if self.enforce_monotonic_time && record.occurred_at < *occurred_at {
                    return Err(format!("record {} predates its predecessor", record.event_id));
                }
                (version + 1, *hash)
            }
            None => (1, self.genesis_hash.as_str()),
        };

        if record.version != expected_version {
            return Err(format!(
                "version {} of {} should be {}",
                record.version, record.aggregate_id, expected_version
            ));
        }
        if record.prev_hash != expected_prev {
            return Err(format!("hash chain broken at record {}", record.event_id));
        }
        if record.compute_hash() != record.hash {
            return Err(format!("record {} hash mismatch", record.event_id));
        }

        let event = record.event().map_err(|e| e.to_string())?;
        if event.event_name() != record.event_name
            || event.aggregate_id() != record.aggregate_id
            || event.secondary_aggregate_ids() != record.secondary_aggregate_ids
            || event.occurred_at() != record.occurred_at
        {
            return Err(format!("record {} payload does not match its envelope", record.event_id));
        }
        Ok(())
    }

    /// Export records
    pub fn export(&self, format: ExportFormat) -> Result<String, AuditError> {
        let ledger = self.ledger.read();
        match format {
            ExportFormat::Json => serde_json::to_string_pretty(&ledger.records)
                .map_err(|e| AuditError::Export(e.to_string())),
            ExportFormat::Csv => Ok(Self::to_csv(&ledger.records)),
        }
    }

    fn to_csv(records: &[AuditRecord]) -> String {
        let mut csv = "sequence,occurred_at,event_name,aggregate_id,version,hash\n".to_string();
        for r in records {
            csv.push_str(&format!(
                "{},{},{},{},{},{}\n",
                r.sequence,
                r.occurred_at.to_rfc3339(),
                r.event_name,
                r.aggregate_id,
                r.version,
                r.hash
            ));
        }
        csv
    }
}

impl Default for AuditTrail {
    fn default() -> Self {
        Self::new()
    }
}

/// Record filter
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub event_name: Option<String>,
    pub aggregate_kind: Option<String>,
    pub actor_id: Option<u64>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl AuditFilter {
    fn matches(&self, record: &AuditRecord) -> bool {
        if let Some(name) = &self.event_name {
            if record.event_name != *name {
                return false;
            }
        }
        if let Some(kind) = &self.aggregate_kind {
            if record.aggregate_id.kind() != kind {
                return false;
            }
        }
        if let Some(actor) = self.actor_id {
            if record.actor_id() != Some(actor) {
                return false;
            }
        }
        if let Some(s) = &self.start_time {
            if record.occurred_at < *s {
                return false;
            }
        }
        if let Some(e) = &self.end_time {
            if record.occurred_at > *e {
                return false;
            }
        }
        true
    }
}

/// Integrity check result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    pub valid: bool,
    pub checked_count: usize,
    pub aggregate_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_sequence: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Export format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{Case, CaseChanges, CaseStatus, Evidence, NewEvidence};
    use crate::domain::events::{CaseCreated, CaseUpdated, EvidenceUploaded};
    use crate::domain::value_objects::EvidenceType;
    use serde_json::json;

    fn case_events() -> Vec<DomainEvent> {
        let case = Case::open(42, "Fraud", "finance", 1).unwrap();
        let progressed = case
            .apply(&CaseChanges { status: Some(CaseStatus::InProgress), ..Default::default() })
            .unwrap();
        let closed = progressed
            .apply(&CaseChanges { status: Some(CaseStatus::Closed), ..Default::default() })
            .unwrap();
        vec![
            CaseCreated::from_entity(&case).into(),
            CaseUpdated::from_entities(&case, &progressed, 1).unwrap().into(),
            CaseUpdated::from_entities(&progressed, &closed, 1).unwrap().into(),
        ]
    }

    fn note_on_case(evidence_id: u64, case_id: u64) -> DomainEvent {
        let evidence = Evidence::create(
            evidence_id,
            NewEvidence {
                case_id,
                evidence_type: EvidenceType::Note,
                title: "Notes".into(),
                description: None,
                file_path: None,
                file_size: None,
                content: Some("enc".into()),
                obtained_date: chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            },
            1,
        )
        .unwrap();
        EvidenceUploaded::from_entity(&evidence).into()
    }

    fn other_case() -> DomainEvent {
        CaseCreated::from_entity(&Case::open(7, "Leak", "security", 2).unwrap()).into()
    }

    #[test]
    fn test_append_chains_per_aggregate() {
        let trail = AuditTrail::new();
        let events = case_events();
        let first = trail.append(&events[0]).unwrap();
        let unrelated = trail.append(&other_case()).unwrap();
        let second = trail.append(&events[1]).unwrap();

        assert_eq!(first.sequence, 1);
        assert_eq!(first.version, 1);
        assert_eq!(first.prev_hash, "genesis");
        assert_eq!(unrelated.prev_hash, "genesis");
        assert_eq!(second.sequence, 3);
        assert_eq!(second.version, 2);
        assert_eq!(second.prev_hash, first.hash);
        assert_eq!(trail.version_of(&AggregateId::case(42)), 2);
        assert_ne!(first.event_id, second.event_id);
    }

    #[test]
    fn test_history_and_reconstruct() {
        let trail = AuditTrail::new();
        let events = case_events();
        for event in &events {
            trail.append(event).unwrap();
        }
        trail.append(&other_case()).unwrap();

        let history = trail.history(&AggregateId::case(42));
        assert_eq!(history.len(), 3);
        assert!(history.windows(2).all(|w| w[0].occurred_at <= w[1].occurred_at));

        let replayed = trail.reconstruct(&AggregateId::case(42)).unwrap();
        assert_eq!(replayed, events);
        assert!(trail.reconstruct(&AggregateId::case(999)).unwrap().is_empty());
    }

    #[test]
    fn test_out_of_order_rejected() {
        let trail = AuditTrail::new();
        let events = case_events();
        trail.append(&events[1]).unwrap();
        let result = trail.append(&events[0]);
        // events[0] was built first, so it cannot follow events[1]
        if events[0].occurred_at() < events[1].occurred_at() {
            assert!(matches!(result, Err(AuditError::OutOfOrder { .. })));
            assert_eq!(trail.len(), 1);
        }

        let relaxed = AuditTrail::with_config(&AuditConfig {
            enforce_monotonic_time: false,
            ..Default::default()
        });
        relaxed.append(&events[1]).unwrap();
        assert!(relaxed.append(&events[0]).is_ok());
    }

    #[test]
    fn test_verify_detects_tampering() {
        let trail = AuditTrail::new();
        for event in case_events() {
            trail.append(&event).unwrap();
        }
        let report = trail.verify_integrity();
        assert!(report.valid);
        assert_eq!(report.checked_count, 3);
        assert_eq!(report.aggregate_count, 1);

        let mut records = trail.records();
        records[1].payload["changes"] = json!({ "status": "on_hold" });
        let tampered = AuditTrail::from_records(records, &AuditConfig::default());
        let report = tampered.verify_integrity();
        assert!(!report.valid);
        assert_eq!(report.failed_sequence, Some(2));
        assert_eq!(report.checked_count, 1);
    }

    #[test]
    fn test_verify_detects_rekeyed_secondary_ids() {
        let trail = AuditTrail::new();
        trail.append(&note_on_case(15, 42)).unwrap();

        let mut records = trail.records();
        records[0].secondary_aggregate_ids = vec![AggregateId::case(999)];
        let moved = AuditTrail::from_records(records.clone(), &AuditConfig::default());
        let report = moved.verify_integrity();
        assert!(!report.valid);
        assert_eq!(report.failed_sequence, Some(1));

        // Rehashing the forged envelope still disagrees with the payload
        records[0].hash = records[0].compute_hash();
        let rehashed = AuditTrail::from_records(records, &AuditConfig::default());
        let report = rehashed.verify_integrity();
        assert!(!report.valid);
        assert!(report.error.unwrap().contains("does not match its envelope"));
    }

    #[test]
    fn test_verify_detects_shifted_occurred_at() {
        let trail = AuditTrail::new();
        trail.append(&note_on_case(15, 42)).unwrap();

        let mut records = trail.records();
        records[0].occurred_at = records[0].occurred_at - chrono::Duration::days(30);
        records[0].hash = records[0].compute_hash();
        let backdated = AuditTrail::from_records(records, &AuditConfig::default());
        assert!(!backdated.verify_integrity().valid);
    }

    #[test]
    fn test_verify_detects_deletion() {
        let trail = AuditTrail::new();
        for event in case_events() {
            trail.append(&event).unwrap();
        }
        let mut records = trail.records();
        records.remove(1);
        let pruned = AuditTrail::from_records(records, &AuditConfig::default());
        assert!(!pruned.verify_integrity().valid);
        assert!(!pruned.verify_aggregate(&AggregateId::case(42)).valid);
    }

    #[test]
    fn test_related_includes_secondary_keys() {
        let trail = AuditTrail::new();
        for event in case_events() {
            trail.append(&event).unwrap();
        }
        trail.append(&note_on_case(15, 42)).unwrap();

        assert_eq!(trail.history(&AggregateId::case(42)).len(), 3);
        assert_eq!(trail.related(&AggregateId::case(42)).len(), 4);
        assert_eq!(trail.history(&AggregateId::evidence(15)).len(), 1);
    }

    #[test]
    fn test_filter_and_export() {
        let trail = AuditTrail::new();
        for event in case_events() {
            trail.append(&event).unwrap();
        }
        let updates = trail.get_records(Some(AuditFilter {
            event_name: Some("CaseUpdated".into()),
            ..Default::default()
        }));
        assert_eq!(updates.len(), 2);

        let json = trail.export(ExportFormat::Json).unwrap();
        let restored: Vec<AuditRecord> = serde_json::from_str(&json).unwrap();
        assert!(AuditTrail::from_records(restored, &AuditConfig::default()).verify_integrity().valid);

        let csv = trail.export(ExportFormat::Csv).unwrap();
        assert_eq!(csv.lines().count(), 4);
    }
}
