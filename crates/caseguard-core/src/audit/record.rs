//! Ledger record

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::domain::events::{AggregateId, DomainEvent, EventError};

/// One appended event with its position in the global and per-aggregate order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub event_id: Uuid,
    /// Global append position, starting at 1
    pub sequence: u64,
    pub aggregate_id: AggregateId,
    /// Position within the aggregate's history, starting at 1
    pub version: u64,
    #[serde(default)]
    pub secondary_aggregate_ids: Vec<AggregateId>,
    pub event_name: String,
    pub occurred_at: DateTime<Utc>,
    pub recorded_at: DateTime<Utc>,
    pub payload: Value,
    pub prev_hash: String,
    pub hash: String,
}

impl AuditRecord {
    pub(crate) fn new(
        event: &DomainEvent,
        sequence: u64,
        version: u64,
        prev_hash: &str,
    ) -> Result<Self, EventError> {
        let mut record = Self {
            event_id: Uuid::new_v4(),
            sequence,
            aggregate_id: event.aggregate_id(),
            version,
            secondary_aggregate_ids: event.secondary_aggregate_ids(),
            event_name: event.event_name().to_string(),
            occurred_at: event.occurred_at(),
            recorded_at: Utc::now(),
            payload: event.payload()?,
            prev_hash: prev_hash.to_string(),
            hash: String::new(),
        };
        record.hash = record.compute_hash();
        Ok(record)
    }

    /// SHA-256 over every envelope field, the payload and the predecessor's hash
    pub fn compute_hash(&self) -> String {
        let secondary: Vec<String> = self
            .secondary_aggregate_ids
            .iter()
            .map(|id| id.to_string())
            .collect();
        let data = format!(
            "{}|{}|{}|{}|{}|{}|{}|{}|{}|{}",
            self.event_id,
            self.sequence,
            self.aggregate_id,
            self.version,
            secondary.join(","),
            self.event_name,
            self.occurred_at.to_rfc3339_opts(SecondsFormat::Nanos, true),
            self.recorded_at.to_rfc3339_opts(SecondsFormat::Nanos, true),
            self.payload,
            self.prev_hash,
        );
        hex::encode(Sha256::digest(data.as_bytes()))
    }

    /// Rebuild the typed event from the stored payload
    pub fn event(&self) -> Result<DomainEvent, EventError> {
        DomainEvent::from_payload(&self.payload)
    }

    /// True when `id` is this record's primary or a secondary key
    pub fn touches(&self, id: &AggregateId) -> bool {
        self.aggregate_id == *id || self.secondary_aggregate_ids.contains(id)
    }

    pub fn actor_id(&self) -> Option<u64> {
        self.event().ok().and_then(|e| e.actor_id())
    }
}
