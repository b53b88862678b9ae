//! Audit Trail Contract
//!
//! Every committed state change appends exactly one record. Records are
//! chained per aggregate so that any edit, deletion or reordering of an
//! aggregate's history is detectable, and histories replay in
//! `occurredAt` order.

mod record;
mod trail;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::events::EventError;

pub use record::AuditRecord;
pub use trail::{AuditFilter, AuditTrail, ExportFormat, IntegrityReport};

/// Audit ledger errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuditError {
    #[error(transparent)]
    Event(#[from] EventError),

    #[error("event for {aggregate_id} at {occurred_at} predates the last recorded event at {last}")]
    OutOfOrder {
        aggregate_id: String,
        occurred_at: DateTime<Utc>,
        last: DateTime<Utc>,
    },

    #[error("record {sequence} is corrupted: {reason}")]
    Corrupted { sequence: u64, reason: String },

    #[error("export failed: {0}")]
    Export(String),
}
