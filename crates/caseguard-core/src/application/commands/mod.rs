//! Command handlers
//!
//! Application services that orchestrate use cases. Each state-changing
//! handler runs the same pipeline: authorize, validate and construct,
//! build exactly one event, commit it with the state change, publish.

mod identity;
mod cases;
mod evidence;

pub use identity::IdentityService;
pub use cases::CaseService;
pub use evidence::EvidenceService;

use tracing::{info, warn};

use crate::audit::AuditRecord;
use crate::domain::events::DomainEvent;
use crate::ports::inbound::UseCaseError;
use crate::ports::outbound::{AggregateStore, EventPublisher, Mutation};

/// Commit, then publish. A publish failure is logged, never rolled back:
/// the commit is already durable and redelivery belongs to the bus.
pub(crate) async fn commit_and_publish(
    store: &dyn AggregateStore,
    publisher: &dyn EventPublisher,
    mutation: Mutation,
    event: DomainEvent,
) -> Result<AuditRecord, UseCaseError> {
    let record = store.commit(mutation, event.clone()).await?;
    info!(
        aggregate = %record.aggregate_id,
        event = %record.event_name,
        sequence = record.sequence,
        version = record.version,
        "Committed"
    );

    if let Err(e) = publisher.publish(vec![event]).await {
        warn!(event = %record.event_name, error = %e, "Event publication failed after commit");
    }
    Ok(record)
}
