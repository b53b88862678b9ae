//! In-process event bus
//!
//! Routes committed events to subscribers by event name.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, info, warn};

use crate::domain::events::DomainEvent;
use crate::ports::outbound::{EventPublisher, EventSubscriber, RepositoryError};

type Subscriber = Arc<dyn EventSubscriber>;

/// Event bus keyed by `eventType`
#[derive(Default)]
pub struct InMemoryEventBus {
    subscribers: DashMap<&'static str, Vec<Subscriber>>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber under every event name it asks for
    pub fn subscribe(&self, subscriber: Subscriber) {
        for name in subscriber.event_names() {
            debug!(subscriber = subscriber.name(), event = name, "Subscribed");
            self.subscribers.entry(name).or_default().push(subscriber.clone());
        }
    }

    pub fn subscriber_count(&self, event_name: &str) -> usize {
        self.subscribers.get(event_name).map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, events: Vec<DomainEvent>) -> Result<(), RepositoryError> {
        let mut failures = Vec::new();
        for event in &events {
            // Clone the list so no map guard is held across an await
            let targets: Vec<Subscriber> = self
                .subscribers
                .get(event.event_name())
                .map(|s| s.value().clone())
                .unwrap_or_default();

            for subscriber in targets {
                if let Err(e) = subscriber.handle(event).await {
                    warn!(subscriber = subscriber.name(), event = event.event_name(), error = %e, "Subscriber failed");
                    failures.push(format!("{}: {e}", subscriber.name()));
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(RepositoryError::Publish(failures.join("; ")))
        }
    }
}

/// Writes every event to the tracing log; anomalies are raised to `warn`
#[derive(Default)]
pub struct TracingAuditSubscriber;

#[async_trait]
impl EventSubscriber for TracingAuditSubscriber {
    fn name(&self) -> &str {
        "tracing-audit"
    }

    fn event_names(&self) -> Vec<&'static str> {
        DomainEvent::NAMES.to_vec()
    }

    async fn handle(&self, event: &DomainEvent) -> Result<(), RepositoryError> {
        let aggregate = event.aggregate_id();
        match event {
            DomainEvent::UserRegistered(e) => {
                info!(%aggregate, email = %e.email, roles = ?e.role_ids, "audit: user registered")
            }
            DomainEvent::UserLoggedIn(e) => info!(
                %aggregate,
                session = %e.session_id,
                ip = e.ip_address.as_deref().unwrap_or("-"),
                "audit: user logged in"
            ),
            DomainEvent::UserLoggedOut(e) => {
                info!(%aggregate, session = %e.session_id, "audit: user logged out")
            }
            DomainEvent::CaseCreated(e) => {
                info!(%aggregate, title = %e.title, created_by = e.created_by, "audit: case created")
            }
            DomainEvent::CaseUpdated(e) if e.is_case_closed() => {
                info!(%aggregate, updated_by = e.updated_by, "audit: case closed")
            }
            DomainEvent::CaseUpdated(e) => info!(
                %aggregate,
                fields = ?e.changes.keys().collect::<Vec<_>>(),
                updated_by = e.updated_by,
                "audit: case updated"
            ),
            DomainEvent::EvidenceUploaded(e) => info!(
                %aggregate,
                case_id = e.case_id,
                evidence_type = %e.evidence_type,
                has_file = e.has_file(),
                "audit: evidence uploaded"
            ),
            DomainEvent::EvidenceSuperseded(e) => warn!(
                %aggregate,
                replacement = e.replacement_id,
                reason = %e.reason,
                "audit: evidence superseded"
            ),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::Case;
    use crate::domain::events::CaseCreated;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl EventSubscriber for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn event_names(&self) -> Vec<&'static str> {
            vec!["CaseCreated"]
        }

        async fn handle(&self, event: &DomainEvent) -> Result<(), RepositoryError> {
            self.seen.lock().push(event.aggregate_id().to_string());
            if self.fail {
                return Err(RepositoryError::Publish("boom".into()));
            }
            Ok(())
        }
    }

    fn case_created(id: u64) -> DomainEvent {
        CaseCreated::from_entity(&Case::open(id, "Case", "hr", 1).unwrap()).into()
    }

    #[tokio::test]
    async fn test_routes_by_event_name() {
        let bus = InMemoryEventBus::new();
        let recorder = Arc::new(Recorder::default());
        bus.subscribe(recorder.clone());
        bus.subscribe(Arc::new(TracingAuditSubscriber));

        assert_eq!(bus.subscriber_count("CaseCreated"), 2);
        assert_eq!(bus.subscriber_count("UserLoggedOut"), 1);

        bus.publish(vec![case_created(4), case_created(5)]).await.unwrap();
        assert_eq!(*recorder.seen.lock(), vec!["case-4", "case-5"]);
    }

    #[tokio::test]
    async fn test_failure_reported_after_all_deliveries() {
        let bus = InMemoryEventBus::new();
        let failing = Arc::new(Recorder { fail: true, ..Default::default() });
        bus.subscribe(failing.clone());

        let result = bus.publish(vec![case_created(1), case_created(2)]).await;
        assert!(matches!(result, Err(RepositoryError::Publish(_))));
        assert_eq!(failing.seen.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_tracing_subscriber_handles_every_variant() {
        let subscriber = TracingAuditSubscriber;
        assert_eq!(subscriber.event_names().len(), DomainEvent::NAMES.len());
        assert!(subscriber.handle(&case_created(1)).await.is_ok());
    }
}
