//! In-memory aggregate store
//!
//! State and audit ledger share one write lock: a commit either applies the
//! mutation and appends its record, or does neither. The lock is also the
//! single-writer serialization point for every aggregate.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use crate::audit::{AuditRecord, AuditTrail};
use crate::config::AuditConfig;
use crate::domain::aggregates::{Case, Evidence, Session, User};
use crate::domain::events::{AggregateId, DomainEvent};
use crate::domain::value_objects::Email;
use crate::ports::outbound::{
    AggregateKind, AggregateStore, CaseRepository, EvidenceRepository, Mutation, RepositoryError,
    UserRepository,
};

#[derive(Default)]
struct State {
    users: HashMap<u64, User>,
    sessions: HashMap<String, Session>,
    cases: HashMap<u64, Case>,
    evidence: BTreeMap<u64, Evidence>,
    /// Every evidence id ever inserted; never shrinks
    issued_evidence_ids: HashSet<u64>,
    last_ids: HashMap<AggregateKind, u64>,
}

impl State {
    fn bump(&mut self, kind: AggregateKind, id: u64) {
        let last = self.last_ids.entry(kind).or_insert(0);
        *last = (*last).max(id);
    }

    /// Reject a mutation that cannot be applied; nothing is changed here
    fn check(&self, mutation: &Mutation, event: &DomainEvent) -> Result<(), RepositoryError> {
        match mutation {
            Mutation::PutUser(user) | Mutation::Login { user, .. } => {
                let taken = self
                    .users
                    .values()
                    .any(|u| u.email() == user.email() && u.id() != user.id());
                if taken {
                    return Err(RepositoryError::DuplicateKey(format!("email {}", user.email())));
                }
                if matches!(mutation, Mutation::Login { .. }) && !self.users.contains_key(&user.id()) {
                    return Err(RepositoryError::NotFound(format!("user {}", user.id())));
                }
            }
            Mutation::Logout { session_id } => {
                if !self.sessions.contains_key(session_id) {
                    return Err(RepositoryError::NotFound(format!("session {session_id}")));
                }
            }
            Mutation::PutCase(_) => {}
            Mutation::InsertEvidence(evidence) => {
                if self.issued_evidence_ids.contains(&evidence.id()) {
                    return Err(RepositoryError::Immutable(format!("evidence {}", evidence.id())));
                }
                if !self.cases.contains_key(&evidence.case_id()) {
                    return Err(RepositoryError::NotFound(format!("case {}", evidence.case_id())));
                }
                if let Some(original) = evidence.supersedes() {
                    if !self.evidence.contains_key(&original) {
                        return Err(RepositoryError::NotFound(format!("evidence {original}")));
                    }
                    if let Some(existing) = self.evidence.values().find(|e| e.supersedes() == Some(original)) {
                        return Err(RepositoryError::Conflict(format!(
                            "evidence {original} is already superseded by {}",
                            existing.id()
                        )));
                    }
                }
            }
        }
        self.check_event_key(mutation, event)
    }

    /// The event must be keyed to the aggregate the mutation changes
    fn check_event_key(&self, mutation: &Mutation, event: &DomainEvent) -> Result<(), RepositoryError> {
        let expected = match mutation {
            Mutation::PutUser(user) | Mutation::Login { user, .. } => AggregateId::user(user.id()),
            Mutation::Logout { session_id } => {
                let session = AggregateId::session(session_id);
                if !event.secondary_aggregate_ids().contains(&session) {
                    return Err(RepositoryError::Conflict(format!(
                        "{} event does not reference {session}",
                        event.event_name()
                    )));
                }
                match self.sessions.get(session_id) {
                    Some(open) => AggregateId::user(open.user_id),
                    None => return Err(RepositoryError::NotFound(format!("session {session_id}"))),
                }
            }
            Mutation::PutCase(case) => AggregateId::case(case.id()),
            Mutation::InsertEvidence(evidence) => {
                AggregateId::evidence(evidence.supersedes().unwrap_or(evidence.id()))
            }
        };

        let actual = event.aggregate_id();
        if actual != expected {
            return Err(RepositoryError::Conflict(format!(
                "{} event for {actual} does not describe a change to {expected}",
                event.event_name()
            )));
        }
        Ok(())
    }

    fn apply(&mut self, mutation: Mutation) {
        match mutation {
            Mutation::PutUser(user) => {
                self.bump(AggregateKind::User, user.id());
                self.users.insert(user.id(), user);
            }
            Mutation::Login { user, session } => {
                self.sessions.insert(session.id.clone(), session);
                self.users.insert(user.id(), user);
            }
            Mutation::Logout { session_id } => {
                self.sessions.remove(&session_id);
            }
            Mutation::PutCase(case) => {
                self.bump(AggregateKind::Case, case.id());
                self.cases.insert(case.id(), case);
            }
            Mutation::InsertEvidence(evidence) => {
                self.bump(AggregateKind::Evidence, evidence.id());
                self.issued_evidence_ids.insert(evidence.id());
                self.evidence.insert(evidence.id(), evidence);
            }
        }
    }
}

/// Users, sessions, cases and evidence with an attached audit ledger
pub struct InMemoryStore {
    state: RwLock<State>,
    audit: Arc<AuditTrail>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_config(&AuditConfig::default())
    }

    pub fn with_config(config: &AuditConfig) -> Self {
        Self {
            state: RwLock::new(State::default()),
            audit: Arc::new(AuditTrail::with_config(config)),
        }
    }

    /// Ledger of every committed event
    pub fn audit(&self) -> Arc<AuditTrail> {
        self.audit.clone()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AggregateStore for InMemoryStore {
    async fn next_id(&self, kind: AggregateKind) -> Result<u64, RepositoryError> {
        let mut state = self.state.write();
        let last = state.last_ids.entry(kind).or_insert(0);
        *last += 1;
        Ok(*last)
    }

    async fn commit(&self, mutation: Mutation, event: DomainEvent) -> Result<AuditRecord, RepositoryError> {
        let mut state = self.state.write();
        state.check(&mutation, &event)?;
        let record = self.audit.append(&event)?;
        state.apply(mutation);

        debug!(
            aggregate = %record.aggregate_id,
            sequence = record.sequence,
            "Mutation applied with audit record"
        );
        Ok(record)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, id: u64) -> Result<Option<User>, RepositoryError> {
        Ok(self.state.read().users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        Ok(self.state.read().users.values().find(|u| u.email() == email).cloned())
    }

    async fn find_session(&self, session_id: &str) -> Result<Option<Session>, RepositoryError> {
        Ok(self.state.read().sessions.get(session_id).cloned())
    }
}

#[async_trait]
impl CaseRepository for InMemoryStore {
    async fn find_by_id(&self, id: u64) -> Result<Option<Case>, RepositoryError> {
        Ok(self.state.read().cases.get(&id).cloned())
    }
}

#[async_trait]
impl EvidenceRepository for InMemoryStore {
    async fn find_by_id(&self, id: u64) -> Result<Option<Evidence>, RepositoryError> {
        Ok(self.state.read().evidence.get(&id).cloned())
    }

    async fn find_by_case(&self, case_id: u64) -> Result<Vec<Evidence>, RepositoryError> {
        Ok(self
            .state
            .read()
            .evidence
            .values()
            .filter(|e| e.case_id() == case_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditError;
    use crate::domain::aggregates::NewEvidence;
    use crate::domain::events::{CaseCreated, EvidenceSuperseded, EvidenceUploaded, UserRegistered};
    use crate::domain::value_objects::EvidenceType;
    use chrono::NaiveDate;

    fn note(id: u64, case_id: u64) -> Evidence {
        Evidence::create(
            id,
            NewEvidence {
                case_id,
                evidence_type: EvidenceType::Note,
                title: "Notes".into(),
                description: None,
                file_path: None,
                file_size: None,
                content: Some("enc".into()),
                obtained_date: NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
            },
            1,
        )
        .unwrap()
    }

    async fn store_with_case() -> InMemoryStore {
        let store = InMemoryStore::new();
        let case = Case::open(1, "Case", "hr", 1).unwrap();
        let event = CaseCreated::from_entity(&case);
        store.commit(Mutation::PutCase(case), event.into()).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_evidence_ids_never_reused() {
        let store = store_with_case().await;
        let first = note(5, 1);
        let event = EvidenceUploaded::from_entity(&first);
        store.commit(Mutation::InsertEvidence(first), event.into()).await.unwrap();

        let overwrite = note(5, 1);
        let event = EvidenceUploaded::from_entity(&overwrite);
        let result = store.commit(Mutation::InsertEvidence(overwrite), event.into()).await;
        assert_eq!(result, Err(RepositoryError::Immutable("evidence 5".into())));
        assert_eq!(store.audit().history(&AggregateId::evidence(5)).len(), 1);
        assert_eq!(store.next_id(AggregateKind::Evidence).await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_failed_append_changes_nothing() {
        let store = store_with_case().await;
        let late = note(9, 1);
        let stale_event = EvidenceUploaded::from_entity(&late);
        // A later event already on evidence-9's chain makes this append out of order
        let mut future = stale_event.clone();
        future.occurred_at = stale_event.occurred_at + chrono::Duration::seconds(60);
        store.audit().append(&future.into()).unwrap();

        let result = store.commit(Mutation::InsertEvidence(late), stale_event.into()).await;
        assert!(matches!(result, Err(RepositoryError::Audit(AuditError::OutOfOrder { .. }))));
        assert!(EvidenceRepository::find_by_id(&store, 9).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_evidence_requires_known_case() {
        let store = InMemoryStore::new();
        let orphan = note(1, 77);
        let event = EvidenceUploaded::from_entity(&orphan);
        assert!(matches!(
            store.commit(Mutation::InsertEvidence(orphan), event.into()).await,
            Err(RepositoryError::NotFound(_))
        ));
        assert!(store.audit().is_empty());
    }

    #[tokio::test]
    async fn test_event_must_match_mutation() {
        let store = store_with_case().await;
        let user = User::with_hash(7, Email::new("ann@firm.org").unwrap(), "Ann", "$argon2id$seed", vec![]).unwrap();
        let retitled = Case::open(1, "Renamed", "hr", 1).unwrap();

        let result = store
            .commit(Mutation::PutCase(retitled), UserRegistered::from_entity(&user, None).into())
            .await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
        assert_eq!(CaseRepository::find_by_id(&store, 1).await.unwrap().unwrap().title(), "Case");
        assert!(store.audit().history(&AggregateId::user(7)).is_empty());
        assert_eq!(store.audit().len(), 1);
    }

    #[tokio::test]
    async fn test_evidence_superseded_once() {
        let store = store_with_case().await;
        let original = note(5, 1);
        let event = EvidenceUploaded::from_entity(&original);
        store.commit(Mutation::InsertEvidence(original.clone()), event.into()).await.unwrap();

        let input = || NewEvidence {
            case_id: 1,
            evidence_type: EvidenceType::Note,
            title: "Notes (corrected)".into(),
            description: None,
            file_path: None,
            file_size: None,
            content: Some("enc2".into()),
            obtained_date: NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
        };
        let first = original.supersede(6, input(), 1).unwrap();
        let second = original.supersede(7, input(), 1).unwrap();

        let event = EvidenceSuperseded::from_entities(&original, &first, "typo", 1).unwrap();
        store.commit(Mutation::InsertEvidence(first), event.into()).await.unwrap();

        let event = EvidenceSuperseded::from_entities(&original, &second, "another typo", 1).unwrap();
        let result = store.commit(Mutation::InsertEvidence(second), event.into()).await;
        assert_eq!(
            result,
            Err(RepositoryError::Conflict("evidence 5 is already superseded by 6".into()))
        );
        assert!(EvidenceRepository::find_by_id(&store, 7).await.unwrap().is_none());
        assert_eq!(store.audit().history(&AggregateId::evidence(5)).len(), 2);
    }

    #[tokio::test]
    async fn test_replacement_keyed_to_original() {
        let store = store_with_case().await;
        let original = note(5, 1);
        let event = EvidenceUploaded::from_entity(&original);
        store.commit(Mutation::InsertEvidence(original.clone()), event.into()).await.unwrap();

        // A replacement announced as a plain upload would start a chain of its own
        let replacement = original
            .supersede(
                6,
                NewEvidence {
                    case_id: 1,
                    evidence_type: EvidenceType::Note,
                    title: "Notes".into(),
                    description: None,
                    file_path: None,
                    file_size: None,
                    content: Some("enc2".into()),
                    obtained_date: NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
                },
                1,
            )
            .unwrap();
        let event = EvidenceUploaded::from_entity(&replacement);
        assert!(matches!(
            store.commit(Mutation::InsertEvidence(replacement), event.into()).await,
            Err(RepositoryError::Conflict(_))
        ));
    }
}
