use std::sync::Arc;

use async_trait::async_trait;

use super::commit_and_publish;
use crate::application::authorization::{permissions, AuthorizationService};
use crate::application::dto::*;
use crate::domain::aggregates::{Case, Evidence, NewEvidence};
use crate::domain::events::{EvidenceSuperseded, EvidenceUploaded};
use crate::domain::value_objects::EvidenceType;
use crate::domain::DomainError;
use crate::ports::inbound::{EvidenceUseCases, UseCaseError};
use crate::ports::outbound::{
    AggregateKind, AggregateStore, CaseRepository, EventPublisher, EvidenceRepository, Mutation,
};

/// Evidence application service
pub struct EvidenceService {
    cases: Arc<dyn CaseRepository>,
    evidence: Arc<dyn EvidenceRepository>,
    store: Arc<dyn AggregateStore>,
    event_publisher: Arc<dyn EventPublisher>,
    authz: Arc<AuthorizationService>,
}

impl EvidenceService {
    pub fn new(
        cases: Arc<dyn CaseRepository>,
        evidence: Arc<dyn EvidenceRepository>,
        store: Arc<dyn AggregateStore>,
        event_publisher: Arc<dyn EventPublisher>,
        authz: Arc<AuthorizationService>,
    ) -> Self {
        Self {
            cases,
            evidence,
            store,
            event_publisher,
            authz,
        }
    }

    /// Case that accepts new evidence
    async fn open_case(&self, case_id: u64) -> Result<Case, UseCaseError> {
        let case = self
            .cases
            .find_by_id(case_id)
            .await?
            .ok_or_else(|| UseCaseError::NotFound(format!("case {case_id}")))?;
        if case.is_closed() {
            return Err(DomainError::CaseClosed(case_id).into());
        }
        Ok(case)
    }

    async fn load(&self, evidence_id: u64) -> Result<Evidence, UseCaseError> {
        self.evidence
            .find_by_id(evidence_id)
            .await?
            .ok_or_else(|| UseCaseError::NotFound(format!("evidence {evidence_id}")))
    }
}

/// Run the upload pre-check and build the entity input
fn prepare(case_id: u64, input: EvidenceInput) -> Result<NewEvidence, UseCaseError> {
    let evidence_type =
        EvidenceType::new(&input.evidence_type).map_err(|e| UseCaseError::Validation(e.to_string()))?;

    if let Some(path) = input.file_path.as_deref().filter(|p| !p.trim().is_empty()) {
        let size = input
            .file_size
            .ok_or_else(|| UseCaseError::Validation("fileSize is required with a file".into()))?;
        let file_name = input
            .file_name
            .as_deref()
            .unwrap_or_else(|| path.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(path));
        evidence_type
            .validate_upload(file_name, size)
            .map_err(|e| UseCaseError::Validation(e.to_string()))?;
    }

    Ok(NewEvidence {
        case_id,
        evidence_type,
        title: input.title,
        description: input.description,
        file_path: input.file_path,
        file_size: input.file_size,
        content: input.content,
        obtained_date: input.obtained_date,
    })
}

#[async_trait]
impl EvidenceUseCases for EvidenceService {
    async fn upload_evidence(&self, actor: u64, command: UploadEvidenceCommand) -> Result<Evidence, UseCaseError> {
        self.authz.authorize(actor, permissions::EVIDENCE_CREATE).await?;
        let case = self.open_case(command.case_id).await?;
        let input = prepare(case.id(), command.evidence)?;

        let id = self.store.next_id(AggregateKind::Evidence).await?;
        let evidence = Evidence::create(id, input, actor)?;
        let event = EvidenceUploaded::from_entity(&evidence);

        commit_and_publish(
            self.store.as_ref(),
            self.event_publisher.as_ref(),
            Mutation::InsertEvidence(evidence.clone()),
            event.into(),
        )
        .await?;
        Ok(evidence)
    }

    async fn supersede_evidence(&self, actor: u64, command: SupersedeEvidenceCommand) -> Result<Evidence, UseCaseError> {
        self.authz.authorize(actor, permissions::EVIDENCE_SUPERSEDE).await?;
        let original = self.load(command.evidence_id).await?;
        self.open_case(original.case_id()).await?;

        let siblings = self.evidence.find_by_case(original.case_id()).await?;
        if let Some(existing) = siblings.iter().find(|e| e.supersedes() == Some(original.id())) {
            return Err(UseCaseError::Validation(format!(
                "evidence {} is already superseded by {}",
                original.id(),
                existing.id()
            )));
        }

        let input = prepare(original.case_id(), command.replacement)?;
        let id = self.store.next_id(AggregateKind::Evidence).await?;
        let replacement = original.supersede(id, input, actor)?;
        let event = EvidenceSuperseded::from_entities(&original, &replacement, command.reason, actor)?;

        commit_and_publish(
            self.store.as_ref(),
            self.event_publisher.as_ref(),
            Mutation::InsertEvidence(replacement.clone()),
            event.into(),
        )
        .await?;
        Ok(replacement)
    }

    async fn list_evidence(&self, actor: u64, case_id: u64) -> Result<Vec<Evidence>, UseCaseError> {
        self.authz.authorize(actor, permissions::EVIDENCE_READ).await?;
        if self.cases.find_by_id(case_id).await?.is_none() {
            return Err(UseCaseError::NotFound(format!("case {case_id}")));
        }
        Ok(self.evidence.find_by_case(case_id).await?)
    }
}
