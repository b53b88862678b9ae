use std::sync::Arc;

use async_trait::async_trait;

use super::commit_and_publish;
use crate::application::authorization::{permissions, AuthorizationService};
use crate::application::dto::*;
use crate::domain::aggregates::{Case, CaseStatus};
use crate::domain::events::{CaseCreated, CaseUpdated, EventError};
use crate::domain::DomainError;
use crate::ports::inbound::{CaseUseCases, UseCaseError};
use crate::ports::outbound::{
    AggregateKind, AggregateStore, CaseRepository, EventPublisher, Mutation, UserRepository,
};

/// Case application service
pub struct CaseService {
    cases: Arc<dyn CaseRepository>,
    users: Arc<dyn UserRepository>,
    store: Arc<dyn AggregateStore>,
    event_publisher: Arc<dyn EventPublisher>,
    authz: Arc<AuthorizationService>,
}

impl CaseService {
    pub fn new(
        cases: Arc<dyn CaseRepository>,
        users: Arc<dyn UserRepository>,
        store: Arc<dyn AggregateStore>,
        event_publisher: Arc<dyn EventPublisher>,
        authz: Arc<AuthorizationService>,
    ) -> Self {
        Self {
            cases,
            users,
            store,
            event_publisher,
            authz,
        }
    }

    async fn ensure_assignable(&self, user_id: Option<u64>) -> Result<(), UseCaseError> {
        let Some(user_id) = user_id else {
            return Ok(());
        };
        match self.users.find_by_id(user_id).await? {
            Some(user) if user.is_active() => Ok(()),
            Some(_) => Err(UseCaseError::Validation(format!("user {user_id} is inactive"))),
            None => Err(UseCaseError::Validation(format!("unknown assignee {user_id}"))),
        }
    }

    async fn load(&self, case_id: u64) -> Result<Case, UseCaseError> {
        self.cases
            .find_by_id(case_id)
            .await?
            .ok_or_else(|| UseCaseError::NotFound(format!("case {case_id}")))
    }
}

#[async_trait]
impl CaseUseCases for CaseService {
    async fn create_case(&self, actor: u64, command: CreateCaseCommand) -> Result<Case, UseCaseError> {
        self.authz.authorize(actor, permissions::CASE_CREATE).await?;
        self.ensure_assignable(command.assigned_to).await?;

        let id = self.store.next_id(AggregateKind::Case).await?;
        let mut case = Case::open(id, command.title, command.case_type, actor)?;
        if let Some(description) = command.description {
            case = case.with_description(description);
        }
        if let Some(assignee) = command.assigned_to {
            case = case.with_assignee(assignee);
        }

        let event = CaseCreated::from_entity(&case);
        commit_and_publish(
            self.store.as_ref(),
            self.event_publisher.as_ref(),
            Mutation::PutCase(case.clone()),
            event.into(),
        )
        .await?;
        Ok(case)
    }

    async fn update_case(&self, actor: u64, command: UpdateCaseCommand) -> Result<Case, UseCaseError> {
        self.authz.authorize(actor, permissions::CASE_UPDATE).await?;
        if command.changes.status == Some(CaseStatus::Closed) {
            self.authz.authorize(actor, permissions::CASE_CLOSE).await?;
        }
        self.ensure_assignable(command.changes.assigned_to).await?;

        let before = self.load(command.case_id).await?;
        let after = before.apply(&command.changes)?;
        let event = CaseUpdated::from_entities(&before, &after, actor).map_err(|e| match e {
            EventError::NoChanges(_) => UseCaseError::Domain(DomainError::NoChanges),
            other => UseCaseError::Validation(other.to_string()),
        })?;

        commit_and_publish(
            self.store.as_ref(),
            self.event_publisher.as_ref(),
            Mutation::PutCase(after.clone()),
            event.into(),
        )
        .await?;
        Ok(after)
    }

    async fn get_case(&self, actor: u64, case_id: u64) -> Result<Case, UseCaseError> {
        self.authz.authorize(actor, permissions::CASE_READ).await?;
        self.load(case_id).await
    }
}
