use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::commit_and_publish;
use crate::application::authorization::{permissions, AuthorizationService};
use crate::application::dto::*;
use crate::domain::aggregates::{Session, User};
use crate::domain::events::{UserLoggedIn, UserLoggedOut, UserRegistered};
use crate::domain::value_objects::{Email, Password};
use crate::ports::inbound::{IdentityUseCases, UseCaseError};
use crate::ports::outbound::{
    AggregateKind, AggregateStore, EventPublisher, Mutation, RoleRepository, UserRepository,
};

/// Identity application service
pub struct IdentityService {
    users: Arc<dyn UserRepository>,
    roles: Arc<dyn RoleRepository>,
    store: Arc<dyn AggregateStore>,
    event_publisher: Arc<dyn EventPublisher>,
    authz: Arc<AuthorizationService>,
}

impl IdentityService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        roles: Arc<dyn RoleRepository>,
        store: Arc<dyn AggregateStore>,
        event_publisher: Arc<dyn EventPublisher>,
        authz: Arc<AuthorizationService>,
    ) -> Self {
        Self {
            users,
            roles,
            store,
            event_publisher,
            authz,
        }
    }

    async fn ensure_roles_exist(&self, role_ids: &[u64]) -> Result<(), UseCaseError> {
        let wanted: BTreeSet<u64> = role_ids.iter().copied().collect();
        let found: BTreeSet<u64> = self
            .roles
            .find_by_ids(role_ids)
            .await?
            .iter()
            .map(|r| r.id())
            .collect();
        match wanted.difference(&found).next() {
            Some(missing) => Err(UseCaseError::Validation(format!("unknown role id {missing}"))),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl IdentityUseCases for IdentityService {
    async fn register_user(&self, actor: Option<u64>, command: RegisterUserCommand) -> Result<User, UseCaseError> {
        match actor {
            Some(actor) => self.authz.authorize(actor, permissions::USER_CREATE).await?,
            None if !command.role_ids.is_empty() => {
                return Err(UseCaseError::Forbidden("self-registration cannot assign roles".into()))
            }
            None => {}
        }

        let email = Email::new(&command.email).map_err(|e| UseCaseError::Validation(e.to_string()))?;
        let password = Password::new(command.password).map_err(|e| UseCaseError::Validation(e.to_string()))?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(UseCaseError::Validation(format!("{email} is already registered")));
        }
        self.ensure_roles_exist(&command.role_ids).await?;

        let id = self.store.next_id(AggregateKind::User).await?;
        let user = User::register(id, email, command.full_name, &password, command.role_ids)?;
        let event = UserRegistered::from_entity(&user, actor);

        commit_and_publish(
            self.store.as_ref(),
            self.event_publisher.as_ref(),
            Mutation::PutUser(user.clone()),
            event.into(),
        )
        .await?;
        Ok(user)
    }

    async fn record_login(&self, command: LoginCommand) -> Result<LoginOutcome, UseCaseError> {
        let email = Email::new(&command.email).map_err(|e| UseCaseError::Validation(e.to_string()))?;
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| UseCaseError::NotFound(format!("user {email}")))?;
        if !user.is_active() {
            return Err(UseCaseError::Forbidden(format!("user {} is inactive", user.id())));
        }

        let session = Session::open(&user, command.ip_address.clone(), command.user_agent.clone());
        let event = UserLoggedIn::from_entity(
            &user,
            session.id.clone(),
            command.ip_address,
            command.user_agent,
        );

        let new_device = event.is_new_device(user.last_user_agent());
        let current_agent = event.user_agent.clone();
        let next = user.logged_in(event.occurred_at, event.user_agent.as_deref());
        let record = commit_and_publish(
            self.store.as_ref(),
            self.event_publisher.as_ref(),
            Mutation::Login {
                user: next.clone(),
                session: session.clone(),
            },
            event.into(),
        )
        .await?;

        if new_device {
            warn!(
                user_id = user.id(),
                session = %session.id,
                previous = user.last_user_agent().unwrap_or("none"),
                current = current_agent.as_deref().unwrap_or("none"),
                "Login from new device"
            );
        }

        Ok(LoginOutcome {
            user: next,
            session,
            new_device,
            record,
        })
    }

    async fn record_logout(&self, user_id: u64, session_id: &str) -> Result<(), UseCaseError> {
        let session = self
            .users
            .find_session(session_id)
            .await?
            .ok_or_else(|| UseCaseError::NotFound(format!("session {session_id}")))?;
        if session.user_id != user_id {
            return Err(UseCaseError::Forbidden(format!(
                "session {session_id} does not belong to user {user_id}"
            )));
        }
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| UseCaseError::NotFound(format!("user {user_id}")))?;

        let event = UserLoggedOut::from_entity(&user, session_id);
        commit_and_publish(
            self.store.as_ref(),
            self.event_publisher.as_ref(),
            Mutation::Logout {
                session_id: session_id.to_string(),
            },
            event.into(),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::commands::fixtures::{harness, Harness, ADMIN, VIEWER};
    use crate::domain::events::AggregateId;
    use crate::ports::outbound::RepositoryError;

    fn service(h: &Harness) -> IdentityService {
        IdentityService::new(h.store.clone(), h.roles.clone(), h.store.clone(), h.bus.clone(), h.authz.clone())
    }

    fn command(email: &str, role_ids: Vec<u64>) -> RegisterUserCommand {
        RegisterUserCommand {
            email: email.into(),
            full_name: "New Hire".into(),
            password: "Corr3ct-H0rse!".into(),
            role_ids,
        }
    }

    #[tokio::test]
    async fn test_admin_registers_user() {
        let h = harness().await;
        let user = service(&h).register_user(Some(ADMIN), command(" New@Firm.org ", vec![20])).await.unwrap();

        assert_eq!(user.email().as_str(), "new@firm.org");
        assert!(user.id() > VIEWER);
        let history = h.store.audit().history(&AggregateId::user(user.id()));
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].event_name, "UserRegistered");
        assert_eq!(history[0].payload["registeredBy"], ADMIN);
    }

    #[tokio::test]
    async fn test_viewer_cannot_register() {
        let h = harness().await;
        let before = h.store.audit().len();
        let result = service(&h).register_user(Some(VIEWER), command("x@firm.org", vec![])).await;
        assert!(matches!(result, Err(UseCaseError::Forbidden(reason)) if reason.contains("user:create")));
        assert_eq!(h.store.audit().len(), before);
    }

    #[tokio::test]
    async fn test_self_registration_rules() {
        let h = harness().await;
        let service = service(&h);
        assert!(matches!(
            service.register_user(None, command("self@firm.org", vec![10])).await,
            Err(UseCaseError::Forbidden(_))
        ));
        assert!(service.register_user(None, command("self@firm.org", vec![])).await.is_ok());
        assert!(matches!(
            service.register_user(None, command("SELF@firm.org", vec![])).await,
            Err(UseCaseError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_input_rejected() {
        let h = harness().await;
        let service = service(&h);
        let weak = RegisterUserCommand { password: "password".into(), ..command("w@firm.org", vec![]) };
        assert!(matches!(service.register_user(Some(ADMIN), weak).await, Err(UseCaseError::Validation(_))));
        assert!(matches!(
            service.register_user(Some(ADMIN), command("r@firm.org", vec![99])).await,
            Err(UseCaseError::Validation(msg)) if msg.contains("99")
        ));
    }

    #[tokio::test]
    async fn test_login_and_logout() {
        let h = harness().await;
        let service = service(&h);
        let login = LoginCommand {
            email: "vic@firm.org".into(),
            ip_address: Some("10.1.1.1".into()),
            user_agent: Some("Firefox".into()),
        };

        let first = service.record_login(login.clone()).await.unwrap();
        assert!(first.new_device);
        assert_eq!(first.user.last_user_agent(), Some("Firefox"));
        assert_eq!(first.record.secondary_aggregate_ids, vec![AggregateId::session(&first.session.id)]);

        let second = service.record_login(login).await.unwrap();
        assert!(!second.new_device);

        assert!(matches!(
            service.record_logout(ADMIN, &second.session.id).await,
            Err(UseCaseError::Forbidden(_))
        ));
        service.record_logout(VIEWER, &second.session.id).await.unwrap();
        assert!(matches!(
            service.record_logout(VIEWER, &second.session.id).await,
            Err(UseCaseError::NotFound(_))
        ));

        let names: Vec<String> = h
            .store
            .audit()
            .history(&AggregateId::user(VIEWER))
            .into_iter()
            .map(|r| r.event_name)
            .collect();
        assert_eq!(names, vec!["UserRegistered", "UserLoggedIn", "UserLoggedIn", "UserLoggedOut"]);
    }

    #[tokio::test]
    async fn test_failed_login_commit_is_not_a_device_change() {
        use crate::infrastructure::InMemoryStore;

        let h = harness().await;
        // Reads see the seeded users; the empty store refuses the commit
        let detached = Arc::new(InMemoryStore::new());
        let broken = IdentityService::new(h.store.clone(), h.roles.clone(), detached.clone(), h.bus.clone(), h.authz.clone());
        let login = LoginCommand {
            email: "vic@firm.org".into(),
            ip_address: None,
            user_agent: Some("Safari".into()),
        };

        assert!(matches!(
            broken.record_login(login.clone()).await,
            Err(UseCaseError::Repository(RepositoryError::NotFound(_)))
        ));
        assert!(detached.audit().is_empty());
        assert_eq!(h.store.audit().history(&AggregateId::user(VIEWER)).len(), 1);

        let outcome = service(&h).record_login(login).await.unwrap();
        assert!(outcome.new_device);
    }
}
