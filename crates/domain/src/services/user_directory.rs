//! Maps external identities to local users.

use serde_json::json;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::DomainError;
use crate::models::{CreateUserInput, User, UserRole};
use crate::repositories::UserRepository;
use crate::services::audit::{audit_entries, AdminAuditLogger};
use crate::services::system_logger::SystemLogger;

/// Request metadata carried into audit entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Clone)]
pub struct UserDirectory {
    users: Arc<dyn UserRepository>,
    logger: SystemLogger,
    audit: AdminAuditLogger,
}

impl UserDirectory {
    pub fn new(users: Arc<dyn UserRepository>, logger: SystemLogger, audit: AdminAuditLogger) -> Self {
        Self {
            users,
            logger,
            audit,
        }
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        self.users.find_by_id(id).await
    }

    /// Local user for an identity-provider subject, created on first sight.
    ///
    /// Registration is logged best-effort; a failed log write does not fail
    /// the lookup.
    pub async fn resolve_or_register(
        &self,
        subject: &str,
        email: Option<&str>,
        name: Option<&str>,
    ) -> Result<User, DomainError> {
        if subject.trim().is_empty() {
            return Err(DomainError::AuthenticationRequired);
        }

        if let Some(user) = self.users.find_by_auth_subject(subject).await? {
            return Ok(user);
        }

        let input = CreateUserInput {
            auth_subject: subject.to_string(),
            email: email
                .filter(|e| !e.trim().is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("{}@users.invalid", subject)),
            name: name.map(str::to_string),
            role: UserRole::User,
        };

        let user = match self.users.create(input).await {
            Ok(user) => user,
            // Another request may have registered the same subject first.
            Err(err) => match self.users.find_by_auth_subject(subject).await? {
                Some(user) => return Ok(user),
                None => return Err(err),
            },
        };

        info!(user_id = %user.id, "Registered new user");
        self.logger
            .user_registered_async(user.id, &user.email, user.name.as_deref());
        Ok(user)
    }

    /// Change a user's role on behalf of an administrator.
    pub async fn change_role(
        &self,
        actor: &User,
        target_id: Uuid,
        role: UserRole,
        meta: RequestMeta,
    ) -> Result<User, DomainError> {
        if !actor.is_admin() {
            return Err(DomainError::Forbidden("Admin access required".into()));
        }

        let updated = self
            .users
            .update_role(target_id, role)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("User {} not found", target_id)))?;

        self.audit
            .record(
                audit_entries::role_changed(actor.id, updated.id, &updated.email, &role.to_string())
                    .with_request(meta.ip_address, meta.user_agent),
            )
            .await;
        self.logger.admin_action_async(
            actor.id,
            "CHANGE_USER_ROLE",
            json!({ "targetUserId": updated.id, "role": role }),
        );

        Ok(updated)
    }
}
