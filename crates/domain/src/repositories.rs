//! Persistence interface consumed by the domain services.
//!
//! Each trait is implemented twice: over PostgreSQL in the `persistence`
//! crate and over in-memory collections for tests and local runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use shared::pagination::KeysetCursor;
use uuid::Uuid;

use crate::error::DomainError;
use crate::models::{
    AdminAuditLog, CreateAdminAuditLogInput, CreateSystemLogInput, CreateUserInput,
    NewNotification, Notification, NotificationScope, PlatformTotals, SystemLog, SystemSetting,
    UpsertMode, User, UserRole,
};

pub type RepoResult<T> = Result<T, DomainError>;

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Persist a notification. Returns `None` when `dedup_key` already exists.
    async fn insert(&self, notification: NewNotification) -> RepoResult<Option<Notification>>;

    /// Notifications in scope, newest first, strictly after `cursor`.
    async fn list(
        &self,
        scope: NotificationScope,
        cursor: Option<KeysetCursor>,
        limit: i64,
    ) -> RepoResult<Vec<Notification>>;

    async fn count_unread(&self, scope: NotificationScope) -> RepoResult<i64>;

    /// Set `read = true`. Returns false when the id is unknown or out of scope.
    async fn mark_read(&self, scope: NotificationScope, id: Uuid) -> RepoResult<bool>;

    /// Mark every unread notification in scope; returns the number changed.
    async fn mark_all_read(&self, scope: NotificationScope) -> RepoResult<u64>;
}

#[async_trait]
pub trait SystemLogRepository: Send + Sync {
    async fn insert(&self, input: CreateSystemLogInput) -> RepoResult<SystemLog>;
}

#[async_trait]
pub trait AdminAuditLogRepository: Send + Sync {
    async fn insert(&self, input: CreateAdminAuditLogInput) -> RepoResult<AdminAuditLog>;
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn get(&self, key: &str) -> RepoResult<Option<SystemSetting>>;

    async fn list(&self) -> RepoResult<Vec<SystemSetting>>;

    async fn upsert(&self, key: &str, value: JsonValue, mode: UpsertMode)
        -> RepoResult<SystemSetting>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>>;

    async fn find_by_auth_subject(&self, subject: &str) -> RepoResult<Option<User>>;

    async fn create(&self, input: CreateUserInput) -> RepoResult<User>;

    /// Returns `None` when no user has the id.
    async fn update_role(&self, id: Uuid, role: UserRole) -> RepoResult<Option<User>>;
}

/// Aggregates read by the evaluator and the system status surface.
#[async_trait]
pub trait PlatformStatsRepository: Send + Sync {
    async fn totals(&self) -> RepoResult<PlatformTotals>;

    /// Users created at or after `since`, oldest first.
    async fn users_created_since(&self, since: DateTime<Utc>) -> RepoResult<Vec<User>>;

    async fn transactions_created_since(&self, since: DateTime<Utc>) -> RepoResult<i64>;
}
