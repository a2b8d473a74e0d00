//! In-memory implementation of every persistence trait.
//!
//! Used by the HTTP integration tests and by `FW__DATABASE__BACKEND=memory`
//! local runs. Semantics match the PostgreSQL repositories, including
//! idempotency keys, keyset pagination and read-state monotonicity.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::models::system_settings::merge_objects;
use domain::models::{
    AdminAuditLog, CreateAdminAuditLogInput, CreateSystemLogInput, CreateUserInput,
    NewNotification, Notification, NotificationScope, PlatformTotals, SystemLog, SystemSetting,
    UpsertMode, User, UserRole,
};
use domain::repositories::{
    AdminAuditLogRepository, NotificationRepository, PlatformStatsRepository, RepoResult,
    SettingsRepository, SystemLogRepository, UserRepository,
};
use domain::DomainError;
use serde_json::Value as JsonValue;
use shared::pagination::KeysetCursor;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    notifications: Vec<Notification>,
    dedup_keys: HashSet<String>,
    system_logs: Vec<SystemLog>,
    audit_logs: Vec<AdminAuditLog>,
    settings: BTreeMap<String, SystemSetting>,
    accounts: Vec<DateTime<Utc>>,
    transactions: Vec<DateTime<Utc>>,
}

/// Failure injection switches.
#[derive(Debug, Default)]
pub struct FailureSwitches {
    pub log_writes: AtomicBool,
    pub notifications: AtomicBool,
    pub stats: AtomicBool,
    pub settings: AtomicBool,
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    pub failures: FailureSwitches,
}

fn injected(switch: &AtomicBool, what: &str) -> RepoResult<()> {
    if switch.load(Ordering::SeqCst) {
        Err(DomainError::persistence(format!("injected failure: {}", what)))
    } else {
        Ok(())
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_log_writes(&self, fail: bool) {
        self.failures.log_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_notifications(&self, fail: bool) {
        self.failures.notifications.store(fail, Ordering::SeqCst);
    }

    pub fn fail_stats(&self, fail: bool) {
        self.failures.stats.store(fail, Ordering::SeqCst);
    }

    pub fn fail_settings(&self, fail: bool) {
        self.failures.settings.store(fail, Ordering::SeqCst);
    }

    /// Insert a user with an explicit creation time.
    pub async fn seed_user(
        &self,
        email: &str,
        role: UserRole,
        created_at: DateTime<Utc>,
    ) -> User {
        let user = User {
            id: Uuid::new_v4(),
            auth_subject: format!("seed|{}", Uuid::new_v4()),
            email: email.to_string(),
            name: None,
            role,
            created_at,
        };
        self.tables.write().await.users.push(user.clone());
        user
    }

    /// Insert a notification with an explicit creation time.
    pub async fn seed_notification(&self, notification: Notification) {
        self.tables.write().await.notifications.push(notification);
    }

    pub async fn record_account(&self, created_at: DateTime<Utc>) {
        self.tables.write().await.accounts.push(created_at);
    }

    pub async fn record_transaction(&self, created_at: DateTime<Utc>) {
        self.tables.write().await.transactions.push(created_at);
    }

    pub async fn system_logs(&self) -> Vec<SystemLog> {
        self.tables.read().await.system_logs.clone()
    }

    pub async fn audit_logs(&self) -> Vec<AdminAuditLog> {
        self.tables.read().await.audit_logs.clone()
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.tables.read().await.notifications.clone()
    }
}

#[async_trait]
impl NotificationRepository for InMemoryStore {
    async fn insert(&self, notification: NewNotification) -> RepoResult<Option<Notification>> {
        injected(&self.failures.notifications, "notifications")?;
        let NewNotification { draft, dedup_key } = notification;
        let mut tables = self.tables.write().await;

        if let Some(key) = &dedup_key {
            if !tables.dedup_keys.insert(key.clone()) {
                return Ok(None);
            }
        }

        let created = Notification {
            id: Uuid::new_v4(),
            notification_type: draft.notification_type,
            title: draft.title,
            message: draft.message,
            priority: draft.priority,
            read: false,
            user_id: draft.user_id,
            related_id: draft.related_id,
            related_type: draft.related_type,
            created_at: Utc::now(),
        };
        tables.notifications.push(created.clone());
        Ok(Some(created))
    }

    async fn list(
        &self,
        scope: NotificationScope,
        cursor: Option<KeysetCursor>,
        limit: i64,
    ) -> RepoResult<Vec<Notification>> {
        injected(&self.failures.notifications, "notifications")?;
        let tables = self.tables.read().await;

        let mut visible: Vec<Notification> = tables
            .notifications
            .iter()
            .filter(|n| scope.includes(n))
            .filter(|n| match cursor {
                Some(c) => (n.created_at, n.id) < (c.created_at, c.id),
                None => true,
            })
            .cloned()
            .collect();

        visible.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        visible.truncate(limit.max(0) as usize);
        Ok(visible)
    }

    async fn count_unread(&self, scope: NotificationScope) -> RepoResult<i64> {
        injected(&self.failures.notifications, "notifications")?;
        let tables = self.tables.read().await;
        Ok(tables
            .notifications
            .iter()
            .filter(|n| !n.read && scope.includes(n))
            .count() as i64)
    }

    async fn mark_read(&self, scope: NotificationScope, id: Uuid) -> RepoResult<bool> {
        injected(&self.failures.notifications, "notifications")?;
        let mut tables = self.tables.write().await;
        match tables
            .notifications
            .iter_mut()
            .find(|n| n.id == id && scope.includes(n))
        {
            Some(notification) => {
                notification.read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_read(&self, scope: NotificationScope) -> RepoResult<u64> {
        injected(&self.failures.notifications, "notifications")?;
        let mut tables = self.tables.write().await;
        let mut changed = 0;
        for notification in tables.notifications.iter_mut() {
            if !notification.read && scope.includes(notification) {
                notification.read = true;
                changed += 1;
            }
        }
        Ok(changed)
    }
}

#[async_trait]
impl SystemLogRepository for InMemoryStore {
    async fn insert(&self, input: CreateSystemLogInput) -> RepoResult<SystemLog> {
        injected(&self.failures.log_writes, "system_logs")?;
        let options = input.options;
        let record = SystemLog {
            id: Uuid::new_v4(),
            action: input.action,
            module: options.module,
            description: input.description,
            level: options.level,
            user_id: options.user_id,
            ip_address: options.ip_address,
            user_agent: options.user_agent,
            resource_id: options.resource_id,
            metadata: options.metadata,
            created_at: Utc::now(),
        };
        self.tables.write().await.system_logs.push(record.clone());
        Ok(record)
    }
}

#[async_trait]
impl AdminAuditLogRepository for InMemoryStore {
    async fn insert(&self, input: CreateAdminAuditLogInput) -> RepoResult<AdminAuditLog> {
        injected(&self.failures.log_writes, "admin_audit_logs")?;
        let record = AdminAuditLog {
            id: Uuid::new_v4(),
            action: input.action,
            resource: input.resource,
            resource_id: input.resource_id,
            description: input.description,
            user_id: input.user_id,
            ip_address: input.ip_address,
            user_agent: input.user_agent,
            metadata: input.metadata,
            created_at: Utc::now(),
        };
        self.tables.write().await.audit_logs.push(record.clone());
        Ok(record)
    }
}

#[async_trait]
impl SettingsRepository for InMemoryStore {
    async fn get(&self, key: &str) -> RepoResult<Option<SystemSetting>> {
        injected(&self.failures.settings, "settings")?;
        Ok(self.tables.read().await.settings.get(key).cloned())
    }

    async fn list(&self) -> RepoResult<Vec<SystemSetting>> {
        injected(&self.failures.settings, "settings")?;
        Ok(self.tables.read().await.settings.values().cloned().collect())
    }

    async fn upsert(
        &self,
        key: &str,
        value: JsonValue,
        mode: UpsertMode,
    ) -> RepoResult<SystemSetting> {
        injected(&self.failures.settings, "settings")?;
        let mut tables = self.tables.write().await;
        let value = match (mode, tables.settings.get(key)) {
            (UpsertMode::Merge, Some(existing)) => merge_objects(&existing.value, &value),
            _ => value,
        };
        let setting = SystemSetting {
            key: key.to_string(),
            value,
            updated_at: Utc::now(),
        };
        tables.settings.insert(key.to_string(), setting.clone());
        Ok(setting)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        Ok(self
            .tables
            .read()
            .await
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn find_by_auth_subject(&self, subject: &str) -> RepoResult<Option<User>> {
        Ok(self
            .tables
            .read()
            .await
            .users
            .iter()
            .find(|u| u.auth_subject == subject)
            .cloned())
    }

    async fn create(&self, input: CreateUserInput) -> RepoResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.auth_subject == input.auth_subject) {
            return Err(DomainError::persistence(
                "duplicate key value violates unique constraint \"users_auth_subject_key\"",
            ));
        }
        let user = User {
            id: Uuid::new_v4(),
            auth_subject: input.auth_subject,
            email: input.email,
            name: input.name,
            role: input.role,
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn update_role(&self, id: Uuid, role: UserRole) -> RepoResult<Option<User>> {
        let mut tables = self.tables.write().await;
        Ok(tables.users.iter_mut().find(|u| u.id == id).map(|user| {
            user.role = role;
            user.clone()
        }))
    }
}

#[async_trait]
impl PlatformStatsRepository for InMemoryStore {
    async fn totals(&self) -> RepoResult<PlatformTotals> {
        injected(&self.failures.stats, "stats")?;
        let tables = self.tables.read().await;
        Ok(PlatformTotals {
            users: tables.users.len() as i64,
            transactions: tables.transactions.len() as i64,
            accounts: tables.accounts.len() as i64,
        })
    }

    async fn users_created_since(&self, since: DateTime<Utc>) -> RepoResult<Vec<User>> {
        injected(&self.failures.stats, "stats")?;
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables
            .users
            .iter()
            .filter(|u| u.created_at >= since)
            .cloned()
            .collect();
        users.sort_by_key(|u| (u.created_at, u.id));
        Ok(users)
    }

    async fn transactions_created_since(&self, since: DateTime<Utc>) -> RepoResult<i64> {
        injected(&self.failures.stats, "stats")?;
        let tables = self.tables.read().await;
        Ok(tables.transactions.iter().filter(|t| **t >= since).count() as i64)
    }
}
