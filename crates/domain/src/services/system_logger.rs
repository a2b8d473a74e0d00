//! Best-effort system log recorder.
//!
//! Writes never fail the caller: a rejected write is counted, remembered in
//! [`LogDiagnostics`] and reported on the operational `tracing` channel.

use metrics::counter;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::{CreateSystemLogInput, LogLevel, LogModule, LogOptions, SystemLog};
use crate::repositories::SystemLogRepository;

/// Failure counters for log writes.
#[derive(Debug, Default)]
pub struct LogDiagnostics {
    failures: AtomicU64,
    last_error: Mutex<Option<String>>,
}

impl LogDiagnostics {
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().ok().and_then(|e| e.clone())
    }

    fn record(&self, message: String) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_error.lock() {
            *last = Some(message);
        }
    }
}

#[derive(Clone)]
pub struct SystemLogger {
    repo: Arc<dyn SystemLogRepository>,
    diagnostics: Arc<LogDiagnostics>,
}

impl SystemLogger {
    pub fn new(repo: Arc<dyn SystemLogRepository>) -> Self {
        Self {
            repo,
            diagnostics: Arc::new(LogDiagnostics::default()),
        }
    }

    pub fn diagnostics(&self) -> &LogDiagnostics {
        &self.diagnostics
    }

    /// Persist a log record. Returns `None` when the write failed.
    pub async fn log(
        &self,
        action: &str,
        description: impl Into<String>,
        options: LogOptions,
    ) -> Option<SystemLog> {
        let input = CreateSystemLogInput {
            action: action.to_string(),
            description: description.into(),
            options,
        };

        match self.repo.insert(input).await {
            Ok(record) => {
                mirror(&record);
                Some(record)
            }
            Err(err) => {
                counter!("system_log_write_failures_total").increment(1);
                warn!(action, error = %err, "Failed to write system log");
                self.diagnostics.record(err.to_string());
                None
            }
        }
    }

    /// Fire-and-forget variant; the write runs on a detached task.
    pub fn log_async(&self, action: &str, description: impl Into<String>, options: LogOptions) {
        let logger = self.clone();
        let action = action.to_string();
        let description = description.into();
        tokio::spawn(async move {
            logger.log(&action, description, options).await;
        });
    }

    pub async fn user_registered(
        &self,
        user_id: Uuid,
        email: &str,
        name: Option<&str>,
    ) -> Option<SystemLog> {
        let (action, description, options) = user_registered_entry(user_id, email, name);
        self.log(action, description, options).await
    }

    /// Non-blocking [`Self::user_registered`].
    pub fn user_registered_async(&self, user_id: Uuid, email: &str, name: Option<&str>) {
        let (action, description, options) = user_registered_entry(user_id, email, name);
        self.log_async(action, description, options);
    }

    pub async fn user_login(
        &self,
        user_id: Uuid,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Option<SystemLog> {
        self.log(
            "USER_LOGIN",
            "User logged in successfully",
            LogOptions::module(LogModule::Auth)
                .with_user(Some(user_id))
                .with_request(ip_address, user_agent),
        )
        .await
    }

    pub async fn transaction_created(
        &self,
        user_id: Uuid,
        transaction_id: &str,
        amount: &str,
        kind: &str,
    ) -> Option<SystemLog> {
        self.log(
            "TRANSACTION_CREATED",
            format!("{} transaction created: ETB {}", kind, amount),
            LogOptions::module(LogModule::Transactions)
                .with_user(Some(user_id))
                .with_resource(transaction_id)
                .with_metadata(json!({ "amount": amount, "type": kind })),
        )
        .await
    }

    pub async fn account_created(
        &self,
        user_id: Uuid,
        account_id: &str,
        account_name: &str,
    ) -> Option<SystemLog> {
        self.log(
            "ACCOUNT_CREATED",
            format!("Account created: {}", account_name),
            LogOptions::module(LogModule::Accounts)
                .with_user(Some(user_id))
                .with_resource(account_id)
                .with_metadata(json!({ "accountName": account_name })),
        )
        .await
    }

    pub async fn admin_action(
        &self,
        user_id: Uuid,
        action: &str,
        details: serde_json::Value,
    ) -> Option<SystemLog> {
        let (kind, description, options) = admin_action_entry(user_id, action, details);
        self.log(kind, description, options).await
    }

    /// Non-blocking [`Self::admin_action`].
    pub fn admin_action_async(&self, user_id: Uuid, action: &str, details: serde_json::Value) {
        let (kind, description, options) = admin_action_entry(user_id, action, details);
        self.log_async(kind, description, options);
    }

    pub async fn error(
        &self,
        module: LogModule,
        description: impl Into<String>,
        err: impl std::fmt::Display,
        user_id: Option<Uuid>,
    ) -> Option<SystemLog> {
        self.log(
            "SYSTEM_ERROR",
            description,
            LogOptions::module(module)
                .with_level(LogLevel::Error)
                .with_user(user_id)
                .with_metadata(json!({ "errorMessage": err.to_string() })),
        )
        .await
    }
}

fn user_registered_entry(
    user_id: Uuid,
    email: &str,
    name: Option<&str>,
) -> (&'static str, String, LogOptions) {
    (
        "USER_REGISTERED",
        format!("New user registered: {}", email),
        LogOptions::module(LogModule::Auth)
            .with_user(Some(user_id))
            .with_metadata(json!({ "email": email, "name": name })),
    )
}

fn admin_action_entry(
    user_id: Uuid,
    action: &str,
    details: serde_json::Value,
) -> (&'static str, String, LogOptions) {
    (
        "ADMIN_ACTION",
        format!("Admin action: {}", action),
        LogOptions::module(LogModule::Admin)
            .with_user(Some(user_id))
            .with_metadata(json!({ "action": action, "details": details })),
    )
}

fn mirror(record: &SystemLog) {
    match record.level {
        LogLevel::Error => error!(module = %record.module, "[{}] {}: {}", record.level, record.action, record.description),
        LogLevel::Warn => warn!(module = %record.module, "[{}] {}: {}", record.level, record.action, record.description),
        LogLevel::Info => info!(module = %record.module, "[{}] {}: {}", record.level, record.action, record.description),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomainError;
    use crate::repositories::RepoResult;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::AtomicBool;
    use tokio::sync::Mutex as AsyncMutex;

    #[derive(Default)]
    struct RecordingRepo {
        fail: AtomicBool,
        records: AsyncMutex<Vec<SystemLog>>,
    }

    #[async_trait]
    impl SystemLogRepository for RecordingRepo {
        async fn insert(&self, input: CreateSystemLogInput) -> RepoResult<SystemLog> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(DomainError::persistence("disk full"));
            }
            let record = SystemLog {
                id: Uuid::new_v4(),
                action: input.action,
                module: input.options.module,
                description: input.description,
                level: input.options.level,
                user_id: input.options.user_id,
                ip_address: input.options.ip_address,
                user_agent: input.options.user_agent,
                resource_id: input.options.resource_id,
                metadata: input.options.metadata,
                created_at: Utc::now(),
            };
            self.records.lock().await.push(record.clone());
            Ok(record)
        }
    }

    #[tokio::test]
    async fn test_wrappers_use_canonical_modules() {
        let repo = Arc::new(RecordingRepo::default());
        let logger = SystemLogger::new(repo.clone());
        let user = Uuid::new_v4();

        logger.user_registered(user, "a@example.com", Some("A")).await;
        logger.user_login(user, None, None).await;
        logger.transaction_created(user, "tx-1", "250.00", "EXPENSE").await;
        logger.account_created(user, "acc-1", "Savings").await;
        logger.admin_action(user, "ban", json!({})).await;
        logger.error(LogModule::System, "cycle failed", "boom", None).await;

        let records = repo.records.lock().await;
        let modules: Vec<LogModule> = records.iter().map(|r| r.module).collect();
        assert_eq!(
            modules,
            vec![
                LogModule::Auth,
                LogModule::Auth,
                LogModule::Transactions,
                LogModule::Accounts,
                LogModule::Admin,
                LogModule::System,
            ]
        );
        assert_eq!(records[5].action, "SYSTEM_ERROR");
        assert_eq!(records[5].level, LogLevel::Error);
        assert_eq!(records[2].resource_id.as_deref(), Some("tx-1"));
    }

    #[tokio::test]
    async fn test_failure_is_swallowed_and_recorded() {
        let repo = Arc::new(RecordingRepo::default());
        repo.fail.store(true, Ordering::SeqCst);
        let logger = SystemLogger::new(repo);

        let result = logger
            .log("USER_LOGIN", "login", LogOptions::module(LogModule::Auth))
            .await;

        assert!(result.is_none());
        assert_eq!(logger.diagnostics().failures(), 1);
        assert!(logger.diagnostics().last_error().unwrap().contains("disk full"));
    }

    #[tokio::test]
    async fn test_log_async_eventually_writes() {
        let repo = Arc::new(RecordingRepo::default());
        let logger = SystemLogger::new(repo.clone());

        logger.log_async("USER_LOGIN", "login", LogOptions::module(LogModule::Auth));

        for _ in 0..50 {
            if !repo.records.lock().await.is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(repo.records.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_async_wrappers_match_awaited_shape() {
        let repo = Arc::new(RecordingRepo::default());
        let logger = SystemLogger::new(repo.clone());
        let user = Uuid::new_v4();

        logger.user_registered_async(user, "b@example.com", None);
        logger.admin_action_async(user, "CHANGE_USER_ROLE", json!({ "role": "admin" }));

        for _ in 0..50 {
            if repo.records.lock().await.len() == 2 {
                break;
            }
            tokio::task::yield_now().await;
        }
        let records = repo.records.lock().await;
        assert_eq!(records.len(), 2);
        let registered = records.iter().find(|r| r.action == "USER_REGISTERED").unwrap();
        assert_eq!(registered.module, LogModule::Auth);
        let admin = records.iter().find(|r| r.action == "ADMIN_ACTION").unwrap();
        assert_eq!(admin.module, LogModule::Admin);
        assert_eq!(admin.metadata.as_ref().unwrap()["details"]["role"], "admin");
    }

    #[tokio::test]
    async fn test_async_failure_is_recorded() {
        let repo = Arc::new(RecordingRepo::default());
        repo.fail.store(true, Ordering::SeqCst);
        let logger = SystemLogger::new(repo);

        logger.admin_action_async(Uuid::new_v4(), "noop", json!({}));

        for _ in 0..50 {
            if logger.diagnostics().failures() > 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(logger.diagnostics().failures(), 1);
    }
}
