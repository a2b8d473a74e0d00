//! Evaluate platform state and persist any warranted notifications.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use domain::models::system_settings::{SECURITY_KEY, SYSTEM_KEY};
use domain::models::SystemFlags;
use domain::repositories::SettingsRepository;
use domain::services::{DedupPolicy, EvaluationContext, EventEvaluator, NotificationStore};
use domain::DomainError;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use super::scheduler::Job;

/// Background job feeding the notification store from the evaluator.
///
/// Holds the "last evaluated at" watermark. The watermark only moves after
/// every draft of a cycle has been persisted, so a failed cycle is retried
/// over the same window on the next tick.
pub struct NotificationPollJob {
    evaluator: EventEvaluator,
    store: NotificationStore,
    settings: Arc<dyn SettingsRepository>,
    policy: DedupPolicy,
    lookback: ChronoDuration,
    watermark: Mutex<Option<DateTime<Utc>>>,
}

impl NotificationPollJob {
    pub fn new(
        evaluator: EventEvaluator,
        store: NotificationStore,
        settings: Arc<dyn SettingsRepository>,
        policy: DedupPolicy,
        lookback_minutes: i64,
    ) -> Self {
        Self {
            evaluator,
            store,
            settings,
            policy,
            lookback: ChronoDuration::minutes(lookback_minutes.max(0)),
            watermark: Mutex::new(None),
        }
    }

    pub async fn watermark(&self) -> Option<DateTime<Utc>> {
        *self.watermark.lock().await
    }

    async fn load_flags(&self) -> Result<SystemFlags, DomainError> {
        let system = self.settings.get(SYSTEM_KEY).await?;
        let security = self.settings.get(SECURITY_KEY).await?;
        Ok(SystemFlags::from_settings(
            system.as_ref().map(|s| &s.value),
            security.as_ref().map(|s| &s.value),
        ))
    }

    /// One full cycle evaluated at `now`.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<usize, DomainError> {
        let mut watermark = self.watermark.lock().await;
        let since = watermark.unwrap_or(now - self.lookback);

        let flags = self.load_flags().await?;
        let ctx = EvaluationContext::new(now, since).with_flags(flags);
        let drafts = self.evaluator.evaluate(&ctx).await?;
        let evaluated = drafts.len();

        let mut created = 0;
        for draft in drafts {
            let inserted = match self.policy.key_for(&draft, now) {
                Some(key) => self.store.create_deduplicated(draft, key).await?.is_some(),
                None => {
                    self.store.create(draft).await?;
                    true
                }
            };
            if inserted {
                created += 1;
            }
        }

        *watermark = Some(now);
        info!(
            evaluated,
            created,
            since = %since,
            "Notification poll cycle finished"
        );
        Ok(created)
    }
}

#[async_trait::async_trait]
impl Job for NotificationPollJob {
    fn name(&self) -> &'static str {
        "notification_poll"
    }

    async fn execute(&self) -> Result<(), DomainError> {
        self.run_at(Utc::now()).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use domain::models::{NotificationPriority, NotificationType, UpsertMode, UserRole};
    use domain::services::{HealthSignal, StaticHealthProbe};
    use persistence::memory::InMemoryStore;
    use serde_json::json;

    fn job(store: &Arc<InMemoryStore>, health: Arc<StaticHealthProbe>) -> NotificationPollJob {
        NotificationPollJob::new(
            EventEvaluator::new(store.clone(), health),
            NotificationStore::new(store.clone()),
            store.clone(),
            DedupPolicy::default(),
            60,
        )
    }

    #[tokio::test]
    async fn test_first_cycle_uses_lookback_and_dedups_repeats() {
        let store = Arc::new(InMemoryStore::new());
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 10, 15, 0).unwrap();
        for minutes in [10, 20, 30] {
            store
                .seed_user(
                    &format!("user{}@example.com", minutes),
                    UserRole::User,
                    now - ChronoDuration::minutes(minutes),
                )
                .await;
        }
        store
            .seed_user("old@example.com", UserRole::User, now - ChronoDuration::hours(3))
            .await;

        let job = job(&store, Arc::new(StaticHealthProbe::healthy()));

        // 3 new users + 1 growth summary + 1 metrics summary.
        assert_eq!(job.run_at(now).await.unwrap(), 5);
        assert_eq!(job.watermark().await, Some(now));

        // Unchanged state in the same hour creates nothing.
        let later = now + ChronoDuration::seconds(30);
        assert_eq!(job.run_at(later).await.unwrap(), 0);

        let notifications = store.notifications().await;
        let new_users: Vec<_> = notifications
            .iter()
            .filter(|n| n.related_type.as_deref() == Some("user"))
            .collect();
        assert_eq!(new_users.len(), 3);
        assert!(new_users
            .iter()
            .all(|n| n.priority == NotificationPriority::Medium
                && n.notification_type == NotificationType::Info));

        let growth: Vec<_> = notifications
            .iter()
            .filter(|n| n.title == "User Growth")
            .collect();
        assert_eq!(growth.len(), 1);
        assert_eq!(growth[0].message, "3 new user(s) registered in the last hour");
    }

    #[tokio::test]
    async fn test_user_growth_repeats_once_per_half_hour() {
        let store = Arc::new(InMemoryStore::new());
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 10, 5, 0).unwrap();
        store
            .seed_user("fresh@example.com", UserRole::User, now - ChronoDuration::minutes(2))
            .await;
        let job = job(&store, Arc::new(StaticHealthProbe::healthy()));

        job.run_at(now).await.unwrap();
        job.run_at(now + ChronoDuration::minutes(20)).await.unwrap();
        // Next slot; metrics stays in the same hour bucket.
        assert_eq!(job.run_at(now + ChronoDuration::minutes(26)).await.unwrap(), 1);

        let growth = store
            .notifications()
            .await
            .into_iter()
            .filter(|n| n.title == "User Growth")
            .count();
        assert_eq!(growth, 2);
    }

    #[tokio::test]
    async fn test_failed_cycle_keeps_watermark() {
        let store = Arc::new(InMemoryStore::new());
        let job = job(&store, Arc::new(StaticHealthProbe::healthy()));
        let now = Utc::now();

        store.fail_stats(true);
        assert!(job.run_at(now).await.is_err());
        assert_eq!(job.watermark().await, None);

        store.fail_stats(false);
        job.run_at(now).await.unwrap();
        assert_eq!(job.watermark().await, Some(now));
    }

    #[tokio::test]
    async fn test_failed_insert_keeps_watermark() {
        let store = Arc::new(InMemoryStore::new());
        let job = job(&store, Arc::new(StaticHealthProbe::healthy()));

        store.fail_notifications(true);
        assert!(job.run_at(Utc::now()).await.is_err());
        assert_eq!(job.watermark().await, None);
    }

    #[tokio::test]
    async fn test_maintenance_and_health_drafts() {
        let store = Arc::new(InMemoryStore::new());
        store
            .upsert(
                SYSTEM_KEY,
                json!({ "maintenanceMode": true, "maintenanceMessage": "Upgrading ledgers" }),
                UpsertMode::Merge,
            )
            .await
            .unwrap();
        let health = Arc::new(StaticHealthProbe::new(HealthSignal::Critical {
            message: "database unreachable".into(),
        }));
        let job = job(&store, health);

        job.run_at(Utc::now()).await.unwrap();

        let notifications = store.notifications().await;
        let maintenance = notifications
            .iter()
            .find(|n| n.title == "Maintenance Mode Active")
            .expect("maintenance notification");
        assert_eq!(maintenance.notification_type, NotificationType::Warning);
        assert!(maintenance.message.contains("Upgrading ledgers"));

        let critical = notifications
            .iter()
            .find(|n| n.notification_type == NotificationType::Error)
            .expect("health notification");
        assert_eq!(critical.priority, NotificationPriority::High);
    }
}
