//! Event evaluator.
//!
//! Inspects platform state and decides which notifications are warranted.
//! The evaluator does not suppress duplicates; callers pass a `since`
//! watermark and persist drafts with idempotency keys.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::debug;

use crate::error::DomainError;
use crate::models::{
    DraftOrigin, NotificationDraft, NotificationPriority, NotificationType, SystemFlags,
};
use crate::repositories::PlatformStatsRepository;
use crate::services::health::{HealthProbe, HealthSignal};

/// Lookback for the user growth summary, independent of the poll watermark.
const GROWTH_LOOKBACK_HOURS: i64 = 1;

/// Inputs for a single evaluation.
#[derive(Debug, Clone)]
pub struct EvaluationContext {
    pub now: DateTime<Utc>,
    /// Lower bound for "recently created" rows.
    pub since: DateTime<Utc>,
    pub flags: SystemFlags,
}

impl EvaluationContext {
    pub fn new(now: DateTime<Utc>, since: DateTime<Utc>) -> Self {
        Self {
            now,
            since,
            flags: SystemFlags::default(),
        }
    }

    pub fn with_flags(mut self, flags: SystemFlags) -> Self {
        self.flags = flags;
        self
    }
}

pub struct EventEvaluator {
    stats: Arc<dyn PlatformStatsRepository>,
    health: Arc<dyn HealthProbe>,
}

impl EventEvaluator {
    pub fn new(stats: Arc<dyn PlatformStatsRepository>, health: Arc<dyn HealthProbe>) -> Self {
        Self { stats, health }
    }

    /// Run every rule. Any read failure aborts the evaluation.
    pub async fn evaluate(
        &self,
        ctx: &EvaluationContext,
    ) -> Result<Vec<NotificationDraft>, DomainError> {
        let mut drafts = self.new_user_drafts(ctx).await?;

        if let Some(draft) = self.growth_draft(ctx).await? {
            drafts.push(draft);
        }

        if let Some(draft) = self.health_draft().await {
            drafts.push(draft);
        }

        drafts.push(self.metrics_draft().await?);

        if let Some(draft) = maintenance_draft(&ctx.flags) {
            drafts.push(draft);
        }

        debug!(count = drafts.len(), since = %ctx.since, "Evaluation produced drafts");
        Ok(drafts)
    }

    async fn new_user_drafts(
        &self,
        ctx: &EvaluationContext,
    ) -> Result<Vec<NotificationDraft>, DomainError> {
        let users = self
            .stats
            .users_created_since(ctx.since)
            .await
            .map_err(read_failure("new users"))?;

        Ok(users
            .iter()
            .map(|user| {
                NotificationDraft::system(
                    DraftOrigin::NewUser,
                    NotificationType::Info,
                    "New User Registered",
                    format!("{} joined the system", user.display_name()),
                    NotificationPriority::Medium,
                )
                .related_to("user", Some(user.id.to_string()))
            })
            .collect())
    }

    async fn growth_draft(
        &self,
        ctx: &EvaluationContext,
    ) -> Result<Option<NotificationDraft>, DomainError> {
        let recent = self
            .stats
            .users_created_since(ctx.now - Duration::hours(GROWTH_LOOKBACK_HOURS))
            .await
            .map_err(read_failure("user growth"))?
            .len();

        if recent == 0 {
            return Ok(None);
        }

        Ok(Some(
            NotificationDraft::system(
                DraftOrigin::UserGrowth,
                NotificationType::Info,
                "User Growth",
                format!("{} new user(s) registered in the last hour", recent),
                NotificationPriority::Medium,
            )
            .related_to("system", None),
        ))
    }

    async fn health_draft(&self) -> Option<NotificationDraft> {
        let (notification_type, priority, title, message) = match self.health.check().await {
            HealthSignal::Healthy => return None,
            HealthSignal::Degraded { message } => (
                NotificationType::Warning,
                NotificationPriority::Medium,
                "System Health Degraded",
                message,
            ),
            HealthSignal::Critical { message } => (
                NotificationType::Error,
                NotificationPriority::High,
                "System Health Critical",
                message,
            ),
        };

        Some(
            NotificationDraft::system(DraftOrigin::Health, notification_type, title, message, priority)
                .related_to("system", None),
        )
    }

    async fn metrics_draft(&self) -> Result<NotificationDraft, DomainError> {
        let totals = self
            .stats
            .totals()
            .await
            .map_err(read_failure("platform totals"))?;

        Ok(NotificationDraft::system(
            DraftOrigin::Metrics,
            NotificationType::Info,
            "System Overview",
            format!(
                "Platform now has {} users, {} transactions, and {} accounts",
                totals.users, totals.transactions, totals.accounts
            ),
            NotificationPriority::Low,
        )
        .related_to("system", None))
    }
}

fn maintenance_draft(flags: &SystemFlags) -> Option<NotificationDraft> {
    flags.maintenance_mode.then(|| {
        NotificationDraft::system(
            DraftOrigin::Maintenance,
            NotificationType::Warning,
            "Maintenance Mode Active",
            flags.maintenance_message.clone(),
            NotificationPriority::Medium,
        )
        .related_to("system", None)
    })
}

fn read_failure(what: &'static str) -> impl Fn(DomainError) -> DomainError {
    move |err| DomainError::Evaluation(format!("failed to read {}: {}", what, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PlatformTotals, User, UserRole};
    use crate::repositories::RepoResult;
    use crate::services::health::StaticHealthProbe;
    use async_trait::async_trait;
    use chrono::Duration;
    use fake::faker::internet::en::SafeEmail;
    use fake::faker::name::en::Name;
    use fake::Fake;
    use uuid::Uuid;

    struct FixedStats {
        users: Vec<User>,
        totals: PlatformTotals,
        fail: bool,
    }

    #[async_trait]
    impl PlatformStatsRepository for FixedStats {
        async fn totals(&self) -> RepoResult<PlatformTotals> {
            if self.fail {
                return Err(DomainError::persistence("connection refused"));
            }
            Ok(self.totals)
        }

        async fn users_created_since(&self, since: DateTime<Utc>) -> RepoResult<Vec<User>> {
            if self.fail {
                return Err(DomainError::persistence("connection refused"));
            }
            Ok(self
                .users
                .iter()
                .filter(|u| u.created_at >= since)
                .cloned()
                .collect())
        }

        async fn transactions_created_since(&self, _since: DateTime<Utc>) -> RepoResult<i64> {
            Ok(0)
        }
    }

    fn user_created_at(created_at: DateTime<Utc>) -> User {
        User {
            id: Uuid::new_v4(),
            auth_subject: Uuid::new_v4().to_string(),
            email: SafeEmail().fake(),
            name: Some(Name().fake()),
            role: UserRole::User,
            created_at,
        }
    }

    fn evaluator(stats: FixedStats, signal: HealthSignal) -> EventEvaluator {
        EventEvaluator::new(Arc::new(stats), Arc::new(StaticHealthProbe::new(signal)))
    }

    fn of_origin(drafts: &[NotificationDraft], origin: DraftOrigin) -> Vec<&NotificationDraft> {
        drafts.iter().filter(|d| d.origin == origin).collect()
    }

    #[tokio::test]
    async fn test_three_new_users_yield_three_drafts() {
        let now = Utc::now();
        let watermark = now - Duration::minutes(10);
        let mut users: Vec<User> = (0..3)
            .map(|i| user_created_at(now - Duration::minutes(i + 1)))
            .collect();
        users.push(user_created_at(now - Duration::days(3)));
        let expected: Vec<String> = users[..3].iter().map(|u| u.id.to_string()).collect();

        let evaluator = evaluator(
            FixedStats {
                users,
                totals: PlatformTotals::default(),
                fail: false,
            },
            HealthSignal::Healthy,
        );
        let drafts = evaluator
            .evaluate(&EvaluationContext::new(now, watermark))
            .await
            .unwrap();

        let new_users = of_origin(&drafts, DraftOrigin::NewUser);
        assert_eq!(new_users.len(), 3);
        for draft in &new_users {
            assert_eq!(draft.notification_type, NotificationType::Info);
            assert_eq!(draft.priority, NotificationPriority::Medium);
            assert!(draft.user_id.is_none());
        }
        let mut related: Vec<String> = new_users
            .iter()
            .filter_map(|d| d.related_id.clone())
            .collect();
        related.sort();
        let mut expected = expected;
        expected.sort();
        assert_eq!(related, expected);
    }

    #[tokio::test]
    async fn test_user_growth_counts_last_hour() {
        let now = Utc::now();
        let users = vec![
            user_created_at(now - Duration::minutes(5)),
            user_created_at(now - Duration::minutes(40)),
            user_created_at(now - Duration::minutes(59)),
            user_created_at(now - Duration::minutes(90)),
        ];

        // Watermark is newer than most signups; growth still looks back a full hour.
        let drafts = evaluator(
            FixedStats {
                users,
                totals: PlatformTotals::default(),
                fail: false,
            },
            HealthSignal::Healthy,
        )
        .evaluate(&EvaluationContext::new(now, now - Duration::minutes(10)))
        .await
        .unwrap();

        assert_eq!(of_origin(&drafts, DraftOrigin::NewUser).len(), 1);
        let growth = of_origin(&drafts, DraftOrigin::UserGrowth);
        assert_eq!(growth.len(), 1);
        assert_eq!(growth[0].notification_type, NotificationType::Info);
        assert_eq!(growth[0].priority, NotificationPriority::Medium);
        assert_eq!(growth[0].title, "User Growth");
        assert_eq!(growth[0].message, "3 new user(s) registered in the last hour");
        assert_eq!(growth[0].related_type.as_deref(), Some("system"));
        assert!(growth[0].related_id.is_none());
        assert!(growth[0].user_id.is_none());
    }

    #[tokio::test]
    async fn test_user_growth_silent_without_signups() {
        let now = Utc::now();
        let drafts = evaluator(
            FixedStats {
                users: vec![user_created_at(now - Duration::hours(2))],
                totals: PlatformTotals::default(),
                fail: false,
            },
            HealthSignal::Healthy,
        )
        .evaluate(&EvaluationContext::new(now, now - Duration::hours(3)))
        .await
        .unwrap();

        assert_eq!(of_origin(&drafts, DraftOrigin::NewUser).len(), 1);
        assert!(of_origin(&drafts, DraftOrigin::UserGrowth).is_empty());
    }

    #[tokio::test]
    async fn test_health_signal_mapping() {
        let stats = || FixedStats {
            users: vec![],
            totals: PlatformTotals::default(),
            fail: false,
        };
        let now = Utc::now();
        let ctx = EvaluationContext::new(now, now);

        let drafts = evaluator(stats(), HealthSignal::Healthy)
            .evaluate(&ctx)
            .await
            .unwrap();
        assert!(of_origin(&drafts, DraftOrigin::Health).is_empty());

        let drafts = evaluator(
            stats(),
            HealthSignal::Degraded {
                message: "Database latency 900ms".into(),
            },
        )
        .evaluate(&ctx)
        .await
        .unwrap();
        let health = of_origin(&drafts, DraftOrigin::Health);
        assert_eq!(health.len(), 1);
        assert_eq!(health[0].notification_type, NotificationType::Warning);
        assert_eq!(health[0].priority, NotificationPriority::Medium);

        let drafts = evaluator(
            stats(),
            HealthSignal::Critical {
                message: "Database unreachable".into(),
            },
        )
        .evaluate(&ctx)
        .await
        .unwrap();
        let health = of_origin(&drafts, DraftOrigin::Health);
        assert_eq!(health[0].notification_type, NotificationType::Error);
        assert_eq!(health[0].priority, NotificationPriority::High);
        assert_eq!(health[0].message, "Database unreachable");
    }

    #[tokio::test]
    async fn test_metrics_summary_is_low_priority_info() {
        let now = Utc::now();
        let drafts = evaluator(
            FixedStats {
                users: vec![],
                totals: PlatformTotals {
                    users: 12,
                    transactions: 340,
                    accounts: 25,
                },
                fail: false,
            },
            HealthSignal::Healthy,
        )
        .evaluate(&EvaluationContext::new(now, now))
        .await
        .unwrap();

        let metrics = of_origin(&drafts, DraftOrigin::Metrics);
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].priority, NotificationPriority::Low);
        assert_eq!(
            metrics[0].message,
            "Platform now has 12 users, 340 transactions, and 25 accounts"
        );
    }

    #[tokio::test]
    async fn test_maintenance_flag_emits_warning() {
        let now = Utc::now();
        let flags = SystemFlags {
            maintenance_mode: true,
            maintenance_message: "Back at 14:00".into(),
            ..SystemFlags::default()
        };
        let drafts = evaluator(
            FixedStats {
                users: vec![],
                totals: PlatformTotals::default(),
                fail: false,
            },
            HealthSignal::Healthy,
        )
        .evaluate(&EvaluationContext::new(now, now).with_flags(flags))
        .await
        .unwrap();

        let maintenance = of_origin(&drafts, DraftOrigin::Maintenance);
        assert_eq!(maintenance.len(), 1);
        assert_eq!(maintenance[0].notification_type, NotificationType::Warning);
        assert_eq!(maintenance[0].message, "Back at 14:00");
    }

    #[tokio::test]
    async fn test_read_failure_is_propagated() {
        let now = Utc::now();
        let result = evaluator(
            FixedStats {
                users: vec![],
                totals: PlatformTotals::default(),
                fail: true,
            },
            HealthSignal::Healthy,
        )
        .evaluate(&EvaluationContext::new(now, now))
        .await;

        assert!(matches!(result, Err(DomainError::Evaluation(_))));
    }
}
