//! Aggregate counts over users, accounts and transactions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::models::{PlatformTotals, User};
use domain::repositories::{PlatformStatsRepository, RepoResult};
use sqlx::PgPool;

use crate::entities::UserEntity;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct PgPlatformStatsRepository {
    pool: PgPool,
}

impl PgPlatformStatsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlatformStatsRepository for PgPlatformStatsRepository {
    async fn totals(&self) -> RepoResult<PlatformTotals> {
        let timer = QueryTimer::new("platform_totals");
        let result = sqlx::query_as::<_, (i64, i64, i64)>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users),
                (SELECT COUNT(*) FROM transactions),
                (SELECT COUNT(*) FROM accounts)
            "#,
        )
        .fetch_one(&self.pool)
        .await;
        timer.record();
        let (users, transactions, accounts) = result?;
        Ok(PlatformTotals {
            users,
            transactions,
            accounts,
        })
    }

    async fn users_created_since(&self, since: DateTime<Utc>) -> RepoResult<Vec<User>> {
        let timer = QueryTimer::new("users_created_since");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, auth_subject, email, name, role, created_at
            FROM users
            WHERE created_at >= $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?.into_iter().map(Into::into).collect())
    }

    async fn transactions_created_since(&self, since: DateTime<Utc>) -> RepoResult<i64> {
        let timer = QueryTimer::new("transactions_created_since");
        let result =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM transactions WHERE created_at >= $1")
                .bind(since)
                .fetch_one(&self.pool)
                .await;
        timer.record();
        Ok(result?)
    }
}
