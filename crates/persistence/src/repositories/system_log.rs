//! System log repository.

use async_trait::async_trait;
use domain::models::{CreateSystemLogInput, SystemLog};
use domain::repositories::{RepoResult, SystemLogRepository};
use sqlx::PgPool;

use crate::entities::SystemLogEntity;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct PgSystemLogRepository {
    pool: PgPool,
}

impl PgSystemLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SystemLogRepository for PgSystemLogRepository {
    async fn insert(&self, input: CreateSystemLogInput) -> RepoResult<SystemLog> {
        let CreateSystemLogInput {
            action,
            description,
            options,
        } = input;
        let timer = QueryTimer::new("insert_system_log");
        let result = sqlx::query_as::<_, SystemLogEntity>(
            r#"
            INSERT INTO system_logs
                (action, module, description, level, user_id, ip_address, user_agent, resource_id, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, action, module, description, level, user_id, ip_address, user_agent,
                      resource_id, metadata, created_at
            "#,
        )
        .bind(action)
        .bind(options.module.to_string())
        .bind(description)
        .bind(options.level.to_string())
        .bind(options.user_id)
        .bind(options.ip_address)
        .bind(options.user_agent)
        .bind(options.resource_id)
        .bind(options.metadata)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        Ok(result?.into())
    }
}
