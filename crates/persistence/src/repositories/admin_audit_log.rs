//! Admin audit log repository.

use async_trait::async_trait;
use domain::models::{AdminAuditLog, CreateAdminAuditLogInput};
use domain::repositories::{AdminAuditLogRepository, RepoResult};
use domain::DomainError;
use sqlx::PgPool;

use crate::entities::AdminAuditLogEntity;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct PgAdminAuditLogRepository {
    pool: PgPool,
}

impl PgAdminAuditLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdminAuditLogRepository for PgAdminAuditLogRepository {
    async fn insert(&self, input: CreateAdminAuditLogInput) -> RepoResult<AdminAuditLog> {
        let timer = QueryTimer::new("insert_admin_audit_log");
        let result = sqlx::query_as::<_, AdminAuditLogEntity>(
            r#"
            INSERT INTO admin_audit_logs
                (action, resource, resource_id, description, user_id, ip_address, user_agent, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, action, resource, resource_id, description, user_id, ip_address,
                      user_agent, metadata, created_at
            "#,
        )
        .bind(input.action.to_string())
        .bind(input.resource)
        .bind(input.resource_id)
        .bind(input.description)
        .bind(input.user_id)
        .bind(input.ip_address)
        .bind(input.user_agent)
        .bind(input.metadata)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        AdminAuditLog::try_from(result?).map_err(DomainError::Persistence)
    }
}
