//! Admin audit log entity.

use chrono::{DateTime, Utc};
use domain::models::{AdminAuditAction, AdminAuditLog};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct AdminAuditLogEntity {
    pub id: Uuid,
    pub action: String,
    pub resource: String,
    pub resource_id: Option<String>,
    pub description: String,
    pub user_id: Uuid,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<AdminAuditLogEntity> for AdminAuditLog {
    type Error = String;

    fn try_from(entity: AdminAuditLogEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            id: entity.id,
            action: entity.action.parse::<AdminAuditAction>()?,
            resource: entity.resource,
            resource_id: entity.resource_id,
            description: entity.description,
            user_id: entity.user_id,
            ip_address: entity.ip_address,
            user_agent: entity.user_agent,
            metadata: entity.metadata,
            created_at: entity.created_at,
        })
    }
}
