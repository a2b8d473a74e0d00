//! System log entity.

use chrono::{DateTime, Utc};
use domain::models::SystemLog;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct SystemLogEntity {
    pub id: Uuid,
    pub action: String,
    pub module: String,
    pub description: String,
    pub level: String,
    pub user_id: Option<Uuid>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub resource_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl From<SystemLogEntity> for SystemLog {
    fn from(entity: SystemLogEntity) -> Self {
        Self {
            id: entity.id,
            action: entity.action,
            module: entity.module.parse().unwrap_or_default(),
            description: entity.description,
            level: entity.level.parse().unwrap_or_default(),
            user_id: entity.user_id,
            ip_address: entity.ip_address,
            user_agent: entity.user_agent,
            resource_id: entity.resource_id,
            metadata: entity.metadata,
            created_at: entity.created_at,
        }
    }
}
