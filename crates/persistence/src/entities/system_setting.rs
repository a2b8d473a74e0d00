//! System setting entity.

use chrono::{DateTime, Utc};
use domain::models::SystemSetting;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct SystemSettingEntity {
    pub key: String,
    pub value: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

impl From<SystemSettingEntity> for SystemSetting {
    fn from(entity: SystemSettingEntity) -> Self {
        Self {
            key: entity.key,
            value: entity.value,
            updated_at: entity.updated_at,
        }
    }
}
