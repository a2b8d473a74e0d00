//! System settings repository.

use async_trait::async_trait;
use domain::models::{SystemSetting, UpsertMode};
use domain::repositories::{RepoResult, SettingsRepository};
use serde_json::Value as JsonValue;
use sqlx::PgPool;

use crate::entities::SystemSettingEntity;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct PgSettingsRepository {
    pool: PgPool,
}

impl PgSettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsRepository for PgSettingsRepository {
    async fn get(&self, key: &str) -> RepoResult<Option<SystemSetting>> {
        let timer = QueryTimer::new("get_system_setting");
        let result = sqlx::query_as::<_, SystemSettingEntity>(
            "SELECT key, value, updated_at FROM system_settings WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Into::into))
    }

    async fn list(&self) -> RepoResult<Vec<SystemSetting>> {
        let timer = QueryTimer::new("list_system_settings");
        let result = sqlx::query_as::<_, SystemSettingEntity>(
            "SELECT key, value, updated_at FROM system_settings ORDER BY key",
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?.into_iter().map(Into::into).collect())
    }

    async fn upsert(
        &self,
        key: &str,
        value: JsonValue,
        mode: UpsertMode,
    ) -> RepoResult<SystemSetting> {
        // Merge is a shallow object merge; anything else replaces.
        let update = match mode {
            UpsertMode::Merge => {
                "CASE WHEN jsonb_typeof(system_settings.value) = 'object' \
                      AND jsonb_typeof(EXCLUDED.value) = 'object' \
                 THEN system_settings.value || EXCLUDED.value \
                 ELSE EXCLUDED.value END"
            }
            UpsertMode::Replace => "EXCLUDED.value",
        };

        let timer = QueryTimer::new("upsert_system_setting");
        let result = sqlx::query_as::<_, SystemSettingEntity>(&format!(
            r#"
            INSERT INTO system_settings (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE
            SET value = {update}, updated_at = NOW()
            RETURNING key, value, updated_at
            "#
        ))
        .bind(key)
        .bind(value)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        Ok(result?.into())
    }
}
