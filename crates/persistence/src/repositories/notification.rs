//! Notification repository for database operations.

use async_trait::async_trait;
use domain::models::{NewNotification, Notification, NotificationScope};
use domain::repositories::{NotificationRepository, RepoResult};
use shared::pagination::KeysetCursor;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::NotificationEntity;
use crate::metrics::{record_dedup_suppressed, QueryTimer};

const COLUMNS: &str = "id, notification_type, title, message, priority, read, user_id, \
                       related_id, related_type, dedup_key, created_at";

/// PostgreSQL-backed notification repository.
#[derive(Clone)]
pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn insert(&self, notification: NewNotification) -> RepoResult<Option<Notification>> {
        let NewNotification { draft, dedup_key } = notification;
        let timer = QueryTimer::new("insert_notification");
        let result = sqlx::query_as::<_, NotificationEntity>(&format!(
            r#"
            INSERT INTO notifications
                (notification_type, title, message, priority, user_id, related_id, related_type, dedup_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (dedup_key) DO NOTHING
            RETURNING {COLUMNS}
            "#
        ))
        .bind(draft.notification_type.to_string())
        .bind(&draft.title)
        .bind(&draft.message)
        .bind(draft.priority.to_string())
        .bind(draft.user_id)
        .bind(&draft.related_id)
        .bind(&draft.related_type)
        .bind(&dedup_key)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        let inserted = result?;
        if inserted.is_none() {
            record_dedup_suppressed();
        }
        Ok(inserted.map(Into::into))
    }

    async fn list(
        &self,
        scope: NotificationScope,
        cursor: Option<KeysetCursor>,
        limit: i64,
    ) -> RepoResult<Vec<Notification>> {
        let timer = QueryTimer::new("list_notifications");
        let result = sqlx::query_as::<_, NotificationEntity>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM notifications
            WHERE ($1::uuid IS NULL OR user_id IS NULL OR user_id = $1)
              AND ($2::timestamptz IS NULL OR (created_at, id) < ($2::timestamptz, $3::uuid))
            ORDER BY created_at DESC, id DESC
            LIMIT $4
            "#
        ))
        .bind(scope.user_filter())
        .bind(cursor.map(|c| c.created_at))
        .bind(cursor.map(|c| c.id))
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result?.into_iter().map(Into::into).collect())
    }

    async fn count_unread(&self, scope: NotificationScope) -> RepoResult<i64> {
        let timer = QueryTimer::new("count_unread_notifications");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM notifications
            WHERE read = FALSE
              AND ($1::uuid IS NULL OR user_id IS NULL OR user_id = $1)
            "#,
        )
        .bind(scope.user_filter())
        .fetch_one(&self.pool)
        .await;
        timer.record();
        Ok(result?)
    }

    async fn mark_read(&self, scope: NotificationScope, id: Uuid) -> RepoResult<bool> {
        let timer = QueryTimer::new("mark_notification_read");
        // Already-read rows still match, so a repeated call reports success.
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET read = TRUE
            WHERE id = $1
              AND ($2::uuid IS NULL OR user_id IS NULL OR user_id = $2)
            "#,
        )
        .bind(id)
        .bind(scope.user_filter())
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }

    async fn mark_all_read(&self, scope: NotificationScope) -> RepoResult<u64> {
        let timer = QueryTimer::new("mark_all_notifications_read");
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET read = TRUE
            WHERE read = FALSE
              AND ($1::uuid IS NULL OR user_id IS NULL OR user_id = $1)
            "#,
        )
        .bind(scope.user_filter())
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result?.rows_affected())
    }
}
