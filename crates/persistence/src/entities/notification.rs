//! Notification entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Notification, NotificationPriority, NotificationType};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the notifications table.
#[derive(Debug, Clone, FromRow)]
pub struct NotificationEntity {
    pub id: Uuid,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub priority: String,
    pub read: bool,
    pub user_id: Option<Uuid>,
    pub related_id: Option<String>,
    pub related_type: Option<String>,
    pub dedup_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<NotificationEntity> for Notification {
    fn from(entity: NotificationEntity) -> Self {
        Self {
            id: entity.id,
            notification_type: entity
                .notification_type
                .parse()
                .unwrap_or(NotificationType::Info),
            title: entity.title,
            message: entity.message,
            priority: entity.priority.parse().unwrap_or_default(),
            read: entity.read,
            user_id: entity.user_id,
            related_id: entity.related_id,
            related_type: entity.related_type,
            created_at: entity.created_at,
        }
    }
}
