//! Notification domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::user::{User, UserRole};

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Info,
    Warning,
    Error,
}

impl FromStr for NotificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(NotificationType::Info),
            "warning" => Ok(NotificationType::Warning),
            "error" => Ok(NotificationType::Error),
            _ => Err(format!("Unknown notification type: {}", s)),
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationType::Info => write!(f, "info"),
            NotificationType::Warning => write!(f, "warning"),
            NotificationType::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Low,
    Medium,
    High,
}

impl Default for NotificationPriority {
    fn default() -> Self {
        NotificationPriority::Medium
    }
}

impl FromStr for NotificationPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(NotificationPriority::Low),
            "medium" => Ok(NotificationPriority::Medium),
            "high" => Ok(NotificationPriority::High),
            _ => Err(format!("Unknown notification priority: {}", s)),
        }
    }
}

impl std::fmt::Display for NotificationPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationPriority::Low => write!(f, "low"),
            NotificationPriority::Medium => write!(f, "medium"),
            NotificationPriority::High => write!(f, "high"),
        }
    }
}

/// Which evaluator rule (if any) produced a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftOrigin {
    NewUser,
    UserGrowth,
    Health,
    Metrics,
    Maintenance,
    /// Explicit triggering action (admin post, domain event).
    Manual,
}

impl std::fmt::Display for DraftOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DraftOrigin::NewUser => "new_user",
            DraftOrigin::UserGrowth => "user_growth",
            DraftOrigin::Health => "health",
            DraftOrigin::Metrics => "metrics",
            DraftOrigin::Maintenance => "maintenance",
            DraftOrigin::Manual => "manual",
        };
        write!(f, "{}", s)
    }
}

/// A persisted notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub priority: NotificationPriority,
    pub read: bool,
    /// `None` marks a system-wide notification.
    pub user_id: Option<Uuid>,
    pub related_id: Option<String>,
    pub related_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn is_system_wide(&self) -> bool {
        self.user_id.is_none()
    }
}

/// An evaluator-produced candidate notification not yet persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationDraft {
    pub origin: DraftOrigin,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub priority: NotificationPriority,
    pub user_id: Option<Uuid>,
    pub related_id: Option<String>,
    pub related_type: Option<String>,
}

impl NotificationDraft {
    /// A system-wide draft visible to every viewer.
    pub fn system(
        origin: DraftOrigin,
        notification_type: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
        priority: NotificationPriority,
    ) -> Self {
        Self {
            origin,
            notification_type,
            title: title.into(),
            message: message.into(),
            priority,
            user_id: None,
            related_id: None,
            related_type: None,
        }
    }

    /// Scope the draft to a single user.
    pub fn for_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Attach a loose reference to the triggering entity.
    pub fn related_to(mut self, related_type: impl Into<String>, related_id: Option<String>) -> Self {
        self.related_type = Some(related_type.into());
        self.related_id = related_id;
        self
    }
}

/// Insert payload handed to the persistence layer.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub draft: NotificationDraft,
    /// Idempotency key; a second insert with the same key is dropped.
    pub dedup_key: Option<String>,
}

/// Who is reading the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    /// Sees system-wide notifications and their own.
    User(Uuid),
    /// Sees every notification.
    Administrator,
}

impl Viewer {
    pub fn for_user(user: &User) -> Self {
        match user.role {
            UserRole::Admin => Viewer::Administrator,
            UserRole::User => Viewer::User(user.id),
        }
    }

    pub fn scope(&self) -> NotificationScope {
        match self {
            Viewer::User(id) => NotificationScope::VisibleTo(*id),
            Viewer::Administrator => NotificationScope::All,
        }
    }
}

/// Row filter derived from a viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationScope {
    All,
    VisibleTo(Uuid),
}

impl NotificationScope {
    pub fn includes(&self, notification: &Notification) -> bool {
        match self {
            NotificationScope::All => true,
            NotificationScope::VisibleTo(id) => {
                notification.user_id.is_none() || notification.user_id == Some(*id)
            }
        }
    }

    /// The user id to bind in SQL filters; `None` matches every row.
    pub fn user_filter(&self) -> Option<Uuid> {
        match self {
            NotificationScope::All => None,
            NotificationScope::VisibleTo(id) => Some(*id),
        }
    }
}

/// Display-ready notification with a relative time label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayNotification {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub priority: NotificationPriority,
    pub read: bool,
    pub created_at: String,
    pub time: String,
}

/// One page of a viewer's feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedPage {
    pub notifications: Vec<Notification>,
    pub next_cursor: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(user_id: Option<Uuid>) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            notification_type: NotificationType::Info,
            title: "t".into(),
            message: "m".into(),
            priority: NotificationPriority::Medium,
            read: false,
            user_id,
            related_id: None,
            related_type: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_type_parse_and_display() {
        assert_eq!("WARNING".parse::<NotificationType>().unwrap(), NotificationType::Warning);
        assert_eq!(NotificationType::Error.to_string(), "error");
        assert!("critical".parse::<NotificationType>().is_err());
    }

    #[test]
    fn test_priority_default_is_medium() {
        assert_eq!(NotificationPriority::default(), NotificationPriority::Medium);
        assert_eq!("low".parse::<NotificationPriority>().unwrap(), NotificationPriority::Low);
    }

    #[test]
    fn test_scope_visibility_partition() {
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();
        let system_wide = notification(None);
        let owned = notification(Some(owner));

        let owner_scope = Viewer::User(owner).scope();
        let other_scope = Viewer::User(other).scope();
        let admin_scope = Viewer::Administrator.scope();

        assert!(owner_scope.includes(&system_wide));
        assert!(other_scope.includes(&system_wide));
        assert!(admin_scope.includes(&system_wide));

        assert!(owner_scope.includes(&owned));
        assert!(!other_scope.includes(&owned));
        assert!(admin_scope.includes(&owned));
    }

    #[test]
    fn test_serialized_shape_uses_type_key() {
        let json = serde_json::to_value(notification(None)).unwrap();
        assert_eq!(json["type"], "info");
        assert_eq!(json["priority"], "medium");
        assert!(json.get("createdAt").is_some());
        assert!(json["userId"].is_null());
    }

    #[test]
    fn test_draft_builders() {
        let user = Uuid::new_v4();
        let draft = NotificationDraft::system(
            DraftOrigin::Manual,
            NotificationType::Info,
            "Title",
            "Body",
            NotificationPriority::Low,
        )
        .for_user(user)
        .related_to("transaction", Some("tx-1".into()));

        assert_eq!(draft.user_id, Some(user));
        assert_eq!(draft.related_type.as_deref(), Some("transaction"));
        assert_eq!(draft.related_id.as_deref(), Some("tx-1"));
    }
}
