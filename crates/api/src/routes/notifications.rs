//! Notification feed endpoint handlers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use domain::models::{
    DisplayNotification, DraftOrigin, NotificationDraft, NotificationPriority, NotificationType,
    Viewer,
};
use domain::services::{audit_entries, feed};
use domain::DomainError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AdminUser, CurrentUser, RequestContext};
use crate::jobs::CycleOutcome;

#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    pub limit: Option<i64>,
    pub cursor: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    pub success: bool,
    pub notifications: Vec<DisplayNotification>,
    pub unread_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl FeedResponse {
    /// Body served when the feed cannot be read.
    pub fn unavailable() -> Self {
        Self {
            success: false,
            notifications: Vec::new(),
            unread_count: 0,
            next_cursor: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    pub notification_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotificationRequest {
    #[serde(rename = "type", default = "default_type")]
    pub notification_type: NotificationType,

    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 2000, message = "message must be 1-2000 characters"))]
    pub message: String,

    #[serde(default)]
    pub priority: NotificationPriority,

    /// Target user; system-wide when absent.
    pub user_id: Option<Uuid>,
}

fn default_type() -> NotificationType {
    NotificationType::Info
}

#[derive(Debug, Serialize)]
pub struct CreateNotificationResponse {
    pub success: bool,
    pub notification: DisplayNotification,
}

async fn load_feed(
    state: &AppState,
    viewer: Viewer,
    query: &FeedQuery,
) -> Result<FeedResponse, DomainError> {
    let page = state
        .notifications
        .list_for(viewer, query.limit, query.cursor.as_deref())
        .await?;
    let unread_count = state.notifications.count_unread(viewer).await?;

    Ok(FeedResponse {
        success: true,
        notifications: feed::format_all(&page.notifications, Utc::now()),
        unread_count,
        next_cursor: page.next_cursor,
    })
}

/// Serve a feed, degrading to an empty body when storage fails.
async fn serve_feed(state: &AppState, viewer: Viewer, query: FeedQuery) -> Result<Response, ApiError> {
    if state.config.notifications.evaluate_on_fetch {
        if let CycleOutcome::Failed = state.scheduler.run_now().await {
            warn!("Evaluation before feed fetch failed");
        }
    }

    match load_feed(state, viewer, &query).await {
        Ok(body) => Ok(Json(body).into_response()),
        Err(DomainError::Validation(msg)) => Err(ApiError::Validation(msg)),
        Err(err) => {
            warn!(error = %err, "Notification feed unavailable");
            Ok((StatusCode::SERVICE_UNAVAILABLE, Json(FeedResponse::unavailable())).into_response())
        }
    }
}

/// Caller's feed: system-wide notifications plus their own.
///
/// GET /api/v1/notifications
pub async fn list_feed(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<FeedQuery>,
) -> Result<Response, ApiError> {
    serve_feed(&state, user.viewer(), query).await
}

/// Aggregate feed across all users.
///
/// GET /api/v1/admin/notifications
pub async fn admin_feed(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<FeedQuery>,
) -> Result<Response, ApiError> {
    serve_feed(&state, Viewer::Administrator, query).await
}

/// Mark one notification read, or all of them when no id is given.
///
/// POST /api/v1/notifications/read
pub async fn mark_read(
    State(state): State<AppState>,
    user: CurrentUser,
    body: Option<Json<MarkReadRequest>>,
) -> Result<Json<MarkReadResponse>, ApiError> {
    let request = body.map(|Json(b)| b).unwrap_or_default();
    let viewer = user.viewer();

    let message = match request.notification_id {
        Some(id) => {
            state.notifications.mark_read(viewer, id).await?;
            "Notification marked as read".to_string()
        }
        None => {
            let changed = state.notifications.mark_all_read(viewer).await?;
            format!("{} notifications marked as read", changed)
        }
    };

    Ok(Json(MarkReadResponse {
        success: true,
        message,
    }))
}

/// POST /api/v1/notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<MarkReadResponse>, ApiError> {
    let changed = state.notifications.mark_all_read(user.viewer()).await?;

    Ok(Json(MarkReadResponse {
        success: true,
        message: format!("{} notifications marked as read", changed),
    }))
}

/// Post an explicit notification.
///
/// POST /api/v1/admin/notifications
pub async fn create_notification(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    RequestContext(meta): RequestContext,
    Json(request): Json<CreateNotificationRequest>,
) -> Result<(StatusCode, Json<CreateNotificationResponse>), ApiError> {
    request.validate()?;

    let mut draft = NotificationDraft::system(
        DraftOrigin::Manual,
        request.notification_type,
        request.title.trim(),
        request.message.trim(),
        request.priority,
    );
    if let Some(user_id) = request.user_id {
        if state.users.find(user_id).await?.is_none() {
            return Err(ApiError::NotFound(format!("User {} not found", user_id)));
        }
        draft = draft.for_user(user_id);
    }

    let notification = state.notifications.create(draft).await?;

    state
        .audit
        .record(
            audit_entries::notification_created(admin.id, notification.id, &notification.title)
                .with_request(meta.ip_address, meta.user_agent),
        )
        .await;
    state.logger.admin_action_async(
        admin.id,
        "CREATE_NOTIFICATION",
        json!({ "notificationId": notification.id, "userId": notification.user_id }),
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateNotificationResponse {
            success: true,
            notification: feed::format(&notification, Utc::now()),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_body_shape() {
        let json = serde_json::to_value(FeedResponse::unavailable()).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["unreadCount"], 0);
        assert_eq!(json["notifications"].as_array().unwrap().len(), 0);
        assert!(json.get("nextCursor").is_none());
    }

    #[test]
    fn test_mark_read_request_optional_id() {
        let empty: MarkReadRequest = serde_json::from_str("{}").unwrap();
        assert!(empty.notification_id.is_none());

        let id = Uuid::new_v4();
        let one: MarkReadRequest =
            serde_json::from_value(json!({ "notificationId": id })).unwrap();
        assert_eq!(one.notification_id, Some(id));
    }

    #[test]
    fn test_create_request_defaults_and_validation() {
        let request: CreateNotificationRequest =
            serde_json::from_value(json!({ "title": "Quarter close", "message": "Books lock Friday" }))
                .unwrap();
        assert_eq!(request.notification_type, NotificationType::Info);
        assert_eq!(request.priority, NotificationPriority::default());
        assert!(request.validate().is_ok());

        let blank: CreateNotificationRequest =
            serde_json::from_value(json!({ "type": "warning", "title": "", "message": "x" }))
                .unwrap();
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_create_request_rejects_unknown_type() {
        let result = serde_json::from_value::<CreateNotificationRequest>(
            json!({ "type": "urgent", "title": "t", "message": "m" }),
        );
        assert!(result.is_err());
    }
}
