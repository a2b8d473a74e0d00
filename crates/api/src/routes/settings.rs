//! System settings and maintenance mode handlers.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use domain::models::system_settings::{merge_with_defaults, DEFAULT_MAINTENANCE_MESSAGE, SYSTEM_KEY};
use domain::models::{LogLevel, LogModule, LogOptions, UpsertMode, User};
use domain::services::{audit_entries, RequestMeta};
use domain::DomainError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};
use tracing::warn;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AdminUser, RequestContext};

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub success: bool,
    pub settings: Map<String, JsonValue>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct MaintenanceRequest {
    pub enabled: bool,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceResponse {
    pub success: bool,
    pub message: String,
    pub maintenance_mode: bool,
    pub timestamp: DateTime<Utc>,
}

/// Stored categories merged over the built-in defaults.
///
/// GET /api/v1/admin/settings
pub async fn get_settings(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<SettingsResponse>, ApiError> {
    let stored = state.settings.list().await?;

    Ok(Json(SettingsResponse {
        success: true,
        settings: merge_with_defaults(&stored),
    }))
}

/// Replace each posted category.
///
/// PUT /api/v1/admin/settings
pub async fn update_settings(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    RequestContext(meta): RequestContext,
    Json(body): Json<Map<String, JsonValue>>,
) -> Result<Json<MessageResponse>, ApiError> {
    if body.is_empty() {
        return Err(ApiError::Validation("No settings categories provided".into()));
    }
    if let Some((key, _)) = body.iter().find(|(_, value)| !value.is_object()) {
        return Err(ApiError::Validation(format!(
            "Settings category {} must be an object",
            key
        )));
    }

    let categories: Vec<String> = body.keys().cloned().collect();

    for (key, value) in body {
        if let Err(err) = state.settings.upsert(&key, value, UpsertMode::Replace).await {
            state
                .logger
                .log_async(
                    "SETTINGS_UPDATE_ERROR",
                    format!("Failed to update system settings: {}", err),
                    LogOptions::module(LogModule::Admin)
                        .with_level(LogLevel::Error)
                        .with_user(Some(admin.id)),
                );
            return Err(err.into());
        }
    }

    state
        .audit
        .record(
            audit_entries::settings_updated(admin.id, &categories)
                .with_request(meta.ip_address.clone(), meta.user_agent.clone()),
        )
        .await;
    state
        .logger
        .log_async(
            "SETTINGS_UPDATE",
            format!(
                "System settings updated by {}. Categories: {}",
                admin.display_name(),
                categories.join(", ")
            ),
            LogOptions::module(LogModule::Admin)
                .with_user(Some(admin.id))
                .with_request(meta.ip_address, meta.user_agent),
        );

    Ok(Json(MessageResponse {
        success: true,
        message: "Settings saved successfully".to_string(),
    }))
}

/// Toggle maintenance mode. Errors propagate to the caller.
///
/// POST /api/v1/admin/settings/maintenance
pub async fn toggle_maintenance(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    RequestContext(meta): RequestContext,
    Json(request): Json<MaintenanceRequest>,
) -> Result<Json<MaintenanceResponse>, ApiError> {
    match apply_maintenance(&state, &admin, &request, meta).await {
        Ok(()) => Ok(Json(MaintenanceResponse {
            success: true,
            message: format!("Maintenance mode {}", enabled_label(request.enabled)),
            maintenance_mode: request.enabled,
            timestamp: Utc::now(),
        })),
        Err(err) => {
            warn!(error = %err, "Failed to update maintenance mode");
            state
                .logger
                .log_async(
                    "MAINTENANCE_ERROR",
                    "Failed to update maintenance mode",
                    LogOptions::module(LogModule::System)
                        .with_level(LogLevel::Error)
                        .with_user(Some(admin.id))
                        .with_metadata(json!({
                            "error": err.to_string(),
                            "timestamp": Utc::now(),
                        })),
                );
            Err(err.into())
        }
    }
}

async fn apply_maintenance(
    state: &AppState,
    admin: &User,
    request: &MaintenanceRequest,
    meta: RequestMeta,
) -> Result<(), DomainError> {
    let message = request
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_MAINTENANCE_MESSAGE)
        .to_string();

    state
        .settings
        .upsert(
            SYSTEM_KEY,
            json!({
                "maintenanceMode": request.enabled,
                "maintenanceMessage": message,
            }),
            UpsertMode::Merge,
        )
        .await?;

    let action = if request.enabled {
        "MAINTENANCE_ENABLED"
    } else {
        "MAINTENANCE_DISABLED"
    };
    state
        .logger
        .log_async(
            action,
            format!("Maintenance mode {}", enabled_label(request.enabled)),
            LogOptions::module(LogModule::System)
                .with_level(LogLevel::Warn)
                .with_user(Some(admin.id))
                .with_metadata(json!({
                    "enabled": request.enabled,
                    "message": message,
                    "timestamp": Utc::now(),
                })),
        );

    state
        .audit
        .record(
            audit_entries::maintenance_toggled(admin.id, request.enabled)
                .with_request(meta.ip_address, meta.user_agent),
        )
        .await;

    Ok(())
}

fn enabled_label(enabled: bool) -> &'static str {
    if enabled {
        "enabled"
    } else {
        "disabled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maintenance_request_message_optional() {
        let request: MaintenanceRequest = serde_json::from_str(r#"{"enabled": true}"#).unwrap();
        assert!(request.enabled);
        assert!(request.message.is_none());
    }

    #[test]
    fn test_maintenance_response_shape() {
        let json = serde_json::to_value(MaintenanceResponse {
            success: true,
            message: "Maintenance mode enabled".into(),
            maintenance_mode: true,
            timestamp: Utc::now(),
        })
        .unwrap();
        assert_eq!(json["maintenanceMode"], true);
        assert!(json["timestamp"].is_string());
    }
}
