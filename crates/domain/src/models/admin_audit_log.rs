//! Administrative audit trail models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::str::FromStr;
use uuid::Uuid;

/// Privileged actions recorded in the admin audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminAuditAction {
    UpdateSettings,
    EnableMaintenance,
    DisableMaintenance,
    ChangeUserRole,
    CreateNotification,
}

impl FromStr for AdminAuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UPDATE_SETTINGS" => Ok(AdminAuditAction::UpdateSettings),
            "ENABLE_MAINTENANCE" => Ok(AdminAuditAction::EnableMaintenance),
            "DISABLE_MAINTENANCE" => Ok(AdminAuditAction::DisableMaintenance),
            "CHANGE_USER_ROLE" => Ok(AdminAuditAction::ChangeUserRole),
            "CREATE_NOTIFICATION" => Ok(AdminAuditAction::CreateNotification),
            _ => Err(format!("Unknown admin audit action: {}", s)),
        }
    }
}

impl std::fmt::Display for AdminAuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AdminAuditAction::UpdateSettings => "UPDATE_SETTINGS",
            AdminAuditAction::EnableMaintenance => "ENABLE_MAINTENANCE",
            AdminAuditAction::DisableMaintenance => "DISABLE_MAINTENANCE",
            AdminAuditAction::ChangeUserRole => "CHANGE_USER_ROLE",
            AdminAuditAction::CreateNotification => "CREATE_NOTIFICATION",
        };
        write!(f, "{}", s)
    }
}

/// A persisted admin audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminAuditLog {
    pub id: Uuid,
    pub action: AdminAuditAction,
    /// Human-readable resource name, e.g. "System Settings".
    pub resource: String,
    pub resource_id: Option<String>,
    pub description: String,
    /// The acting administrator.
    pub user_id: Uuid,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub metadata: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for an admin audit record.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateAdminAuditLogInput {
    pub action: AdminAuditAction,
    pub resource: String,
    pub resource_id: Option<String>,
    pub description: String,
    pub user_id: Uuid,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub metadata: Option<JsonValue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_string_roundtrip() {
        for action in [
            AdminAuditAction::UpdateSettings,
            AdminAuditAction::EnableMaintenance,
            AdminAuditAction::DisableMaintenance,
            AdminAuditAction::ChangeUserRole,
            AdminAuditAction::CreateNotification,
        ] {
            assert_eq!(action.to_string().parse::<AdminAuditAction>().unwrap(), action);
        }
    }

    #[test]
    fn test_action_serde_matches_display() {
        let json = serde_json::to_value(AdminAuditAction::EnableMaintenance).unwrap();
        assert_eq!(json, "ENABLE_MAINTENANCE");
    }
}
