//! System settings models.
//!
//! Settings are stored as one JSON object per category key. Readers merge the
//! stored object over the built-in defaults, so a partially written category
//! still yields every known field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};

/// Category holding maintenance mode and other platform-wide switches.
pub const SYSTEM_KEY: &str = "system";
/// Category holding session and login policy.
pub const SECURITY_KEY: &str = "security";

pub const DEFAULT_MAINTENANCE_MESSAGE: &str = "System maintenance in progress";
pub const DEFAULT_SESSION_TIMEOUT_MINUTES: i64 = 5;

/// A stored settings category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSetting {
    pub key: String,
    pub value: JsonValue,
    pub updated_at: DateTime<Utc>,
}

/// How an upsert combines the posted value with an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertMode {
    /// Shallow object merge, posted keys win.
    Merge,
    Replace,
}

/// Built-in defaults for every known category.
pub fn default_settings() -> Map<String, JsonValue> {
    let defaults = json!({
        "system": {
            "systemName": "Finwatch",
            "systemEmail": "admin@finwatch.local",
            "maintenanceMode": false,
            "maintenanceMessage": DEFAULT_MAINTENANCE_MESSAGE,
            "autoBackup": true,
            "backupFrequency": "daily"
        },
        "security": {
            "require2FA": true,
            "sessionTimeout": DEFAULT_SESSION_TIMEOUT_MINUTES,
            "maxLoginAttempts": 5
        },
        "notifications": {
            "emailNotifications": true,
            "securityAlerts": true,
            "systemUpdates": true,
            "budgetAlerts": true
        },
        "financial": {
            "defaultCurrency": "ETB"
        },
        "users": {
            "allowRegistrations": true,
            "requireEmailVerification": true,
            "defaultUserRole": "user"
        }
    });

    match defaults {
        JsonValue::Object(map) => map,
        _ => Map::new(),
    }
}

/// Shallow merge of `overlay` onto `base`. Non-object overlays replace.
pub fn merge_objects(base: &JsonValue, overlay: &JsonValue) -> JsonValue {
    match (base, overlay) {
        (JsonValue::Object(base), JsonValue::Object(overlay)) => {
            let mut merged = base.clone();
            for (key, value) in overlay {
                merged.insert(key.clone(), value.clone());
            }
            JsonValue::Object(merged)
        }
        (_, overlay) => overlay.clone(),
    }
}

/// Stored categories merged over the defaults. Unknown stored categories are
/// passed through unchanged.
pub fn merge_with_defaults(stored: &[SystemSetting]) -> Map<String, JsonValue> {
    let mut merged = default_settings();
    for setting in stored {
        let value = match merged.get(&setting.key) {
            Some(default) => merge_objects(default, &setting.value),
            None => setting.value.clone(),
        };
        merged.insert(setting.key.clone(), value);
    }
    merged
}

/// Cross-cutting flags read by the evaluator and the poll job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemFlags {
    pub maintenance_mode: bool,
    pub maintenance_message: String,
    pub session_timeout_minutes: i64,
}

impl Default for SystemFlags {
    fn default() -> Self {
        Self {
            maintenance_mode: false,
            maintenance_message: DEFAULT_MAINTENANCE_MESSAGE.to_string(),
            session_timeout_minutes: DEFAULT_SESSION_TIMEOUT_MINUTES,
        }
    }
}

impl SystemFlags {
    /// Extract flags from the stored `system` and `security` categories.
    /// Missing or mistyped fields fall back to defaults.
    pub fn from_settings(system: Option<&JsonValue>, security: Option<&JsonValue>) -> Self {
        let defaults = Self::default();

        let maintenance_mode = system
            .and_then(|v| v.get("maintenanceMode"))
            .and_then(JsonValue::as_bool)
            .unwrap_or(defaults.maintenance_mode);

        let maintenance_message = system
            .and_then(|v| v.get("maintenanceMessage"))
            .and_then(JsonValue::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .unwrap_or(defaults.maintenance_message);

        let session_timeout_minutes = security
            .and_then(|v| v.get("sessionTimeout"))
            .and_then(JsonValue::as_i64)
            .filter(|minutes| *minutes > 0)
            .unwrap_or(defaults.session_timeout_minutes);

        Self {
            maintenance_mode,
            maintenance_message,
            session_timeout_minutes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setting(key: &str, value: JsonValue) -> SystemSetting {
        SystemSetting {
            key: key.into(),
            value,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_defaults_cover_all_categories() {
        let defaults = default_settings();
        for key in ["system", "security", "notifications", "financial", "users"] {
            assert!(defaults.contains_key(key), "missing {}", key);
        }
    }

    #[test]
    fn test_merge_with_defaults_overrides_fields() {
        let stored = vec![
            setting("system", json!({ "maintenanceMode": true })),
            setting("custom", json!({ "x": 1 })),
        ];
        let merged = merge_with_defaults(&stored);

        assert_eq!(merged["system"]["maintenanceMode"], true);
        assert_eq!(merged["system"]["backupFrequency"], "daily");
        assert_eq!(merged["custom"]["x"], 1);
    }

    #[test]
    fn test_merge_objects_non_object_overlay_replaces() {
        assert_eq!(merge_objects(&json!({ "a": 1 }), &json!(3)), json!(3));
    }

    #[test]
    fn test_flags_from_settings() {
        let system = json!({ "maintenanceMode": true, "maintenanceMessage": "Upgrading" });
        let security = json!({ "sessionTimeout": 30 });
        let flags = SystemFlags::from_settings(Some(&system), Some(&security));

        assert!(flags.maintenance_mode);
        assert_eq!(flags.maintenance_message, "Upgrading");
        assert_eq!(flags.session_timeout_minutes, 30);
    }

    #[test]
    fn test_flags_fall_back_on_bad_values() {
        let system = json!({ "maintenanceMode": "yes", "maintenanceMessage": "" });
        let security = json!({ "sessionTimeout": -1 });
        let flags = SystemFlags::from_settings(Some(&system), Some(&security));

        assert_eq!(flags, SystemFlags::default());
        assert_eq!(SystemFlags::from_settings(None, None), SystemFlags::default());
    }
}
