//! Admin audit trail recorder.
//!
//! Entries are assembled with [`AuditEntryBuilder`] and written best-effort:
//! a failed write is reported on the operational channel and never reaches
//! the caller.

use metrics::counter;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{AdminAuditAction, AdminAuditLog, CreateAdminAuditLogInput};
use crate::repositories::AdminAuditLogRepository;

/// Fluent builder for admin audit entries.
#[derive(Debug, Clone)]
pub struct AuditEntryBuilder {
    action: AdminAuditAction,
    actor_id: Uuid,
    resource: String,
    resource_id: Option<String>,
    description: String,
    ip_address: Option<String>,
    user_agent: Option<String>,
    metadata: Option<JsonValue>,
}

impl AuditEntryBuilder {
    pub fn new(actor_id: Uuid, action: AdminAuditAction) -> Self {
        Self {
            action,
            actor_id,
            resource: String::new(),
            resource_id: None,
            description: String::new(),
            ip_address: None,
            user_agent: None,
            metadata: None,
        }
    }

    /// Set the resource being acted upon.
    pub fn on_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = resource.into();
        self
    }

    pub fn with_resource_id(mut self, id: impl Into<String>) -> Self {
        self.resource_id = Some(id.into());
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Client address and agent; absent values are stored as "unknown".
    pub fn with_request(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = Some(ip_address.unwrap_or_else(|| "unknown".to_string()));
        self.user_agent = Some(user_agent.unwrap_or_else(|| "unknown".to_string()));
        self
    }

    pub fn with_metadata(mut self, metadata: JsonValue) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn build(self) -> CreateAdminAuditLogInput {
        CreateAdminAuditLogInput {
            action: self.action,
            resource: self.resource,
            resource_id: self.resource_id,
            description: self.description,
            user_id: self.actor_id,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            metadata: self.metadata,
        }
    }
}

#[derive(Clone)]
pub struct AdminAuditLogger {
    repo: Arc<dyn AdminAuditLogRepository>,
}

impl AdminAuditLogger {
    pub fn new(repo: Arc<dyn AdminAuditLogRepository>) -> Self {
        Self { repo }
    }

    pub async fn record(&self, entry: AuditEntryBuilder) -> Option<AdminAuditLog> {
        let input = entry.build();
        let action = input.action;
        match self.repo.insert(input).await {
            Ok(record) => {
                info!(action = %record.action, actor = %record.user_id, resource = %record.resource, "Admin audit recorded");
                Some(record)
            }
            Err(err) => {
                counter!("system_log_write_failures_total", "sink" => "admin_audit").increment(1);
                warn!(%action, error = %err, "Failed to write admin audit log");
                None
            }
        }
    }
}

/// Canonical entries for the administrative surfaces.
pub mod audit_entries {
    use super::*;

    pub fn settings_updated(actor_id: Uuid, categories: &[String]) -> AuditEntryBuilder {
        AuditEntryBuilder::new(actor_id, AdminAuditAction::UpdateSettings)
            .on_resource("System Settings")
            .describe(format!(
                "Updated system configuration: {}",
                categories.join(", ")
            ))
    }

    pub fn maintenance_toggled(actor_id: Uuid, enabled: bool) -> AuditEntryBuilder {
        let action = if enabled {
            AdminAuditAction::EnableMaintenance
        } else {
            AdminAuditAction::DisableMaintenance
        };
        AuditEntryBuilder::new(actor_id, action)
            .on_resource("System")
            .describe(format!(
                "Maintenance mode {}",
                if enabled { "enabled" } else { "disabled" }
            ))
    }

    pub fn role_changed(
        actor_id: Uuid,
        target_id: Uuid,
        target_email: &str,
        role: &str,
    ) -> AuditEntryBuilder {
        AuditEntryBuilder::new(actor_id, AdminAuditAction::ChangeUserRole)
            .on_resource("User")
            .with_resource_id(target_id.to_string())
            .describe(format!("Changed role of {} to {}", target_email, role))
    }

    pub fn notification_created(
        actor_id: Uuid,
        notification_id: Uuid,
        title: &str,
    ) -> AuditEntryBuilder {
        AuditEntryBuilder::new(actor_id, AdminAuditAction::CreateNotification)
            .on_resource("Notification")
            .with_resource_id(notification_id.to_string())
            .describe(format!("Created notification: {}", title))
    }
}
