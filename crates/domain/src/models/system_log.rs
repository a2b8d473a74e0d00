//! System log domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            _ => Err(format!("Unknown log level: {}", s)),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// Subsystem tag attached to every system log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogModule {
    Auth,
    Transactions,
    Accounts,
    Admin,
    System,
}

impl Default for LogModule {
    fn default() -> Self {
        LogModule::System
    }
}

impl FromStr for LogModule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "AUTH" => Ok(LogModule::Auth),
            "TRANSACTIONS" => Ok(LogModule::Transactions),
            "ACCOUNTS" => Ok(LogModule::Accounts),
            "ADMIN" => Ok(LogModule::Admin),
            "SYSTEM" => Ok(LogModule::System),
            _ => Err(format!("Unknown log module: {}", s)),
        }
    }
}

impl std::fmt::Display for LogModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogModule::Auth => write!(f, "AUTH"),
            LogModule::Transactions => write!(f, "TRANSACTIONS"),
            LogModule::Accounts => write!(f, "ACCOUNTS"),
            LogModule::Admin => write!(f, "ADMIN"),
            LogModule::System => write!(f, "SYSTEM"),
        }
    }
}

/// A persisted system log record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemLog {
    pub id: Uuid,
    pub action: String,
    pub module: LogModule,
    pub description: String,
    pub level: LogLevel,
    pub user_id: Option<Uuid>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub resource_id: Option<String>,
    pub metadata: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
}

/// Optional fields accepted by `SystemLogger::log`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogOptions {
    pub module: LogModule,
    pub level: LogLevel,
    pub user_id: Option<Uuid>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub resource_id: Option<String>,
    pub metadata: Option<JsonValue>,
}

impl LogOptions {
    pub fn module(module: LogModule) -> Self {
        Self {
            module,
            ..Self::default()
        }
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_user(mut self, user_id: Option<Uuid>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn with_request(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }

    pub fn with_resource(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    pub fn with_metadata(mut self, metadata: JsonValue) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Insert payload for a system log record.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateSystemLogInput {
    pub action: String,
    pub description: String,
    pub options: LogOptions,
}
