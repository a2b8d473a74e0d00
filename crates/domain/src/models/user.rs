//! User identity models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Administrative status of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(UserRole::User),
            "admin" => Ok(UserRole::Admin),
            _ => Err(format!("Invalid role: {}. Must be \"user\" or \"admin\"", s)),
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::User => write!(f, "user"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

/// A locally known user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    /// Identifier assigned by the external identity provider.
    pub auth_subject: String,
    pub email: String,
    pub name: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Name for human-facing text, falling back to the email address.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.email,
        }
    }
}

/// Input for creating a user record.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateUserInput {
    pub auth_subject: String,
    pub email: String,
    pub name: Option<String>,
    pub role: UserRole,
}

/// Platform-wide entity counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformTotals {
    pub users: i64,
    pub transactions: i64,
    pub accounts: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: Option<&str>) -> User {
        User {
            id: Uuid::new_v4(),
            auth_subject: "sub".into(),
            email: "someone@example.com".into(),
            name: name.map(str::to_string),
            role: UserRole::User,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("Admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!("user".parse::<UserRole>().unwrap(), UserRole::User);
        assert!("owner".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_display_name_fallback() {
        assert_eq!(user(Some("Hana")).display_name(), "Hana");
        assert_eq!(user(Some("  ")).display_name(), "someone@example.com");
        assert_eq!(user(None).display_name(), "someone@example.com");
    }
}
