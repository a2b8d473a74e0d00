//! User entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{User, UserRole};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the users table.
#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: Uuid,
    pub auth_subject: String,
    pub email: String,
    pub name: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserEntity> for User {
    fn from(entity: UserEntity) -> Self {
        Self {
            id: entity.id,
            auth_subject: entity.auth_subject,
            email: entity.email,
            name: entity.name,
            // Unknown roles never grant admin access.
            role: entity.role.parse().unwrap_or(UserRole::User),
            created_at: entity.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_role_maps_to_user() {
        let entity = UserEntity {
            id: Uuid::new_v4(),
            auth_subject: "sub_1".into(),
            email: "a@b.c".into(),
            name: None,
            role: "superuser".into(),
            created_at: Utc::now(),
        };
        assert_eq!(User::from(entity).role, UserRole::User);
    }
}
