//! User repository for database operations.

use async_trait::async_trait;
use domain::models::{CreateUserInput, User, UserRole};
use domain::repositories::{RepoResult, UserRepository};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::UserEntity;
use crate::metrics::QueryTimer;

/// PostgreSQL-backed user repository.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        let timer = QueryTimer::new("find_user_by_id");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, auth_subject, email, name, role, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Into::into))
    }

    async fn find_by_auth_subject(&self, subject: &str) -> RepoResult<Option<User>> {
        let timer = QueryTimer::new("find_user_by_auth_subject");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, auth_subject, email, name, role, created_at
            FROM users
            WHERE auth_subject = $1
            "#,
        )
        .bind(subject)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Into::into))
    }

    async fn create(&self, input: CreateUserInput) -> RepoResult<User> {
        let timer = QueryTimer::new("create_user");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            INSERT INTO users (auth_subject, email, name, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, auth_subject, email, name, role, created_at
            "#,
        )
        .bind(input.auth_subject)
        .bind(input.email)
        .bind(input.name)
        .bind(input.role.to_string())
        .fetch_one(&self.pool)
        .await;
        timer.record();
        Ok(result?.into())
    }

    async fn update_role(&self, id: Uuid, role: UserRole) -> RepoResult<Option<User>> {
        let timer = QueryTimer::new("update_user_role");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            UPDATE users
            SET role = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, auth_subject, email, name, role, created_at
            "#,
        )
        .bind(id)
        .bind(role.to_string())
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result?.map(Into::into))
    }
}
