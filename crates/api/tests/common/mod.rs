//! Common test utilities for integration tests.
//!
//! Tests run the full router over the in-memory backend, so no database is
//! required. Tokens are signed with the same shared secret the app verifies.

// Helpers are shared across test binaries; not every binary uses all of them.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request},
    response::Response,
    Router,
};
use domain::models::{User, UserRole};
use domain::repositories::UserRepository;
use finwatch_api::{
    app::{create_app, AppState, Backends},
    config::{
        AuthConfig, Config, DatabaseBackend, DatabaseConfig, LoggingConfig, NotificationsConfig,
        SchedulerConfig, SecurityConfig, ServerConfig,
    },
};
use persistence::memory::InMemoryStore;
use serde_json::Value;
use shared::jwt::JwtConfig;
use std::sync::Arc;

pub const TEST_JWT_SECRET: &str = "integration-test-secret";

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout_secs: 30,
        },
        database: DatabaseConfig {
            backend: DatabaseBackend::Memory,
            url: String::new(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout_secs: 10,
            idle_timeout_secs: 600,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig {
            cors_origins: vec![],
        },
        auth: AuthConfig {
            jwt_secret: TEST_JWT_SECRET.to_string(),
            leeway_secs: 30,
        },
        notifications: NotificationsConfig::default(),
        scheduler: SchedulerConfig {
            enabled: false,
            shutdown_timeout_secs: 1,
        },
    }
}

/// Router plus handles on the state behind it.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<InMemoryStore>,
    jwt: JwtConfig,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self::with_backends(config, Backends::in_memory(store.clone()), store)
    }

    pub fn with_backends(config: Config, backends: Backends, store: Arc<InMemoryStore>) -> Self {
        let state = AppState::new(config, backends).expect("Failed to build app state");
        Self {
            router: create_app(state.clone()),
            state,
            store,
            jwt: JwtConfig::new(TEST_JWT_SECRET).expect("Failed to build JWT config"),
        }
    }

    /// A signed identity token for an arbitrary subject.
    pub fn token_for(&self, subject: &str, email: Option<&str>) -> String {
        self.jwt
            .issue_token(subject, email, Some("Test User"), 3600)
            .expect("Failed to issue token")
    }

    pub fn expired_token(&self, subject: &str) -> String {
        self.jwt
            .issue_token(subject, None, None, -3600)
            .expect("Failed to issue token")
    }

    /// Provision a user with the given role and return it with a token.
    pub async fn user_with_role(&self, role: UserRole) -> (User, String) {
        let subject = format!("auth|{}", uuid::Uuid::new_v4().simple());
        let email = format!("{}@example.com", uuid::Uuid::new_v4().simple());
        let user = self
            .state
            .users
            .resolve_or_register(&subject, Some(&email), Some("Test User"))
            .await
            .expect("Failed to register user");

        let user = if role == UserRole::User {
            user
        } else {
            self.store
                .update_role(user.id, role)
                .await
                .expect("Failed to update role")
                .expect("User disappeared")
        };

        (user, self.token_for(&subject, Some(&email)))
    }

    pub async fn admin(&self) -> (User, String) {
        self.user_with_role(UserRole::Admin).await
    }

    pub async fn regular_user(&self) -> (User, String) {
        self.user_with_role(UserRole::User).await
    }

    /// Let detached log writes finish before asserting on them.
    pub async fn settle(&self) {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        use tower::ServiceExt;
        self.router.clone().oneshot(request).await.unwrap()
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

pub fn get_request_with_auth(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

pub fn json_request_with_auth(method: Method, uri: &str, body: Value, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header("user-agent", "integration-tests")
        .header("x-forwarded-for", "203.0.113.10")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

pub fn post_empty_with_auth(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn parse_response_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(Value::Null)
}
