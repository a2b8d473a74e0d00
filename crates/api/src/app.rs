use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use domain::repositories::{
    AdminAuditLogRepository, NotificationRepository, PlatformStatsRepository, SettingsRepository,
    SystemLogRepository, UserRepository,
};
use domain::services::{
    AdminAuditLogger, EventEvaluator, HealthProbe, NotificationStore, StaticHealthProbe,
    SystemLogger, UserDirectory,
};
use persistence::health::DatabaseHealthProbe;
use persistence::memory::InMemoryStore;
use persistence::repositories::{
    PgAdminAuditLogRepository, PgNotificationRepository, PgPlatformStatsRepository,
    PgSettingsRepository, PgSystemLogRepository, PgUserRepository,
};
use shared::jwt::{JwtConfig, JwtError};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::jobs::{NotificationPollJob, PollScheduler};
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{health, notifications, settings, system_status, users};

/// Repository implementations behind the domain traits.
#[derive(Clone)]
pub struct Backends {
    pub notifications: Arc<dyn NotificationRepository>,
    pub system_logs: Arc<dyn SystemLogRepository>,
    pub audit_logs: Arc<dyn AdminAuditLogRepository>,
    pub settings: Arc<dyn SettingsRepository>,
    pub users: Arc<dyn UserRepository>,
    pub stats: Arc<dyn PlatformStatsRepository>,
    pub health: Arc<dyn HealthProbe>,
    /// Present for the PostgreSQL backend; used for latency probes.
    pub pool: Option<PgPool>,
}

impl Backends {
    pub fn postgres(pool: PgPool, latency_warn: Duration) -> Self {
        Self {
            notifications: Arc::new(PgNotificationRepository::new(pool.clone())),
            system_logs: Arc::new(PgSystemLogRepository::new(pool.clone())),
            audit_logs: Arc::new(PgAdminAuditLogRepository::new(pool.clone())),
            settings: Arc::new(PgSettingsRepository::new(pool.clone())),
            users: Arc::new(PgUserRepository::new(pool.clone())),
            stats: Arc::new(PgPlatformStatsRepository::new(pool.clone())),
            health: Arc::new(DatabaseHealthProbe::new(pool.clone(), latency_warn)),
            pool: Some(pool),
        }
    }

    /// Every repository backed by one in-process store; health is always
    /// reported as healthy unless the caller swaps the probe.
    pub fn in_memory(store: Arc<InMemoryStore>) -> Self {
        Self {
            notifications: store.clone(),
            system_logs: store.clone(),
            audit_logs: store.clone(),
            settings: store.clone(),
            users: store.clone(),
            stats: store,
            health: Arc::new(StaticHealthProbe::healthy()),
            pool: None,
        }
    }

    pub fn with_health(mut self, health: Arc<dyn HealthProbe>) -> Self {
        self.health = health;
        self
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub notifications: NotificationStore,
    pub users: UserDirectory,
    pub settings: Arc<dyn SettingsRepository>,
    pub stats: Arc<dyn PlatformStatsRepository>,
    pub health: Arc<dyn HealthProbe>,
    pub logger: SystemLogger,
    pub audit: AdminAuditLogger,
    pub jwt: Arc<JwtConfig>,
    pub scheduler: Arc<PollScheduler>,
    pub pool: Option<PgPool>,
}

impl AppState {
    /// Wire services over the given backends. The scheduler is built but
    /// not started.
    pub fn new(config: Config, backends: Backends) -> Result<Self, JwtError> {
        let jwt = JwtConfig::with_leeway(&config.auth.jwt_secret, config.auth.leeway_secs)?;

        let logger = SystemLogger::new(backends.system_logs.clone());
        let audit = AdminAuditLogger::new(backends.audit_logs.clone());
        let notifications = NotificationStore::new(backends.notifications.clone()).with_limits(
            config.notifications.feed_default_limit,
            config.notifications.feed_max_limit,
        );
        let users = UserDirectory::new(backends.users.clone(), logger.clone(), audit.clone());

        let poll_job = NotificationPollJob::new(
            EventEvaluator::new(backends.stats.clone(), backends.health.clone()),
            notifications.clone(),
            backends.settings.clone(),
            config.notifications.dedup.into(),
            config.notifications.lookback_minutes,
        );
        let scheduler = PollScheduler::new(
            poll_job,
            config.notifications.poll_interval(),
            logger.clone(),
        )
        .with_initial_delay(config.notifications.initial_delay());

        Ok(Self {
            config: Arc::new(config),
            notifications,
            users,
            settings: backends.settings,
            stats: backends.stats,
            health: backends.health,
            logger,
            audit,
            jwt: Arc::new(jwt),
            scheduler: Arc::new(scheduler),
            pool: backends.pool,
        })
    }
}

pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Authentication is enforced per handler by the CurrentUser/AdminUser
    // extractors.
    let user_routes = Router::new()
        .route("/api/v1/notifications", get(notifications::list_feed))
        .route("/api/v1/notifications/read", post(notifications::mark_read))
        .route(
            "/api/v1/notifications/read-all",
            post(notifications::mark_all_read),
        );

    let admin_routes = Router::new()
        .route(
            "/api/v1/admin/notifications",
            get(notifications::admin_feed).post(notifications::create_notification),
        )
        .route(
            "/api/v1/admin/system-status",
            get(system_status::get_system_status),
        )
        .route(
            "/api/v1/admin/settings",
            get(settings::get_settings).put(settings::update_settings),
        )
        .route(
            "/api/v1/admin/settings/maintenance",
            post(settings::toggle_maintenance),
        )
        .route("/api/v1/admin/users/:user_id/role", post(users::change_role));

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(admin_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
