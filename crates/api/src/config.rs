use domain::services::{DedupPolicy, DedupWindow};
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Postgres,
    /// Volatile in-process store for local runs.
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_backend")]
    pub backend: DatabaseBackend,

    #[serde(default)]
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn pool_config(&self) -> persistence::db::DatabaseConfig {
        persistence::db::DatabaseConfig {
            url: self.url.clone(),
            max_connections: self.max_connections,
            min_connections: self.min_connections,
            connect_timeout_secs: self.connect_timeout_secs,
            idle_timeout_secs: self.idle_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

/// Verification of identity tokens issued by the external auth provider.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared HS256 secret.
    #[serde(default)]
    pub jwt_secret: String,

    /// Clock skew tolerance in seconds.
    #[serde(default = "default_jwt_leeway")]
    pub leeway_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Delay before the first cycle after start.
    #[serde(default = "default_initial_delay")]
    pub initial_delay_secs: u64,

    /// How far back the first cycle looks for new users.
    #[serde(default = "default_lookback_minutes")]
    pub lookback_minutes: i64,

    #[serde(default = "default_feed_limit")]
    pub feed_default_limit: i64,

    #[serde(default = "default_feed_max_limit")]
    pub feed_max_limit: i64,

    /// Run an evaluation cycle before serving each feed fetch.
    #[serde(default)]
    pub evaluate_on_fetch: bool,

    #[serde(default = "default_health_latency_warn_ms")]
    pub health_latency_warn_ms: u64,

    #[serde(default)]
    pub dedup: DedupConfig,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            initial_delay_secs: default_initial_delay(),
            lookback_minutes: default_lookback_minutes(),
            feed_default_limit: default_feed_limit(),
            feed_max_limit: default_feed_max_limit(),
            evaluate_on_fetch: false,
            health_latency_warn_ms: default_health_latency_warn_ms(),
            dedup: DedupConfig::default(),
        }
    }
}

impl NotificationsConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs)
    }

    pub fn health_latency_warn(&self) -> Duration {
        Duration::from_millis(self.health_latency_warn_ms)
    }
}

/// De-duplication window per evaluator rule.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DedupConfig {
    #[serde(default = "default_new_user_window")]
    pub new_user: DedupWindow,
    #[serde(default = "default_user_growth_window")]
    pub user_growth: DedupWindow,
    #[serde(default = "default_hour_window")]
    pub health: DedupWindow,
    #[serde(default = "default_hour_window")]
    pub metrics: DedupWindow,
    #[serde(default = "default_day_window")]
    pub maintenance: DedupWindow,
}

impl Default for DedupConfig {
    fn default() -> Self {
        let policy = DedupPolicy::default();
        Self {
            new_user: policy.new_user,
            user_growth: policy.user_growth,
            health: policy.health,
            metrics: policy.metrics,
            maintenance: policy.maintenance,
        }
    }
}

impl From<DedupConfig> for DedupPolicy {
    fn from(config: DedupConfig) -> Self {
        Self {
            new_user: config.new_user,
            user_growth: config.user_growth,
            health: config.health,
            metrics: config.metrics,
            maintenance: config.maintenance,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// How long shutdown waits for an in-flight cycle.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_backend() -> DatabaseBackend {
    DatabaseBackend::Postgres
}
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    5
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_jwt_leeway() -> u64 {
    30
}
fn default_poll_interval() -> u64 {
    60
}
fn default_initial_delay() -> u64 {
    5
}
fn default_lookback_minutes() -> i64 {
    60
}
fn default_feed_limit() -> i64 {
    50
}
fn default_feed_max_limit() -> i64 {
    100
}
fn default_health_latency_warn_ms() -> u64 {
    500
}
fn default_new_user_window() -> DedupWindow {
    DedupWindow::Event
}
fn default_user_growth_window() -> DedupWindow {
    DedupWindow::HalfHour
}
fn default_hour_window() -> DedupWindow {
    DedupWindow::Hour
}
fn default_day_window() -> DedupWindow {
    DedupWindow::Day
}
fn default_true() -> bool {
    true
}
fn default_shutdown_timeout() -> u64 {
    10
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with FW__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("FW").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    ///
    /// Defaults are embedded so tests do not depend on the working directory.
    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            request_timeout_secs = 30

            [database]
            backend = "postgres"
            url = ""
            max_connections = 20
            min_connections = 5
            connect_timeout_secs = 10
            idle_timeout_secs = 600

            [logging]
            level = "info"
            format = "json"

            [security]
            cors_origins = []

            [auth]
            jwt_secret = "test-secret"
            leeway_secs = 30

            [notifications]
            poll_interval_secs = 60
            initial_delay_secs = 5
            lookback_minutes = 60
            feed_default_limit = 50
            feed_max_limit = 100
            evaluate_on_fetch = false
            health_latency_warn_ms = 500

            [notifications.dedup]
            new_user = "event"
            user_growth = "half_hour"
            health = "hour"
            metrics = "hour"
            maintenance = "day"

            [scheduler]
            enabled = true
            shutdown_timeout_secs = 10
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.backend == DatabaseBackend::Postgres && self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "FW__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "FW__AUTH__JWT_SECRET environment variable must be set".to_string(),
            ));
        }

        if self.notifications.poll_interval_secs == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "notifications.poll_interval_secs must be greater than 0".to_string(),
            ));
        }

        for (name, value) in [
            ("feed_default_limit", self.notifications.feed_default_limit),
            ("feed_max_limit", self.notifications.feed_max_limit),
        ] {
            if value < 1 {
                return Err(ConfigValidationError::InvalidValue(format!(
                    "notifications.{} must be at least 1",
                    name
                )));
            }
        }

        if self.notifications.feed_default_limit > self.notifications.feed_max_limit {
            return Err(ConfigValidationError::InvalidValue(
                "feed_default_limit cannot exceed feed_max_limit".to_string(),
            ));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }
}
