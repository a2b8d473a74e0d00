//! PostgreSQL implementations of the domain persistence traits.

pub mod admin_audit_log;
pub mod notification;
pub mod platform_stats;
pub mod system_log;
pub mod system_setting;
pub mod user;

pub use admin_audit_log::PgAdminAuditLogRepository;
pub use notification::PgNotificationRepository;
pub use platform_stats::PgPlatformStatsRepository;
pub use system_log::PgSystemLogRepository;
pub use system_setting::PgSettingsRepository;
pub use user::PgUserRepository;
