//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod admin_audit_log;
pub mod notification;
pub mod system_log;
pub mod system_setting;
pub mod user;

pub use admin_audit_log::AdminAuditLogEntity;
pub use notification::NotificationEntity;
pub use system_log::SystemLogEntity;
pub use system_setting::SystemSettingEntity;
pub use user::UserEntity;
