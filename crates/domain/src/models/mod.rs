//! Domain models for Finwatch.

pub mod admin_audit_log;
pub mod notification;
pub mod system_log;
pub mod system_settings;
pub mod user;

pub use admin_audit_log::{AdminAuditAction, AdminAuditLog, CreateAdminAuditLogInput};
pub use notification::{
    DisplayNotification, DraftOrigin, FeedPage, NewNotification, Notification, NotificationDraft,
    NotificationPriority, NotificationScope, NotificationType, Viewer,
};
pub use system_log::{CreateSystemLogInput, LogLevel, LogModule, LogOptions, SystemLog};
pub use system_settings::{SystemFlags, SystemSetting, UpsertMode};
pub use user::{CreateUserInput, PlatformTotals, User, UserRole};
