//! Domain services for Finwatch.
//!
//! Services contain business logic that operates on domain models and the
//! persistence traits.

pub mod audit;
pub mod dedup;
pub mod evaluator;
pub mod feed;
pub mod health;
pub mod notification_store;
pub mod system_logger;
pub mod user_directory;

pub use audit::{audit_entries, AdminAuditLogger, AuditEntryBuilder};
pub use dedup::{DedupPolicy, DedupWindow};
pub use evaluator::{EvaluationContext, EventEvaluator};
pub use health::{HealthProbe, HealthSignal, StaticHealthProbe};
pub use notification_store::NotificationStore;
pub use system_logger::{LogDiagnostics, SystemLogger};
pub use user_directory::{RequestMeta, UserDirectory};
