//! HTTP route handlers.

pub mod health;
pub mod notifications;
pub mod settings;
pub mod system_status;
pub mod users;
