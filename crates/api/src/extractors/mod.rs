//! Custom Axum extractors.

pub mod request_context;
pub mod user_auth;

pub use request_context::RequestContext;
pub use user_auth::{AdminUser, CurrentUser};
