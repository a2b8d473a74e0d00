//! Domain layer for the Finwatch backend.
//!
//! This crate contains:
//! - Domain models (Notification, SystemLog, AdminAuditLog, SystemSettings, User)
//! - The persistence traits the services are written against
//! - The notification and logging services
//! - Domain error types

pub mod error;
pub mod models;
pub mod repositories;
pub mod services;

pub use error::DomainError;
