//! Persistence layer for the Finwatch backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - PostgreSQL repository implementations of the domain traits
//! - An in-memory store implementing the same traits

pub mod db;
pub mod entities;
pub mod health;
pub mod memory;
pub mod metrics;
pub mod repositories;
