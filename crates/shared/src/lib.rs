//! Shared utilities and common types for the Finwatch backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Keyset cursor encoding for feed pagination
//! - Verification of bearer tokens issued by the external identity provider

pub mod jwt;
pub mod pagination;
