//! Persistence layer for the Backoffice backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations for the billing aggregates

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
