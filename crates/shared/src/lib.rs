//! Shared utilities and common types for the Backoffice backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Currency rounding helpers
//! - Calendar helpers for monthly billing cycles
//! - Common validation logic

pub mod dates;
pub mod money;
pub mod validation;
