//! Domain layer for the Backoffice backend.
//!
//! This crate contains:
//! - Domain models (Invoice, RecurringTemplate, EmailLogEntry)
//! - Pure business services (monetary calculator, email templating)

pub mod models;
pub mod services;
