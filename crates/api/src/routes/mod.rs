//! HTTP route handlers.

pub mod email_logs;
pub mod health;
pub mod invoices;
pub mod recurring;
