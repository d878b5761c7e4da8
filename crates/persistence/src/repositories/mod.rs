//! Repository implementations for the billing aggregates.

pub mod client;
pub mod counter;
pub mod email_log;
pub mod invoice;
pub mod recurring;

pub use client::ClientRepository;
pub use counter::CounterRepository;
pub use email_log::EmailLogRepository;
pub use invoice::InvoiceRepository;
pub use recurring::RecurringTemplateRepository;
