//! Domain model definitions.

pub mod client;
pub mod company;
pub mod email_log;
pub mod invoice;
pub mod recurring;

pub use client::ClientContact;
pub use company::CompanyProfile;
pub use email_log::{EmailLogEntry, EmailOutcome, NewEmailLogEntry};
pub use invoice::{Invoice, InvoiceLine, InvoiceStatus};
pub use recurring::{RecurringLine, RecurringTemplate};
