//! Entity definitions (database row mappings).

pub mod client;
pub mod email_log;
pub mod invoice;
pub mod recurring;

pub use client::ClientContactEntity;
pub use email_log::EmailLogEntity;
pub use invoice::{InvoiceEntity, InvoiceLineEntity, ScheduledInvoiceEntity};
pub use recurring::{RecurringLineEntity, RecurringTemplateEntity};
