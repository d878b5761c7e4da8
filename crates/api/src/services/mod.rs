//! Application services: email delivery, PDF rendering, billing engine.

pub mod billing;
pub mod email;
pub mod pdf;

pub use billing::{BillingEngine, RecurringBillingEngine, RunSummary};
pub use email::{EmailService, Mailer};
pub use pdf::{PdfRenderer, PdfService};
