//! Background job scheduler and job implementations.

mod overdue;
mod recurring_billing;
mod scheduled_send;
mod scheduler;

pub use overdue::OverdueSweepJob;
pub use recurring_billing::RecurringBillingJob;
pub use scheduled_send::ScheduledSendJob;
pub use scheduler::JobScheduler;
