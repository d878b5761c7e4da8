//! Pure domain services.

pub mod templating;
pub mod totals;
