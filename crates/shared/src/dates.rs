//! Calendar helpers for monthly billing cycles.

use chrono::{Datelike, NaiveDate};

/// Returns true if both dates fall in the same calendar month and year.
///
/// This is the comparison behind the recurring-generation watermark: a
/// template whose `last_generation_date` is in the same month/year as today
/// must not generate again.
pub fn same_calendar_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

/// Standard payment term applied to generated invoices, in days.
pub const PAYMENT_TERM_DAYS: i64 = 30;

/// Computes the due date for an invoice issued on the given date.
pub fn due_date_for(issue_date: NaiveDate) -> NaiveDate {
    issue_date + chrono::Duration::days(PAYMENT_TERM_DAYS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_same_month_same_year() {
        assert!(same_calendar_month(d(2026, 3, 1), d(2026, 3, 31)));
    }

    #[test]
    fn test_same_month_different_year() {
        assert!(!same_calendar_month(d(2025, 3, 15), d(2026, 3, 15)));
    }

    #[test]
    fn test_different_month_same_year() {
        assert!(!same_calendar_month(d(2026, 2, 28), d(2026, 3, 1)));
    }

    #[test]
    fn test_due_date_crosses_month_boundary() {
        assert_eq!(due_date_for(d(2026, 1, 15)), d(2026, 2, 14));
    }

    #[test]
    fn test_due_date_crosses_year_boundary() {
        assert_eq!(due_date_for(d(2026, 12, 15)), d(2027, 1, 14));
    }

    #[test]
    fn test_due_date_over_february() {
        // 30 calendar days, not "next month same day"
        assert_eq!(due_date_for(d(2026, 2, 1)), d(2026, 3, 3));
    }
}
