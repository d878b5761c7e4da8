//! Monetary calculator.
//!
//! Converts line items and tax rates into subtotal, withholding, VAT and
//! total. Total and pure: no validation, no I/O, no error path. Input
//! validation belongs to the request models; the same line set always
//! reproduces bit-identical output, which the recurring engine relies on.

use shared::money::round2;

/// Quantity and unit price of one line, the only inputs the calculator needs.
#[derive(Debug, Clone, Copy)]
pub struct LineAmount {
    pub quantity: f64,
    pub unit_price: f64,
}

/// Computed financial breakdown of an invoice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvoiceTotals {
    pub subtotal: f64,
    pub withholding_amount: f64,
    pub vat_amount: f64,
    pub total: f64,
}

/// Total of a single line, rounded to cents.
pub fn line_total(quantity: f64, unit_price: f64) -> f64 {
    round2(quantity * unit_price)
}

/// Computes invoice totals from lines and percentage rates.
///
/// `total = subtotal - subtotal*withholding/100 + subtotal*vat/100`, every
/// component rounded to 2 decimal places. Withholding is deducted from the
/// subtotal before VAT is added.
pub fn compute_totals(lines: &[LineAmount], vat_rate: f64, withholding_rate: f64) -> InvoiceTotals {
    let subtotal = round2(
        lines
            .iter()
            .map(|line| line_total(line.quantity, line.unit_price))
            .sum(),
    );
    let withholding_amount = round2(subtotal * withholding_rate / 100.0);
    let vat_amount = round2(subtotal * vat_rate / 100.0);
    let total = round2(subtotal - withholding_amount + vat_amount);

    InvoiceTotals {
        subtotal,
        withholding_amount,
        vat_amount,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: f64, unit_price: f64) -> LineAmount {
        LineAmount {
            quantity,
            unit_price,
        }
    }

    #[test]
    fn test_standard_freelance_invoice() {
        // 2 x 50 at 21% VAT and 15% withholding
        let totals = compute_totals(&[line(2.0, 50.0)], 21.0, 15.0);
        assert_eq!(totals.subtotal, 100.0);
        assert_eq!(totals.withholding_amount, 15.0);
        assert_eq!(totals.vat_amount, 21.0);
        assert_eq!(totals.total, 106.0);
    }

    #[test]
    fn test_zero_rates() {
        let totals = compute_totals(&[line(3.0, 10.0)], 0.0, 0.0);
        assert_eq!(totals.subtotal, 30.0);
        assert_eq!(totals.withholding_amount, 0.0);
        assert_eq!(totals.vat_amount, 0.0);
        assert_eq!(totals.total, 30.0);
    }

    #[test]
    fn test_empty_line_set() {
        let totals = compute_totals(&[], 21.0, 15.0);
        assert_eq!(totals.subtotal, 0.0);
        assert_eq!(totals.total, 0.0);
    }

    #[test]
    fn test_fractional_quantities_round_to_cents() {
        // 1.5h x 33.33 = 49.995 -> line total 50.00
        let totals = compute_totals(&[line(1.5, 33.33)], 0.0, 0.0);
        assert_eq!(totals.subtotal, 50.0);
        assert_eq!(totals.total, 50.0);
    }

    #[test]
    fn test_multiple_lines_sum_before_rates() {
        let totals = compute_totals(&[line(1.0, 100.0), line(2.0, 25.0)], 10.0, 7.0);
        assert_eq!(totals.subtotal, 150.0);
        assert_eq!(totals.withholding_amount, 10.5);
        assert_eq!(totals.vat_amount, 15.0);
        assert_eq!(totals.total, 154.5);
    }

    #[test]
    fn test_deterministic_for_identical_input() {
        let lines = [line(3.25, 47.99), line(0.5, 120.0), line(12.0, 9.95)];
        let first = compute_totals(&lines, 21.0, 15.0);
        let second = compute_totals(&lines, 21.0, 15.0);
        assert_eq!(first, second);
        assert_eq!(first.total.to_bits(), second.total.to_bits());
    }

    #[test]
    fn test_totals_invariant_holds() {
        let lines = [line(2.0, 37.5), line(1.0, 12.34)];
        let totals = compute_totals(&lines, 21.0, 15.0);
        let expected = round2_check(
            totals.subtotal - totals.subtotal * 15.0 / 100.0 + totals.subtotal * 21.0 / 100.0,
        );
        assert!((totals.total - expected).abs() < 0.011);
    }

    fn round2_check(amount: f64) -> f64 {
        (amount * 100.0).round() / 100.0
    }
}
