//! Order totals: subtotal, discount and final amount derived from line items.

use bigdecimal::{BigDecimal, RoundingMode, Zero};
use serde::Serialize;

use super::errors::DomainError;

/// Monetary amounts are kept at cent precision.
pub const MONEY_SCALE: i64 = 2;

/// Largest quantity a single line may carry.
pub const MAX_LINE_QUANTITY: i32 = 10_000;

/// Exclusive upper bound of line and order amounts (NUMERIC(12,2) columns).
fn amount_limit() -> BigDecimal {
    BigDecimal::from(10_000_000_000_i64)
}

/// Quantity and unit price of one line, the only inputs totals depend on.
#[derive(Debug, Clone)]
pub struct LineAmount {
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderTotals {
    pub subtotal: BigDecimal,
    pub discount_percent: BigDecimal,
    pub discount_amount: BigDecimal,
    pub total: BigDecimal,
}

impl OrderTotals {
    pub fn zero() -> Self {
        Self {
            subtotal: BigDecimal::zero(),
            discount_percent: BigDecimal::zero(),
            discount_amount: BigDecimal::zero(),
            total: BigDecimal::zero(),
        }
    }
}

pub fn line_subtotal(quantity: i32, unit_price: &BigDecimal) -> BigDecimal {
    BigDecimal::from(quantity) * unit_price
}

/// Rejects a discount percentage outside `0..=100` or finer than cents.
///
/// The column holds two decimals, so anything finer would be stored rounded
/// and no longer match the totals computed from the request.
pub fn validate_discount_percent(percent: &BigDecimal) -> Result<(), DomainError> {
    if *percent < BigDecimal::zero() || *percent > BigDecimal::from(100) {
        return Err(DomainError::invalid(format!(
            "discount percent must be between 0 and 100, got {percent}"
        )));
    }
    if percent.with_scale(MONEY_SCALE) != *percent {
        return Err(DomainError::invalid(format!(
            "discount percent allows at most two decimals, got {percent}"
        )));
    }
    Ok(())
}

pub fn validate_quantity(quantity: i32) -> Result<(), DomainError> {
    if !(1..=MAX_LINE_QUANTITY).contains(&quantity) {
        return Err(DomainError::invalid(format!(
            "quantity must be between 1 and {MAX_LINE_QUANTITY}, got {quantity}"
        )));
    }
    Ok(())
}

fn check_amount(what: &str, amount: &BigDecimal) -> Result<(), DomainError> {
    if amount.abs() >= amount_limit() {
        return Err(DomainError::invalid(format!(
            "{what} {amount} exceeds the largest storable amount"
        )));
    }
    Ok(())
}

/// Computes the totals of an order.
///
/// The discount amount is rounded half-up to cents; the total is then the
/// exact difference, so `total == subtotal - discount_amount` always holds.
/// Amounts that would not fit the order columns are rejected.
pub fn compute_totals(
    lines: &[LineAmount],
    discount_percent: &BigDecimal,
) -> Result<OrderTotals, DomainError> {
    validate_discount_percent(discount_percent)?;

    let mut subtotal = BigDecimal::zero();
    for l in lines {
        let amount = line_subtotal(l.quantity, &l.unit_price);
        check_amount("line subtotal", &amount)?;
        subtotal += amount;
    }
    check_amount("order subtotal", &subtotal)?;

    let discount_amount = (&subtotal * discount_percent / BigDecimal::from(100))
        .with_scale_round(MONEY_SCALE, RoundingMode::HalfUp);
    let total = &subtotal - &discount_amount;

    Ok(OrderTotals {
        subtotal,
        discount_percent: discount_percent.clone(),
        discount_amount,
        total,
    })
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    fn line(quantity: i32, price: &str) -> LineAmount {
        LineAmount {
            quantity,
            unit_price: dec(price),
        }
    }

    #[test]
    fn empty_order_has_zero_totals() {
        let totals = compute_totals(&[], &dec("10")).expect("valid");
        assert_eq!(totals.subtotal, BigDecimal::zero());
        assert_eq!(totals.discount_amount, BigDecimal::zero());
        assert_eq!(totals.total, BigDecimal::zero());
    }

    #[test]
    fn subtotal_is_sum_of_line_subtotals() {
        let lines = vec![line(2, "4.50"), line(1, "12.00"), line(3, "0.99")];
        let totals = compute_totals(&lines, &BigDecimal::zero()).expect("valid");

        let expected = lines
            .iter()
            .map(|l| line_subtotal(l.quantity, &l.unit_price))
            .fold(BigDecimal::zero(), |a, b| a + b);
        assert_eq!(totals.subtotal, expected);
        assert_eq!(totals.subtotal, dec("23.97"));
        assert_eq!(totals.total, dec("23.97"));
    }

    #[test]
    fn discount_is_applied_as_percentage() {
        let totals = compute_totals(&[line(4, "25.00")], &dec("15")).expect("valid");
        assert_eq!(totals.subtotal, dec("100.00"));
        assert_eq!(totals.discount_amount, dec("15.00"));
        assert_eq!(totals.total, dec("85.00"));
    }

    #[test]
    fn discount_amount_rounds_half_up_to_cents() {
        // 3 * 3.35 = 10.05; 10.05 * 5% = 0.5025 -> 0.50
        let totals = compute_totals(&[line(3, "3.35")], &dec("5")).expect("valid");
        assert_eq!(totals.discount_amount, dec("0.50"));
        // 0.125 rounds up
        let totals = compute_totals(&[line(1, "2.50")], &dec("5")).expect("valid");
        assert_eq!(totals.discount_amount, dec("0.13"));
    }

    #[test]
    fn total_equals_subtotal_minus_discount() {
        let lines = vec![line(7, "3.33"), line(2, "18.90")];
        for pct in ["0", "7.5", "33.33", "100"] {
            let totals = compute_totals(&lines, &dec(pct)).expect("valid");
            assert_eq!(totals.total, &totals.subtotal - &totals.discount_amount);
        }
    }

    #[test]
    fn full_discount_yields_zero_total() {
        let totals = compute_totals(&[line(2, "9.99")], &dec("100")).expect("valid");
        assert_eq!(totals.total, BigDecimal::zero());
    }

    #[test]
    fn rejects_discount_out_of_range() {
        assert!(matches!(
            compute_totals(&[], &dec("-1")),
            Err(DomainError::InvalidInput(_))
        ));
        assert!(matches!(
            compute_totals(&[], &dec("100.01")),
            Err(DomainError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_discount_finer_than_cents() {
        assert!(matches!(
            validate_discount_percent(&dec("33.333")),
            Err(DomainError::InvalidInput(_))
        ));
        validate_discount_percent(&dec("33.33")).expect("two decimals");
        validate_discount_percent(&dec("33.330")).expect("trailing zero");
    }

    #[test]
    fn quantity_is_bounded() {
        assert!(validate_quantity(0).is_err());
        validate_quantity(1).expect("minimum");
        validate_quantity(MAX_LINE_QUANTITY).expect("maximum");
        assert!(matches!(
            validate_quantity(MAX_LINE_QUANTITY + 1),
            Err(DomainError::InvalidInput(_))
        ));
        assert!(validate_quantity(i32::MAX).is_err());
    }

    #[test]
    fn rejects_amounts_that_do_not_fit_the_columns() {
        // 10_000 * 99_999_999.99 is far beyond NUMERIC(12,2)
        let err = compute_totals(&[line(10_000, "99999999.99")], &BigDecimal::zero()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));

        // each line fits, their sum does not
        let lines = vec![line(100, "60000000.00"), line(100, "60000000.00")];
        assert!(compute_totals(&lines[..1], &BigDecimal::zero()).is_ok());
        assert!(matches!(
            compute_totals(&lines, &BigDecimal::zero()),
            Err(DomainError::InvalidInput(_))
        ));
    }
}
