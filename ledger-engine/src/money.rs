//! Money calculation utilities using rust_decimal for precision
//!
//! All arithmetic runs on `Decimal` internally and converts back to `f64`
//! for storage/serialization, rounded to 2 decimal places half-up.

use rust_decimal::prelude::*;
use shared::error::{LedgerError, LedgerResult};

/// Rounding for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

pub(crate) fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

pub(crate) fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or(0.0)
}

/// `qty * unit_price`, rounded
pub(crate) fn line_total(qty: i64, unit_price: f64) -> f64 {
    to_f64(Decimal::from(qty) * to_decimal(unit_price))
}

/// Sum a list of already-rounded amounts without float drift
pub(crate) fn sum(values: impl IntoIterator<Item = f64>) -> f64 {
    to_f64(values.into_iter().map(to_decimal).sum::<Decimal>())
}

/// `lhs - rhs`, rounded
pub(crate) fn subtract(lhs: f64, rhs: f64) -> f64 {
    to_f64(to_decimal(lhs) - to_decimal(rhs))
}

/// Reject NaN/Infinity before any amount enters a transaction
pub(crate) fn require_finite(value: f64, field: &str) -> LedgerResult<()> {
    if !value.is_finite() {
        return Err(LedgerError::invalid_input(format!(
            "{field} must be a finite number, got {value}"
        )));
    }
    Ok(())
}

/// Reject NaN/Infinity and negative amounts
pub(crate) fn require_non_negative(value: f64, field: &str) -> LedgerResult<()> {
    require_finite(value, field)?;
    if value < 0.0 {
        return Err(LedgerError::invalid_input(format!(
            "{field} must be non-negative, got {value}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_sum_avoids_float_drift() {
        // Classic floating point problem: 0.1 + 0.2 != 0.3
        let sum_f64 = 0.1_f64 + 0.2_f64;
        assert_ne!(sum_f64, 0.3);

        assert_eq!(sum([0.1, 0.2]), 0.3);
    }

    #[test]
    fn line_totals_use_decimal_arithmetic() {
        assert_eq!(line_total(3, 1.25), 3.75);
        assert_eq!(line_total(2, 3000.0), 6000.0);
        assert_eq!(sum([19.99, 0.01]), 20.0);
        // Half-up at the midpoint
        assert_eq!(to_f64(Decimal::new(3015, 3)), 3.02);
    }

    #[test]
    fn finite_checks_reject_nan_and_infinity() {
        assert!(require_finite(1.0, "amount").is_ok());
        assert!(require_finite(f64::NAN, "amount").is_err());
        assert!(require_finite(f64::INFINITY, "amount").is_err());
        assert!(require_non_negative(-0.01, "amount").is_err());
        assert!(require_non_negative(0.0, "amount").is_ok());
    }
}
