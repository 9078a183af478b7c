//! Rent and payment arithmetic
//!
//! Amounts are stored as `f64` rupiah and computed with `Decimal`,
//! rounded to 2 places half-up.

use rust_decimal::prelude::*;

const DECIMAL_PLACES: u32 = 2;

/// Down payment share of the lease total (30%)
pub const DOWN_PAYMENT_RATE: Decimal = Decimal::from_parts(30, 0, 0, false, 2);

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Back to `f64`, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    round(value).to_f64().unwrap_or_default()
}

#[inline]
fn round(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// `monthly * months`
pub fn rent_total(monthly: f64, months: i64) -> f64 {
    to_f64(to_decimal(monthly) * Decimal::from(months))
}

/// 30% of `total`
pub fn down_payment(total: f64) -> f64 {
    to_f64(to_decimal(total) * DOWN_PAYMENT_RATE)
}

/// What is left to pay after the down payment
pub fn remaining_after_down_payment(total: f64) -> f64 {
    let total = to_decimal(total);
    let dp = round(total * DOWN_PAYMENT_RATE);
    to_f64(total - dp)
}

/// Sum with decimal precision
pub fn sum<I: IntoIterator<Item = f64>>(amounts: I) -> f64 {
    to_f64(amounts.into_iter().map(to_decimal).sum())
}

/// Equal within one cent
pub fn money_eq(a: f64, b: f64) -> bool {
    (to_decimal(a) - to_decimal(b)).abs() < MONEY_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rent_total() {
        assert_eq!(rent_total(1_500_000.0, 6), 9_000_000.0);
        assert_eq!(rent_total(1_250_000.5, 2), 2_500_001.0);
    }

    #[test]
    fn test_down_payment_split() {
        let total = rent_total(1_500_000.0, 3);
        assert_eq!(down_payment(total), 1_350_000.0);
        assert_eq!(remaining_after_down_payment(total), 3_150_000.0);
    }

    #[test]
    fn test_down_payment_rounds_half_up() {
        // 0.35 * 0.30 = 0.105
        assert_eq!(down_payment(0.35), 0.11);
        assert!(money_eq(
            down_payment(0.35) + remaining_after_down_payment(0.35),
            0.35
        ));
    }

    #[test]
    fn test_sum_avoids_float_drift() {
        assert_eq!(sum([0.1, 0.2]), 0.3);
        assert_eq!(sum(Vec::<f64>::new()), 0.0);
    }
}
