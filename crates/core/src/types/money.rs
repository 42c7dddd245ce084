//! Money arithmetic helpers.
//!
//! All amounts are `rust_decimal::Decimal` in the currency's standard unit
//! (dollars, not cents). Totals are rounded to two decimal places before
//! persisting; the payment processor receives integer minor units.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Round a monetary amount to two decimal places (bankers' rounding).
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp(2)
}

/// Convert a monetary amount to the payment processor's integer minor units
/// (e.g. 19.98 USD -> 1998 cents).
///
/// Returns `None` if the amount does not fit in an `i64`.
#[must_use]
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    (amount * Decimal::from(100)).round_dp(0).to_i64()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_round_money_two_places() {
        let amount = Decimal::new(19_984, 3); // 19.984
        assert_eq!(round_money(amount), Decimal::new(1998, 2));
    }

    #[test]
    fn test_round_money_already_exact() {
        let amount = Decimal::new(1998, 2); // 19.98
        assert_eq!(round_money(amount), amount);
    }

    #[test]
    fn test_to_minor_units() {
        assert_eq!(to_minor_units(Decimal::new(1998, 2)), Some(1998));
        assert_eq!(to_minor_units(Decimal::new(999, 2)), Some(999));
        assert_eq!(to_minor_units(Decimal::ZERO), Some(0));
    }

    #[test]
    fn test_to_minor_units_whole_dollars() {
        assert_eq!(to_minor_units(Decimal::from(250)), Some(25_000));
    }
}
