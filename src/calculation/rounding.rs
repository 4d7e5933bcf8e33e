//! Yen rounding for social insurance contributions.
//!
//! When a contribution is deducted from salary, a fraction of 50 sen or less
//! is dropped and a fraction above 50 sen is rounded up to the next yen.

use rust_decimal::Decimal;

/// Fractions within this distance of one half count as exactly one half.
///
/// Rates are exact decimals, so this only matters for amounts that arrive
/// from a remote provider as binary floats.
pub fn half_tolerance() -> Decimal {
    Decimal::new(1, 8)
}

/// Rounds to whole yen, dropping fractions of one half or less.
///
/// # Examples
///
/// ```
/// use deduction_engine::calculation::round_half_down;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// assert_eq!(round_half_down(Decimal::from_str("6330.5").unwrap()), Decimal::from(6330));
/// assert_eq!(round_half_down(Decimal::from_str("6330.51").unwrap()), Decimal::from(6331));
/// assert_eq!(round_half_down(Decimal::from(14880)), Decimal::from(14880));
/// ```
pub fn round_half_down(amount: Decimal) -> Decimal {
    let floor = amount.floor();
    let fraction = amount - floor;

    if fraction > Decimal::new(5, 1) + half_tolerance() {
        amount.ceil()
    } else {
        floor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_exact_half_rounds_down() {
        assert_eq!(round_half_down(dec("100.50")), dec("100"));
    }

    #[test]
    fn test_just_above_half_rounds_up() {
        assert_eq!(round_half_down(dec("100.51")), dec("101"));
        assert_eq!(round_half_down(dec("100.5000001")), dec("101"));
    }

    #[test]
    fn test_below_half_rounds_down() {
        assert_eq!(round_half_down(dec("100.49")), dec("100"));
        assert_eq!(round_half_down(dec("100.01")), dec("100"));
    }

    #[test]
    fn test_whole_amount_is_unchanged() {
        assert_eq!(round_half_down(dec("100.00")), dec("100"));
        assert_eq!(round_half_down(Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_float_noise_around_half_counts_as_half() {
        // 0.5 carried through an f64 can arrive slightly above one half.
        assert_eq!(round_half_down(dec("6330.500000000001")), dec("6330"));
        assert_eq!(round_half_down(dec("6330.499999999999")), dec("6330"));
    }

    proptest! {
        #[test]
        fn prop_half_rounds_down_everywhere(whole in 0i64..2_000_000) {
            let value = Decimal::from(whole) + dec("0.5");
            prop_assert_eq!(round_half_down(value), Decimal::from(whole));
        }

        #[test]
        fn prop_above_half_rounds_up_everywhere(whole in 0i64..2_000_000, cents in 51i64..100) {
            let value = Decimal::from(whole) + Decimal::new(cents, 2);
            prop_assert_eq!(round_half_down(value), Decimal::from(whole + 1));
        }

        #[test]
        fn prop_result_is_within_half_yen(whole in 0i64..2_000_000, cents in 0i64..100) {
            let value = Decimal::from(whole) + Decimal::new(cents, 2);
            let rounded = round_half_down(value);
            prop_assert!((rounded - value).abs() <= dec("0.5"));
            prop_assert_eq!(rounded.fract(), Decimal::ZERO);
        }
    }
}
