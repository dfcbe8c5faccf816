//! Reputation tiers derived from accumulated points.
//!
//! The tier label is a stateless projection of the points total against a
//! fixed ascending threshold table, so it can never drift from the points.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Ascending (threshold, label) pairs; boundaries are inclusive on the lower
/// bound. Below the first threshold the label is unset.
pub const TIERS: &[(i64, &str)] = &[
    (5, "Platform Friend"),
    (501, "Keeper of Hope"),
    (2501, "Benefactor"),
    (5501, "Blazing Heart"),
];

/// Resolves the tier label for a points total.
pub fn status_for_points(points: i64) -> Option<&'static str> {
    TIERS
        .iter()
        .rev()
        .find(|(threshold, _)| points >= *threshold)
        .map(|(_, label)| *label)
}

/// Points earned for a confirmed donation: 1 currency unit = 1 point,
/// truncated toward zero.
pub fn points_for_amount(amount: Decimal) -> i64 {
    amount.trunc().to_i64().unwrap_or(0).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(num: i64, scale: u32) -> Decimal {
        Decimal::new(num, scale)
    }

    #[test]
    fn label_boundaries_are_inclusive_on_the_lower_bound() {
        assert_eq!(status_for_points(0), None);
        assert_eq!(status_for_points(4), None);
        assert_eq!(status_for_points(5), Some("Platform Friend"));
        assert_eq!(status_for_points(500), Some("Platform Friend"));
        assert_eq!(status_for_points(501), Some("Keeper of Hope"));
        assert_eq!(status_for_points(2500), Some("Keeper of Hope"));
        assert_eq!(status_for_points(2501), Some("Benefactor"));
        assert_eq!(status_for_points(5500), Some("Benefactor"));
        assert_eq!(status_for_points(5501), Some("Blazing Heart"));
        assert_eq!(status_for_points(1_000_000), Some("Blazing Heart"));
    }

    #[test]
    fn points_truncate_fractional_currency() {
        assert_eq!(points_for_amount(dec(10, 0)), 10);
        assert_eq!(points_for_amount(dec(257, 1)), 25);
        assert_eq!(points_for_amount(dec(100, 0)), 100);
        assert_eq!(points_for_amount(dec(99, 2)), 0);
    }

    #[test]
    fn confirmed_sequence_sums_truncated_points() {
        let amounts = [dec(10, 0), dec(257, 1), dec(100, 0)];
        let points: i64 = amounts.iter().map(|a| points_for_amount(*a)).sum();
        let total: Decimal = amounts.iter().copied().sum();
        assert_eq!(points, 135);
        assert_eq!(total.to_string(), "135.7");
    }
}
