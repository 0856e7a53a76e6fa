//! Pure finance arithmetic, independent of the store. The service layer
//! loads rows and hands them here; every number the API reports is computed
//! by one of these functions.

pub mod spend;
pub mod usage;

use rust_decimal::Decimal;

pub const MONTHS: [&str; 12] = [
    "01", "02", "03", "04", "05", "06", "07", "08", "09", "10", "11", "12",
];

pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// One manday is 8 hours. Derived at write time; stored rows carry both
/// `total_hours` and the derived value.
pub fn mandays_from_hours(total_hours: Decimal) -> Decimal {
    (total_hours / Decimal::from(8)).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eight_hours_is_one_manday() {
        assert_eq!(mandays_from_hours(Decimal::from(8)), Decimal::ONE);
    }

    #[test]
    fn fractional_hours_round_to_two_places() {
        // 7.33h / 8 = 0.91625
        assert_eq!(mandays_from_hours(Decimal::new(733, 2)), Decimal::new(92, 2));
        assert_eq!(mandays_from_hours(Decimal::from(10)), Decimal::new(125, 2));
    }

    #[test]
    fn zero_hours_is_zero_mandays() {
        assert_eq!(mandays_from_hours(Decimal::ZERO), Decimal::ZERO);
    }
}
