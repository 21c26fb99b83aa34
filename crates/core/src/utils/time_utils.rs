use chrono::NaiveDate;

use crate::constants::{DAYS_PER_MONTH, DAYS_PER_YEAR};

/// Fractional months between two dates, by average month length.
/// Negative when `end` precedes `start`.
pub fn months_between(start: NaiveDate, end: NaiveDate) -> f64 {
    (end - start).num_days() as f64 / DAYS_PER_MONTH
}

/// Fractional years between two dates, actual/365.25.
pub fn years_between(start: NaiveDate, end: NaiveDate) -> f64 {
    (end - start).num_days() as f64 / DAYS_PER_YEAR
}

/// Every day from `start` to `end` inclusive.
pub fn days_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    if start > end {
        return Vec::new();
    }
    let mut days = Vec::new();
    let mut current = start;
    while current <= end {
        days.push(current);
        if let Some(next) = current.succ_opt() {
            current = next;
        } else {
            break;
        }
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_months_between_one_year() {
        let months = months_between(date(2023, 1, 1), date(2024, 1, 1));
        assert!((months - 12.0).abs() < 0.1);
    }

    #[test]
    fn test_years_between_is_signed() {
        assert!(years_between(date(2024, 1, 1), date(2023, 1, 1)) < 0.0);
    }

    #[test]
    fn test_days_between_inclusive() {
        let days = days_between(date(2024, 3, 1), date(2024, 3, 3));
        assert_eq!(days.len(), 3);
        assert_eq!(days[0], date(2024, 3, 1));
        assert_eq!(days[2], date(2024, 3, 3));
    }

    #[test]
    fn test_days_between_reversed_is_empty() {
        assert!(days_between(date(2024, 3, 3), date(2024, 3, 1)).is_empty());
    }
}
