use chrono::{Datelike, Duration, NaiveDate};

/// The most recent occurrence of `first_day_of_week` on or before `date`.
/// `first_day_of_week`: 0 = Sunday, 1 = Monday, ... 6 = Saturday.
///
/// Translation invariant: shifting `date` by a whole number of weeks shifts
/// the result by the same amount, which is what lets rotation and history
/// walk backward in 7-day steps.
pub fn week_start(date: NaiveDate, first_day_of_week: u8) -> NaiveDate {
    let day = date.weekday().num_days_from_sunday() as i64;
    let diff = (day - i64::from(first_day_of_week)).rem_euclid(7);
    date - Duration::days(diff)
}

/// The last day of the week containing `date`.
pub fn week_end(date: NaiveDate, first_day_of_week: u8) -> NaiveDate {
    week_start(date, first_day_of_week) + Duration::days(6)
}

/// Days left in the week counting `today` itself; 0 once the week has passed.
pub fn days_remaining_in_week(today: NaiveDate, date: NaiveDate, first_day_of_week: u8) -> i64 {
    let end = week_end(date, first_day_of_week);
    ((end - today).num_days() + 1).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_start_monday_weeks() {
        // 2024-01-15 is a Monday
        assert_eq!(week_start(date(2024, 1, 15), 1), date(2024, 1, 15));
        assert_eq!(week_start(date(2024, 1, 17), 1), date(2024, 1, 15));
        // Sunday belongs to the Monday-started week before it
        assert_eq!(week_start(date(2024, 1, 21), 1), date(2024, 1, 15));
    }

    #[test]
    fn test_week_start_sunday_weeks() {
        // 2024-01-14 is a Sunday
        assert_eq!(week_start(date(2024, 1, 14), 0), date(2024, 1, 14));
        assert_eq!(week_start(date(2024, 1, 20), 0), date(2024, 1, 14));
        assert_eq!(week_start(date(2024, 1, 21), 0), date(2024, 1, 21));
    }

    #[test]
    fn test_week_start_saturday_weeks() {
        // 2024-01-13 is a Saturday
        assert_eq!(week_start(date(2024, 1, 13), 6), date(2024, 1, 13));
        assert_eq!(week_start(date(2024, 1, 19), 6), date(2024, 1, 13));
    }

    #[test]
    fn test_week_end() {
        assert_eq!(week_end(date(2024, 1, 17), 1), date(2024, 1, 21));
        assert_eq!(week_end(date(2024, 1, 14), 0), date(2024, 1, 20));
    }

    #[test]
    fn test_translation_invariance() {
        // week_start(D + 7*O days, f) == week_start(D, f) + 7*O days
        let d = date(2024, 2, 29);
        for f in 0..7u8 {
            for offset in [-52i64, -3, -1, 1, 2, 10] {
                let shifted = d + Duration::days(7 * offset);
                assert_eq!(
                    week_start(shifted, f),
                    week_start(d, f) + Duration::days(7 * offset),
                );
            }
        }
    }

    #[test]
    fn test_week_start_is_fixed_point() {
        let d = date(2024, 1, 17);
        let start = week_start(d, 1);
        assert_eq!(week_start(start + Duration::days(7), 1), start + Duration::days(7));
        assert_eq!(week_start(start, 1), start);
    }

    #[test]
    fn test_days_remaining_in_week() {
        // Monday-started week 2024-01-15..2024-01-21
        assert_eq!(days_remaining_in_week(date(2024, 1, 15), date(2024, 1, 15), 1), 7);
        assert_eq!(days_remaining_in_week(date(2024, 1, 21), date(2024, 1, 15), 1), 1);
        assert_eq!(days_remaining_in_week(date(2024, 1, 25), date(2024, 1, 15), 1), 0);
    }
}
