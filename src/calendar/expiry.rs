//! Weekly expiry calendar.
//!
//! Index options expire weekly on a fixed weekday. A cycle is entered on the
//! Monday of the expiry week, or the first trading day after it.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Extra calendar days probed after Monday when it has no data.
pub const ENTRY_PROBE_DAYS: i64 = 4;

/// Calendar of weekly expiries for one underlying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryCalendar {
    expiry_weekday: Weekday,
}

impl ExpiryCalendar {
    pub fn new(expiry_weekday: Weekday) -> Self {
        Self { expiry_weekday }
    }

    pub fn expiry_weekday(&self) -> Weekday {
        self.expiry_weekday
    }

    /// Every expiry in `[start, end]`, ascending.
    pub fn expiries(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        weekly_expiries(start, end, self.expiry_weekday)
    }

    /// Entry date for the cycle expiring on `expiry`.
    ///
    /// Monday of the expiry week if `has_data` accepts it, otherwise the
    /// first of the next four calendar days that does. Days after the
    /// expiry itself are never used. `None` means the cycle is skipped.
    pub fn entry_date_for<F>(&self, expiry: NaiveDate, has_data: F) -> Option<NaiveDate>
    where
        F: Fn(NaiveDate) -> bool,
    {
        let monday = week_monday(expiry);
        (0..=ENTRY_PROBE_DAYS)
            .map(|offset| monday + Duration::days(offset))
            .take_while(|date| *date <= expiry)
            .find(|date| has_data(*date))
    }

    /// Next expiry strictly after `today`.
    pub fn next_expiry(&self, today: NaiveDate) -> NaiveDate {
        next_weekly_expiry(today, self.expiry_weekday)
    }
}

/// All dates in `[start, end]` falling on `weekday`.
pub fn weekly_expiries(start: NaiveDate, end: NaiveDate, weekday: Weekday) -> Vec<NaiveDate> {
    if start > end {
        return Vec::new();
    }

    let offset = (weekday.num_days_from_monday() as i64
        - start.weekday().num_days_from_monday() as i64)
        .rem_euclid(7);
    let mut date = start + Duration::days(offset);

    let mut expiries = Vec::new();
    while date <= end {
        expiries.push(date);
        date += Duration::days(7);
    }
    expiries
}

/// The first `weekday` strictly after `today`.
pub fn next_weekly_expiry(today: NaiveDate, weekday: Weekday) -> NaiveDate {
    let mut days_ahead = weekday.num_days_from_monday() as i64
        - today.weekday().num_days_from_monday() as i64;
    if days_ahead <= 0 {
        days_ahead += 7;
    }
    today + Duration::days(days_ahead)
}

/// Monday of the week containing `date`.
pub fn week_monday(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Full English weekday name.
pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Parse a weekday name ("Thursday", "thu").
pub fn parse_weekday(name: &str) -> Option<Weekday> {
    name.trim().parse::<Weekday>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_thursday_expiries() {
        // 2024-01-01 is a Monday
        let expiries = weekly_expiries(date(2024, 1, 1), date(2024, 1, 31), Weekday::Thu);
        assert_eq!(
            expiries,
            vec![
                date(2024, 1, 4),
                date(2024, 1, 11),
                date(2024, 1, 18),
                date(2024, 1, 25)
            ]
        );
        assert!(expiries.iter().all(|d| d.weekday() == Weekday::Thu));
    }

    #[test]
    fn test_range_boundaries_inclusive() {
        let expiries = weekly_expiries(date(2024, 1, 3), date(2024, 1, 17), Weekday::Wed);
        assert_eq!(expiries, vec![date(2024, 1, 3), date(2024, 1, 10), date(2024, 1, 17)]);

        assert!(weekly_expiries(date(2024, 1, 5), date(2024, 1, 1), Weekday::Thu).is_empty());
    }

    #[test]
    fn test_entry_on_monday() {
        let calendar = ExpiryCalendar::new(Weekday::Thu);
        let entry = calendar.entry_date_for(date(2024, 1, 11), |_| true);
        assert_eq!(entry, Some(date(2024, 1, 8)));
    }

    #[test]
    fn test_entry_probes_past_holiday() {
        let calendar = ExpiryCalendar::new(Weekday::Thu);
        // Monday and Tuesday closed
        let entry = calendar.entry_date_for(date(2024, 1, 11), |d| d >= date(2024, 1, 10));
        assert_eq!(entry, Some(date(2024, 1, 10)));
    }

    #[test]
    fn test_entry_none_when_week_is_empty() {
        let calendar = ExpiryCalendar::new(Weekday::Thu);
        assert_eq!(calendar.entry_date_for(date(2024, 1, 11), |_| false), None);
    }

    #[test]
    fn test_entry_never_after_expiry() {
        let calendar = ExpiryCalendar::new(Weekday::Wed);
        // Only Thursday has data, which is past the Wednesday expiry
        let entry = calendar.entry_date_for(date(2024, 1, 10), |d| d == date(2024, 1, 11));
        assert_eq!(entry, None);
    }

    #[test]
    fn test_next_expiry() {
        let calendar = ExpiryCalendar::new(Weekday::Thu);
        assert_eq!(calendar.next_expiry(date(2024, 1, 1)), date(2024, 1, 4));
        // On expiry day, roll to next week
        assert_eq!(calendar.next_expiry(date(2024, 1, 4)), date(2024, 1, 11));
        assert_eq!(calendar.next_expiry(date(2024, 1, 5)), date(2024, 1, 11));
    }

    #[test]
    fn test_parse_weekday() {
        assert_eq!(parse_weekday("Thursday"), Some(Weekday::Thu));
        assert_eq!(parse_weekday("wed"), Some(Weekday::Wed));
        assert_eq!(parse_weekday("someday"), None);
        assert_eq!(weekday_name(Weekday::Thu), "Thursday");
    }
}
