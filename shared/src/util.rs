use chrono::{NaiveDate, Utc};

/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Today's date in UTC
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// Whole years between `birth` and `on`
pub fn age_on(birth: NaiveDate, on: NaiveDate) -> i32 {
    on.years_since(birth).map(|y| y as i32).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2025-02-28"), NaiveDate::from_ymd_opt(2025, 2, 28));
        assert_eq!(parse_date("2025-02-30"), None);
        assert_eq!(parse_date("28/02/2025"), None);
    }

    #[test]
    fn test_age_on() {
        let birth = NaiveDate::from_ymd_opt(2000, 6, 15).unwrap();
        assert_eq!(age_on(birth, NaiveDate::from_ymd_opt(2025, 6, 14).unwrap()), 24);
        assert_eq!(age_on(birth, NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()), 25);
        assert_eq!(age_on(birth, NaiveDate::from_ymd_opt(1999, 1, 1).unwrap()), 0);
    }
}
