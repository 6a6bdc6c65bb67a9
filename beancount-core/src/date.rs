use std::fmt;

use chrono::{Duration, NaiveDate};

/// A directive date, rendered as `YYYY-MM-DD`.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, PartialOrd, Ord)]
pub struct Date(NaiveDate);

impl Date {
    /// The following calendar day.
    pub fn next_day(self) -> Date {
        Date(self.0 + Duration::days(1))
    }
}

impl From<NaiveDate> for Date {
    fn from(d: NaiveDate) -> Self {
        Date(d)
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

#[test]
fn test_date_display_and_next_day() {
    let d = Date::from(NaiveDate::from_ymd_opt(2020, 2, 29).unwrap());
    assert_eq!(d.to_string(), "2020-02-29");
    assert_eq!(d.next_day().to_string(), "2020-03-01");
}
