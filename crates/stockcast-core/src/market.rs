//! Regular-session status for US equity exchanges.
//!
//! Session hours are 09:30 to 16:00 New York time, Monday to Friday.
//! Exchange holidays are not considered.

use serde::Serialize;
use time::macros::{offset, time};
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset, Weekday};

pub const SESSION_OPEN: Time = time!(9:30);
pub const SESSION_CLOSE: Time = time!(16:00);

const EASTERN_STANDARD: UtcOffset = offset!(-5);
const EASTERN_DAYLIGHT: UtcOffset = offset!(-4);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketStatus {
    pub is_open: bool,
    /// Exchange-local wall clock, with its UTC offset.
    #[serde(with = "time::serde::rfc3339")]
    pub current_time: OffsetDateTime,
    pub market_open: &'static str,
    pub market_close: &'static str,
    pub day_of_week: String,
}

/// `n`th Sunday of `month`, counting from one.
fn nth_sunday(year: i32, month: Month, n: u8) -> Option<Date> {
    let first = Date::from_calendar_date(year, month, 1).ok()?;
    let offset = (7 - first.weekday().number_days_from_sunday()) % 7;
    first.replace_day(1 + offset + 7 * (n - 1)).ok()
}

/// New York's offset at `instant`. Daylight time runs from 02:00 local on the
/// second Sunday of March to 02:00 local on the first Sunday of November.
pub fn eastern_offset(instant: OffsetDateTime) -> UtcOffset {
    let year = instant.to_offset(EASTERN_STANDARD).year();
    let switch = |date: Option<Date>, utc_hour: u8| {
        date.and_then(|date| {
            Time::from_hms(utc_hour, 0, 0)
                .ok()
                .map(|at| PrimitiveDateTime::new(date, at).assume_utc())
        })
    };
    // 02:00 EST is 07:00 UTC; 02:00 EDT is 06:00 UTC.
    let starts = switch(nth_sunday(year, Month::March, 2), 7);
    let ends = switch(nth_sunday(year, Month::November, 1), 6);

    match (starts, ends) {
        (Some(starts), Some(ends)) if instant >= starts && instant < ends => EASTERN_DAYLIGHT,
        _ => EASTERN_STANDARD,
    }
}

/// Whether the regular session is trading at `instant`.
pub fn market_status(instant: OffsetDateTime) -> MarketStatus {
    let local = instant.to_offset(eastern_offset(instant));
    let weekday = local.weekday();
    let is_weekday = !matches!(weekday, Weekday::Saturday | Weekday::Sunday);
    let in_session = (SESSION_OPEN..SESSION_CLOSE).contains(&local.time());

    MarketStatus {
        is_open: is_weekday && in_session,
        current_time: local,
        market_open: "09:30 ET",
        market_close: "16:00 ET",
        day_of_week: weekday.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn daylight_time_follows_the_us_switch_dates() {
        assert_eq!(eastern_offset(datetime!(2024-01-15 12:00 UTC)), offset!(-5));
        assert_eq!(eastern_offset(datetime!(2024-07-15 12:00 UTC)), offset!(-4));
        // 2024-03-10 02:00 EST and 2024-11-03 02:00 EDT.
        assert_eq!(eastern_offset(datetime!(2024-03-10 06:59 UTC)), offset!(-5));
        assert_eq!(eastern_offset(datetime!(2024-03-10 07:00 UTC)), offset!(-4));
        assert_eq!(eastern_offset(datetime!(2024-11-03 05:59 UTC)), offset!(-4));
        assert_eq!(eastern_offset(datetime!(2024-11-03 06:00 UTC)), offset!(-5));
    }

    #[test]
    fn session_opens_at_half_past_nine_local() {
        // Winter: 14:30 UTC is 09:30 EST.
        assert!(!market_status(datetime!(2024-01-16 14:29 UTC)).is_open);
        assert!(market_status(datetime!(2024-01-16 14:30 UTC)).is_open);
        // Summer: 13:30 UTC is 09:30 EDT.
        assert!(market_status(datetime!(2024-07-16 13:30 UTC)).is_open);
    }

    #[test]
    fn session_is_closed_at_four_and_on_weekends() {
        assert!(!market_status(datetime!(2024-07-16 20:00 UTC)).is_open);
        assert!(market_status(datetime!(2024-07-16 19:59 UTC)).is_open);

        let saturday = market_status(datetime!(2024-07-13 15:00 UTC));
        assert!(!saturday.is_open);
        assert_eq!(saturday.day_of_week, "Saturday");
    }

    #[test]
    fn local_clock_is_reported_with_its_offset() {
        let status = market_status(datetime!(2024-07-16 13:30 UTC));
        let json = serde_json::to_value(&status).expect("serialize");

        assert_eq!(json["current_time"], "2024-07-16T09:30:00-04:00");
        assert_eq!(json["market_open"], "09:30 ET");
        assert_eq!(json["day_of_week"], "Tuesday");
    }
}
