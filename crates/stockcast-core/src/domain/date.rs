use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Duration, Month, OffsetDateTime, Weekday};

use crate::ValidationError;

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Calendar day of a daily bar, serialized as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TradingDate(Date);

impl TradingDate {
    pub fn today() -> Self {
        Self(OffsetDateTime::now_utc().date())
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        Date::parse(input.trim(), DATE_FORMAT)
            .map(Self)
            .map_err(|_| ValidationError::InvalidDate {
                value: input.to_owned(),
            })
    }

    pub fn from_ymd(year: i32, month: u8, day: u8) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidDate {
            value: format!("{year:04}-{month:02}-{day:02}"),
        };
        let month = Month::try_from(month).map_err(|_| invalid())?;
        Date::from_calendar_date(year, month, day)
            .map(Self)
            .map_err(|_| invalid())
    }

    /// Calendar day of a unix timestamp shifted by the exchange's UTC offset.
    pub fn from_unix_timestamp(seconds: i64, utc_offset_seconds: i64) -> Option<Self> {
        OffsetDateTime::from_unix_timestamp(seconds.checked_add(utc_offset_seconds)?)
            .ok()
            .map(|value| Self(value.date()))
    }

    pub const fn into_inner(self) -> Date {
        self.0
    }

    pub fn is_weekend(self) -> bool {
        matches!(self.0.weekday(), Weekday::Saturday | Weekday::Sunday)
    }

    /// Next Monday-to-Friday date. Holiday calendars are not considered.
    pub fn next_business_day(self) -> Self {
        let mut current = self.0;
        loop {
            current = current.next_day().unwrap_or(current);
            let candidate = Self(current);
            if !candidate.is_weekend() || current == Date::MAX {
                return candidate;
            }
        }
    }

    pub fn minus_days(self, days: i64) -> Self {
        Self(self.0.checked_sub(Duration::days(days)).unwrap_or(Date::MIN))
    }

    /// Seconds since the unix epoch at midnight UTC.
    pub fn unix_midnight(self) -> i64 {
        self.0.midnight().assume_utc().unix_timestamp()
    }

    pub fn format_iso(self) -> String {
        self.0
            .format(DATE_FORMAT)
            .unwrap_or_else(|_| String::from("<unformattable>"))
    }
}

impl Display for TradingDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_iso())
    }
}

impl Serialize for TradingDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.format_iso())
    }
}

impl<'de> Deserialize<'de> for TradingDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_formats_iso_dates() {
        let parsed = TradingDate::parse("2024-03-08").expect("must parse");
        assert_eq!(parsed.format_iso(), "2024-03-08");
        assert_eq!(parsed, TradingDate::from_ymd(2024, 3, 8).expect("valid"));
    }

    #[test]
    fn rejects_malformed_dates() {
        let err = TradingDate::parse("03/08/2024").expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidDate { .. }));
        assert!(TradingDate::from_ymd(2024, 2, 30).is_err());
    }

    #[test]
    fn friday_rolls_to_monday() {
        let friday = TradingDate::from_ymd(2024, 3, 8).expect("valid");
        let monday = TradingDate::from_ymd(2024, 3, 11).expect("valid");
        assert_eq!(friday.next_business_day(), monday);
    }

    #[test]
    fn saturday_rolls_to_monday_and_midweek_to_next_day() {
        let saturday = TradingDate::from_ymd(2024, 3, 9).expect("valid");
        let tuesday = TradingDate::from_ymd(2024, 3, 12).expect("valid");
        assert_eq!(
            saturday.next_business_day(),
            TradingDate::from_ymd(2024, 3, 11).expect("valid")
        );
        assert_eq!(
            tuesday.next_business_day(),
            TradingDate::from_ymd(2024, 3, 13).expect("valid")
        );
    }

    #[test]
    fn converts_exchange_local_timestamps() {
        // 2024-03-08 14:30 UTC, New York open (UTC-5).
        let date = TradingDate::from_unix_timestamp(1_709_908_200, -18_000).expect("valid");
        assert_eq!(date.format_iso(), "2024-03-08");
    }

    #[test]
    fn serializes_as_plain_string() {
        let date = TradingDate::from_ymd(2024, 1, 2).expect("valid");
        let json = serde_json::to_string(&date).expect("serialize");
        assert_eq!(json, "\"2024-01-02\"");
        let back: TradingDate = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, date);
    }
}
