use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::macros::format_description;
use time::{Date, Month, OffsetDateTime, Weekday};

use crate::ValidationError;

/// Calendar date of a trading session or forecast period (no time of day).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarketDate(Date);

impl MarketDate {
    pub const fn new(date: Date) -> Self {
        Self(date)
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

    pub fn today_utc() -> Self {
        Self(OffsetDateTime::now_utc().date())
    }

    /// Parse an ISO-8601 calendar date (`YYYY-MM-DD`).
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        Date::parse(input.trim(), format_description!("[year]-[month]-[day]"))
            .map(Self)
            .map_err(|_| ValidationError::InvalidDate {
                value: input.to_owned(),
            })
    }

    /// Calendar date of a unix timestamp shifted by an exchange UTC offset.
    pub fn from_unix(timestamp: i64, utc_offset_secs: i64) -> Result<Self, ValidationError> {
        OffsetDateTime::from_unix_timestamp(timestamp.saturating_add(utc_offset_secs))
            .map(|value| Self(value.date()))
            .map_err(|_| ValidationError::DateOutOfRange {
                value: timestamp.to_string(),
            })
    }

    pub const fn into_inner(self) -> Date {
        self.0
    }

    /// Unix timestamp of midnight UTC at the start of this date.
    pub fn unix_midnight(self) -> i64 {
        self.0.midnight().assume_utc().unix_timestamp()
    }

    pub fn next_day(self) -> Result<Self, ValidationError> {
        self.0
            .next_day()
            .map(Self)
            .ok_or_else(|| self.out_of_range())
    }

    /// Last calendar day of this date's month.
    pub fn month_end(self) -> Result<Self, ValidationError> {
        let first_of_next = match self.0.month() {
            Month::December => Date::from_calendar_date(self.0.year() + 1, Month::January, 1),
            month => Date::from_calendar_date(self.0.year(), month.next(), 1),
        };

        first_of_next
            .ok()
            .and_then(Date::previous_day)
            .map(Self)
            .ok_or_else(|| self.out_of_range())
    }

    pub fn is_weekend(self) -> bool {
        matches!(self.0.weekday(), Weekday::Saturday | Weekday::Sunday)
    }

    fn out_of_range(self) -> ValidationError {
        ValidationError::DateOutOfRange {
            value: self.to_string(),
        }
    }
}

impl Display for MarketDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}",
            self.0.year(),
            u8::from(self.0.month()),
            self.0.day()
        )
    }
}

impl Serialize for MarketDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MarketDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}
