//! Times of day and validated time intervals.
//!
//! The server exchanges times of day as `HH:MM` strings (seconds are
//! included only when non-zero). Calendar exports may use a single digit
//! for the hour, so parsing accepts `H:MM` as well.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when parsing or validating times of day.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimeError {
    /// The value is not a recognizable time of day.
    #[error("invalid time of day: {value}")]
    InvalidTime { value: String },

    /// The interval end does not come after its start.
    #[error("End time must be after start time ({start} >= {end})")]
    EndNotAfterStart { start: String, end: String },

    /// The value is not of the form `HH:MM-HH:MM`.
    #[error("invalid time range: {value} (expected HH:MM-HH:MM)")]
    InvalidRange { value: String },
}

/// Parses a time of day such as `09:30`, `9:30` or `09:30:15`.
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime, TimeError> {
    let trimmed = value.trim();
    ["%H:%M", "%H:%M:%S"]
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| TimeError::InvalidTime {
            value: value.to_string(),
        })
}

/// Formats a time of day as `HH:MM`, or `HH:MM:SS` when seconds are set.
pub fn format_time_of_day(time: NaiveTime) -> String {
    if time.second() == 0 {
        time.format("%H:%M").to_string()
    } else {
        time.format("%H:%M:%S").to_string()
    }
}

/// Minutes elapsed since midnight, with seconds as a fraction.
pub fn minutes_since_midnight(time: NaiveTime) -> f64 {
    f64::from(time.num_seconds_from_midnight()) / 60.0
}

/// A time-of-day range with `start < end`.
///
/// Used both for participant busy periods and for caller-defined blackouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawInterval", into = "RawInterval")]
pub struct TimeInterval {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeInterval {
    /// Creates an interval, rejecting empty or inverted ranges.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, TimeError> {
        if start >= end {
            return Err(TimeError::EndNotAfterStart {
                start: format_time_of_day(start),
                end: format_time_of_day(end),
            });
        }
        Ok(Self { start, end })
    }

    /// Parses both bounds and validates the result.
    pub fn parse(start: &str, end: &str) -> Result<Self, TimeError> {
        Self::new(parse_time_of_day(start)?, parse_time_of_day(end)?)
    }

    pub const fn start(&self) -> NaiveTime {
        self.start
    }

    pub const fn end(&self) -> NaiveTime {
        self.end
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            format_time_of_day(self.start),
            format_time_of_day(self.end)
        )
    }
}

impl FromStr for TimeInterval {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((start, end)) = s.split_once('-') else {
            return Err(TimeError::InvalidRange {
                value: s.to_string(),
            });
        };
        Self::parse(start, end)
    }
}

/// Wire form of an interval: `{"start":"HH:MM","end":"HH:MM"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawInterval {
    start: String,
    end: String,
}

impl TryFrom<RawInterval> for TimeInterval {
    type Error = TimeError;

    fn try_from(raw: RawInterval) -> Result<Self, Self::Error> {
        Self::parse(&raw.start, &raw.end)
    }
}

impl From<TimeInterval> for RawInterval {
    fn from(interval: TimeInterval) -> Self {
        Self {
            start: format_time_of_day(interval.start),
            end: format_time_of_day(interval.end),
        }
    }
}

/// Serde adapter for a bare `HH:MM` time of day.
pub(crate) mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_time_of_day(*time))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        super::parse_time_of_day(&value).map_err(serde::de::Error::custom)
    }

    /// Same as the parent module, for optional fields.
    pub mod option {
        use chrono::NaiveTime;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match time {
                Some(time) => serializer.serialize_some(&super::super::format_time_of_day(*time)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Option::<String>::deserialize(deserializer)?
                .map(|value| super::super::parse_time_of_day(&value))
                .transpose()
                .map_err(serde::de::Error::custom)
        }
    }
}

#[cfg(test)]
pub(crate) fn t(value: &str) -> NaiveTime {
    parse_time_of_day(value).unwrap()
}
