//! Small validated value types shared by the CareWatch crates.
//!
//! - [`ClockTime`]: a wall-clock time of day with minute precision, rendered as `"HH:MM"`.
//! - [`Label`]: display text that is guaranteed to be non-blank.

use std::fmt;
use std::str::FromStr;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Errors that can occur when creating validated types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeError {
    /// The text is not of the form `H:MM`, `HH:MM` or `HH:MM:SS`.
    #[error("invalid clock time: {0:?}")]
    Malformed(String),

    /// Hour or minute outside the 24-hour clock.
    #[error("clock time out of range: {hour:02}:{minute:02}")]
    OutOfRange { hour: u32, minute: u32 },
}

/// Errors that can occur when creating a [`Label`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LabelError {
    /// The input text was empty or contained only whitespace
    #[error("label cannot be empty")]
    Empty,
}

/// A time of day on the 24-hour clock, minute precision.
///
/// Stored as minutes since midnight. The `Display` and serde forms are zero-padded `"HH:MM"`,
/// so the derived ordering agrees with lexicographic ordering of the rendered strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(u16);

impl ClockTime {
    pub const MIDNIGHT: ClockTime = ClockTime(0);

    /// Creates a clock time from an hour (0-23) and minute (0-59).
    pub fn new(hour: u32, minute: u32) -> Result<Self, TimeError> {
        if hour >= 24 || minute >= 60 {
            return Err(TimeError::OutOfRange { hour, minute });
        }
        Ok(Self((hour * 60 + minute) as u16))
    }

    /// Const constructor for fixed tables. Out-of-range values wrap past midnight.
    pub const fn hm(hour: u8, minute: u8) -> Self {
        Self(((hour as u16) * 60 + minute as u16) % (MINUTES_PER_DAY as u16))
    }

    /// Creates a clock time from minutes since midnight, wrapping past the end of the day.
    pub fn from_minutes(minutes: u32) -> Self {
        Self((minutes % MINUTES_PER_DAY) as u16)
    }

    /// Creates a clock time from a whole hour, wrapping modulo 24.
    pub fn from_hour(hour: u32) -> Self {
        Self::from_minutes(hour * 60)
    }

    pub fn hour(self) -> u32 {
        u32::from(self.0) / 60
    }

    pub fn minute(self) -> u32 {
        u32::from(self.0) % 60
    }

    pub fn minutes_since_midnight(self) -> u32 {
        u32::from(self.0)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for ClockTime {
    type Err = TimeError;

    /// Parses `H:MM`, `HH:MM` or `HH:MM:SS`. Seconds are validated and then dropped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || TimeError::Malformed(s.to_string());
        let trimmed = s.trim();

        let mut parts = trimmed.split(':');
        let hour = parts.next().ok_or_else(malformed)?;
        let minute = parts.next().ok_or_else(malformed)?;
        let second = parts.next();
        if parts.next().is_some() {
            return Err(malformed());
        }

        let numeric = |part: &str, max_len: usize| -> Result<u32, TimeError> {
            if part.is_empty() || part.len() > max_len || !part.bytes().all(|b| b.is_ascii_digit())
            {
                return Err(malformed());
            }
            part.parse::<u32>().map_err(|_| malformed())
        };

        let hour = numeric(hour, 2)?;
        if minute.len() != 2 {
            return Err(malformed());
        }
        let minute = numeric(minute, 2)?;
        if let Some(second) = second {
            if second.len() != 2 || numeric(second, 2)? >= 60 {
                return Err(malformed());
            }
        }

        ClockTime::new(hour, minute)
    }
}

impl serde::Serialize for ClockTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for ClockTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Display text with at least one non-whitespace character.
///
/// Leading and trailing whitespace is trimmed on construction. Case is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label(String);

impl Label {
    pub fn new(input: impl AsRef<str>) -> Result<Self, LabelError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(LabelError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Builds a label from optional text, treating absent and blank text alike.
    pub fn from_optional(input: Option<&str>) -> Option<Self> {
        input.and_then(|s| Self::new(s).ok())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Label {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for Label {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Label {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Label::new(&s).map_err(serde::de::Error::custom)
    }
}
