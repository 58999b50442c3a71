use std::{fmt, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    #[error("invalid time format: {0:?}")]
    InvalidTimeFormat(String),
}

/// Minute-precision wall-clock time. `24:00` is never stored; it is coerced
/// to `23:59` on construction because the backend rejects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WallTime {
    hour: u8,
    minute: u8,
}

impl WallTime {
    pub const MIDNIGHT: Self = Self { hour: 0, minute: 0 };
    pub const END_OF_DAY: Self = Self {
        hour: 23,
        minute: 59,
    };

    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        match (hour, minute) {
            (24, 0) => Some(Self::END_OF_DAY),
            (0..=23, 0..=59) => Some(Self {
                hour: hour as u8,
                minute: minute as u8,
            }),
            _ => None,
        }
    }

    pub fn hour(self) -> u8 {
        self.hour
    }

    pub fn minute(self) -> u8 {
        self.minute
    }

    pub fn minutes_since_midnight(self) -> u16 {
        self.hour as u16 * 60 + self.minute as u16
    }

    pub fn to_12_hour(self) -> String {
        let (hour, suffix) = match self.hour {
            0 => (12, "AM"),
            1..=11 => (self.hour, "AM"),
            12 => (12, "PM"),
            _ => (self.hour - 12, "PM"),
        };
        format!("{hour:02}:{:02} {suffix}", self.minute)
    }
}

impl fmt::Display for WallTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for WallTime {
    type Err = TimeError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = || TimeError::InvalidTimeFormat(text.to_string());
        let fields = split_fields(text.trim()).ok_or_else(invalid)?;

        match fields.as_slice() {
            [hour, minute] => WallTime::new(*hour, *minute).ok_or_else(invalid),
            [hour, minute, second] if *second <= 59 => {
                if *hour == 24 && *second != 0 {
                    return Err(invalid());
                }
                WallTime::new(*hour, *minute).ok_or_else(invalid)
            }
            _ => Err(invalid()),
        }
    }
}

impl Serialize for WallTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WallTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        normalize(&text).map_err(de::Error::custom)
    }
}

fn split_fields(text: &str) -> Option<Vec<u32>> {
    text.split(':')
        .map(|field| {
            if field.is_empty() || field.len() > 2 || !field.bytes().all(|b| b.is_ascii_digit()) {
                None
            } else {
                field.parse::<u32>().ok()
            }
        })
        .collect()
}

fn meridiem(text: &str) -> Option<(&str, bool)> {
    let lower = text.to_ascii_lowercase();
    let (index, is_pm) = match (lower.find("am"), lower.find("pm")) {
        (Some(index), None) => (index, false),
        (None, Some(index)) => (index, true),
        _ => return None,
    };
    if !lower[index + 2..].trim().is_empty() {
        return None;
    }
    Some((text[..index].trim(), is_pm))
}

fn has_meridiem(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    lower.contains("am") || lower.contains("pm")
}

// Input without an am/pm marker is already 24-hour and is returned unchanged
// once validated.
pub fn to_24_hour(display: &str) -> Result<String, TimeError> {
    if !has_meridiem(display) {
        display.parse::<WallTime>()?;
        return Ok(display.to_string());
    }

    let invalid = || TimeError::InvalidTimeFormat(display.to_string());
    let (clock, is_pm) = meridiem(display).ok_or_else(invalid)?;
    let [hour, minute] = split_fields(clock)
        .and_then(|fields| <[u32; 2]>::try_from(fields).ok())
        .ok_or_else(invalid)?;

    if !(1..=12).contains(&hour) || minute > 59 {
        return Err(invalid());
    }

    let hour = match (hour, is_pm) {
        (12, false) => 0,
        (12, true) => 12,
        (hour, true) => hour + 12,
        (hour, false) => hour,
    };
    Ok(format!("{hour:02}:{minute:02}"))
}

pub fn to_12_hour(time24: &str) -> Result<String, TimeError> {
    Ok(time24.parse::<WallTime>()?.to_12_hour())
}

pub fn normalize(display: &str) -> Result<WallTime, TimeError> {
    to_24_hour(display)?.parse()
}
