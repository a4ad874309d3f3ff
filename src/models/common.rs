use chrono::NaiveTime;

use crate::errors::ScheduleError;

/// Parse a time of day written as `HH:MM`, tolerating a trailing `:SS`.
pub fn parse_hhmm(value: &str) -> Result<NaiveTime, ScheduleError> {
    let trimmed = value.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|_| ScheduleError::Format(value.to_string()))
}

/// Render a time of day as `HH:MM`.
pub fn format_hhmm(time: &NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Serde adapter for `"HH:MM"` times on the wire.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_hhmm(time))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_hhmm(&raw).map_err(serde::de::Error::custom)
    }
}
