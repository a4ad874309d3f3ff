use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::ScheduleError;
use crate::models::common::{format_hhmm, parse_hhmm};

// Indexed by `Weekday::num_days_from_sunday`
const DAY_LABELS: [&str; 7] = [
    "Domingo",
    "Lunes",
    "Martes",
    "Miércoles",
    "Jueves",
    "Viernes",
    "Sábado",
];

/// Label the backend uses for a weekday in a business's opening hours.
pub fn day_label(weekday: Weekday) -> &'static str {
    DAY_LABELS[weekday.num_days_from_sunday() as usize]
}

// Some records are typed without accents
fn unaccented_label(weekday: Weekday) -> Option<&'static str> {
    match weekday {
        Weekday::Wed => Some("Miercoles"),
        Weekday::Sat => Some("Sabado"),
        _ => None,
    }
}

/// One open interval `[start, end)` of a business day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl FromStr for TimeRange {
    type Err = ScheduleError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (start, end) = value
            .split_once('-')
            .ok_or_else(|| ScheduleError::Format(value.to_string()))?;

        let start = parse_hhmm(start).map_err(|_| ScheduleError::Format(value.to_string()))?;
        let end = parse_hhmm(end).map_err(|_| ScheduleError::Format(value.to_string()))?;

        if start >= end {
            return Err(ScheduleError::EmptyRange(value.to_string()));
        }

        Ok(TimeRange { start, end })
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", format_hhmm(&self.start), format_hhmm(&self.end))
    }
}

/// Weekly opening hours as returned by `GET /empresas/horarios/{id}`:
/// a day label mapped to its `"HH:MM-HH:MM"` ranges, in configured order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeeklySchedule(HashMap<String, Vec<String>>);

impl WeeklySchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_day(mut self, weekday: Weekday, ranges: &[&str]) -> Self {
        self.0.insert(
            day_label(weekday).to_string(),
            ranges.iter().map(|r| r.to_string()).collect(),
        );
        self
    }

    /// Raw range strings for a weekday; a missing day is an empty slice.
    pub fn raw_ranges(&self, weekday: Weekday) -> &[String] {
        self.0
            .get(day_label(weekday))
            .or_else(|| unaccented_label(weekday).and_then(|label| self.0.get(label)))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Parsed ranges for a weekday. The first malformed entry aborts.
    pub fn ranges_for(&self, weekday: Weekday) -> Result<Vec<TimeRange>, ScheduleError> {
        self.raw_ranges(weekday)
            .iter()
            .map(|raw| raw.parse())
            .collect()
    }
}
