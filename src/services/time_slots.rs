use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

use crate::errors::ScheduleError;
use crate::models::common::hhmm;
use crate::models::schedule::{day_label, TimeRange, WeeklySchedule};
use crate::models::turno::Ocupado;
use crate::services::holidays::HolidaySet;

/// Granularity of bookable slots, in minutes.
pub const SLOT_MINUTES: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SlotStatus {
    #[serde(rename = "libre")]
    Free,
    #[serde(rename = "ocupado")]
    Occupied,
}

/// A bookable time of day tagged with its availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Slot {
    #[serde(with = "hhmm")]
    pub hora: NaiveTime,
    pub estado: SlotStatus,
}

impl Slot {
    pub fn is_free(&self) -> bool {
        self.estado == SlotStatus::Free
    }
}

/// Times already reserved for one business on one date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OccupiedSet(BTreeSet<NaiveTime>);

impl OccupiedSet {
    pub fn contains(&self, time: &NaiveTime) -> bool {
        self.0.contains(time)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<NaiveTime> for OccupiedSet {
    fn from_iter<I: IntoIterator<Item = NaiveTime>>(iter: I) -> Self {
        OccupiedSet(iter.into_iter().collect())
    }
}

impl From<Vec<Ocupado>> for OccupiedSet {
    fn from(rows: Vec<Ocupado>) -> Self {
        rows.into_iter().map(|row| row.hora).collect()
    }
}

/// Which business and day is being looked at, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRequest {
    pub empresa_id: i64,
    pub fecha: NaiveDate,
    pub now: NaiveDateTime,
}

/// Weekday rules applied on top of the configured opening hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailabilityRules {
    /// No slots at all on this day.
    pub closed_day: Weekday,
    /// Only the first configured range is honored on this day.
    pub half_day: Weekday,
    pub slot_minutes: i64,
}

impl Default for AvailabilityRules {
    fn default() -> Self {
        Self {
            closed_day: Weekday::Sun,
            half_day: Weekday::Sat,
            slot_minutes: SLOT_MINUTES,
        }
    }
}

/// Slot start times inside `[range.start, range.end)` every `step_minutes`.
pub fn generate_range_slots(range: &TimeRange, step_minutes: i64) -> Vec<NaiveTime> {
    let step = Duration::minutes(step_minutes.max(1));
    let mut slots = Vec::new();
    let mut current = range.start;

    while current < range.end {
        slots.push(current);
        let (next, wrapped) = current.overflowing_add_signed(step);
        // Past midnight
        if wrapped != 0 {
            break;
        }
        current = next;
    }

    slots
}

/// Computes the slot grid of a business for one date.
///
/// Pure and synchronous: the same inputs always give the same ordered
/// output. Malformed opening hours are reported, never skipped.
#[derive(Debug, Clone, Default)]
pub struct SlotAvailabilityCalculator {
    rules: AvailabilityRules,
}

impl SlotAvailabilityCalculator {
    pub fn new(rules: AvailabilityRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &AvailabilityRules {
        &self.rules
    }

    /// Times offered on `fecha` before looking at reservations.
    pub fn bookable_times(
        &self,
        schedule: &WeeklySchedule,
        holidays: &HolidaySet,
        fecha: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<Vec<NaiveTime>, ScheduleError> {
        let weekday = fecha.weekday();

        if holidays.contains(&fecha) {
            debug!("{} is a holiday, no slots", fecha);
            return Ok(Vec::new());
        }

        if weekday == self.rules.closed_day {
            debug!("{} is a {}, no slots", fecha, day_label(weekday));
            return Ok(Vec::new());
        }

        // The half day drops extra ranges before parsing them
        let raw = schedule.raw_ranges(weekday);
        let raw = if weekday == self.rules.half_day {
            &raw[..raw.len().min(1)]
        } else {
            raw
        };
        let ranges = raw
            .iter()
            .map(|range| range.parse::<TimeRange>())
            .collect::<Result<Vec<_>, _>>()?;

        let mut times: Vec<NaiveTime> = ranges
            .iter()
            .flat_map(|range| generate_range_slots(range, self.rules.slot_minutes))
            .collect();

        if fecha == now.date() {
            // Compare at minute resolution
            let current = now.time().with_second(0).and_then(|t| t.with_nanosecond(0));
            if let Some(current) = current {
                times.retain(|time| *time > current);
            }
        }

        debug!(
            "{} ({}): {} ranges, {} bookable times",
            fecha,
            day_label(weekday),
            ranges.len(),
            times.len()
        );

        Ok(times)
    }

    /// Full slot grid for a request, each slot tagged free or occupied.
    pub fn compute(
        &self,
        schedule: &WeeklySchedule,
        holidays: &HolidaySet,
        occupied: &OccupiedSet,
        request: &SlotRequest,
    ) -> Result<Vec<Slot>, ScheduleError> {
        let slots = self
            .bookable_times(schedule, holidays, request.fecha, request.now)?
            .into_iter()
            .map(|hora| Slot {
                hora,
                estado: if occupied.contains(&hora) {
                    SlotStatus::Occupied
                } else {
                    SlotStatus::Free
                },
            })
            .collect();

        Ok(slots)
    }
}
