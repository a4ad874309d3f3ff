use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::client::TurnosRepository;
use crate::errors::{ApiError, ApiResult};
use crate::models::schedule::{day_label, WeeklySchedule};
use crate::models::turno::{ReservaRequest, Turno};
use crate::services::holidays::HolidaySet;
use crate::services::time_slots::{
    OccupiedSet, Slot, SlotAvailabilityCalculator, SlotRequest, SlotStatus,
};
use crate::session::Session;

/// Slot grid of one business for one date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Availability {
    pub empresa_id: i64,
    pub fecha: NaiveDate,
    pub dia: &'static str,
    pub slots: Vec<Slot>,
}

/// What happened when a user picked a slot from the grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ReservationOutcome {
    /// Booked; the grid was re-fetched afterwards.
    Reserved { availability: Availability },
    /// The slot was already taken in the grid; nothing was sent.
    Occupied { availability: Availability },
    /// Someone else booked it first; the grid was re-fetched.
    Conflict {
        message: String,
        availability: Availability,
    },
}

fn mark_occupied(mut availability: Availability, hora: NaiveTime) -> Availability {
    for slot in availability.slots.iter_mut().filter(|slot| slot.hora == hora) {
        slot.estado = SlotStatus::Occupied;
    }
    availability
}

/// Booking workflow on top of the backend and the slot calculator.
pub struct BookingService {
    turnos: Arc<dyn TurnosRepository>,
    holidays: HolidaySet,
    calculator: SlotAvailabilityCalculator,
}

impl BookingService {
    pub fn new(turnos: Arc<dyn TurnosRepository>, holidays: HolidaySet) -> Self {
        Self {
            turnos,
            holidays,
            calculator: SlotAvailabilityCalculator::default(),
        }
    }

    pub fn with_calculator(mut self, calculator: SlotAvailabilityCalculator) -> Self {
        self.calculator = calculator;
        self
    }

    pub fn holidays(&self) -> &HolidaySet {
        &self.holidays
    }

    // Dates before today are refused before anything is fetched
    fn check_date(&self, fecha: NaiveDate, now: NaiveDateTime) -> ApiResult<()> {
        if fecha < now.date() {
            return Err(ApiError::Validation(format!(
                "{} is in the past",
                fecha
            )));
        }
        Ok(())
    }

    fn grid(
        &self,
        schedule: &WeeklySchedule,
        occupied: &OccupiedSet,
        request: &SlotRequest,
    ) -> ApiResult<Availability> {
        let slots = self
            .calculator
            .compute(schedule, &self.holidays, occupied, request)?;

        Ok(Availability {
            empresa_id: request.empresa_id,
            fecha: request.fecha,
            dia: day_label(request.fecha.weekday()),
            slots,
        })
    }

    async fn fetch_day(
        &self,
        empresa_id: i64,
        fecha: NaiveDate,
    ) -> ApiResult<(WeeklySchedule, OccupiedSet)> {
        futures::try_join!(
            self.turnos.weekly_schedule(empresa_id),
            self.turnos.occupied(empresa_id, fecha)
        )
    }

    /// Slot grid for a business on a date, as seen at `now`.
    pub async fn availability(
        &self,
        empresa_id: i64,
        fecha: NaiveDate,
        now: NaiveDateTime,
    ) -> ApiResult<Availability> {
        self.check_date(fecha, now)?;

        let (schedule, occupied) = self.fetch_day(empresa_id, fecha).await?;
        let request = SlotRequest {
            empresa_id,
            fecha,
            now,
        };
        let availability = self.grid(&schedule, &occupied, &request)?;

        info!(
            "Business {} on {} ({}): {} slots, {} occupied",
            empresa_id,
            fecha,
            availability.dia,
            availability.slots.len(),
            availability.slots.iter().filter(|s| !s.is_free()).count()
        );

        Ok(availability)
    }

    /// Pick a slot: occupied slots are ignored, free ones get reserved.
    pub async fn select_slot(
        &self,
        session: &Session,
        reserva: &ReservaRequest,
        now: NaiveDateTime,
    ) -> ApiResult<ReservationOutcome> {
        self.check_date(reserva.fecha, now)?;

        let (schedule, occupied) = self.fetch_day(reserva.empresa_id, reserva.fecha).await?;
        let request = SlotRequest {
            empresa_id: reserva.empresa_id,
            fecha: reserva.fecha,
            now,
        };
        let availability = self.grid(&schedule, &occupied, &request)?;

        let slot = availability
            .slots
            .iter()
            .find(|slot| slot.hora == reserva.hora)
            .copied()
            .ok_or_else(|| {
                ApiError::Validation(format!(
                    "{} is not offered on {}",
                    reserva.hora.format("%H:%M"),
                    reserva.fecha
                ))
            })?;

        if !slot.is_free() {
            debug!(
                "Slot {} on {} already occupied, ignoring selection",
                slot.hora, reserva.fecha
            );
            return Ok(ReservationOutcome::Occupied { availability });
        }

        match self.turnos.reserve(session, reserva).await {
            Ok(()) => {
                info!(
                    "User {} reserved {} {} at business {}",
                    session.user.id, reserva.fecha, reserva.hora, reserva.empresa_id
                );
                // Already committed; fall back to the grid we have
                let availability =
                    match self.turnos.occupied(reserva.empresa_id, reserva.fecha).await {
                        Ok(occupied) => self.grid(&schedule, &occupied, &request)?,
                        Err(err) => {
                            warn!(
                                "Could not refresh occupied slots after reserving: {}",
                                err
                            );
                            mark_occupied(availability, reserva.hora)
                        }
                    };
                Ok(ReservationOutcome::Reserved { availability })
            }
            Err(ApiError::Conflict(message)) => {
                warn!(
                    "Slot {} on {} taken concurrently: {}",
                    reserva.hora, reserva.fecha, message
                );
                let occupied = self.turnos.occupied(reserva.empresa_id, reserva.fecha).await?;
                let availability = self.grid(&schedule, &occupied, &request)?;
                Ok(ReservationOutcome::Conflict {
                    message,
                    availability,
                })
            }
            Err(err) => Err(err),
        }
    }

    pub async fn my_bookings(&self, session: &Session) -> ApiResult<Vec<Turno>> {
        self.turnos.my_bookings(session).await
    }

    pub async fn cancel(&self, session: &Session, turno_id: i64) -> ApiResult<()> {
        self.turnos.cancel(session, turno_id).await?;
        info!("User {} cancelled booking {}", session.user.id, turno_id);
        Ok(())
    }
}
