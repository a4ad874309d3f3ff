//! Turnos booking service
//!
//! This library computes the bookable appointment slots of a business for a
//! given date and fronts the turnos REST backend with a typed client, a
//! session store and a small JSON service for browsers.
//!
//! # Modules
//!
//! - `services::time_slots`: the slot availability calculator
//! - `services::booking`: availability queries and reservations on top of the backend
//! - `client`: `TurnosClient` and the data-access traits it implements
//! - `session`: sessions opened on login and closed on logout
//!
//! # Slot rules
//!
//! Slots start every 30 minutes inside each configured opening range. Holidays
//! and Sundays have none, Saturdays only honor the first range, and for today
//! only times later than the current minute are offered.

pub mod client;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod session;




// Re-export the main API types for ease of use
pub use client::{AuthGateway, EmpresaRepository, TurnosBackend, TurnosClient, TurnosRepository};
pub use config::AppConfig;
pub use errors::{ApiError, ApiResult, AuthError, ScheduleError};
pub use handlers::api::AppState;
pub use routes::create_router;
pub use services::time_slots::{Slot, SlotAvailabilityCalculator, SlotStatus};
pub use session::{Session, SessionStore};
