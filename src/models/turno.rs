use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::models::common::hhmm;

/// One entry of `GET /turnos/ocupados`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ocupado {
    #[serde(with = "hhmm")]
    pub hora: NaiveTime,
}

/// Body of `POST /turnos/reservar`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservaRequest {
    pub empresa_id: i64,
    pub fecha: NaiveDate,
    #[serde(with = "hhmm")]
    pub hora: NaiveTime,
}

/// A booking owned by the logged-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turno {
    pub id: i64,
    pub fecha: String,
    #[serde(with = "hhmm")]
    pub hora: NaiveTime,
    #[serde(default)]
    pub empresa_nombre: Option<String>,
}
