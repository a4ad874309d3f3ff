use axum::{
    extract::{Json as ExtractJson, Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::client::{AuthGateway, EmpresaRepository, TurnosBackend};
use crate::errors::AuthError;
use crate::handlers::error::AppError;
use crate::models::auth::{LoginRequest, RegisterRequest, Usuario};
use crate::models::empresa::{Categoria, Empresa, EmpresaForm};
use crate::models::turno::{ReservaRequest, Turno};
use crate::services::booking::{Availability, BookingService, ReservationOutcome};
use crate::services::holidays::HolidaySet;
use crate::session::{Session, SessionStore};

/// Local wall-clock time; availability is computed in local calendar days.
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

// AppState struct containing shared resources
pub struct AppState {
    pub empresas: Arc<dyn EmpresaRepository>,
    pub auth: Arc<dyn AuthGateway>,
    pub booking: BookingService,
    pub sessions: SessionStore,
    pub clock: fn() -> NaiveDateTime,
}

impl AppState {
    pub fn new<B>(backend: Arc<B>, holidays: HolidaySet, sessions: SessionStore) -> Self
    where
        B: TurnosBackend + 'static,
    {
        Self {
            empresas: backend.clone(),
            auth: backend.clone(),
            booking: BookingService::new(backend, holidays),
            sessions,
            clock: local_now,
        }
    }

    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }

    // Same clock, as an instant for token expiry
    fn now_utc(&self) -> DateTime<Utc> {
        self.now()
            .and_local_timezone(Local)
            .earliest()
            .map(|now| now.with_timezone(&Utc))
            .unwrap_or_else(Utc::now)
    }
}

fn session_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|id| !id.is_empty())
}

fn require_session(state: &AppState, headers: &HeaderMap) -> Result<Session, AppError> {
    let id = session_id(headers).ok_or(AuthError::MissingSession)?;
    Ok(state.sessions.get(id, state.now_utc())?)
}

fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<Session, AppError> {
    let session = require_session(state, headers)?;
    if !session.is_admin() {
        warn!("User {} tried an admin operation", session.user.id);
        return Err(AuthError::InsufficientRole.into());
    }
    Ok(session)
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub fecha: NaiveDate,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResult {
    pub session_id: String,
    pub user: Usuario,
}

// List categories endpoint
pub async fn list_categorias(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Categoria>>, AppError> {
    Ok(Json(state.empresas.list_categorias().await?))
}

// Businesses in a category endpoint
pub async fn list_empresas_by_categoria(
    State(state): State<Arc<AppState>>,
    Path(categoria_id): Path<i64>,
) -> Result<Json<Vec<Empresa>>, AppError> {
    Ok(Json(state.empresas.list_by_categoria(categoria_id).await?))
}

pub async fn list_empresas(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Empresa>>, AppError> {
    Ok(Json(state.empresas.list().await?))
}

pub async fn get_empresa(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Empresa>, AppError> {
    Ok(Json(state.empresas.get(id).await?))
}

// Slot grid endpoint
pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Path(empresa_id): Path<i64>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Availability>, AppError> {
    info!(
        "Received availability request for business {} on {}",
        empresa_id, query.fecha
    );

    let availability = state
        .booking
        .availability(empresa_id, query.fecha, state.now())
        .await?;
    Ok(Json(availability))
}

// Reserve endpoint: a lost race answers 409 with the refreshed grid
pub async fn reserve_turno(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ExtractJson(reserva): ExtractJson<ReservaRequest>,
) -> Result<Response, AppError> {
    let session = require_session(&state, &headers)?;
    info!(
        "Received reservation request from user {} for business {} on {} {}",
        session.user.id,
        reserva.empresa_id,
        reserva.fecha,
        reserva.hora.format("%H:%M")
    );

    let outcome = state
        .booking
        .select_slot(&session, &reserva, state.now())
        .await?;

    let status = match outcome {
        ReservationOutcome::Reserved { .. } => StatusCode::CREATED,
        ReservationOutcome::Occupied { .. } => StatusCode::OK,
        ReservationOutcome::Conflict { .. } => StatusCode::CONFLICT,
    };

    Ok((status, Json(outcome)).into_response())
}

pub async fn mis_turnos(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Turno>>, AppError> {
    let session = require_session(&state, &headers)?;
    Ok(Json(state.booking.my_bookings(&session).await?))
}

pub async fn cancel_turno(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(turno_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let session = require_session(&state, &headers)?;
    state.booking.cancel(&session, turno_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    ExtractJson(request): ExtractJson<LoginRequest>,
) -> Result<Json<LoginResult>, AppError> {
    let response = state.auth.login(&request).await?;
    let user = response.user.clone();
    let session_id = state.sessions.open(Session::from(response))?;

    info!("User {} logged in", user.id);
    Ok(Json(LoginResult { session_id, user }))
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    ExtractJson(request): ExtractJson<RegisterRequest>,
) -> Result<StatusCode, AppError> {
    state.auth.register(&request).await?;
    info!("Registered {}", request.email);
    Ok(StatusCode::CREATED)
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let id = session_id(&headers).ok_or(AuthError::MissingSession)?;
    if !state.sessions.close(id)? {
        return Err(AuthError::MissingSession.into());
    }
    Ok(StatusCode::NO_CONTENT)
}

// Admin CRUD endpoints
pub async fn create_empresa(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ExtractJson(form): ExtractJson<EmpresaForm>,
) -> Result<(StatusCode, Json<Empresa>), AppError> {
    let session = require_admin(&state, &headers)?;
    form.validate()?;

    let empresa = state.empresas.create(&session, &form).await?;
    info!("Business {} created by {}", empresa.id, session.user.id);
    Ok((StatusCode::CREATED, Json(empresa)))
}

pub async fn update_empresa(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    ExtractJson(form): ExtractJson<EmpresaForm>,
) -> Result<Json<Empresa>, AppError> {
    let session = require_admin(&state, &headers)?;
    form.validate()?;

    let empresa = state.empresas.update(&session, id, &form).await?;
    info!("Business {} updated by {}", id, session.user.id);
    Ok(Json(empresa))
}

pub async fn delete_empresa(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let session = require_admin(&state, &headers)?;
    state.empresas.delete(&session, id).await?;
    info!("Business {} deleted by {}", id, session.user.id);
    Ok(StatusCode::NO_CONTENT)
}
