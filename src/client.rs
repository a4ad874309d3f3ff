use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::errors::{ApiError, ApiResult, AuthError};
use crate::models::auth::{LoginRequest, LoginResponse, RegisterRequest};
use crate::models::empresa::{Categoria, Empresa, EmpresaForm};
use crate::models::schedule::WeeklySchedule;
use crate::models::turno::{Ocupado, ReservaRequest, Turno};
use crate::services::time_slots::OccupiedSet;
use crate::session::Session;

/// Business records: catalog browsing plus the admin CRUD operations.
#[async_trait]
pub trait EmpresaRepository: Send + Sync {
    async fn list_categorias(&self) -> ApiResult<Vec<Categoria>>;

    async fn list_by_categoria(&self, categoria_id: i64) -> ApiResult<Vec<Empresa>>;

    async fn list(&self) -> ApiResult<Vec<Empresa>>;

    async fn get(&self, id: i64) -> ApiResult<Empresa>;

    async fn create(&self, session: &Session, form: &EmpresaForm) -> ApiResult<Empresa>;

    async fn update(&self, session: &Session, id: i64, form: &EmpresaForm) -> ApiResult<Empresa>;

    async fn delete(&self, session: &Session, id: i64) -> ApiResult<()>;
}

/// Opening hours and bookings.
#[async_trait]
pub trait TurnosRepository: Send + Sync {
    async fn weekly_schedule(&self, empresa_id: i64) -> ApiResult<WeeklySchedule>;

    async fn occupied(&self, empresa_id: i64, fecha: NaiveDate) -> ApiResult<OccupiedSet>;

    async fn reserve(&self, session: &Session, request: &ReservaRequest) -> ApiResult<()>;

    async fn my_bookings(&self, session: &Session) -> ApiResult<Vec<Turno>>;

    async fn cancel(&self, session: &Session, turno_id: i64) -> ApiResult<()>;
}

/// Credential exchange.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> ApiResult<LoginResponse>;

    async fn register(&self, request: &RegisterRequest) -> ApiResult<()>;
}

/// Everything the service needs from the booking backend.
pub trait TurnosBackend: EmpresaRepository + TurnosRepository + AuthGateway {}

impl<T: EmpresaRepository + TurnosRepository + AuthGateway> TurnosBackend for T {}

/// Client for the turnos REST backend
pub struct TurnosClient {
    client: Client,
    base_url: String,
}

impl TurnosClient {
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &AppConfig) -> ApiResult<Self> {
        Self::new(&config.api_base_url, config.api_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = self.send(request).await?;
        Ok(response.json::<T>().await?)
    }

    async fn send(&self, request: RequestBuilder) -> ApiResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        debug!("Response received with status: {}", status);

        if status.is_success() {
            Ok(response)
        } else {
            Err(error_for_status(response).await)
        }
    }
}

fn authorized(request: RequestBuilder, session: &Session) -> RequestBuilder {
    request.bearer_auth(&session.token)
}

// Backend errors come as {"message": ...} or {"error": ...}
fn extract_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => value
            .get("message")
            .or_else(|| value.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string),
        Err(_) => Some(trimmed.to_string()),
    }
}

async fn error_for_status(response: Response) -> ApiError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = extract_message(&body)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());

    warn!("Backend answered {}: {}", status, message);

    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ApiError::Validation(message),
        StatusCode::UNAUTHORIZED => ApiError::Auth(AuthError::Rejected(message)),
        StatusCode::FORBIDDEN => ApiError::Auth(AuthError::InsufficientRole),
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        StatusCode::CONFLICT => ApiError::Conflict(message),
        _ => ApiError::Server {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl EmpresaRepository for TurnosClient {
    async fn list_categorias(&self) -> ApiResult<Vec<Categoria>> {
        info!("Fetching categories");
        self.send_json(self.client.get(self.url("/categorias"))).await
    }

    async fn list_by_categoria(&self, categoria_id: i64) -> ApiResult<Vec<Empresa>> {
        info!("Fetching businesses of category {}", categoria_id);
        let url = self.url(&format!("/empresas/categoria/{}", categoria_id));
        self.send_json(self.client.get(url)).await
    }

    async fn list(&self) -> ApiResult<Vec<Empresa>> {
        info!("Fetching businesses");
        self.send_json(self.client.get(self.url("/empresas"))).await
    }

    async fn get(&self, id: i64) -> ApiResult<Empresa> {
        info!("Fetching business {}", id);
        self.send_json(self.client.get(self.url(&format!("/empresas/{}", id))))
            .await
    }

    async fn create(&self, session: &Session, form: &EmpresaForm) -> ApiResult<Empresa> {
        info!("Creating business '{}'", form.nombre);
        let request = authorized(self.client.post(self.url("/empresas")), session).json(form);
        self.send_json(request).await
    }

    async fn update(&self, session: &Session, id: i64, form: &EmpresaForm) -> ApiResult<Empresa> {
        info!("Updating business {}", id);
        let request = authorized(
            self.client.put(self.url(&format!("/empresas/{}", id))),
            session,
        )
        .json(form);
        self.send_json(request).await
    }

    async fn delete(&self, session: &Session, id: i64) -> ApiResult<()> {
        info!("Deleting business {}", id);
        let request = authorized(
            self.client.delete(self.url(&format!("/empresas/{}", id))),
            session,
        );
        self.send(request).await?;
        Ok(())
    }
}

#[async_trait]
impl TurnosRepository for TurnosClient {
    async fn weekly_schedule(&self, empresa_id: i64) -> ApiResult<WeeklySchedule> {
        info!("Fetching opening hours of business {}", empresa_id);
        let url = self.url(&format!("/empresas/horarios/{}", empresa_id));
        self.send_json(self.client.get(url)).await
    }

    async fn occupied(&self, empresa_id: i64, fecha: NaiveDate) -> ApiResult<OccupiedSet> {
        info!(
            "Fetching occupied slots of business {} on {}",
            empresa_id, fecha
        );
        let request = self.client.get(self.url("/turnos/ocupados")).query(&[
            ("empresa_id", empresa_id.to_string()),
            ("fecha", fecha.to_string()),
        ]);
        let rows: Vec<Ocupado> = self.send_json(request).await?;
        Ok(OccupiedSet::from(rows))
    }

    async fn reserve(&self, session: &Session, request: &ReservaRequest) -> ApiResult<()> {
        info!(
            "Reserving {} {} at business {}",
            request.fecha, request.hora, request.empresa_id
        );
        let builder =
            authorized(self.client.post(self.url("/turnos/reservar")), session).json(request);
        self.send(builder).await?;
        Ok(())
    }

    async fn my_bookings(&self, session: &Session) -> ApiResult<Vec<Turno>> {
        info!("Fetching bookings of user {}", session.user.id);
        let request = authorized(self.client.get(self.url("/turnos/mis-turnos")), session);
        self.send_json(request).await
    }

    async fn cancel(&self, session: &Session, turno_id: i64) -> ApiResult<()> {
        info!("Cancelling booking {}", turno_id);
        let request = authorized(
            self.client
                .delete(self.url(&format!("/turnos/cancelar/{}", turno_id))),
            session,
        );
        self.send(request).await?;
        Ok(())
    }
}

#[async_trait]
impl AuthGateway for TurnosClient {
    async fn login(&self, request: &LoginRequest) -> ApiResult<LoginResponse> {
        info!("Logging in {}", request.email);
        self.send_json(self.client.post(self.url("/auth/login")).json(request))
            .await
    }

    async fn register(&self, request: &RegisterRequest) -> ApiResult<()> {
        info!("Registering {}", request.email);
        self.send(self.client.post(self.url("/auth/register")).json(request))
            .await?;
        Ok(())
    }
}
