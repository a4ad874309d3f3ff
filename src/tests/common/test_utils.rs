use axum::http::{header::AUTHORIZATION, HeaderName, HeaderValue};
use axum_test::{TestServer, TestServerConfig};
use chrono::NaiveDateTime;
use std::sync::Arc;

use crate::client_mock::{setup_mock_backend, MockDataStore, MockTurnosBackend};
use crate::handlers::api::AppState;
use crate::routes::create_router;
use crate::services::holidays::HolidaySet;
use crate::session::{Session, SessionStore};

pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub store: Arc<MockDataStore>,
}

/// Test server over the in-memory mock backend
pub fn create_test_app(clock: fn() -> NaiveDateTime, admin_enabled: bool) -> TestApp {
    let (mock, store) = setup_mock_backend();
    let (server, state) = create_test_server(mock, clock, admin_enabled);
    TestApp {
        server,
        state,
        store,
    }
}

/// Test server over a mock with custom expectations
pub fn create_test_server(
    mock: MockTurnosBackend,
    clock: fn() -> NaiveDateTime,
    admin_enabled: bool,
) -> (TestServer, Arc<AppState>) {
    let state = Arc::new(
        AppState::new(
            Arc::new(mock),
            HolidaySet::default(),
            SessionStore::in_memory(),
        )
        .with_clock(clock),
    );

    let router = create_router(Arc::clone(&state), admin_enabled);
    let config = TestServerConfig::builder().mock_transport().build();
    let server = TestServer::new_with_config(router, config).unwrap();

    (server, state)
}

pub fn open_session(state: &AppState, session: Session) -> String {
    state.sessions.open(session).unwrap()
}

pub fn bearer(session_id: &str) -> (HeaderName, HeaderValue) {
    (
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", session_id)).unwrap(),
    )
}
