use base64::engine::{general_purpose, Engine};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, info, warn};

use crate::errors::{AuthError, SessionError};
use crate::models::auth::{LoginResponse, Usuario};

/// Backend token plus the profile of the user it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: Usuario,
}

#[derive(Deserialize)]
struct Claims {
    exp: Option<i64>,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.user
            .rol
            .as_deref()
            .map(|rol| rol.eq_ignore_ascii_case("admin"))
            .unwrap_or(false)
    }

    /// Expiry read from the `exp` claim when the token is a JWT.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let payload = self.token.split('.').nth(1)?;
        let bytes = general_purpose::URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .ok()?;
        let claims: Claims = serde_json::from_slice(&bytes).ok()?;
        Utc.timestamp_opt(claims.exp?, 0).single()
    }

    /// Opaque tokens never expire on this side.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().map(|exp| exp <= now).unwrap_or(false)
    }
}

impl From<LoginResponse> for Session {
    fn from(response: LoginResponse) -> Self {
        Session {
            token: response.token,
            user: response.user,
        }
    }
}

/// Generate a random opaque session id
pub fn generate_session_id() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}

/// Sessions opened through this service, keyed by session id.
///
/// Opened on login, closed on logout, and read back from disk at startup
/// when a session file is configured.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    path: Option<PathBuf>,
}

impl SessionStore {
    pub fn in_memory() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            path: None,
        }
    }

    /// Read the session file, starting empty when it does not exist yet.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SessionError> {
        let path = path.as_ref().to_path_buf();

        let sessions = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                HashMap::new()
            } else {
                serde_json::from_str(&raw)?
            }
        } else {
            HashMap::new()
        };

        info!(
            "Loaded {} sessions from {}",
            sessions.len(),
            path.display()
        );

        Ok(Self {
            sessions: RwLock::new(sessions),
            path: Some(path),
        })
    }

    pub fn open(&self, session: Session) -> Result<String, SessionError> {
        let id = generate_session_id();
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());

        debug!("Opening session for user {}", session.user.id);
        sessions.insert(id.clone(), session);
        self.persist(&sessions)?;

        Ok(id)
    }

    pub fn get(&self, id: &str, now: DateTime<Utc>) -> Result<Session, AuthError> {
        let session = {
            let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
            sessions.get(id).cloned().ok_or(AuthError::MissingSession)?
        };

        if session.is_expired(now) {
            info!("Session for user {} expired", session.user.id);
            if let Err(err) = self.close(id) {
                warn!("Failed to drop expired session: {}", err);
            }
            return Err(AuthError::Expired);
        }

        Ok(session)
    }

    /// Returns whether a session was actually removed.
    pub fn close(&self, id: &str) -> Result<bool, SessionError> {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        let removed = sessions.remove(id).is_some();
        if removed {
            self.persist(&sessions)?;
        }
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn persist(&self, sessions: &HashMap<String, Session>) -> Result<(), SessionError> {
        if let Some(path) = &self.path {
            fs::write(path, serde_json::to_string(sessions)?)?;
        }
        Ok(())
    }
}
