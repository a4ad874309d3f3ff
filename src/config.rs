//! Service configuration read from the environment.
//!
//! - `TURNOS_API_BASE_URL`: root of the booking backend (default: `http://localhost:3001/api`)
//! - `TURNOS_API_TIMEOUT_SECS`: per-request timeout towards the backend (default: 10)
//! - `TURNOS_LISTEN_ADDR`: address the service binds to (default: `0.0.0.0:3000`)
//! - `TURNOS_HOLIDAYS_CSV`: optional `fecha,nombre` CSV replacing the built-in holidays
//! - `TURNOS_SESSION_FILE`: optional JSON file that keeps sessions across restarts
//! - `TURNOS_ADMIN_ENABLED`: mount the admin CRUD routes (default: true)
//! - `ENVIRONMENT`: `production` or anything else

use std::collections::HashMap;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api_base_url: String,
    pub api_timeout: Duration,
    pub listen_addr: SocketAddr,
    pub holidays_csv: Option<PathBuf>,
    pub session_file: Option<PathBuf>,
    pub admin_enabled: bool,
    pub is_production: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_vars(&env::vars().collect())
    }

    /// Build the configuration from an explicit variable map.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str| vars.get(name).map(|v| v.trim()).filter(|v| !v.is_empty());

        let api_base_url = get("TURNOS_API_BASE_URL")
            .unwrap_or("http://localhost:3001/api")
            .to_string();

        let api_timeout = match get("TURNOS_API_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or_else(|| ConfigError::Invalid {
                    name: "TURNOS_API_TIMEOUT_SECS",
                    value: raw.to_string(),
                })?,
            None => Duration::from_secs(10),
        };

        let listen_raw = get("TURNOS_LISTEN_ADDR").unwrap_or("0.0.0.0:3000");
        let listen_addr = listen_raw
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::Invalid {
                name: "TURNOS_LISTEN_ADDR",
                value: listen_raw.to_string(),
            })?;

        let admin_enabled = match get("TURNOS_ADMIN_ENABLED") {
            Some(raw) => parse_flag(raw).ok_or_else(|| ConfigError::Invalid {
                name: "TURNOS_ADMIN_ENABLED",
                value: raw.to_string(),
            })?,
            None => true,
        };

        let is_production = get("ENVIRONMENT")
            .map(|val| val.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        Ok(Self {
            api_base_url,
            api_timeout,
            listen_addr,
            holidays_csv: get("TURNOS_HOLIDAYS_CSV").map(PathBuf::from),
            session_file: get("TURNOS_SESSION_FILE").map(PathBuf::from),
            admin_enabled,
            is_production,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
