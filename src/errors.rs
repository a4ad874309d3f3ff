use thiserror::Error;

/// Failures while reading a business's weekly opening hours.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("malformed time range: {0}")]
    Format(String),

    #[error("time range {0} does not start before it ends")]
    EmptyRange(String),
}

/// Authentication and authorization failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("no active session")]
    MissingSession,

    #[error("session expired")]
    Expired,

    #[error("credentials rejected: {0}")]
    Rejected(String),

    #[error("insufficient role")]
    InsufficientRole,
}

/// Every failure a backend call or a booking operation can report.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("slot no longer available: {0}")]
    Conflict(String),

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("backend error {status}: {message}")]
    Server { status: u16, message: String },
}

impl From<ScheduleError> for ApiError {
    fn from(err: ScheduleError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

/// Failures reading or writing the persisted session file.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("session file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;
