use axum::{
    extract::rejection::{PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Application-specific error types.
#[derive(Debug)]
pub enum AppError {
    /// Requested entity does not exist.
    NotFound(String),
    /// Bad request error (missing or invalid identifier).
    BadRequest(String),
    /// Storage unreachable or failing its ping.
    UpstreamUnavailable(String),
    /// Database-related errors.
    DatabaseError(sqlx::Error),
    /// The request deadline elapsed before the read finished.
    DeadlineExceeded(Duration),
    /// Error with a stable, caller-facing message attached.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

/// JSON error envelope returned for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::UpstreamUnavailable(msg) => write!(f, "Upstream unavailable: {}", msg),
            AppError::DatabaseError(e) => write!(f, "Database error: {}", e),
            AppError::DeadlineExceeded(budget) => {
                write!(f, "deadline of {}ms exceeded", budget.as_millis())
            }
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// HTTP status this error maps to. Context wrappers inherit the status of their source.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::DatabaseError(_) | AppError::DeadlineExceeded(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::WithContext { source, .. } => source.status(),
        }
    }

    /// Builds the `{error, details}` envelope.
    ///
    /// Client errors carry their message as `error` and no details. Server faults carry a stable
    /// message as `error` and the underlying failure text as `details`.
    pub fn body(&self) -> ErrorBody {
        match self {
            AppError::NotFound(msg) | AppError::BadRequest(msg) => ErrorBody {
                error: msg.clone(),
                details: None,
            },
            AppError::UpstreamUnavailable(msg) => ErrorBody {
                error: "database unavailable".to_string(),
                details: Some(msg.clone()),
            },
            AppError::DatabaseError(e) => ErrorBody {
                error: "database error".to_string(),
                details: Some(e.to_string()),
            },
            AppError::DeadlineExceeded(_) => ErrorBody {
                error: "deadline exceeded".to_string(),
                details: Some(self.to_string()),
            },
            AppError::WithContext { source, context } => {
                let inner = source.body();
                match source.status() {
                    StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => inner,
                    _ => ErrorBody {
                        error: context.clone(),
                        details: inner.details.or(Some(inner.error)),
                    },
                }
            }
        }
    }
}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// Server-side faults are logged before the envelope is written.
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "{}", self);
        } else {
            tracing::debug!(status = status.as_u16(), "{}", self);
        }

        (status, Json(self.body())).into_response()
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(format!("invalid path: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(format!("invalid query string: {}", rejection.body_text()))
    }
}

impl From<sqlx::Error> for AppError {
    /// Converts a `sqlx::Error` into an `AppError`.
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err)
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    ///
    /// # Arguments
    ///
    /// * `context` - The context message to add.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }
}

/// Extension for sqlx::Error to add context
impl<T> ResultExt<T> for Result<T, sqlx::Error> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::DatabaseError(e)),
            context: context.into(),
        })
    }
}
