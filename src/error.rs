use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{message}")]
    NotFound { message: String, ids: Vec<i64> },

    #[error("{0}")]
    Mismatch(String),

    #[error("{message}")]
    Conflict { message: String, ids: Vec<i64> },

    #[error("database error")]
    Database(sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound { message: message.into(), ids: Vec::new() }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        AppError::Conflict { message: message.into(), ids: Vec::new() }
    }

    /// Attaches the offending ids to a `NotFound` or `Conflict`.
    pub fn with_ids(self, ids: Vec<i64>) -> Self {
        match self {
            AppError::NotFound { message, .. } => AppError::NotFound { message, ids },
            AppError::Conflict { message, .. } => AppError::Conflict { message, ids },
            other => other,
        }
    }

    /// Fills in the ids of a `Conflict` raised without any, such as a
    /// serialization failure reported by the database.
    pub fn or_ids(self, ids: &[i64]) -> Self {
        match self {
            AppError::Conflict { message, ids: existing } if existing.is_empty() => {
                AppError::Conflict { message, ids: ids.to_vec() }
            }
            other => other,
        }
    }

    pub fn ids(&self) -> &[i64] {
        match self {
            AppError::NotFound { ids, .. } | AppError::Conflict { ids, .. } => ids,
            _ => &[],
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) | AppError::Mismatch(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound { .. } => "NOT_FOUND",
            AppError::Mismatch(_) => "MISMATCH",
            AppError::Conflict { .. } => "CONFLICT",
            AppError::Database(_) | AppError::Internal(_) => "INTERNAL",
        }
    }

    fn log(&self) {
        match self {
            AppError::Database(e) => tracing::error!(error = ?e, "database error"),
            AppError::Internal(msg) => tracing::error!(message = %msg, "internal error"),
            AppError::Conflict { message, ids } => {
                tracing::warn!(message = %message, ids = ?ids, "conflict")
            }
            other => tracing::debug!(code = other.code(), message = %other, "request rejected"),
        }
    }
}

// 40001/40P01 are lost races and surface as Conflict.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        let code = err
            .as_database_error()
            .and_then(|db| db.code())
            .map(|c| c.into_owned());

        match code.as_deref() {
            Some("40001") | Some("40P01") => {
                AppError::conflict("concurrent update detected, retry with a fresh read")
            }
            Some("23505") => AppError::conflict("record already exists"),
            Some("22003") => AppError::InvalidInput("numeric value out of range".to_string()),
            _ => AppError::Database(err),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(errors.to_string())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    details: Option<Value>,
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: ErrorBody,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();

        let status = self.status_code();
        let message = match &self {
            AppError::Database(_) | AppError::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        };
        let details = (!self.ids().is_empty()).then(|| json!({ "ids": self.ids() }));

        let body = ErrorResponse {
            success: false,
            error: ErrorBody { code: self.code(), message, details },
        };
        (status, Json(body)).into_response()
    }
}
