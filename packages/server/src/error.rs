use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;
use validator::ValidationErrors;

/// Structured error response returned by all endpoints on failure.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Always `false`.
    pub success: bool,
    /// Machine-readable error code. One of: `INVALID_ID`, `VALIDATION_ERROR`,
    /// `NOT_FOUND`, `RATE_LIMITED`, `CONFIGURATION_ERROR`, `UPSTREAM_ERROR`,
    /// `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error summary.
    #[schema(example = "Validation failed")]
    pub error: String,
    /// Itemized field-level failures.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[schema(example = json!(["Title must be at most 200 characters"]))]
    pub details: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    /// A path identifier is not a well-formed UUID.
    InvalidId,
    Validation(String),
    /// Every field-level failure of one request.
    InvalidFields(Vec<String>),
    NotFound(String),
    /// Rate limit exceeded. Contains seconds until retry is allowed.
    RateLimited {
        retry_after: u64,
    },
    /// A required setting (credential, connection string) is missing.
    Configuration(String),
    /// A third-party service rejected or failed the request.
    Upstream(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::InvalidId => (
                StatusCode::BAD_REQUEST,
                body("INVALID_ID", "Invalid portfolio ID"),
            ),
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    details: vec![msg],
                    ..body("VALIDATION_ERROR", "Validation failed")
                },
            ),
            AppError::InvalidFields(details) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    details,
                    ..body("VALIDATION_ERROR", "Validation failed")
                },
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, body("NOT_FOUND", msg)),
            AppError::RateLimited { retry_after } => (
                StatusCode::TOO_MANY_REQUESTS,
                ErrorBody {
                    message: Some(format!(
                        "Rate limit exceeded. Try again in {retry_after} seconds"
                    )),
                    ..body("RATE_LIMITED", "Too many requests")
                },
            ),
            AppError::Configuration(detail) => {
                tracing::error!("Configuration error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        message: debug_detail(detail),
                        ..body("CONFIGURATION_ERROR", "Service is not configured")
                    },
                )
            }
            AppError::Upstream(detail) => {
                tracing::error!("Upstream error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        message: debug_detail(detail),
                        ..body("UPSTREAM_ERROR", "Failed to send email")
                    },
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        message: debug_detail(detail),
                        ..body("INTERNAL_ERROR", "An unexpected error occurred")
                    },
                )
            }
        }
    }
}

fn body(code: &'static str, error: impl Into<String>) -> ErrorBody {
    ErrorBody {
        success: false,
        code,
        error: error.into(),
        details: Vec::new(),
        message: None,
    }
}

/// Internal detail is only echoed to clients by debug builds.
fn debug_detail(detail: String) -> Option<String> {
    cfg!(debug_assertions).then_some(detail)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let retry_after = if let AppError::RateLimited { retry_after } = &self {
            Some(*retry_after)
        } else {
            None
        };

        let (status, body) = self.status_and_body();

        if let Some(seconds) = retry_after {
            (status, [("Retry-After", seconds.to_string())], Json(body)).into_response()
        } else {
            (status, Json(body)).into_response()
        }
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) => AppError::NotFound("Image not found".into()),
            StorageError::SizeLimitExceeded { limit, .. } => {
                AppError::Validation(format!("Image must be at most {limit} bytes"))
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::InvalidFields(validation_messages(&errors))
    }
}

/// Flatten field errors into messages, ordered by field name.
pub fn validation_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut fields: Vec<_> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| (field.to_string(), errs))
        .collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter()
                .map(move |e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("{field} is invalid"),
                })
                .collect::<Vec<_>>()
        })
        .collect()
}
