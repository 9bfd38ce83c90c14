//! Application error type and its HTTP mapping.
//!
//! Every handler returns `Result<_, AppError>`. Errors render as
//!
//! ```json
//! { "status": "fail", "message": "No tour found with that ID" }
//! ```
//!
//! `status` is `"fail"` for 4xx and `"error"` for 5xx. Internal failures never
//! leak their message to clients; the detail is logged instead.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use validator::{ValidationErrors, ValidationErrorsKind};

/// Client-facing message for internal failures.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed input, failed field validation or a unique-key collision.
    #[error("{message}")]
    Validation { message: String, details: Value },

    #[error("{message}")]
    NotFound { message: String },

    /// Missing or unusable credentials.
    #[error("{message}")]
    Unauthorized { message: String },

    /// Valid request the caller may not perform, including rejected session tokens.
    #[error("{message}")]
    Forbidden { message: String },

    #[error("Token is invalid or has expired")]
    TokenInvalidOrExpired,

    /// An outbound dependency (the mail relay) failed.
    #[error("{message}")]
    UpstreamDelivery { message: String },

    #[error("{message}")]
    Internal { message: String },
}

#[derive(Serialize)]
struct ErrorBody {
    status: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Value::is_null")]
    errors: Value,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn upstream_delivery(message: impl Into<String>) -> Self {
        Self::UpstreamDelivery {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Unique-key collision on insert or update.
    pub fn duplicate(fields: &[&str]) -> Self {
        Self::Validation {
            message: format!(
                "Duplicate value for {}. Please use another value",
                fields.join(", ")
            ),
            details: json!({ "fields": fields }),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::TokenInvalidOrExpired => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::UpstreamDelivery { .. } | AppError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// `true` for errors caused by the client rather than by the service.
    pub fn is_operational(&self) -> bool {
        !matches!(self, AppError::Internal { .. })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }

        let message = if self.is_operational() {
            self.to_string()
        } else {
            GENERIC_ERROR_MESSAGE.to_string()
        };

        let errors = match self {
            AppError::Validation { details, .. } => details,
            _ => Value::Null,
        };

        let body = ErrorBody {
            status: if status.is_client_error() {
                "fail"
            } else {
                "error"
            },
            message,
            errors,
        };

        (status, Json(body)).into_response()
    }
}

/// Collects messages from field, nested struct and list errors.
fn collect_messages(errors: &ValidationErrors, prefix: &str, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };

        match kind {
            ValidationErrorsKind::Field(errs) => {
                out.extend(errs.iter().map(|e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("Invalid value for {path}"),
                }));
            }
            ValidationErrorsKind::Struct(inner) => collect_messages(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_messages(inner, &format!("{path}.{index}"), out);
                }
            }
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages = Vec::new();
        collect_messages(&errors, "", &mut messages);
        messages.sort();
        messages.dedup();

        let message = if messages.is_empty() {
            "Invalid input data".to_string()
        } else {
            format!("Invalid input data. {}", messages.join(". "))
        };

        let details = serde_json::to_value(&errors).unwrap_or(Value::Null);
        AppError::bad_request(message, details)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db) = e.as_database_error()
            && db.is_unique_violation()
        {
            return AppError::bad_request(
                "Duplicate value. Please use another value",
                json!({ "constraint": db.constraint() }),
            );
        }

        AppError::internal(format!("Database error: {e}"))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::internal(format!("Document serialization error: {e}"))
    }
}
