use axum::http::Uri;

use crate::error::AppError;

/// Answers every unmatched route with a 404 error envelope.
pub async fn fallback_handler(uri: Uri) -> AppError {
    AppError::not_found(format!("Can't find {} on this server", uri.path()))
}
