use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use outing_promo::CouponError;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    ValidationError(String),
    /// Coupon eligibility failure with a rider-facing message
    Rejected(String),
    NotFoundError(String),
    ConflictError(String),
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Rejected(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Rider-facing eligibility failures become 422; store trouble stays opaque.
impl From<CouponError> for AppError {
    fn from(err: CouponError) -> Self {
        match err {
            CouponError::DuplicateCode(_) => AppError::ConflictError(err.to_string()),
            CouponError::InvalidDefinition(_) => AppError::ValidationError(err.to_string()),
            CouponError::Store(e) => AppError::InternalServerError(e.to_string()),
            other => AppError::Rejected(other.to_string()),
        }
    }
}
