//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// API error type.
///
/// Each variant is a distinct error kind so callers branch on kind, never on
/// message content. `Already*` reward outcomes are not errors and do not
/// appear here; they are reported as distinct success responses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Bad request - validation failure before any charge.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Uploaded file exceeds the size cap. No balance effect.
    #[error("upload too large: limit is {limit} bytes")]
    PayloadTooLarge {
        /// The configured upload cap.
        limit: usize,
    },

    /// Uploaded file has a content type outside the allow-list.
    #[error("unsupported content type: {0}")]
    UnsupportedMediaType(String),

    /// Insufficient credits. No balance effect, no log entry.
    #[error("insufficient credits: balance={balance}, required={required}")]
    InsufficientCredits {
        /// Current balance.
        balance: i64,
        /// Required amount.
        required: i64,
    },

    /// Webhook signature verification failed. Fail closed.
    #[error("invalid webhook signature")]
    InvalidSignature,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Payment system not configured.
    #[error("payments unavailable")]
    PaymentsUnavailable,

    /// The search failed after a successful charge. The message tells the
    /// caller whether the charge was refunded; internal stage detail is not
    /// leaked.
    #[error("search failed")]
    SearchFailed {
        /// Whether the compensating refund was applied.
        refunded: bool,
    },

    /// External service error.
    #[error("external service error: {0}")]
    ExternalService(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                self.to_string(),
                None,
            ),
            Self::InvalidInput(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_input", msg.clone(), None)
            }
            Self::PayloadTooLarge { .. } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "payload_too_large",
                self.to_string(),
                None,
            ),
            Self::UnsupportedMediaType(_) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "unsupported_media_type",
                self.to_string(),
                None,
            ),
            Self::InsufficientCredits { balance, required } => (
                StatusCode::PAYMENT_REQUIRED,
                "insufficient_credits",
                "Not enough credits, please top up".to_string(),
                Some(serde_json::json!({
                    "balance": balance,
                    "required": required
                })),
            ),
            Self::InvalidSignature => (
                StatusCode::BAD_REQUEST,
                "invalid_signature",
                self.to_string(),
                None,
            ),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::PaymentsUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "payments_unavailable",
                "Payment system is not configured".to_string(),
                None,
            ),
            Self::SearchFailed { refunded } => {
                let message = if *refunded {
                    "Search failed, your credit was refunded. Please try again.".to_string()
                } else {
                    "Search failed and the refund could not be applied. \
                     Please contact support."
                        .to_string()
                };
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "search_failed",
                    message,
                    Some(serde_json::json!({ "refunded": refunded })),
                )
            }
            Self::ExternalService(msg) => (
                StatusCode::BAD_GATEWAY,
                "external_service_error",
                msg.clone(),
                None,
            ),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<imglens_store::StoreError> for ApiError {
    fn from(err: imglens_store::StoreError) -> Self {
        match err {
            imglens_store::StoreError::NotFound => Self::NotFound("account not found".into()),
            imglens_store::StoreError::InsufficientCredits { balance, required } => {
                Self::InsufficientCredits { balance, required }
            }
            imglens_store::StoreError::Database(msg)
            | imglens_store::StoreError::Serialization(msg) => Self::Internal(msg),
        }
    }
}
