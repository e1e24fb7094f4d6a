//! API error responses
//!
//! Maps the domain error taxonomy onto HTTP: validation failures carry
//! their specific message, authorization failures are generic on purpose
//! (never revealing which check failed), not-found is distinct from
//! validation, and upstream/internal detail stays in the server logs.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use finalcommit_fund::FundError;
use serde_json::json;

pub type ApiResult<T> = Result<T, ApiError>;

/// Wrapper giving `FundError` an HTTP rendering.
#[derive(Debug)]
pub struct ApiError(pub FundError);

impl From<FundError> for ApiError {
    fn from(err: FundError) -> Self {
        Self(err)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        Self(FundError::Database(err))
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            FundError::Validation(_) => StatusCode::BAD_REQUEST,
            FundError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            FundError::Unauthorized | FundError::WebhookSignatureInvalid => {
                StatusCode::UNAUTHORIZED
            }
            FundError::Forbidden => StatusCode::FORBIDDEN,
            FundError::NotFound(_) => StatusCode::NOT_FOUND,
            FundError::Gateway(_) | FundError::Email(_) | FundError::AuthService(_) => {
                StatusCode::BAD_GATEWAY
            }
            FundError::Database(_) | FundError::Internal(_) | FundError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The message the client sees. Authorization failures collapse to a
    /// single generic string; server-side failures never leak detail.
    fn client_message(&self) -> String {
        match &self.0 {
            FundError::Validation(msg) => msg.clone(),
            FundError::RateLimited => self.0.to_string(),
            FundError::Unauthorized | FundError::WebhookSignatureInvalid => {
                "Unauthorized".to_string()
            }
            FundError::Forbidden => "Forbidden".to_string(),
            FundError::NotFound(what) => format!("{what} not found"),
            // The gateway's rejection message is already user-facing
            // ("Insufficient funds"); transport detail was genericized
            // by the client before it got here.
            FundError::Gateway(msg) => msg.clone(),
            FundError::Email(_) => "Failed to send email".to_string(),
            FundError::AuthService(_) => "Account service request failed".to_string(),
            FundError::Database(_) | FundError::Internal(_) | FundError::Config(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() || status == StatusCode::BAD_GATEWAY {
            tracing::error!(error = %self.0, status = %status, "Request failed");
        } else if matches!(
            self.0,
            FundError::Unauthorized | FundError::WebhookSignatureInvalid | FundError::Forbidden
        ) {
            tracing::warn!(error = %self.0, "Request denied");
        }

        (
            status,
            Json(json!({
                "success": false,
                "error": self.client_message(),
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases: Vec<(FundError, StatusCode)> = vec![
            (
                FundError::validation("bad amount"),
                StatusCode::BAD_REQUEST,
            ),
            (FundError::RateLimited, StatusCode::TOO_MANY_REQUESTS),
            (FundError::Unauthorized, StatusCode::UNAUTHORIZED),
            (
                FundError::WebhookSignatureInvalid,
                StatusCode::UNAUTHORIZED,
            ),
            (FundError::Forbidden, StatusCode::FORBIDDEN),
            (
                FundError::NotFound("contribution".to_string()),
                StatusCode::NOT_FOUND,
            ),
            (
                FundError::Gateway("declined".to_string()),
                StatusCode::BAD_GATEWAY,
            ),
            (
                FundError::Internal("boom".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError(err).status_code(), expected);
        }
    }

    #[test]
    fn test_authorization_failures_are_generic() {
        // Signature mismatch and missing session read identically.
        let sig = ApiError(FundError::WebhookSignatureInvalid).client_message();
        let auth = ApiError(FundError::Unauthorized).client_message();
        assert_eq!(sig, auth);
        assert_eq!(sig, "Unauthorized");
    }

    #[test]
    fn test_internal_detail_never_reaches_client() {
        let msg =
            ApiError(FundError::Internal("db password rejected".to_string())).client_message();
        assert!(!msg.contains("password"));
    }

    #[test]
    fn test_validation_message_is_specific() {
        let msg = ApiError(FundError::validation("Amount must be between 1 and 50000 KES"))
            .client_message();
        assert!(msg.contains("50000"));
    }
}
