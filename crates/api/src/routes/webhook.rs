//! Payment gateway webhook endpoint

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use finalcommit_fund::{FundError, SIGNATURE_HEADER};
use serde_json::json;

use crate::error::ApiError;
use crate::state::AppState;

/// `POST /api/webhooks/paystack`
///
/// The raw body is verified against the signature header before any
/// parsing. Every handled or ignored delivery gets a JSON acknowledgement
/// so the gateway stops retrying; only signature failures and unmatched
/// references are error statuses.
pub async fn paystack_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(signature) = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
    else {
        return ApiError::from(FundError::WebhookSignatureInvalid).into_response();
    };

    match state.fund.webhooks.reconcile(&body, signature).await {
        Ok(ack) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": ack.message(),
            })),
        )
            .into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}
