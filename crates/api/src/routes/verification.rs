//! Verification code endpoints
//!
//! Unauthenticated by design: codes are requested during signup, before a
//! session exists. Issuance replaces any live code for the address.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendCodeRequest {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyCodeRequest {
    pub email: String,
    pub code: String,
}

/// `POST /api/auth/send-code`
pub async fn send_code(
    State(state): State<AppState>,
    Json(req): Json<SendCodeRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    state
        .fund
        .verification
        .issue(&req.email, req.name.as_deref())
        .await?;
    Ok(Json(
        json!({"success": true, "message": "Verification code sent"}),
    ))
}

/// `POST /api/auth/verify-code`
pub async fn verify_code(
    State(state): State<AppState>,
    Json(req): Json<VerifyCodeRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    state.fund.verification.consume(&req.email, &req.code).await?;
    Ok(Json(
        json!({"success": true, "message": "Email verified successfully"}),
    ))
}
