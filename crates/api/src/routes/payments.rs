//! Payment initiation endpoint

use axum::extract::State;
use axum::{Extension, Json};
use finalcommit_fund::{FundError, InitiateRequest, MemberIdentity};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct InitiatePaymentRequest {
    pub amount: i64,
    pub phone_number: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InitiatePaymentResponse {
    pub success: bool,
    pub message: String,
    pub contribution_id: Uuid,
    pub reference: String,
}

/// `POST /api/payments/initiate`
///
/// Identity comes from the verified session, never the body. Onboarding
/// must be complete before the payment path unlocks.
pub async fn initiate_payment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<InitiatePaymentRequest>,
) -> ApiResult<Json<InitiatePaymentResponse>> {
    let profile = state
        .fund
        .profiles
        .ensure_profile(user.user_id, user.email.as_deref(), None)
        .await?;
    if !profile.onboarding_completed {
        return Err(FundError::validation(
            "Please complete onboarding before contributing",
        )
        .into());
    }

    let member = MemberIdentity {
        user_id: user.user_id,
        email: user.email.clone(),
    };
    let outcome = state
        .fund
        .initiator
        .initiate(
            &member,
            &InitiateRequest {
                amount: req.amount,
                phone_number: req.phone_number,
                email: req.email,
            },
        )
        .await?;

    Ok(Json(InitiatePaymentResponse {
        success: true,
        message: outcome.message,
        contribution_id: outcome.contribution_id,
        reference: outcome.reference,
    }))
}
