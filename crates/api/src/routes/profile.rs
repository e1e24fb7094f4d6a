//! Member profile endpoints
//!
//! All operate on the caller's own profile; there is no path to read or
//! mutate another member's row.

use axum::extract::State;
use axum::{Extension, Json};
use finalcommit_fund::{Profile, ProfileUpdate};
use serde_json::json;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

/// `GET /api/profile` - fetch the caller's profile, creating it on first
/// authenticated contact.
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<Profile>> {
    let profile = state
        .fund
        .profiles
        .ensure_profile(user.user_id, user.email.as_deref(), None)
        .await?;
    Ok(Json(profile))
}

/// `PATCH /api/profile` - owner-only partial update.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<Json<Profile>> {
    let profile = state.fund.profiles.update(user.user_id, &update).await?;
    Ok(Json(profile))
}

/// `POST /api/profile/complete-onboarding`
pub async fn complete_onboarding(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<serde_json::Value>> {
    state.fund.profiles.complete_onboarding(user.user_id).await?;
    Ok(Json(json!({"success": true})))
}
