//! Account deletion

use axum::extract::State;
use axum::{Extension, Json};
use serde_json::json;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

/// `DELETE /api/account`
///
/// Deletes the caller's contributions, profile, and backing auth
/// identity. Irreversible; scoped to the bearer of the credential.
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<serde_json::Value>> {
    state.fund.profiles.delete_account(user.user_id).await?;
    Ok(Json(json!({"success": true})))
}
