//! Treasurer reminder generation

use axum::extract::State;
use axum::{Extension, Json};
use finalcommit_fund::{FundError, ReminderBatch, TargetGroup};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RemindersRequest {
    /// One of all, not_started, in_progress, incomplete, completed.
    #[serde(default = "default_target_group")]
    pub target_group: String,
}

fn default_target_group() -> String {
    "all".to_string()
}

/// `POST /api/reminders` - treasurer only.
pub async fn generate_reminders(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<RemindersRequest>,
) -> ApiResult<Json<ReminderBatch>> {
    if !state.fund.profiles.is_treasurer(user.user_id).await? {
        return Err(FundError::Forbidden.into());
    }

    let group = TargetGroup::parse(&req.target_group)?;
    Ok(Json(state.fund.reminders.generate(group).await?))
}
