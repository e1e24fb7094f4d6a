//! Group progress projections

use axum::extract::State;
use axum::{Extension, Json};
use finalcommit_fund::{FundError, GroupStats, PublicStats};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

/// `GET /api/stats`
///
/// The privacy-reduced projection: counts and totals only. Available to
/// every authenticated member.
pub async fn public_stats(State(state): State<AppState>) -> ApiResult<Json<PublicStats>> {
    Ok(Json(state.fund.projection.public_stats().await?))
}

/// `GET /api/stats/members`
///
/// The treasurer projection with the per-member breakdown. The role check
/// happens here at the data-access seam, not in display code.
pub async fn member_stats(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<GroupStats>> {
    if !state.fund.profiles.is_treasurer(user.user_id).await? {
        return Err(FundError::Forbidden.into());
    }
    Ok(Json(state.fund.projection.group_stats().await?))
}
