//! Member contribution history

use axum::extract::State;
use axum::{Extension, Json};
use finalcommit_fund::{Contribution, MemberStatus};
use serde::Serialize;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MyContributionsResponse {
    pub contributions: Vec<Contribution>,
    pub total_paid: i64,
    pub remaining: i64,
    pub status: MemberStatus,
}

/// `GET /api/contributions/me`
///
/// The caller's completed contributions, newest first, plus their balance.
pub async fn my_contributions(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<MyContributionsResponse>> {
    let contributions: Vec<Contribution> = sqlx::query_as(
        r#"
        SELECT * FROM contributions
        WHERE user_id = $1 AND status = 'completed'
        ORDER BY created_at DESC
        "#,
    )
    .bind(user.user_id)
    .fetch_all(&state.pool)
    .await?;

    let (balance, status) = state.fund.projection.member_progress(user.user_id).await?;

    Ok(Json(MyContributionsResponse {
        contributions,
        total_paid: balance.total_paid,
        remaining: balance.remaining,
        status,
    }))
}
