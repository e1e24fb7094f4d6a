//! Balance derivation
//!
//! Pure derivation of a member's paid total and remaining balance from
//! their `completed` contributions. There is no cached aggregate anywhere:
//! every caller recomputes from the store, so balances can never drift from
//! the contribution rows.

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::FundResult;

/// A member's position against the per-member target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemberBalance {
    pub total_paid: i64,
    pub remaining: i64,
}

/// Derive a balance from a total of `completed` amounts.
///
/// `remaining` is clamped at zero: a member who overshot the target (last
/// payment may exceed the gap) still reads as zero remaining.
pub fn from_total(target: i64, total_paid: i64) -> MemberBalance {
    MemberBalance {
        total_paid,
        remaining: (target - total_paid).max(0),
    }
}

/// Sum a set of completed contribution amounts. Empty set sums to zero.
pub fn total_paid(amounts: impl IntoIterator<Item = i64>) -> i64 {
    amounts.into_iter().sum()
}

/// Compute a member's balance from their `completed` rows.
///
/// Only `completed` contributions count; pending/processing/failed attempts
/// never affect the balance.
pub async fn member_balance(
    pool: &PgPool,
    user_id: Uuid,
    target: i64,
) -> FundResult<MemberBalance> {
    let (total,): (Option<i64>,) = sqlx::query_as(
        r#"
        SELECT SUM(amount)::BIGINT
        FROM contributions
        WHERE user_id = $1 AND status = 'completed'
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(from_total(target, total.unwrap_or(0)))
}
