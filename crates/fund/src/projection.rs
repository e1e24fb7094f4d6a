//! Status projections
//!
//! Read-side aggregation over the contribution set. Two named projections
//! exist over the same rows: `PublicStats` (counts and totals only, safe
//! for every member) and `GroupStats` (adds the per-member breakdown,
//! treasurer only). The reduction happens here in the data-access layer,
//! not by hiding fields at the edge.

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::balance::{self, MemberBalance};
use crate::error::FundResult;

/// Progress bucket for one member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MemberStatus {
    Completed,
    InProgress,
    Pending,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Completed => "completed",
            MemberStatus::InProgress => "in-progress",
            MemberStatus::Pending => "pending",
        }
    }
}

/// Threshold bucketing of a paid total against the target.
pub fn member_status(total_paid: i64, target: i64) -> MemberStatus {
    if total_paid >= target {
        MemberStatus::Completed
    } else if total_paid > 0 {
        MemberStatus::InProgress
    } else {
        MemberStatus::Pending
    }
}

/// Per-member read shape.
#[derive(Debug, Clone, Serialize)]
pub struct MemberProgress {
    pub user_id: Uuid,
    pub name: String,
    pub total_paid: i64,
    pub remaining: i64,
    pub status: MemberStatus,
}

/// Privacy-reduced group view: counts and totals, no per-member data.
#[derive(Debug, Clone, Serialize)]
pub struct PublicStats {
    pub total_collected: i64,
    pub total_target: i64,
    pub member_count: i64,
    pub completed_count: i64,
    pub in_progress_count: i64,
    pub not_started_count: i64,
    pub progress_percentage: i64,
}

/// Treasurer view: the public aggregates plus the member breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct GroupStats {
    #[serde(flatten)]
    pub totals: PublicStats,
    pub members: Vec<MemberProgress>,
}

/// Aggregate per-member paid totals into the public shape.
///
/// `member_count` comes from the profile set, not the contribution set:
/// members with no completed rows still count as not-started.
pub fn aggregate_public(member_count: i64, totals: &[i64], target: i64) -> PublicStats {
    let total_collected: i64 = totals.iter().sum();
    let completed_count = totals.iter().filter(|&&t| t >= target).count() as i64;
    let in_progress_count = totals.iter().filter(|&&t| t > 0 && t < target).count() as i64;
    let not_started_count = (member_count - completed_count - in_progress_count).max(0);
    let total_target = member_count * target;
    let progress_percentage = if total_target > 0 {
        ((total_collected as f64 / total_target as f64) * 100.0).round() as i64
    } else {
        0
    };

    PublicStats {
        total_collected,
        total_target,
        member_count,
        completed_count,
        in_progress_count,
        not_started_count,
        progress_percentage,
    }
}

/// Status Projection service.
pub struct StatusProjection {
    pool: PgPool,
    target: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct MemberTotalRow {
    user_id: Uuid,
    name: String,
    total_paid: i64,
}

impl StatusProjection {
    pub fn new(pool: PgPool, target: i64) -> Self {
        Self { pool, target }
    }

    pub fn target(&self) -> i64 {
        self.target
    }

    /// One member's progress: balance plus bucket.
    pub async fn member_progress(&self, user_id: Uuid) -> FundResult<(MemberBalance, MemberStatus)> {
        let balance = balance::member_balance(&self.pool, user_id, self.target).await?;
        Ok((balance, member_status(balance.total_paid, self.target)))
    }

    /// The privacy-reduced projection available to every member.
    pub async fn public_stats(&self) -> FundResult<PublicStats> {
        let (member_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM profiles")
            .fetch_one(&self.pool)
            .await?;

        let totals: Vec<(i64,)> = sqlx::query_as(
            r#"
            SELECT SUM(amount)::BIGINT
            FROM contributions
            WHERE status = 'completed'
            GROUP BY user_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let totals: Vec<i64> = totals.into_iter().map(|(t,)| t).collect();
        Ok(aggregate_public(member_count, &totals, self.target))
    }

    /// The treasurer projection with the per-member breakdown.
    pub async fn group_stats(&self) -> FundResult<GroupStats> {
        let rows: Vec<MemberTotalRow> = sqlx::query_as(
            r#"
            SELECT
                p.user_id,
                p.name,
                COALESCE(SUM(c.amount) FILTER (WHERE c.status = 'completed'), 0)::BIGINT
                    AS total_paid
            FROM profiles p
            LEFT JOIN contributions c ON c.user_id = p.user_id
            GROUP BY p.user_id, p.name
            ORDER BY p.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let totals: Vec<i64> = rows.iter().map(|r| r.total_paid).collect();
        let aggregates = aggregate_public(rows.len() as i64, &totals, self.target);

        let members = rows
            .into_iter()
            .map(|row| {
                let balance = balance::from_total(self.target, row.total_paid);
                MemberProgress {
                    user_id: row.user_id,
                    name: row.name,
                    total_paid: balance.total_paid,
                    remaining: balance.remaining,
                    status: member_status(balance.total_paid, self.target),
                }
            })
            .collect();

        Ok(GroupStats {
            totals: aggregates,
            members,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_thresholds() {
        assert_eq!(member_status(0, 700), MemberStatus::Pending);
        assert_eq!(member_status(1, 700), MemberStatus::InProgress);
        assert_eq!(member_status(699, 700), MemberStatus::InProgress);
        assert_eq!(member_status(700, 700), MemberStatus::Completed);
        assert_eq!(member_status(900, 700), MemberStatus::Completed);
    }

    #[test]
    fn test_aggregate_buckets_and_totals() {
        // 5 members: one complete, two in progress, two never contributed
        // (only three appear in the grouped totals).
        let totals = [700, 300, 150];
        let stats = aggregate_public(5, &totals, 700);
        assert_eq!(stats.total_collected, 1150);
        assert_eq!(stats.total_target, 3500);
        assert_eq!(stats.completed_count, 1);
        assert_eq!(stats.in_progress_count, 2);
        assert_eq!(stats.not_started_count, 2);
        assert_eq!(stats.progress_percentage, 33);
    }

    #[test]
    fn test_aggregate_empty_group() {
        let stats = aggregate_public(0, &[], 700);
        assert_eq!(stats.total_collected, 0);
        assert_eq!(stats.progress_percentage, 0);
        assert_eq!(stats.not_started_count, 0);
    }

    #[test]
    fn test_not_started_never_negative() {
        // Overshoot rows without profiles must not push the count negative.
        let totals = [700, 700];
        let stats = aggregate_public(1, &totals, 700);
        assert_eq!(stats.not_started_count, 0);
    }

    #[test]
    fn test_percentage_rounds() {
        let stats = aggregate_public(3, &[700], 700);
        // 700 / 2100 = 33.33% -> 33
        assert_eq!(stats.progress_percentage, 33);
        let stats = aggregate_public(2, &[700, 350], 700);
        // 1050 / 1400 = 75%
        assert_eq!(stats.progress_percentage, 75);
    }
}
