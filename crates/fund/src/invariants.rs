//! Fund Invariants Module
//!
//! Runnable consistency checks for the contribution system. These can be
//! run after any mutation or webhook burst to confirm the store is in a
//! valid state.
//!
//! ## Design Principles
//!
//! 1. **Executable**: Each invariant is a real SQL query that can be run
//! 2. **Explanatory**: Violations include enough context to debug
//! 3. **Non-destructive**: Checks only read, never write

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::FundResult;

/// Result of running a single invariant check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvariantViolation {
    /// Which invariant was violated
    pub invariant: String,
    /// Member(s) affected
    pub user_ids: Vec<Uuid>,
    /// Human-readable description of the violation
    pub description: String,
    /// Additional context for debugging
    pub context: serde_json::Value,
    /// Severity level
    pub severity: ViolationSeverity,
}

/// Severity of an invariant violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationSeverity {
    /// Critical - money may be recorded incorrectly
    Critical,
    /// High - data inconsistency that needs attention
    High,
    /// Medium - potential issue, should investigate
    Medium,
    /// Low - minor inconsistency, informational
    Low,
}

impl std::fmt::Display for ViolationSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViolationSeverity::Critical => write!(f, "CRITICAL"),
            ViolationSeverity::High => write!(f, "HIGH"),
            ViolationSeverity::Medium => write!(f, "MEDIUM"),
            ViolationSeverity::Low => write!(f, "LOW"),
        }
    }
}

/// Summary of all invariant checks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvariantCheckSummary {
    pub checked_at: OffsetDateTime,
    pub checks_run: usize,
    pub checks_passed: usize,
    pub checks_failed: usize,
    pub violations: Vec<InvariantViolation>,
    pub healthy: bool,
}

#[derive(Debug, sqlx::FromRow)]
struct BadAmountRow {
    id: Uuid,
    user_id: Uuid,
    amount: i32,
}

#[derive(Debug, sqlx::FromRow)]
struct OverTargetRow {
    user_id: Uuid,
    total_paid: i64,
    max_single: i32,
}

#[derive(Debug, sqlx::FromRow)]
struct StuckRow {
    id: Uuid,
    user_id: Uuid,
    status: String,
    created_at: OffsetDateTime,
}

#[derive(Debug, sqlx::FromRow)]
struct DuplicateCodeRow {
    email: String,
    live_count: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct DuplicateUsernameRow {
    username_lower: String,
    holder_count: i64,
}

/// Service for running fund invariant checks
pub struct InvariantChecker {
    pool: PgPool,
    target: i64,
}

impl InvariantChecker {
    pub fn new(pool: PgPool, target: i64) -> Self {
        Self { pool, target }
    }

    /// Run all invariant checks and return summary
    pub async fn run_all_checks(&self) -> FundResult<InvariantCheckSummary> {
        let now = OffsetDateTime::now_utc();
        let mut violations = Vec::new();

        violations.extend(self.check_positive_amounts().await?);
        violations.extend(self.check_completed_within_target().await?);
        violations.extend(self.check_no_stuck_pending().await?);
        violations.extend(self.check_single_live_code().await?);
        violations.extend(self.check_unique_usernames().await?);

        let checks_run = 5;
        let checks_failed = violations
            .iter()
            .map(|v| &v.invariant)
            .collect::<std::collections::HashSet<_>>()
            .len();
        let checks_passed = checks_run - checks_failed;

        Ok(InvariantCheckSummary {
            checked_at: now,
            checks_run,
            checks_passed,
            checks_failed,
            healthy: violations.is_empty(),
            violations,
        })
    }

    /// Invariant 1: Every contribution amount is positive
    ///
    /// Negative or zero amounts would corrupt every balance derivation.
    async fn check_positive_amounts(&self) -> FundResult<Vec<InvariantViolation>> {
        let rows: Vec<BadAmountRow> =
            sqlx::query_as("SELECT id, user_id, amount FROM contributions WHERE amount <= 0")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|row| InvariantViolation {
                invariant: "positive_amounts".to_string(),
                user_ids: vec![row.user_id],
                description: format!("Contribution has non-positive amount {}", row.amount),
                context: serde_json::json!({
                    "contribution_id": row.id,
                    "amount": row.amount,
                }),
                severity: ViolationSeverity::Critical,
            })
            .collect())
    }

    /// Invariant 2: Completed totals stay within target plus one payment
    ///
    /// Initiation validates amount against the remaining balance, so a
    /// member's completed sum can exceed the target by at most their
    /// largest single payment.
    async fn check_completed_within_target(&self) -> FundResult<Vec<InvariantViolation>> {
        let rows: Vec<OverTargetRow> = sqlx::query_as(
            r#"
            SELECT
                user_id,
                SUM(amount)::BIGINT AS total_paid,
                MAX(amount) AS max_single
            FROM contributions
            WHERE status = 'completed'
            GROUP BY user_id
            HAVING SUM(amount)::BIGINT > $1 + MAX(amount)
            "#,
        )
        .bind(self.target)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| InvariantViolation {
                invariant: "completed_within_target".to_string(),
                user_ids: vec![row.user_id],
                description: format!(
                    "Member's completed total {} exceeds target {} by more than one payment",
                    row.total_paid, self.target
                ),
                context: serde_json::json!({
                    "total_paid": row.total_paid,
                    "target": self.target,
                    "max_single_payment": row.max_single,
                }),
                severity: ViolationSeverity::Critical,
            })
            .collect())
    }

    /// Invariant 3: No contribution stays non-terminal for long
    ///
    /// Initiation resolves each row to processing or failed within the
    /// request, and webhooks terminalize processing rows. A row pending or
    /// processing for over a day means a lost webhook or a crashed request.
    async fn check_no_stuck_pending(&self) -> FundResult<Vec<InvariantViolation>> {
        let rows: Vec<StuckRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, status, created_at
            FROM contributions
            WHERE status IN ('pending', 'processing')
              AND created_at < NOW() - INTERVAL '24 hours'
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| InvariantViolation {
                invariant: "no_stuck_pending".to_string(),
                user_ids: vec![row.user_id],
                description: format!(
                    "Contribution stuck in '{}' since {}",
                    row.status, row.created_at
                ),
                context: serde_json::json!({
                    "contribution_id": row.id,
                    "status": row.status,
                }),
                severity: ViolationSeverity::Medium,
            })
            .collect())
    }

    /// Invariant 4: At most one live verification code per email
    ///
    /// Issuance deletes before inserting; two live codes mean a race or a
    /// missed cleanup.
    async fn check_single_live_code(&self) -> FundResult<Vec<InvariantViolation>> {
        let rows: Vec<DuplicateCodeRow> = sqlx::query_as(
            r#"
            SELECT email, COUNT(*) AS live_count
            FROM verification_codes
            WHERE verified = FALSE AND expires_at > NOW()
            GROUP BY email
            HAVING COUNT(*) > 1
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| InvariantViolation {
                invariant: "single_live_code".to_string(),
                user_ids: vec![],
                description: format!(
                    "Email has {} live verification codes (expected at most 1)",
                    row.live_count
                ),
                context: serde_json::json!({
                    "email": row.email,
                    "live_count": row.live_count,
                }),
                severity: ViolationSeverity::High,
            })
            .collect())
    }

    /// Invariant 5: Usernames are unique case-insensitively
    async fn check_unique_usernames(&self) -> FundResult<Vec<InvariantViolation>> {
        let rows: Vec<DuplicateUsernameRow> = sqlx::query_as(
            r#"
            SELECT LOWER(username) AS username_lower, COUNT(*) AS holder_count
            FROM profiles
            WHERE username IS NOT NULL
            GROUP BY LOWER(username)
            HAVING COUNT(*) > 1
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| InvariantViolation {
                invariant: "unique_usernames".to_string(),
                user_ids: vec![],
                description: format!(
                    "Username '{}' is held by {} profiles",
                    row.username_lower, row.holder_count
                ),
                context: serde_json::json!({
                    "username": row.username_lower,
                    "holder_count": row.holder_count,
                }),
                severity: ViolationSeverity::High,
            })
            .collect())
    }

    /// Run a single invariant check by name
    pub async fn run_check(&self, name: &str) -> FundResult<Vec<InvariantViolation>> {
        match name {
            "positive_amounts" => self.check_positive_amounts().await,
            "completed_within_target" => self.check_completed_within_target().await,
            "no_stuck_pending" => self.check_no_stuck_pending().await,
            "single_live_code" => self.check_single_live_code().await,
            "unique_usernames" => self.check_unique_usernames().await,
            _ => Ok(vec![]),
        }
    }

    /// Get list of all available invariant checks
    pub fn available_checks() -> Vec<&'static str> {
        vec![
            "positive_amounts",
            "completed_within_target",
            "no_stuck_pending",
            "single_live_code",
            "unique_usernames",
        ]
    }
}
