//! Payment initiation
//!
//! Validates a contribution request, enforces the balance and rate-limit
//! policies, creates the pending record, and submits the charge to the
//! gateway. Every check runs server-side against the store; nothing client-
//! supplied is trusted, including the caller's claimed balance.

use rand::Rng;
use sqlx::PgPool;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::balance;
use crate::changefeed::{ChangeFeed, ChangeKind};
use crate::error::{FundError, FundResult};
use crate::gateway::{ChargeRequest, PaystackClient};
use crate::model::ContributionStatus;
use crate::phone;

/// Bounds on a single contribution, whole KES.
pub const MIN_AMOUNT: i64 = 1;
pub const MAX_AMOUNT: i64 = 50_000;

/// At most this many contribution attempts per member per trailing window.
pub const MAX_RECENT_ATTEMPTS: i64 = 3;
pub const RATE_LIMIT_WINDOW: Duration = Duration::minutes(5);

/// Identity of the caller, taken only from a verified session credential.
#[derive(Debug, Clone)]
pub struct MemberIdentity {
    pub user_id: Uuid,
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct InitiateRequest {
    pub amount: i64,
    pub phone_number: String,
    /// Optional receipt email; falls back to the session email.
    pub email: Option<String>,
}

/// Outcome handed back to the client for polling/subscription.
#[derive(Debug, Clone)]
pub struct InitiateOutcome {
    pub contribution_id: Uuid,
    pub reference: String,
    pub message: String,
}

/// Validate the amount in isolation: positive integer within bounds.
pub fn validate_amount(amount: i64) -> FundResult<()> {
    if amount <= 0 {
        return Err(FundError::validation("Amount must be a positive integer"));
    }
    if !(MIN_AMOUNT..=MAX_AMOUNT).contains(&amount) {
        return Err(FundError::Validation(format!(
            "Amount must be between {MIN_AMOUNT} and {MAX_AMOUNT} KES"
        )));
    }
    Ok(())
}

/// Build the correlation token tying the charge to its webhook.
pub fn new_reference(user_id: Uuid) -> String {
    let uid = user_id.simple().to_string();
    let nonce: u64 = rand::thread_rng().gen();
    format!("fcf_{}_{nonce:016x}", &uid[..8])
}

/// Payment Initiator service.
pub struct PaymentInitiator {
    gateway: PaystackClient,
    pool: PgPool,
    feed: ChangeFeed,
    /// Per-member contribution target, whole KES.
    target: i64,
}

impl PaymentInitiator {
    pub fn new(gateway: PaystackClient, pool: PgPool, feed: ChangeFeed, target: i64) -> Self {
        Self {
            gateway,
            pool,
            feed,
            target,
        }
    }

    /// Initiate a contribution payment.
    ///
    /// Precondition order: amount bounds, phone format, remaining balance,
    /// rate limit. All failures are typed errors and leave no row behind.
    /// After the pending row exists, a gateway acceptance moves it to
    /// `processing` and any gateway failure moves it to `failed` - a row is
    /// never left `pending` past this call.
    pub async fn initiate(
        &self,
        member: &MemberIdentity,
        req: &InitiateRequest,
    ) -> FundResult<InitiateOutcome> {
        validate_amount(req.amount)?;
        let msisdn = phone::normalize(&req.phone_number)?;

        let balance = balance::member_balance(&self.pool, member.user_id, self.target).await?;
        if balance.remaining <= 0 {
            return Err(FundError::validation(
                "You have already completed your contribution target",
            ));
        }
        if req.amount > balance.remaining {
            return Err(FundError::Validation(format!(
                "Amount exceeds remaining balance of {} KES",
                balance.remaining
            )));
        }

        self.check_rate_limit(member.user_id).await?;

        let reference = new_reference(member.user_id);
        let contribution_id = self.insert_pending(member.user_id, req.amount, &reference).await?;

        tracing::info!(
            amount = req.amount,
            phone = %phone::mask(&msisdn),
            reference_prefix = &reference[..12.min(reference.len())],
            "Created pending contribution"
        );

        let uid = member.user_id.simple().to_string();
        let charge = ChargeRequest {
            amount: req.amount,
            email: req
                .email
                .clone()
                .or_else(|| member.email.clone())
                .unwrap_or_else(|| format!("{}@finalcommit.fund", &uid[..8])),
            phone: msisdn,
            reference: reference.clone(),
            user_id: member.user_id,
            contribution_id,
        };

        match self.gateway.charge_mobile_money(&charge).await {
            Ok(accepted) => {
                self.set_status(contribution_id, member.user_id, ContributionStatus::Processing)
                    .await?;
                Ok(InitiateOutcome {
                    contribution_id,
                    reference: accepted.reference.unwrap_or(reference),
                    message: accepted.display_text.unwrap_or_else(|| {
                        "Payment prompt sent. Check your phone to complete payment.".to_string()
                    }),
                })
            }
            Err(gateway_err) => {
                // The row must not stay pending; mark it failed even when the
                // status write itself has trouble.
                if let Err(update_err) = self
                    .set_status(contribution_id, member.user_id, ContributionStatus::Failed)
                    .await
                {
                    tracing::error!(
                        contribution_id = %contribution_id,
                        error = %update_err,
                        "Failed to mark contribution failed after gateway error"
                    );
                }
                Err(gateway_err)
            }
        }
    }

    /// Trailing-window rate limit over the member's contribution rows.
    ///
    /// The store is the arbiter so the limit holds across instances; all
    /// attempts count, not just completed ones.
    async fn check_rate_limit(&self, user_id: Uuid) -> FundResult<()> {
        let window_start = OffsetDateTime::now_utc() - RATE_LIMIT_WINDOW;
        let (attempts,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM contributions
            WHERE user_id = $1 AND created_at >= $2
            "#,
        )
        .bind(user_id)
        .bind(window_start)
        .fetch_one(&self.pool)
        .await?;

        if attempts >= MAX_RECENT_ATTEMPTS {
            tracing::warn!(attempts = attempts, "Contribution rate limit hit");
            return Err(FundError::RateLimited);
        }
        Ok(())
    }

    async fn insert_pending(
        &self,
        user_id: Uuid,
        amount: i64,
        reference: &str,
    ) -> FundResult<Uuid> {
        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO contributions (user_id, amount, status, api_ref)
            VALUES ($1, $2, 'pending', $3)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(amount as i32)
        .bind(reference)
        .fetch_one(&self.pool)
        .await?;

        self.feed.publish(ChangeKind::Inserted, user_id);
        Ok(id)
    }

    async fn set_status(
        &self,
        contribution_id: Uuid,
        user_id: Uuid,
        status: ContributionStatus,
    ) -> FundResult<()> {
        sqlx::query("UPDATE contributions SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(contribution_id)
            .execute(&self.pool)
            .await?;

        self.feed.publish(ChangeKind::Updated, user_id);
        Ok(())
    }
}
