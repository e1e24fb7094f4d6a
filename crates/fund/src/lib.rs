// Fund crate clippy configuration
// Test code patterns (expected in test files):
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! FinalCommit Fund Domain
//!
//! Core domain logic for the group-contribution fund: members make
//! incremental mobile-money payments toward a fixed per-member target and
//! a treasurer tracks group progress.
//!
//! ## Features
//!
//! - **Balance Calculation**: Pure derivation of paid/remaining per member
//! - **Payment Initiation**: Validation, rate limiting, pending record,
//!   gateway charge
//! - **Webhook Reconciliation**: HMAC-verified, idempotent status updates
//! - **Status Projection**: Public and treasurer read models
//! - **Profiles**: Onboarding, owner-only updates, account deletion
//! - **Verification Codes**: Issue/consume email verification
//! - **Reminders**: Treasurer reminder batches with WhatsApp links
//! - **Invariants**: Runnable consistency checks over the store

pub mod auth_admin;
pub mod balance;
pub mod changefeed;
pub mod email;
pub mod error;
pub mod gateway;
pub mod initiate;
pub mod invariants;
pub mod model;
pub mod phone;
pub mod profile;
pub mod projection;
pub mod reminders;
pub mod verification;
pub mod webhook;

#[cfg(test)]
mod edge_case_tests;

// Auth admin
pub use auth_admin::{AuthAdminClient, AuthAdminConfig};

// Balance
pub use balance::{member_balance, MemberBalance};

// Change feed
pub use changefeed::{ChangeFeed, ChangeKind, ContributionEvent};

// Email
pub use email::{EmailConfig, EmailService};

// Error
pub use error::{FundError, FundResult};

// Gateway
pub use gateway::{ChargeAccepted, ChargeRequest, PaystackClient, PaystackConfig};

// Initiation
pub use initiate::{
    InitiateOutcome, InitiateRequest, MemberIdentity, PaymentInitiator, MAX_AMOUNT,
    MAX_RECENT_ATTEMPTS, MIN_AMOUNT, RATE_LIMIT_WINDOW,
};

// Invariants
pub use invariants::{
    InvariantCheckSummary, InvariantChecker, InvariantViolation, ViolationSeverity,
};

// Model
pub use model::{Contribution, ContributionStatus};

// Profiles
pub use profile::{Profile, ProfileService, ProfileUpdate};

// Projection
pub use projection::{GroupStats, MemberProgress, MemberStatus, PublicStats, StatusProjection};

// Reminders
pub use reminders::{MemberReminder, ReminderBatch, ReminderService, ReminderSummary, TargetGroup};

// Verification
pub use verification::VerificationService;

// Webhook
pub use webhook::{GatewayEvent, ReconcileAck, WebhookReconciler, SIGNATURE_HEADER};

use sqlx::PgPool;
use time::macros::format_description;
use time::Date;

/// Fund policy settings, configuration rather than literals.
#[derive(Debug, Clone)]
pub struct FundSettings {
    /// Per-member contribution target, whole KES.
    pub target: i64,
    /// Contribution deadline used in reminders.
    pub deadline: Date,
    /// Public application URL for link construction.
    pub app_url: String,
}

impl FundSettings {
    pub const DEFAULT_TARGET: i64 = 700;

    pub fn from_env() -> FundResult<Self> {
        let target = match std::env::var("MEMBER_TARGET") {
            Ok(raw) => raw.parse::<i64>().ok().filter(|t| *t > 0).ok_or_else(|| {
                FundError::Config("MEMBER_TARGET must be a positive integer".to_string())
            })?,
            Err(_) => Self::DEFAULT_TARGET,
        };

        let deadline_raw =
            std::env::var("FUND_DEADLINE").unwrap_or_else(|_| "2026-05-01".to_string());
        let deadline = Date::parse(&deadline_raw, format_description!("[year]-[month]-[day]"))
            .map_err(|_| {
                FundError::Config("FUND_DEADLINE must be a YYYY-MM-DD date".to_string())
            })?;

        let app_url =
            std::env::var("APP_URL").unwrap_or_else(|_| "https://finalcommit.fund".to_string());

        Ok(Self {
            target,
            deadline,
            app_url,
        })
    }
}

/// Main fund service that combines all domain functionality
pub struct FundService {
    pub settings: FundSettings,
    pub feed: ChangeFeed,
    pub gateway: PaystackClient,
    pub email: EmailService,
    pub auth_admin: AuthAdminClient,
    pub initiator: PaymentInitiator,
    pub webhooks: WebhookReconciler,
    pub projection: StatusProjection,
    pub profiles: ProfileService,
    pub verification: VerificationService,
    pub reminders: ReminderService,
    pub invariants: InvariantChecker,
}

impl FundService {
    /// Create the service from environment variables.
    ///
    /// Fails fast when a required secret (gateway key, target parse) is
    /// missing; optional providers (email, auth admin) degrade with a
    /// warning at first use instead.
    pub fn from_env(pool: PgPool) -> FundResult<Self> {
        let settings = FundSettings::from_env()?;
        let gateway = PaystackClient::from_env()?;
        let email = EmailService::from_env();
        let auth_admin = AuthAdminClient::from_env();
        Ok(Self::new(pool, settings, gateway, email, auth_admin))
    }

    /// Create the service with explicit configuration.
    pub fn new(
        pool: PgPool,
        settings: FundSettings,
        gateway: PaystackClient,
        email: EmailService,
        auth_admin: AuthAdminClient,
    ) -> Self {
        let feed = ChangeFeed::new();
        let webhook_secret = gateway.webhook_secret().to_string();

        Self {
            initiator: PaymentInitiator::new(
                gateway.clone(),
                pool.clone(),
                feed.clone(),
                settings.target,
            ),
            webhooks: WebhookReconciler::new(pool.clone(), webhook_secret, feed.clone()),
            projection: StatusProjection::new(pool.clone(), settings.target),
            profiles: ProfileService::new(pool.clone(), auth_admin.clone(), feed.clone()),
            verification: VerificationService::new(pool.clone(), email.clone(), auth_admin.clone()),
            reminders: ReminderService::new(
                pool.clone(),
                settings.target,
                settings.deadline,
                settings.app_url.clone(),
            ),
            invariants: InvariantChecker::new(pool, settings.target),
            feed,
            gateway,
            email,
            auth_admin,
            settings,
        }
    }
}
