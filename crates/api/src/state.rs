//! Application state

use std::sync::Arc;

use finalcommit_fund::FundService;
use sqlx::PgPool;

use crate::auth::AuthState;
use crate::config::Config;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub fund: Arc<FundService>,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> anyhow::Result<Self> {
        let fund = FundService::from_env(pool.clone())?;

        tracing::info!(
            target = fund.settings.target,
            deadline = %fund.settings.deadline,
            "Fund policy loaded"
        );

        if fund.email.is_enabled() {
            tracing::info!("Email delivery enabled");
        } else {
            tracing::warn!("Email delivery not configured (missing RESEND_API_KEY)");
        }

        if fund.auth_admin.is_enabled() {
            tracing::info!("Auth admin API enabled");
        } else {
            tracing::warn!(
                "Auth admin API not configured (missing AUTH_ADMIN_URL or AUTH_SERVICE_KEY) - \
                 email confirmation and account deletion will fail"
            );
        }

        Ok(Self {
            pool,
            config,
            fund: Arc::new(fund),
        })
    }

    /// Get auth state for middleware
    pub fn auth_state(&self) -> AuthState {
        AuthState::new(&self.config.auth_jwt_secret)
    }
}
