//! Error types for the fund domain

use thiserror::Error;

pub type FundResult<T> = Result<T, FundError>;

/// Domain error taxonomy.
///
/// Validation and rate-limit errors carry caller-facing messages. Upstream
/// errors (`Gateway`, `Email`, `AuthService`) carry internal detail that is
/// logged server-side; the HTTP layer replaces it with a generic message.
#[derive(Debug, Error)]
pub enum FundError {
    /// Bad input: amount, phone, email, payload shape.
    #[error("{0}")]
    Validation(String),

    /// Too many contribution attempts inside the trailing window.
    #[error("Too many payment attempts. Please wait a few minutes before trying again.")]
    RateLimited,

    /// Missing or invalid session credential.
    #[error("Unauthorized")]
    Unauthorized,

    /// Authenticated but not allowed (e.g. non-treasurer on treasurer data).
    #[error("Forbidden")]
    Forbidden,

    /// Webhook body/signature pair failed HMAC verification.
    #[error("webhook signature verification failed")]
    WebhookSignatureInvalid,

    /// Referenced entity does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Payment gateway rejected the call or was unreachable.
    #[error("payment gateway error: {0}")]
    Gateway(String),

    /// Email provider rejected the call or was unreachable.
    #[error("email provider error: {0}")]
    Email(String),

    /// Auth service admin API rejected the call or was unreachable.
    #[error("auth service error: {0}")]
    AuthService(String),

    /// A required configuration value is missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl FundError {
    pub fn validation(msg: impl Into<String>) -> Self {
        FundError::Validation(msg.into())
    }
}
