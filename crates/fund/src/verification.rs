//! Email verification codes
//!
//! Issuance replaces any live code for the email (delete-then-insert), so
//! at most one live code exists per address. Expiry is enforced by the
//! lookup predicate at consumption time; there is no background sweep.

use rand::Rng;
use sqlx::PgPool;
use time::{Duration, OffsetDateTime};

use crate::auth_admin::AuthAdminClient;
use crate::email::EmailService;
use crate::error::{FundError, FundResult};

pub const CODE_TTL: Duration = Duration::hours(1);

/// Generate a 6-digit verification code.
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..1_000_000).to_string()
}

/// Normalize an address for storage and lookup.
pub fn normalize_email(raw: &str) -> FundResult<String> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') || email.len() > 255 {
        return Err(FundError::validation("Please enter a valid email address"));
    }
    Ok(email)
}

/// Verification code service.
pub struct VerificationService {
    pool: PgPool,
    email: EmailService,
    auth_admin: AuthAdminClient,
}

impl VerificationService {
    pub fn new(pool: PgPool, email: EmailService, auth_admin: AuthAdminClient) -> Self {
        Self {
            pool,
            email,
            auth_admin,
        }
    }

    /// Issue a fresh code and email it.
    ///
    /// Any previous code for the email is deleted first, so a resend
    /// invalidates the earlier code rather than leaving two live.
    pub async fn issue(&self, raw_email: &str, name: Option<&str>) -> FundResult<()> {
        let email = normalize_email(raw_email)?;
        let code = generate_code();
        let expires_at = OffsetDateTime::now_utc() + CODE_TTL;

        sqlx::query("DELETE FROM verification_codes WHERE email = $1")
            .bind(&email)
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO verification_codes (email, code, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(&email)
        .bind(&code)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        self.email.send_verification_code(&email, name, &code).await?;

        tracing::info!("Verification code issued");
        Ok(())
    }

    /// Consume a code: validate it, confirm the auth identity's email,
    /// and delete every code for the address.
    pub async fn consume(&self, raw_email: &str, code: &str) -> FundResult<()> {
        let email = normalize_email(raw_email)?;
        if code.trim().is_empty() {
            return Err(FundError::validation("Email and code are required"));
        }

        let record: Option<(uuid::Uuid,)> = sqlx::query_as(
            r#"
            SELECT id FROM verification_codes
            WHERE email = $1
              AND code = $2
              AND verified = FALSE
              AND expires_at > NOW()
            "#,
        )
        .bind(&email)
        .bind(code.trim())
        .fetch_optional(&self.pool)
        .await?;

        let (record_id,) = record.ok_or_else(|| {
            FundError::validation("Invalid or expired verification code")
        })?;

        sqlx::query("UPDATE verification_codes SET verified = TRUE WHERE id = $1")
            .bind(record_id)
            .execute(&self.pool)
            .await?;

        self.auth_admin.confirm_email(&email).await?;

        // Consumed codes are deleted, not kept around as history.
        sqlx::query("DELETE FROM verification_codes WHERE email = $1")
            .bind(&email)
            .execute(&self.pool)
            .await?;

        tracing::info!("Email verified");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_is_six_digits() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            assert!(!code.starts_with('0'));
        }
    }

    #[test]
    fn test_email_normalization() {
        assert_eq!(
            normalize_email("  User@Example.COM ").unwrap(),
            "user@example.com"
        );
        assert!(normalize_email("").is_err());
        assert!(normalize_email("not-an-email").is_err());
    }
}
