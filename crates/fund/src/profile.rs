//! Member profiles
//!
//! A profile row is created on first authenticated contact and completed by
//! an explicit onboarding step. Only the owning member mutates their
//! profile; the treasurer flag is read here but never set through this
//! service.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth_admin::AuthAdminClient;
use crate::changefeed::{ChangeFeed, ChangeKind};
use crate::error::{FundError, FundResult};
use crate::phone;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub username: Option<String>,
    pub phone: Option<String>,
    pub is_treasurer: bool,
    pub onboarding_completed: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Owner-submitted profile changes. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub username: Option<String>,
}

/// Profile service.
pub struct ProfileService {
    pool: PgPool,
    auth_admin: AuthAdminClient,
    feed: ChangeFeed,
}

impl ProfileService {
    pub fn new(pool: PgPool, auth_admin: AuthAdminClient, feed: ChangeFeed) -> Self {
        Self {
            pool,
            auth_admin,
            feed,
        }
    }

    /// Fetch the caller's profile, creating it on first contact.
    pub async fn ensure_profile(
        &self,
        user_id: Uuid,
        email: Option<&str>,
        name_hint: Option<&str>,
    ) -> FundResult<Profile> {
        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, name, email)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(name_hint.unwrap_or(""))
        .bind(email.unwrap_or(""))
        .execute(&self.pool)
        .await?;

        self.get(user_id).await
    }

    pub async fn get(&self, user_id: Uuid) -> FundResult<Profile> {
        let profile: Option<Profile> =
            sqlx::query_as("SELECT * FROM profiles WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        profile.ok_or_else(|| FundError::NotFound("profile".to_string()))
    }

    pub async fn is_treasurer(&self, user_id: Uuid) -> FundResult<bool> {
        let row: Option<(bool,)> =
            sqlx::query_as("SELECT is_treasurer FROM profiles WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(t,)| t).unwrap_or(false))
    }

    /// Apply owner-submitted changes.
    ///
    /// Phone is validated and stored normalized; username uniqueness is
    /// checked case-insensitively with a distinct "taken" error.
    pub async fn update(&self, user_id: Uuid, update: &ProfileUpdate) -> FundResult<Profile> {
        let name = match &update.name {
            Some(raw) => Some(validate_name(raw)?),
            None => None,
        };
        let msisdn = match &update.phone {
            Some(raw) => Some(phone::normalize(raw)?),
            None => None,
        };
        let username = match &update.username {
            Some(raw) => {
                let username = validate_username(raw)?;
                self.check_username_free(&username, user_id).await?;
                Some(username)
            }
            None => None,
        };

        sqlx::query(
            r#"
            UPDATE profiles
            SET name = COALESCE($1, name),
                phone = COALESCE($2, phone),
                username = COALESCE($3, username)
            WHERE user_id = $4
            "#,
        )
        .bind(name)
        .bind(msisdn)
        .bind(username)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        self.get(user_id).await
    }

    /// Mark onboarding done. Protected features gate on this flag.
    pub async fn complete_onboarding(&self, user_id: Uuid) -> FundResult<()> {
        let result =
            sqlx::query("UPDATE profiles SET onboarding_completed = TRUE WHERE user_id = $1")
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(FundError::NotFound("profile".to_string()));
        }
        tracing::info!("Member completed onboarding");
        Ok(())
    }

    /// Delete the caller's account: contributions, profile, then the
    /// backing auth identity. Irreversible.
    pub async fn delete_account(&self, user_id: Uuid) -> FundResult<()> {
        sqlx::query("DELETE FROM contributions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        self.feed.publish(ChangeKind::Deleted, user_id);

        sqlx::query("DELETE FROM profiles WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        self.auth_admin.delete_user(user_id).await?;

        tracing::info!("Account deleted");
        Ok(())
    }

    async fn check_username_free(&self, username: &str, user_id: Uuid) -> FundResult<()> {
        let (taken,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM profiles
                WHERE LOWER(username) = LOWER($1) AND user_id != $2
            )
            "#,
        )
        .bind(username)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        if taken {
            return Err(FundError::validation("Username is already taken"));
        }
        Ok(())
    }
}

fn validate_name(raw: &str) -> FundResult<String> {
    let name = raw.trim();
    if name.len() < 2 || name.len() > 100 {
        return Err(FundError::validation(
            "Name must be between 2 and 100 characters",
        ));
    }
    Ok(name.to_string())
}

fn validate_username(raw: &str) -> FundResult<String> {
    let username = raw.trim();
    let valid = (3..=30).contains(&username.len())
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(FundError::validation(
            "Username must be 3-30 characters of letters, numbers, or underscores",
        ));
    }
    Ok(username.to_string())
}
