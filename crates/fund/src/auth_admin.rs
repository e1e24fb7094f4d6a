//! Admin client for the managed auth service
//!
//! The auth service owns identities, sessions, and email confirmation.
//! This client covers the two admin operations the fund needs: confirming
//! an email after code verification, and deleting an identity during
//! account deletion. Both require the service-role key, never the anon key.

use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;

use crate::error::{FundError, FundResult};

#[derive(Debug, Clone)]
pub struct AuthAdminConfig {
    pub base_url: Option<String>,
    pub service_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserList {
    users: Vec<UserRecord>,
}

#[derive(Debug, Deserialize)]
struct UserRecord {
    id: Uuid,
    email: Option<String>,
}

/// HTTP client for auth-service admin endpoints.
#[derive(Clone)]
pub struct AuthAdminClient {
    config: Arc<AuthAdminConfig>,
    http: reqwest::Client,
}

impl AuthAdminClient {
    pub fn new(config: AuthAdminConfig) -> Self {
        Self {
            config: Arc::new(config),
            http: reqwest::Client::new(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(AuthAdminConfig {
            base_url: std::env::var("AUTH_ADMIN_URL").ok().filter(|v| !v.is_empty()),
            service_key: std::env::var("AUTH_SERVICE_KEY").ok().filter(|v| !v.is_empty()),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.config.base_url.is_some() && self.config.service_key.is_some()
    }

    fn credentials(&self) -> FundResult<(&str, &str)> {
        match (&self.config.base_url, &self.config.service_key) {
            (Some(url), Some(key)) => Ok((url.as_str(), key.as_str())),
            _ => Err(FundError::AuthService(
                "auth admin API is not configured".to_string(),
            )),
        }
    }

    /// Mark the identity matching `email` as email-confirmed.
    pub async fn confirm_email(&self, email: &str) -> FundResult<()> {
        let (base, key) = self.credentials()?;

        let list: UserList = self
            .http
            .get(format!("{base}/admin/users"))
            .query(&[("email", email)])
            .bearer_auth(key)
            .send()
            .await
            .map_err(|e| unreachable_error(e, "user lookup"))?
            .error_for_status()
            .map_err(|e| rejected_error(e, "user lookup"))?
            .json()
            .await
            .map_err(|e| unreachable_error(e, "user lookup"))?;

        let user = list
            .users
            .into_iter()
            .find(|u| {
                u.email
                    .as_deref()
                    .is_some_and(|e| e.eq_ignore_ascii_case(email))
            })
            .ok_or_else(|| {
                FundError::Validation("User not found. Please sign up first.".to_string())
            })?;

        self.http
            .put(format!("{base}/admin/users/{}", user.id))
            .bearer_auth(key)
            .json(&serde_json::json!({ "email_confirm": true }))
            .send()
            .await
            .map_err(|e| unreachable_error(e, "email confirmation"))?
            .error_for_status()
            .map_err(|e| rejected_error(e, "email confirmation"))?;

        tracing::info!("Auth identity email confirmed");
        Ok(())
    }

    /// Permanently delete the backing identity.
    pub async fn delete_user(&self, user_id: Uuid) -> FundResult<()> {
        let (base, key) = self.credentials()?;

        self.http
            .delete(format!("{base}/admin/users/{user_id}"))
            .bearer_auth(key)
            .send()
            .await
            .map_err(|e| unreachable_error(e, "identity deletion"))?
            .error_for_status()
            .map_err(|e| rejected_error(e, "identity deletion"))?;

        tracing::info!(user_id = %user_id, "Auth identity deleted");
        Ok(())
    }
}

fn unreachable_error(e: reqwest::Error, op: &str) -> FundError {
    tracing::error!(error = %e, operation = op, "Auth service unreachable");
    FundError::AuthService("auth service unreachable".to_string())
}

fn rejected_error(e: reqwest::Error, op: &str) -> FundError {
    tracing::error!(error = %e, operation = op, "Auth service rejected request");
    FundError::AuthService(format!("{op} failed"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: String) -> AuthAdminClient {
        AuthAdminClient::new(AuthAdminConfig {
            base_url: Some(base_url),
            service_key: Some("service_key".to_string()),
        })
    }

    #[tokio::test]
    async fn test_confirm_email_looks_up_then_updates() {
        let user_id = Uuid::new_v4();
        let mut server = mockito::Server::new_async().await;
        let lookup = server
            .mock("GET", "/admin/users")
            .match_query(mockito::Matcher::UrlEncoded(
                "email".into(),
                "user@example.com".into(),
            ))
            .with_status(200)
            .with_body(format!(
                r#"{{"users": [{{"id": "{user_id}", "email": "User@Example.com"}}]}}"#
            ))
            .create_async()
            .await;
        let update = server
            .mock("PUT", format!("/admin/users/{user_id}").as_str())
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        test_client(server.url())
            .confirm_email("user@example.com")
            .await
            .unwrap();
        lookup.assert_async().await;
        update.assert_async().await;
    }

    #[tokio::test]
    async fn test_confirm_email_unknown_user_is_validation_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/admin/users")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"users": []}"#)
            .create_async()
            .await;

        let err = test_client(server.url())
            .confirm_email("ghost@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, FundError::Validation(_)));
    }

    #[tokio::test]
    async fn test_disabled_client_errors_without_network() {
        let client = AuthAdminClient::new(AuthAdminConfig {
            base_url: None,
            service_key: None,
        });
        assert!(!client.is_enabled());
        let err = client.delete_user(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, FundError::AuthService(_)));
    }
}
