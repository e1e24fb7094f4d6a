//! Email delivery via the Resend HTTP API

use std::sync::Arc;

use crate::error::{FundError, FundResult};

const DEFAULT_BASE_URL: &str = "https://api.resend.com";
const DEFAULT_FROM: &str = "FinalCommit <onboarding@resend.dev>";

/// Email provider configuration.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Absent key disables delivery; sends then fail with a typed error.
    pub api_key: Option<String>,
    pub from_address: String,
    pub base_url: String,
}

/// Transactional email sender.
#[derive(Clone)]
pub struct EmailService {
    config: Arc<EmailConfig>,
    http: reqwest::Client,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self {
            config: Arc::new(config),
            http: reqwest::Client::new(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(EmailConfig {
            api_key: std::env::var("RESEND_API_KEY").ok().filter(|v| !v.is_empty()),
            from_address: std::env::var("EMAIL_FROM").unwrap_or_else(|_| DEFAULT_FROM.to_string()),
            base_url: std::env::var("RESEND_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Send a verification code email.
    pub async fn send_verification_code(
        &self,
        to: &str,
        name: Option<&str>,
        code: &str,
    ) -> FundResult<()> {
        let subject = "Verify your email - FinalCommit";
        let html = verification_email_html(name.unwrap_or("there"), code);
        self.send(to, subject, &html).await
    }

    async fn send(&self, to: &str, subject: &str, html: &str) -> FundResult<()> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| FundError::Email("email delivery is not configured".to_string()))?;

        let url = format!("{}/emails", self.config.base_url);
        let body = serde_json::json!({
            "from": self.config.from_address,
            "to": [to],
            "subject": subject,
            "html": html,
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Email provider unreachable");
                FundError::Email("email provider unreachable".to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::error!(http_status = %status, detail = %detail, "Email provider rejected send");
            return Err(FundError::Email("failed to send email".to_string()));
        }

        tracing::info!(subject = %subject, "Email sent");
        Ok(())
    }
}

/// Render the verification-code email body.
fn verification_email_html(name: &str, code: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<body style="font-family: -apple-system, 'Segoe UI', Roboto, Arial, sans-serif; background-color: #f4f4f5; margin: 0; padding: 40px 20px;">
  <div style="max-width: 420px; margin: 0 auto; background: white; border-radius: 12px; padding: 40px;">
    <h1 style="color: #18181b; font-size: 24px; text-align: center;">FinalCommit</h1>
    <h2 style="color: #18181b; font-size: 20px; text-align: center;">Verify your email</h2>
    <p style="color: #71717a; font-size: 15px; text-align: center;">Hi {name}, enter this code to complete your registration</p>
    <div style="background: #f4f4f5; border-radius: 12px; padding: 24px; text-align: center;">
      <p style="font-family: monospace; font-size: 36px; font-weight: 700; color: #18181b; letter-spacing: 8px; margin: 0;">{code}</p>
    </div>
    <p style="color: #a1a1aa; font-size: 13px; text-align: center;">This code expires in 1 hour</p>
    <p style="color: #a1a1aa; font-size: 13px; text-align: center;">If you didn't request this, you can safely ignore this email.</p>
  </div>
</body>
</html>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service(base_url: String, api_key: Option<&str>) -> EmailService {
        EmailService::new(EmailConfig {
            api_key: api_key.map(String::from),
            from_address: DEFAULT_FROM.to_string(),
            base_url,
        })
    }

    #[test]
    fn test_template_contains_code_and_name() {
        let html = verification_email_html("Alex", "482913");
        assert!(html.contains("482913"));
        assert!(html.contains("Hi Alex"));
    }

    #[tokio::test]
    async fn test_send_posts_to_provider() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/emails")
            .match_header("authorization", "Bearer re_test_key")
            .with_status(200)
            .with_body(r#"{"id": "email_123"}"#)
            .create_async()
            .await;

        let service = test_service(server.url(), Some("re_test_key"));
        service
            .send_verification_code("user@example.com", Some("Alex"), "482913")
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_disabled_service_fails_with_typed_error() {
        let service = test_service("http://unused.invalid".to_string(), None);
        let err = service
            .send_verification_code("user@example.com", None, "000000")
            .await
            .unwrap_err();
        assert!(matches!(err, FundError::Email(_)));
    }
}
