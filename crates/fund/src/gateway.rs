//! Paystack charge client
//!
//! Speaks the gateway's mobile-money charge API. The gateway owns the hard
//! parts (STK prompt delivery, carrier integration); this client only
//! submits charges and reports acceptance or rejection.

use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;

use crate::error::{FundError, FundResult};

const DEFAULT_BASE_URL: &str = "https://api.paystack.co";

/// Gateway configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct PaystackConfig {
    /// Secret key. Authenticates outgoing charges and keys the webhook HMAC.
    pub secret_key: String,
    pub base_url: String,
    pub currency: String,
}

impl PaystackConfig {
    /// Load from environment variables.
    ///
    /// `PAYSTACK_SECRET_KEY` is required; a missing or empty value is a
    /// startup error, never a silent no-op.
    pub fn from_env() -> FundResult<Self> {
        let secret_key = std::env::var("PAYSTACK_SECRET_KEY")
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| FundError::Config("PAYSTACK_SECRET_KEY is not set".to_string()))?;

        let base_url =
            std::env::var("PAYSTACK_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let currency = std::env::var("PAYSTACK_CURRENCY").unwrap_or_else(|_| "KES".to_string());

        Ok(Self {
            secret_key,
            base_url,
            currency,
        })
    }
}

/// Charge parameters for one contribution attempt.
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    /// Whole currency units; converted to minor units on the wire.
    pub amount: i64,
    pub email: String,
    /// Normalized international phone (`+254...`).
    pub phone: String,
    pub reference: String,
    pub user_id: Uuid,
    pub contribution_id: Uuid,
}

/// Gateway acceptance of a charge. Final status arrives later by webhook.
#[derive(Debug, Clone)]
pub struct ChargeAccepted {
    pub reference: Option<String>,
    pub display_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    status: bool,
    message: Option<String>,
    data: Option<ChargeData>,
}

#[derive(Debug, Deserialize)]
struct ChargeData {
    reference: Option<String>,
    display_text: Option<String>,
}

/// HTTP client for the payment gateway.
#[derive(Clone)]
pub struct PaystackClient {
    config: Arc<PaystackConfig>,
    http: reqwest::Client,
}

impl PaystackClient {
    pub fn new(config: PaystackConfig) -> Self {
        Self {
            config: Arc::new(config),
            http: reqwest::Client::new(),
        }
    }

    pub fn from_env() -> FundResult<Self> {
        Ok(Self::new(PaystackConfig::from_env()?))
    }

    pub fn config(&self) -> &PaystackConfig {
        &self.config
    }

    /// The shared secret that keys webhook signatures.
    pub fn webhook_secret(&self) -> &str {
        &self.config.secret_key
    }

    /// Submit a mobile-money charge.
    ///
    /// Returns `Ok` when the gateway accepted the charge (the member's
    /// phone will receive a payment prompt). A gateway rejection surfaces
    /// its message; transport failures surface a generic message with the
    /// detail logged server-side only.
    pub async fn charge_mobile_money(&self, req: &ChargeRequest) -> FundResult<ChargeAccepted> {
        let url = format!("{}/charge", self.config.base_url);

        let body = serde_json::json!({
            "amount": req.amount * 100,
            "email": req.email,
            "currency": self.config.currency,
            "mobile_money": {
                "phone": req.phone,
                "provider": "mpesa",
            },
            "reference": req.reference,
            "metadata": {
                "user_id": req.user_id,
                "contribution_id": req.contribution_id,
            },
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.secret_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Payment gateway unreachable");
                FundError::Gateway("payment service unreachable".to_string())
            })?;

        let http_status = response.status();
        let envelope: ApiEnvelope = response.json().await.map_err(|e| {
            tracing::error!(error = %e, http_status = %http_status, "Unparseable gateway response");
            FundError::Gateway("unexpected payment service response".to_string())
        })?;

        tracing::info!(
            accepted = envelope.status,
            has_data = envelope.data.is_some(),
            "Payment gateway charge response"
        );

        if !envelope.status {
            return Err(FundError::Gateway(
                envelope
                    .message
                    .unwrap_or_else(|| "Payment initiation failed".to_string()),
            ));
        }

        let data = envelope.data.unwrap_or(ChargeData {
            reference: None,
            display_text: None,
        });

        Ok(ChargeAccepted {
            reference: data.reference,
            display_text: data.display_text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(base_url: String) -> PaystackConfig {
        PaystackConfig {
            secret_key: "sk_test_abc".to_string(),
            base_url,
            currency: "KES".to_string(),
        }
    }

    fn charge_request() -> ChargeRequest {
        ChargeRequest {
            amount: 300,
            email: "member@example.com".to_string(),
            phone: "+254712345678".to_string(),
            reference: "fcf_12345678_deadbeef".to_string(),
            user_id: Uuid::new_v4(),
            contribution_id: Uuid::new_v4(),
        }
    }

    #[tokio::test]
    async fn test_charge_accepted() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/charge")
            .match_header("authorization", "Bearer sk_test_abc")
            .with_status(200)
            .with_body(
                r#"{
                    "status": true,
                    "message": "Charge attempted",
                    "data": {
                        "reference": "fcf_12345678_deadbeef",
                        "display_text": "Check your phone to complete payment"
                    }
                }"#,
            )
            .create_async()
            .await;

        let client = PaystackClient::new(test_config(server.url()));
        let accepted = client.charge_mobile_money(&charge_request()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(accepted.reference.as_deref(), Some("fcf_12345678_deadbeef"));
        assert_eq!(
            accepted.display_text.as_deref(),
            Some("Check your phone to complete payment")
        );
    }

    #[tokio::test]
    async fn test_charge_rejected_surfaces_gateway_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/charge")
            .with_status(200)
            .with_body(r#"{"status": false, "message": "Insufficient funds"}"#)
            .create_async()
            .await;

        let client = PaystackClient::new(test_config(server.url()));
        let err = client
            .charge_mobile_money(&charge_request())
            .await
            .unwrap_err();

        match err {
            FundError::Gateway(msg) => assert_eq!(msg, "Insufficient funds"),
            other => panic!("expected gateway error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_garbage_response_is_generic_gateway_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/charge")
            .with_status(502)
            .with_body("<html>bad gateway</html>")
            .create_async()
            .await;

        let client = PaystackClient::new(test_config(server.url()));
        let err = client
            .charge_mobile_money(&charge_request())
            .await
            .unwrap_err();

        match err {
            FundError::Gateway(msg) => {
                // Internal detail stays in the logs; caller sees a generic message.
                assert!(!msg.contains("html"));
            }
            other => panic!("expected gateway error, got {other:?}"),
        }
    }
}
