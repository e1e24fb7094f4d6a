//! Webhook reconciliation
//!
//! The webhook endpoint is the only unauthenticated writer in the system,
//! so the HMAC signature over the raw body is the sole authenticity
//! boundary. Verification happens before any parsing or lookup; a bad
//! signature performs no mutation.
//!
//! The gateway does not guarantee ordered or deduplicated delivery. The
//! reconciler tolerates both by the absorbing-state rule: a `completed`
//! record is never overwritten, and reapplying a terminal update is a
//! silent success rather than an error.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha512;
use sqlx::PgPool;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::changefeed::{ChangeFeed, ChangeKind};
use crate::error::{FundError, FundResult};
use crate::model::ContributionStatus;

type HmacSha512 = Hmac<Sha512>;

/// Header carrying the gateway's hex HMAC-SHA512 of the raw body.
pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

/// Parsed gateway event.
#[derive(Debug, Deserialize)]
pub struct GatewayEvent {
    pub event: String,
    #[serde(default)]
    pub data: GatewayEventData,
}

#[derive(Debug, Default, Deserialize)]
pub struct GatewayEventData {
    pub reference: Option<String>,
    pub status: Option<String>,
}

/// Acknowledgement returned to the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileAck {
    /// The contribution transitioned to `status`.
    Updated {
        contribution_id: Uuid,
        status: ContributionStatus,
    },
    /// The record was already in a state this delivery cannot change.
    Unchanged { contribution_id: Uuid },
    /// Event type is not a charge event; acknowledged so the gateway
    /// stops retrying.
    Ignored { event: String },
}

impl ReconcileAck {
    pub fn message(&self) -> String {
        match self {
            ReconcileAck::Updated { status, .. } => {
                format!("Contribution status updated to {status}")
            }
            ReconcileAck::Unchanged { .. } => "Already processed".to_string(),
            ReconcileAck::Ignored { event } => format!("Ignored event type {event}"),
        }
    }
}

/// Fixed mapping from gateway charge statuses to contribution statuses.
pub fn map_gateway_status(gateway_status: &str) -> ContributionStatus {
    match gateway_status {
        "success" => ContributionStatus::Completed,
        "failed" | "abandoned" => ContributionStatus::Failed,
        _ => ContributionStatus::Processing,
    }
}

/// Decide the stored-status transition for an incoming mapped status.
///
/// `None` means no write: either the stored status is absorbing
/// (`completed`) or the update would be a no-op.
pub fn next_status(
    stored: ContributionStatus,
    incoming: ContributionStatus,
) -> Option<ContributionStatus> {
    if stored.is_absorbing() || stored == incoming {
        None
    } else {
        Some(incoming)
    }
}

/// Webhook Reconciler service.
pub struct WebhookReconciler {
    pool: PgPool,
    secret: String,
    feed: ChangeFeed,
}

impl WebhookReconciler {
    pub fn new(pool: PgPool, secret: String, feed: ChangeFeed) -> Self {
        Self { pool, secret, feed }
    }

    /// Verify the signature header against the HMAC of the raw body.
    ///
    /// Comparison is constant-time; hex case is normalized first.
    pub fn verify_signature(&self, raw_body: &[u8], signature: &str) -> FundResult<()> {
        let mut mac = HmacSha512::new_from_slice(self.secret.as_bytes())
            .map_err(|_| FundError::Internal("invalid webhook secret key".to_string()))?;
        mac.update(raw_body);
        let computed = hex::encode(mac.finalize().into_bytes());

        let received = signature.trim().to_ascii_lowercase();
        if computed.len() != received.len()
            || !bool::from(computed.as_bytes().ct_eq(received.as_bytes()))
        {
            tracing::warn!(
                payload_len = raw_body.len(),
                "Webhook signature mismatch"
            );
            return Err(FundError::WebhookSignatureInvalid);
        }
        Ok(())
    }

    /// Verify, parse, and apply one webhook delivery.
    pub async fn reconcile(&self, raw_body: &[u8], signature: &str) -> FundResult<ReconcileAck> {
        self.verify_signature(raw_body, signature)?;

        let event: GatewayEvent = serde_json::from_slice(raw_body)
            .map_err(|_| FundError::validation("malformed webhook payload"))?;

        // The gateway also delivers transfer/customer/etc. events; only
        // charge events describe a contribution.
        if !event.event.starts_with("charge.") {
            tracing::info!(event = %event.event, "Ignoring non-charge webhook event");
            return Ok(ReconcileAck::Ignored { event: event.event });
        }

        let reference = event
            .data
            .reference
            .ok_or_else(|| FundError::validation("missing reference in webhook payload"))?;

        let gateway_status = event.data.status.unwrap_or_else(|| {
            // Older event payloads omit data.status; the event name carries it.
            if event.event == "charge.success" {
                "success".to_string()
            } else {
                "failed".to_string()
            }
        });
        let incoming = map_gateway_status(&gateway_status);

        let row: Option<(Uuid, String, Uuid)> = sqlx::query_as(
            "SELECT id, status, user_id FROM contributions WHERE api_ref = $1",
        )
        .bind(&reference)
        .fetch_optional(&self.pool)
        .await?;

        // A miss must not reconcile a record into existence.
        let (contribution_id, stored_str, user_id) =
            row.ok_or_else(|| FundError::NotFound("contribution".to_string()))?;

        let stored = ContributionStatus::parse(&stored_str).ok_or_else(|| {
            FundError::Internal(format!("contribution has unknown status {stored_str}"))
        })?;

        let Some(next) = next_status(stored, incoming) else {
            tracing::info!(
                contribution_id = %contribution_id,
                stored = %stored,
                incoming = %incoming,
                "Webhook delivery is a no-op"
            );
            return Ok(ReconcileAck::Unchanged { contribution_id });
        };

        sqlx::query("UPDATE contributions SET status = $1 WHERE id = $2")
            .bind(next.as_str())
            .bind(contribution_id)
            .execute(&self.pool)
            .await?;

        self.feed.publish(ChangeKind::Updated, user_id);

        tracing::info!(
            contribution_id = %contribution_id,
            status = %next,
            "Contribution reconciled from webhook"
        );

        Ok(ReconcileAck::Updated {
            contribution_id,
            status: next,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn test_reconciler(secret: &str) -> WebhookReconciler {
        // Lazy pool: signature tests never touch the database.
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        WebhookReconciler::new(pool, secret.to_string(), ChangeFeed::new())
    }

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha512::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_valid_signature_accepted() {
        let reconciler = test_reconciler("sk_test_secret");
        let body = br#"{"event":"charge.success","data":{"reference":"fcf_x","status":"success"}}"#;
        let signature = sign("sk_test_secret", body);
        assert!(reconciler.verify_signature(body, &signature).is_ok());
    }

    #[test]
    fn test_uppercase_hex_signature_accepted() {
        let reconciler = test_reconciler("sk_test_secret");
        let body = b"{}";
        let signature = sign("sk_test_secret", body).to_ascii_uppercase();
        assert!(reconciler.verify_signature(body, &signature).is_ok());
    }

    #[test]
    fn test_tampered_body_rejected() {
        let reconciler = test_reconciler("sk_test_secret");
        let body = br#"{"event":"charge.success","data":{"reference":"fcf_x","status":"success"}}"#;
        let signature = sign("sk_test_secret", body);
        let tampered =
            br#"{"event":"charge.success","data":{"reference":"fcf_y","status":"success"}}"#;
        let err = reconciler.verify_signature(tampered, &signature).unwrap_err();
        assert!(matches!(err, FundError::WebhookSignatureInvalid));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let reconciler = test_reconciler("sk_live_other");
        let body = b"{}";
        let signature = sign("sk_test_secret", body);
        assert!(reconciler.verify_signature(body, &signature).is_err());
    }

    #[test]
    fn test_status_mapping_table() {
        assert_eq!(
            map_gateway_status("success"),
            ContributionStatus::Completed
        );
        assert_eq!(map_gateway_status("failed"), ContributionStatus::Failed);
        assert_eq!(map_gateway_status("abandoned"), ContributionStatus::Failed);
        assert_eq!(
            map_gateway_status("pending"),
            ContributionStatus::Processing
        );
        assert_eq!(
            map_gateway_status("ongoing"),
            ContributionStatus::Processing
        );
    }

    #[test]
    fn test_completed_absorbs_late_failure() {
        // Out-of-order delivery: failed arrives after completed.
        assert_eq!(
            next_status(ContributionStatus::Completed, ContributionStatus::Failed),
            None
        );
    }

    #[test]
    fn test_duplicate_completed_is_noop() {
        assert_eq!(
            next_status(ContributionStatus::Completed, ContributionStatus::Completed),
            None
        );
    }

    #[test]
    fn test_forward_transitions_apply() {
        assert_eq!(
            next_status(ContributionStatus::Processing, ContributionStatus::Completed),
            Some(ContributionStatus::Completed)
        );
        assert_eq!(
            next_status(ContributionStatus::Pending, ContributionStatus::Processing),
            Some(ContributionStatus::Processing)
        );
        // A failed record may still complete on a late success delivery.
        assert_eq!(
            next_status(ContributionStatus::Failed, ContributionStatus::Completed),
            Some(ContributionStatus::Completed)
        );
    }

    #[test]
    fn test_event_payload_parses() {
        let body = br#"{
            "event": "charge.success",
            "data": {"reference": "fcf_12345678_aa", "status": "success", "amount": 30000}
        }"#;
        let event: GatewayEvent = serde_json::from_slice(body).unwrap();
        assert_eq!(event.event, "charge.success");
        assert_eq!(event.data.reference.as_deref(), Some("fcf_12345678_aa"));
        assert_eq!(event.data.status.as_deref(), Some("success"));
    }

    #[test]
    fn test_non_charge_event_parses_without_data() {
        let body = br#"{"event": "transfer.success"}"#;
        let event: GatewayEvent = serde_json::from_slice(body).unwrap();
        assert!(event.data.reference.is_none());
    }
}
