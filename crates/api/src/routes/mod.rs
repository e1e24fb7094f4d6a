//! HTTP route wiring

pub mod account;
pub mod contributions;
pub mod payments;
pub mod profile;
pub mod reminders;
pub mod stats;
pub mod verification;
pub mod webhook;

use axum::middleware;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::auth::require_auth;
use crate::state::AppState;

/// Build the application router.
///
/// The webhook and verification-code endpoints are unauthenticated by
/// design: the webhook is called by the gateway (HMAC is its authenticity
/// boundary) and codes are requested before a session exists. Everything
/// else requires a verified bearer session.
pub fn create_router(state: AppState) -> Router {
    let auth_state = state.auth_state();

    let protected = Router::new()
        .route("/api/payments/initiate", post(payments::initiate_payment))
        .route("/api/contributions/me", get(contributions::my_contributions))
        .route("/api/stats", get(stats::public_stats))
        .route("/api/stats/members", get(stats::member_stats))
        .route(
            "/api/profile",
            get(profile::get_profile).patch(profile::update_profile),
        )
        .route(
            "/api/profile/complete-onboarding",
            post(profile::complete_onboarding),
        )
        .route("/api/reminders", post(reminders::generate_reminders))
        .route("/api/account", delete(account::delete_account))
        .layer(middleware::from_fn_with_state(auth_state, require_auth));

    Router::new()
        .route("/health", get(health))
        .route("/api/webhooks/paystack", post(webhook::paystack_webhook))
        .route("/api/auth/send-code", post(verification::send_code))
        .route("/api/auth/verify-code", post(verification::verify_code))
        .merge(protected)
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}
