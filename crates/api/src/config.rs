//! Server configuration

use anyhow::Context;

/// Configuration read once at startup.
///
/// Required values fail fast with an error naming the variable; the
/// gateway/email/auth-admin clients read their own variables when the
/// fund service is constructed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Direct (non-pooled) URL for migrations; falls back to `database_url`.
    pub database_direct_url: Option<String>,
    pub bind_address: String,
    /// Shared secret the managed auth service signs session JWTs with.
    pub auth_jwt_secret: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            database_direct_url: std::env::var("DATABASE_DIRECT_URL")
                .ok()
                .filter(|v| !v.is_empty()),
            bind_address: std::env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            auth_jwt_secret: required("AUTH_JWT_SECRET")?,
        })
    }
}

fn required(name: &str) -> anyhow::Result<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .with_context(|| format!("required environment variable {name} is not set"))
}
