// API crate clippy configuration
// Test code patterns:
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! FinalCommit API Library
//!
//! This crate contains the HTTP server components for the FinalCommit
//! Fund: configuration, authentication middleware, route handlers, and
//! the error-to-response mapping.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod security;
pub mod state;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use state::AppState;
