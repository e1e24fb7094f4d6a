// Shared crate clippy configuration
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! FinalCommit Shared Library
//!
//! Database pool construction and migration running, shared between the
//! API server and the fund domain crate.

pub mod db;

pub use db::{create_migration_pool, create_pool, run_migrations};
