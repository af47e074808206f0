//! # ProjectHub Shared Library
//!
//! Core types and business logic shared across the ProjectHub services.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their sqlx operations
//! - `access`: Project access resolution (membership, roles, admin bypass)
//! - `analytics`: Derived metrics over the relational store
//! - `search`: Best-effort semantic search index and sync
//! - `auth`: Password hashing and JWT primitives
//! - `db`: Connection pool and migrations
//! - `error`: Common error types

pub mod access;
pub mod analytics;
pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod search;

/// Current version of the ProjectHub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
