//! # TaskHub Shared Library
//!
//! Data layer and business logic behind the TaskHub API.
//!
//! ## Module Organization
//!
//! - `db`: connection pool and embedded migrations
//! - `models`: database models and their queries
//! - `auth`: service token, password hashing, reset tokens
//! - `crypto`: card number encryption
//! - `ledger`: money movement between balances

pub mod auth;
pub mod crypto;
pub mod db;
pub mod ledger;
pub mod models;

/// Current version of the TaskHub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
