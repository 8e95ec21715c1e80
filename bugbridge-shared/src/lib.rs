//! # BugBridge Shared Library
//!
//! Entity models, persistence, authentication primitives and the service
//! layer used by the BugBridge API server.
//!
//! ## Module Organization
//!
//! - `models`: Users, bugs and bug assignments with their queries
//! - `db`: SQLite pool and embedded migrations
//! - `auth`: Password hashing, JWT tokens, caller identity
//! - `services`: Business rules and the errors they return

pub mod auth;
pub mod db;
pub mod models;
pub mod services;

/// Current version of the BugBridge shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
