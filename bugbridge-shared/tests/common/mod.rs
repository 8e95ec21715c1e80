//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use bugbridge_shared::db::migrations::run_migrations;
use bugbridge_shared::db::pool::{create_pool, DatabaseConfig};
use bugbridge_shared::models::user::{CreateUser, User, UserRole};
use sqlx::SqlitePool;

/// Fresh private in-memory database with the schema applied
pub async fn setup_pool() -> SqlitePool {
    let pool = create_pool(DatabaseConfig::in_memory())
        .await
        .expect("Failed to open in-memory database");
    run_migrations(&pool).await.expect("Failed to run migrations");
    pool
}

/// Inserts a user directly, skipping password hashing
pub async fn insert_user(pool: &SqlitePool, name: &str, email: &str, role: UserRole) -> User {
    User::create(
        pool,
        CreateUser {
            name: name.to_string(),
            email: email.to_string(),
            role,
            password_hash: "$argon2id$v=19$m=65536,t=3,p=4$placeholder".to_string(),
        },
    )
    .await
    .expect("Failed to insert user")
}

/// File-backed database URL unique to one test
pub fn temp_database_url(test_name: &str) -> String {
    let path = std::env::temp_dir().join(format!(
        "bugbridge-{}-{}.db",
        test_name,
        std::process::id()
    ));
    format!("sqlite://{}", path.display())
}

/// Removes a file database created from `temp_database_url`, with its WAL files
pub fn remove_database_files(url: &str) {
    let path = url.trim_start_matches("sqlite://");
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{}", path, suffix));
    }
}
