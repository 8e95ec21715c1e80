/// Database layer for BugBridge
///
/// # Modules
///
/// - `pool`: SQLite connection pool with foreign keys enforced
/// - `migrations`: embedded schema migrations
///
/// Models and their queries live in the `models` module at crate root level.

pub mod migrations;
pub mod pool;
