/// Database models for BugBridge
///
/// This module contains the entities and their persistence functions. Every
/// function takes an executor, so the same call works against the pool or
/// inside a transaction (`&mut *tx`).
///
/// # Models
///
/// - `user`: User accounts and roles
/// - `bug`: Reported defects, their priority, status and assignee
/// - `bug_assignment`: Append-only history of tester to developer hand-offs
///
/// # Example
///
/// ```no_run
/// use bugbridge_shared::models::bug::{Bug, BugPriority, CreateBug};
/// use bugbridge_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let bug = Bug::create(&pool, CreateBug {
///     description: "Login button does nothing".to_string(),
///     priority: BugPriority::High,
///     reported_by: 1,
///     assigned_to: None,
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```

use serde::Serialize;
use std::fmt;

pub mod bug;
pub mod bug_assignment;
pub mod user;

/// A single rule broken by an input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}
