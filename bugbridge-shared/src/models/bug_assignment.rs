/// Bug assignment history
///
/// Every time a tester hands a bug to a developer a row is appended here. Rows
/// are never updated; they disappear only when the bug or one of the two users
/// is deleted.
///
/// Reads return [`BugAssignmentDetails`]: ids and display names, no nested
/// entities.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE bug_assignments (
///     id           INTEGER PRIMARY KEY AUTOINCREMENT,
///     bug_id       INTEGER NOT NULL REFERENCES bugs(id) ON DELETE CASCADE,
///     tester_id    INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     developer_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     assigned_at  TEXT NOT NULL
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqliteExecutor;

const SELECT_DETAILS: &str = "SELECT ba.id, t.name AS tester_name, d.name AS developer_name,
        ba.bug_id, ba.assigned_at
    FROM bug_assignments ba
    JOIN users t ON t.id = ba.tester_id
    JOIN users d ON d.id = ba.developer_id";

/// Raw assignment row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BugAssignment {
    pub id: i64,
    pub bug_id: i64,
    pub tester_id: i64,
    pub developer_id: i64,
    pub assigned_at: DateTime<Utc>,
}

/// Assignment as shown to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BugAssignmentDetails {
    pub id: i64,
    pub tester_name: String,
    pub developer_name: String,
    pub bug_id: i64,
    pub assigned_at: DateTime<Utc>,
}

/// Input for recording an assignment
#[derive(Debug, Clone)]
pub struct CreateBugAssignment {
    pub bug_id: i64,
    pub tester_id: i64,
    pub developer_id: i64,
}

impl BugAssignment {
    /// Appends an assignment stamped with the current time
    pub async fn create<'e>(
        db: impl SqliteExecutor<'e>,
        data: CreateBugAssignment,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, BugAssignment>(
            "INSERT INTO bug_assignments (bug_id, tester_id, developer_id, assigned_at)
             VALUES (?, ?, ?, ?)
             RETURNING id, bug_id, tester_id, developer_id, assigned_at",
        )
        .bind(data.bug_id)
        .bind(data.tester_id)
        .bind(data.developer_id)
        .bind(Utc::now())
        .fetch_one(db)
        .await
    }

    /// Loads the client-facing view of a single assignment
    pub async fn find_details<'e>(
        db: impl SqliteExecutor<'e>,
        id: i64,
    ) -> Result<Option<BugAssignmentDetails>, sqlx::Error> {
        sqlx::query_as::<_, BugAssignmentDetails>(&format!("{SELECT_DETAILS} WHERE ba.id = ?"))
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Assignment history of one bug, oldest first
    pub async fn list_by_bug<'e>(
        db: impl SqliteExecutor<'e>,
        bug_id: i64,
    ) -> Result<Vec<BugAssignmentDetails>, sqlx::Error> {
        sqlx::query_as::<_, BugAssignmentDetails>(&format!(
            "{SELECT_DETAILS} WHERE ba.bug_id = ? ORDER BY ba.assigned_at, ba.id"
        ))
        .bind(bug_id)
        .fetch_all(db)
        .await
    }

    /// Assignments a tester made
    pub async fn list_by_tester<'e>(
        db: impl SqliteExecutor<'e>,
        tester_id: i64,
    ) -> Result<Vec<BugAssignmentDetails>, sqlx::Error> {
        sqlx::query_as::<_, BugAssignmentDetails>(&format!(
            "{SELECT_DETAILS} WHERE ba.tester_id = ? ORDER BY ba.assigned_at, ba.id"
        ))
        .bind(tester_id)
        .fetch_all(db)
        .await
    }

    /// Assignments a developer received
    pub async fn list_by_developer<'e>(
        db: impl SqliteExecutor<'e>,
        developer_id: i64,
    ) -> Result<Vec<BugAssignmentDetails>, sqlx::Error> {
        sqlx::query_as::<_, BugAssignmentDetails>(&format!(
            "{SELECT_DETAILS} WHERE ba.developer_id = ? ORDER BY ba.assigned_at, ba.id"
        ))
        .bind(developer_id)
        .fetch_all(db)
        .await
    }
}
