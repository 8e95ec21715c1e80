/// Bug model and database operations
///
/// A bug is reported by one user and may be assigned to a developer. Bugs are
/// soft-deleted: `soft_delete` flips `is_deleted` and the row stays readable by
/// id but drops out of every list.
///
/// # Lifecycle
///
/// ```text
/// OPEN → IN_PROGRESS → RESOLVED
/// ```
///
/// Assigning a bug through an assignment moves it from OPEN to IN_PROGRESS;
/// any other status change is an explicit update.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE bugs (
///     id          INTEGER PRIMARY KEY AUTOINCREMENT,
///     description TEXT NOT NULL,
///     priority    TEXT NOT NULL,                  -- LOW | MEDIUM | HIGH
///     status      TEXT NOT NULL DEFAULT 'OPEN',   -- OPEN | IN_PROGRESS | RESOLVED
///     reported_by INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     assigned_to INTEGER REFERENCES users(id) ON DELETE CASCADE,
///     is_deleted  BOOLEAN NOT NULL DEFAULT 0,
///     reported_at TEXT NOT NULL,
///     updated_at  TEXT NOT NULL
/// );
/// ```

use super::FieldViolation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor};
use std::fmt;
use std::str::FromStr;

pub const MAX_DESCRIPTION_LENGTH: usize = 2000;

/// Reads bug rows together with the display names of reporter and assignee
const SELECT_BUG: &str = "SELECT b.id, b.description, b.priority, b.status,
        b.reported_by, r.name AS reporter_name,
        b.assigned_to, a.name AS assignee_name,
        b.is_deleted, b.reported_at, b.updated_at
    FROM bugs b
    JOIN users r ON r.id = b.reported_by
    LEFT JOIN users a ON a.id = b.assigned_to";

/// How urgent a bug is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BugPriority {
    Low,
    Medium,
    High,
}

impl BugPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            BugPriority::Low => "LOW",
            BugPriority::Medium => "MEDIUM",
            BugPriority::High => "HIGH",
        }
    }
}

impl fmt::Display for BugPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BugPriority {
    type Err = FieldViolation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "LOW" => Ok(BugPriority::Low),
            "MEDIUM" => Ok(BugPriority::Medium),
            "HIGH" => Ok(BugPriority::High),
            _ => Err(FieldViolation::new(
                "priority",
                format!("Invalid priority '{}': expected LOW, MEDIUM or HIGH", s.trim()),
            )),
        }
    }
}

/// Where a bug is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BugStatus {
    /// Reported, nobody working on it yet
    Open,

    /// Handed to a developer
    InProgress,

    /// Fixed
    Resolved,
}

impl BugStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BugStatus::Open => "OPEN",
            BugStatus::InProgress => "IN_PROGRESS",
            BugStatus::Resolved => "RESOLVED",
        }
    }
}

impl fmt::Display for BugStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BugStatus {
    type Err = FieldViolation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace([' ', '-'], "_").as_str() {
            "OPEN" => Ok(BugStatus::Open),
            "IN_PROGRESS" => Ok(BugStatus::InProgress),
            "RESOLVED" => Ok(BugStatus::Resolved),
            _ => Err(FieldViolation::new(
                "status",
                format!(
                    "Invalid status '{}': expected OPEN, IN_PROGRESS or RESOLVED",
                    s.trim()
                ),
            )),
        }
    }
}

/// Checks a bug description: present and at most 2000 characters
pub fn check_description(description: &str) -> Result<(), FieldViolation> {
    if description.trim().is_empty() {
        return Err(FieldViolation::new("description", "Description is required."));
    }
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(FieldViolation::new(
            "description",
            format!("Description must be at most {} characters.", MAX_DESCRIPTION_LENGTH),
        ));
    }
    Ok(())
}

/// Bug with the names of the users it references
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bug {
    pub id: i64,

    pub description: String,

    pub priority: BugPriority,

    pub status: BugStatus,

    /// User who reported the bug
    pub reported_by: i64,

    pub reporter_name: String,

    /// Developer working on the bug, if any
    pub assigned_to: Option<i64>,

    pub assignee_name: Option<String>,

    pub is_deleted: bool,

    pub reported_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new bug
#[derive(Debug, Clone)]
pub struct CreateBug {
    pub description: String,
    pub priority: BugPriority,
    pub reported_by: i64,
    pub assigned_to: Option<i64>,
}

/// Input for updating an existing bug
///
/// All fields are optional. Only non-None fields will be updated; the assignee
/// can be changed but not cleared.
#[derive(Debug, Clone, Default)]
pub struct UpdateBug {
    pub description: Option<String>,
    pub priority: Option<BugPriority>,
    pub status: Option<BugStatus>,
    pub assigned_to: Option<i64>,
}

impl Bug {
    /// Inserts a new bug in the OPEN state
    ///
    /// # Errors
    ///
    /// Returns a foreign-key error if the reporter or assignee does not exist.
    pub async fn create<'e>(
        db: impl SqliteExecutor<'e>,
        data: CreateBug,
    ) -> Result<Self, sqlx::Error> {
        let now = Utc::now();

        sqlx::query_as::<_, Bug>(
            "INSERT INTO bugs (description, priority, status, reported_by, assigned_to,
                               is_deleted, reported_at, updated_at)
             VALUES (?, ?, ?, ?, ?, 0, ?, ?)
             RETURNING id, description, priority, status,
                 reported_by,
                 (SELECT u.name FROM users u WHERE u.id = bugs.reported_by) AS reporter_name,
                 assigned_to,
                 (SELECT u.name FROM users u WHERE u.id = bugs.assigned_to) AS assignee_name,
                 is_deleted, reported_at, updated_at",
        )
        .bind(data.description)
        .bind(data.priority)
        .bind(BugStatus::Open)
        .bind(data.reported_by)
        .bind(data.assigned_to)
        .bind(now)
        .bind(now)
        .fetch_one(db)
        .await
    }

    /// Finds a bug by ID, soft-deleted or not
    pub async fn find_by_id<'e>(
        db: impl SqliteExecutor<'e>,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Bug>(&format!("{SELECT_BUG} WHERE b.id = ?"))
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Lists every live bug in the order it was reported
    pub async fn list_all<'e>(db: impl SqliteExecutor<'e>) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Bug>(&format!(
            "{SELECT_BUG} WHERE b.is_deleted = 0 ORDER BY b.id"
        ))
        .fetch_all(db)
        .await
    }

    /// Lists live bugs assigned to a user
    pub async fn list_by_assignee<'e>(
        db: impl SqliteExecutor<'e>,
        user_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Bug>(&format!(
            "{SELECT_BUG} WHERE b.assigned_to = ? AND b.is_deleted = 0 ORDER BY b.id"
        ))
        .bind(user_id)
        .fetch_all(db)
        .await
    }

    /// Lists live bugs reported by a user
    pub async fn list_by_reporter<'e>(
        db: impl SqliteExecutor<'e>,
        user_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Bug>(&format!(
            "{SELECT_BUG} WHERE b.reported_by = ? AND b.is_deleted = 0 ORDER BY b.id"
        ))
        .bind(user_id)
        .fetch_all(db)
        .await
    }

    /// Updates a live bug
    ///
    /// Returns the number of rows affected: 0 when the bug does not exist or
    /// has been soft-deleted.
    pub async fn update<'e>(
        db: impl SqliteExecutor<'e>,
        id: i64,
        data: UpdateBug,
    ) -> Result<u64, sqlx::Error> {
        let mut query = QueryBuilder::<Sqlite>::new("UPDATE bugs SET updated_at = ");
        query.push_bind(Utc::now());

        if let Some(description) = data.description {
            query.push(", description = ").push_bind(description);
        }
        if let Some(priority) = data.priority {
            query.push(", priority = ").push_bind(priority);
        }
        if let Some(status) = data.status {
            query.push(", status = ").push_bind(status);
        }
        if let Some(assigned_to) = data.assigned_to {
            query.push(", assigned_to = ").push_bind(assigned_to);
        }

        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" AND is_deleted = 0");

        let result = query.build().execute(db).await?;
        Ok(result.rows_affected())
    }

    /// Marks a bug as deleted
    ///
    /// Returns 0 if the bug does not exist or was already deleted.
    pub async fn soft_delete<'e>(db: impl SqliteExecutor<'e>, id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE bugs SET is_deleted = 1, updated_at = ? WHERE id = ? AND is_deleted = 0",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(db)
        .await?;

        Ok(result.rows_affected())
    }
}
