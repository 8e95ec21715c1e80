//! Bug management: creation with reporter/assignee checks, listing, lookup,
//! partial updates and soft deletion.

use sqlx::{SqliteExecutor, SqlitePool};
use tracing::{info, warn};

use super::error::{collect_violations, ServiceError, ServiceResult};
use crate::models::bug::{check_description, Bug, BugPriority, BugStatus, CreateBug, UpdateBug};
use crate::models::user::{User, UserRole};
use crate::models::FieldViolation;

/// Bug report as received from a client
#[derive(Debug, Clone)]
pub struct NewBug {
    pub reported_by: i64,
    pub assigned_to: Option<i64>,
    pub description: String,
    /// Priority name, parsed case-insensitively
    pub priority: String,
}

/// Partial bug update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct BugChanges {
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub assigned_to: Option<i64>,
}

pub struct BugService<'a> {
    pub db: &'a SqlitePool,
}

impl<'a> BugService<'a> {
    pub fn new(db: &'a SqlitePool) -> Self {
        Self { db }
    }

    /// Files a new bug in the OPEN state.
    ///
    /// # Returns
    /// - `Ok(Bug)` - The stored bug with reporter and assignee names
    /// - `Err(ServiceError::Validation)` - Bad description or priority, or the
    ///   assignee is not a developer (nothing is stored)
    /// - `Err(ServiceError::NotFound)` - Reporter or assignee does not exist
    pub async fn create_bug(&self, new_bug: NewBug) -> ServiceResult<Bug> {
        let priority = new_bug.priority.parse::<BugPriority>();
        collect_violations([
            check_description(&new_bug.description),
            priority.clone().map(|_| ()),
        ])?;
        let priority = priority?;

        if User::find_by_id(self.db, new_bug.reported_by).await?.is_none() {
            return Err(ServiceError::not_found(format!(
                "Reporter {} not found",
                new_bug.reported_by
            )));
        }

        if let Some(assignee_id) = new_bug.assigned_to {
            require_developer(self.db, assignee_id).await?;
        }

        let bug = Bug::create(
            self.db,
            CreateBug {
                description: new_bug.description.trim().to_string(),
                priority,
                reported_by: new_bug.reported_by,
                assigned_to: new_bug.assigned_to,
            },
        )
        .await?;

        info!(
            bug_id = bug.id,
            reported_by = bug.reported_by,
            assigned_to = ?bug.assigned_to,
            priority = %bug.priority,
            "Bug created"
        );
        Ok(bug)
    }

    /// All live bugs, oldest first
    pub async fn find_all(&self) -> ServiceResult<Vec<Bug>> {
        Ok(Bug::list_all(self.db).await?)
    }

    /// Live bugs assigned to a user; empty when there are none
    pub async fn find_by_assigned_to_id(&self, user_id: i64) -> ServiceResult<Vec<Bug>> {
        Ok(Bug::list_by_assignee(self.db, user_id).await?)
    }

    /// Live bugs reported by a user; empty when there are none
    pub async fn find_by_reported_by_id(&self, user_id: i64) -> ServiceResult<Vec<Bug>> {
        Ok(Bug::list_by_reporter(self.db, user_id).await?)
    }

    /// Looks up a bug by id, including soft-deleted ones
    pub async fn find_bug_by_id(&self, id: i64) -> ServiceResult<Bug> {
        Bug::find_by_id(self.db, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Bug not found"))
    }

    /// Applies a partial update to a live bug and returns the result.
    pub async fn update_bug(&self, id: i64, changes: BugChanges) -> ServiceResult<Bug> {
        let priority = changes.priority.as_deref().map(str::parse::<BugPriority>).transpose();
        let status = changes.status.as_deref().map(str::parse::<BugStatus>).transpose();

        collect_violations([
            changes.description.as_deref().map_or(Ok(()), check_description),
            priority.clone().map(|_| ()),
            status.clone().map(|_| ()),
        ])?;
        let (priority, status) = (priority?, status?);

        if let Some(assignee_id) = changes.assigned_to {
            require_developer(self.db, assignee_id).await?;
        }

        let rows = Bug::update(
            self.db,
            id,
            UpdateBug {
                description: changes.description.map(|d| d.trim().to_string()),
                priority,
                status,
                assigned_to: changes.assigned_to,
            },
        )
        .await?;

        if rows == 0 {
            return Err(ServiceError::not_found("Bug not found"));
        }

        info!(bug_id = id, "Bug updated");
        self.find_bug_by_id(id).await
    }

    /// Soft-deletes a bug; it stays readable by id but leaves every list.
    pub async fn delete_bug(&self, id: i64) -> ServiceResult<()> {
        if Bug::soft_delete(self.db, id).await? == 0 {
            return Err(ServiceError::not_found("Bug not found"));
        }

        info!(bug_id = id, "Bug deleted");
        Ok(())
    }
}

/// Loads a user and requires the DEVELOPER role
///
/// Missing user is `NotFound`; any other role is a validation failure on the
/// `assignedTo` field.
pub(crate) async fn require_developer<'e>(
    db: impl SqliteExecutor<'e>,
    user_id: i64,
) -> ServiceResult<User> {
    require_role(db, user_id, UserRole::Developer, "assignedTo").await
}

pub(crate) async fn require_role<'e>(
    db: impl SqliteExecutor<'e>,
    user_id: i64,
    role: UserRole,
    field: &str,
) -> ServiceResult<User> {
    let user = User::find_by_id(db, user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("User {} not found", user_id)))?;

    if user.role != role {
        warn!(user_id, expected = %role, actual = %user.role, "User has the wrong role");
        return Err(ServiceError::invalid(FieldViolation::new(
            field,
            format!("User {} is not a {}", user_id, role),
        )));
    }

    Ok(user)
}
