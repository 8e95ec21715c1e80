//! Tester to developer hand-offs and their history.

use sqlx::SqlitePool;
use tracing::info;

use super::bug::require_role;
use super::error::{ServiceError, ServiceResult};
use crate::models::bug::{Bug, BugStatus, UpdateBug};
use crate::models::bug_assignment::{BugAssignment, BugAssignmentDetails, CreateBugAssignment};
use crate::models::user::UserRole;

pub struct AssignmentService<'a> {
    pub db: &'a SqlitePool,
}

impl<'a> AssignmentService<'a> {
    pub fn new(db: &'a SqlitePool) -> Self {
        Self { db }
    }

    /// Hands a bug from a tester to a developer.
    ///
    /// In one transaction: checks the bug is live and both users hold the
    /// right roles, points the bug at the developer (OPEN becomes
    /// IN_PROGRESS) and appends an assignment record.
    ///
    /// # Returns
    /// - `Ok(BugAssignmentDetails)` - The new history entry
    /// - `Err(ServiceError::NotFound)` - Bug, tester or developer missing
    /// - `Err(ServiceError::Validation)` - Tester or developer has the wrong role
    pub async fn assign(
        &self,
        bug_id: i64,
        tester_id: i64,
        developer_id: i64,
    ) -> ServiceResult<BugAssignmentDetails> {
        let mut tx = self.db.begin().await?;

        let bug = Bug::find_by_id(&mut *tx, bug_id)
            .await?
            .filter(|bug| !bug.is_deleted)
            .ok_or_else(|| ServiceError::not_found("Bug not found"))?;

        require_role(&mut *tx, tester_id, UserRole::Tester, "testerId").await?;
        require_role(&mut *tx, developer_id, UserRole::Developer, "developerId").await?;

        let status = (bug.status == BugStatus::Open).then_some(BugStatus::InProgress);
        Bug::update(
            &mut *tx,
            bug_id,
            UpdateBug {
                status,
                assigned_to: Some(developer_id),
                ..Default::default()
            },
        )
        .await?;

        let assignment = BugAssignment::create(
            &mut *tx,
            CreateBugAssignment {
                bug_id,
                tester_id,
                developer_id,
            },
        )
        .await?;

        let details = BugAssignment::find_details(&mut *tx, assignment.id)
            .await?
            .ok_or(ServiceError::Database(sqlx::Error::RowNotFound))?;

        tx.commit().await?;

        info!(
            assignment_id = assignment.id,
            bug_id,
            tester_id,
            developer_id,
            "Bug assigned"
        );
        Ok(details)
    }

    /// Assignment history of a bug, oldest first
    pub async fn history_for_bug(&self, bug_id: i64) -> ServiceResult<Vec<BugAssignmentDetails>> {
        if Bug::find_by_id(self.db, bug_id).await?.is_none() {
            return Err(ServiceError::not_found("Bug not found"));
        }

        Ok(BugAssignment::list_by_bug(self.db, bug_id).await?)
    }

    pub async fn assignments_by_tester(
        &self,
        tester_id: i64,
    ) -> ServiceResult<Vec<BugAssignmentDetails>> {
        Ok(BugAssignment::list_by_tester(self.db, tester_id).await?)
    }

    pub async fn assignments_for_developer(
        &self,
        developer_id: i64,
    ) -> ServiceResult<Vec<BugAssignmentDetails>> {
        Ok(BugAssignment::list_by_developer(self.db, developer_id).await?)
    }
}
