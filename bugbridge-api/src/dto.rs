/// Request and response bodies
///
/// Requests are deserialized and validated at the edge; responses are flat
/// views of the models with camelCase keys. No DTO carries a password or
/// password hash.

use bugbridge_shared::models::bug::{Bug, BugPriority, BugStatus};
use bugbridge_shared::models::bug_assignment::BugAssignmentDetails;
use bugbridge_shared::models::user::{User, UserRole};
use bugbridge_shared::services::bug::{BugChanges, NewBug};
use bugbridge_shared::services::user::{NewUser, UserDetails};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BugDto {
    pub id: i64,
    pub description: String,
    pub priority: BugPriority,
    pub status: BugStatus,
    pub reported_by: i64,
    pub reported_by_name: String,
    pub assigned_to: Option<i64>,
    pub assigned_to_name: Option<String>,
    pub date_reported: DateTime<Utc>,
    pub is_deleted: bool,
}

impl From<Bug> for BugDto {
    fn from(bug: Bug) -> Self {
        Self {
            id: bug.id,
            description: bug.description,
            priority: bug.priority,
            status: bug.status,
            reported_by: bug.reported_by,
            reported_by_name: bug.reporter_name,
            assigned_to: bug.assigned_to,
            assigned_to_name: bug.assignee_name,
            date_reported: bug.reported_at,
            is_deleted: bug.is_deleted,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BugAssignmentDto {
    pub id: i64,
    pub tester_name: String,
    pub developer_name: String,
    pub bug_id: i64,
    pub assigned_at: DateTime<Utc>,
}

impl From<BugAssignmentDetails> for BugAssignmentDto {
    fn from(details: BugAssignmentDetails) -> Self {
        Self {
            id: details.id,
            tester_name: details.tester_name,
            developer_name: details.developer_name,
            bug_id: details.bug_id,
            assigned_at: details.assigned_at,
        }
    }
}

/// `POST /api/users/register`
///
/// Field rules (name pattern, email pattern, role) are enforced by the user
/// service; only presence and sizes are checked here.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Name is required."))]
    pub name: String,

    #[validate(length(min = 1, message = "Email is required."))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,

    #[validate(length(min = 1, message = "Role is required."))]
    pub role: String,
}

impl From<RegisterRequest> for NewUser {
    fn from(req: RegisterRequest) -> Self {
        Self {
            name: req.name,
            email: req.email,
            password: req.password,
            role: req.role,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required."))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(alias = "refresh_token")]
    #[validate(length(min = 1, message = "Refresh token is required."))]
    pub refresh_token: String,
}

/// `PUT /api/users/:id`
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

impl From<UpdateUserRequest> for UserDetails {
    fn from(req: UpdateUserRequest) -> Self {
        Self {
            name: req.name,
            email: req.email,
            password: req.password,
            role: req.role,
        }
    }
}

/// `POST /api/bugs/create`
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBugRequest {
    pub reported_by: i64,

    pub assigned_to: Option<i64>,

    #[validate(length(min = 1, max = 2000, message = "Description must be 1-2000 characters."))]
    pub description: String,

    #[validate(length(min = 1, message = "Priority is required."))]
    pub priority: String,
}

impl From<CreateBugRequest> for NewBug {
    fn from(req: CreateBugRequest) -> Self {
        Self {
            reported_by: req.reported_by,
            assigned_to: req.assigned_to,
            description: req.description,
            priority: req.priority,
        }
    }
}

/// `PATCH /api/bugs/:id`
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBugRequest {
    #[validate(length(min = 1, max = 2000, message = "Description must be 1-2000 characters."))]
    pub description: Option<String>,

    pub priority: Option<String>,

    pub status: Option<String>,

    pub assigned_to: Option<i64>,
}

impl From<UpdateBugRequest> for BugChanges {
    fn from(req: UpdateBugRequest) -> Self {
        Self {
            description: req.description,
            priority: req.priority,
            status: req.status,
            assigned_to: req.assigned_to,
        }
    }
}

/// `POST /api/assignments`
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignBugRequest {
    #[validate(range(min = 1, message = "bugId must be positive."))]
    pub bug_id: i64,

    #[validate(range(min = 1, message = "testerId must be positive."))]
    pub tester_id: i64,

    #[validate(range(min = 1, message = "developerId must be positive."))]
    pub developer_id: i64,
}

/// `?user_id=` filter on bug listings
#[derive(Debug, Default, Deserialize)]
pub struct UserIdQuery {
    #[serde(alias = "userId")]
    pub user_id: Option<i64>,
}

/// `?email=` on user lookups
#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bug_dto_uses_camel_case() {
        let dto = BugDto {
            id: 1,
            description: "Crash".to_string(),
            priority: BugPriority::High,
            status: BugStatus::InProgress,
            reported_by: 2,
            reported_by_name: "Alice".to_string(),
            assigned_to: None,
            assigned_to_name: None,
            date_reported: Utc::now(),
            is_deleted: false,
        };

        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["reportedBy"], 2);
        assert_eq!(json["reportedByName"], "Alice");
        assert_eq!(json["status"], "IN_PROGRESS");
        assert_eq!(json["isDeleted"], false);
        assert!(json["assignedTo"].is_null());
        assert!(json.get("dateReported").is_some());
    }

    #[test]
    fn test_user_response_has_no_password() {
        let json = serde_json::to_value(UserResponse {
            id: 1,
            name: "Alice".to_string(),
            email: "alice@x.com".to_string(),
            role: UserRole::Tester,
        })
        .unwrap();

        assert_eq!(json.as_object().unwrap().len(), 4);
        assert_eq!(json["role"], "TESTER");
    }

    #[test]
    fn test_create_bug_request_validation() {
        let req: CreateBugRequest = serde_json::from_str(
            r#"{"reportedBy": 1, "description": "", "priority": "low"}"#,
        )
        .unwrap();

        assert!(req.assigned_to.is_none());
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("description"));
    }

    #[test]
    fn test_refresh_request_accepts_both_spellings() {
        let a: RefreshRequest = serde_json::from_str(r#"{"refreshToken": "t"}"#).unwrap();
        let b: RefreshRequest = serde_json::from_str(r#"{"refresh_token": "t"}"#).unwrap();
        assert_eq!(a.refresh_token, b.refresh_token);
    }
}
