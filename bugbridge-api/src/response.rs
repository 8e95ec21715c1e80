/// Response envelopes
///
/// Every response body, success or failure, has the same shape:
///
/// ```json
/// {
///   "timestamp": "2025-03-01T12:00:00Z",
///   "status": 200,
///   "message": "Bug found",
///   "path": "/api/bugs/1",
///   "bug": { ... }
/// }
/// ```
///
/// The payload keys differ per resource and are omitted when empty. The HTTP
/// status always equals `status`. The request path is not known where the
/// envelope is built; [`crate::middleware::envelope::stamp_request_path`]
/// fills it in on the way out.

use crate::dto::{BugAssignmentDto, BugDto, UserResponse};
use crate::error::ValidationErrorDetail;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Envelope waiting for its `path`, carried as a response extension
#[derive(Debug, Clone)]
pub struct PendingEnvelope(pub serde_json::Value);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<P> {
    pub timestamp: DateTime<Utc>,
    pub status: u16,
    pub message: String,
    pub path: String,
    #[serde(flatten)]
    pub payload: P,
}

impl<P> Envelope<P> {
    pub fn new(status: StatusCode, message: impl Into<String>, payload: P) -> Self {
        Self {
            timestamp: Utc::now(),
            status: status.as_u16(),
            message: message.into(),
            path: String::new(),
            payload,
        }
    }
}

impl<P: Serialize> IntoResponse for Envelope<P> {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        match serde_json::to_value(&self) {
            Ok(body) => {
                let mut response = (status, Json(body.clone())).into_response();
                response.extensions_mut().insert(PendingEnvelope(body));
                response
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize response envelope");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BugPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bug: Option<BugDto>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bug_list: Option<Vec<BugDto>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_list: Option<Vec<UserResponse>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BugAssignmentPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bug_assignment: Option<BugAssignmentDto>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bug_assignment_list: Option<Vec<BugAssignmentDto>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,

    pub access_token: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Seconds until the access token expires
    pub expires_in: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Per-field details, only for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ValidationErrorDetail>>,
}

pub type BugApiResponse = Envelope<BugPayload>;
pub type UserApiResponse = Envelope<UserPayload>;
pub type BugAssignmentApiResponse = Envelope<BugAssignmentPayload>;
pub type AuthApiResponse = Envelope<AuthPayload>;
pub type ErrorResponse = Envelope<ErrorPayload>;

impl BugApiResponse {
    pub fn bug(status: StatusCode, message: impl Into<String>, bug: impl Into<BugDto>) -> Self {
        Envelope::new(
            status,
            message,
            BugPayload {
                bug: Some(bug.into()),
                bug_list: None,
            },
        )
    }

    pub fn bug_list<B: Into<BugDto>>(message: impl Into<String>, bugs: Vec<B>) -> Self {
        Envelope::new(
            StatusCode::OK,
            message,
            BugPayload {
                bug: None,
                bug_list: Some(bugs.into_iter().map(Into::into).collect()),
            },
        )
    }

    pub fn message_only(message: impl Into<String>) -> Self {
        Envelope::new(StatusCode::OK, message, BugPayload::default())
    }
}

impl UserApiResponse {
    pub fn user(status: StatusCode, message: impl Into<String>, user: impl Into<UserResponse>) -> Self {
        Envelope::new(
            status,
            message,
            UserPayload {
                user: Some(user.into()),
                user_list: None,
            },
        )
    }

    pub fn user_list<U: Into<UserResponse>>(message: impl Into<String>, users: Vec<U>) -> Self {
        Envelope::new(
            StatusCode::OK,
            message,
            UserPayload {
                user: None,
                user_list: Some(users.into_iter().map(Into::into).collect()),
            },
        )
    }

    pub fn message_only(message: impl Into<String>) -> Self {
        Envelope::new(StatusCode::OK, message, UserPayload::default())
    }
}

impl BugAssignmentApiResponse {
    pub fn assignment(
        status: StatusCode,
        message: impl Into<String>,
        assignment: impl Into<BugAssignmentDto>,
    ) -> Self {
        Envelope::new(
            status,
            message,
            BugAssignmentPayload {
                bug_assignment: Some(assignment.into()),
                bug_assignment_list: None,
            },
        )
    }

    pub fn assignment_list<A: Into<BugAssignmentDto>>(
        message: impl Into<String>,
        assignments: Vec<A>,
    ) -> Self {
        Envelope::new(
            StatusCode::OK,
            message,
            BugAssignmentPayload {
                bug_assignment: None,
                bug_assignment_list: Some(assignments.into_iter().map(Into::into).collect()),
            },
        )
    }
}

impl ErrorResponse {
    pub fn error(
        status: StatusCode,
        message: impl Into<String>,
        errors: Option<Vec<ValidationErrorDetail>>,
    ) -> Self {
        Envelope::new(status, message, ErrorPayload { errors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_payload_keys_are_omitted() {
        let envelope = BugApiResponse::message_only("Bug deleted successfully");
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["status"], 200);
        assert_eq!(json["message"], "Bug deleted successfully");
        assert_eq!(json["path"], "");
        assert!(json.get("timestamp").is_some());
        assert!(json.get("bug").is_none());
        assert!(json.get("bugList").is_none());
    }

    #[test]
    fn test_list_payload_key_is_camel_case() {
        let envelope = UserApiResponse::user_list::<UserResponse>("Users", vec![]);
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["userList"], serde_json::json!([]));
        assert!(json.get("user").is_none());
    }

    #[test]
    fn test_http_status_mirrors_envelope() {
        let response = ErrorResponse::error(StatusCode::NOT_FOUND, "Bug not found", None)
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let pending = response.extensions().get::<PendingEnvelope>().unwrap();
        assert_eq!(pending.0["status"], 404);
        assert!(pending.0.get("errors").is_none());
    }
}
