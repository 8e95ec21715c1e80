/// Bug assignment endpoints
///
/// # Endpoints
///
/// - `POST /api/assignments` - Hand a bug from a tester to a developer
/// - `GET  /api/assignments/bug/:id` - Assignment history of a bug
/// - `GET  /api/assignments/tester/:id` - Assignments made by a tester
/// - `GET  /api/assignments/developer/:id` - Assignments received by a developer

use crate::{
    app::AppState,
    dto::AssignBugRequest,
    error::ApiResult,
    extract::{ApiPath, ValidatedJson},
    response::BugAssignmentApiResponse,
};
use axum::{extract::State, http::StatusCode};
use bugbridge_shared::services::AssignmentService;

/// Assign a bug
///
/// ```text
/// POST /api/assignments
/// Content-Type: application/json
///
/// { "bugId": 1, "testerId": 2, "developerId": 3 }
/// ```
///
/// The bug's assignee becomes the developer and an OPEN bug moves to
/// IN_PROGRESS.
///
/// # Errors
///
/// - `404 Not Found`: Bug (or deleted bug), tester or developer missing
/// - `422 Unprocessable Entity`: Tester or developer has the wrong role
pub async fn assign_bug(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<AssignBugRequest>,
) -> ApiResult<BugAssignmentApiResponse> {
    let assignment = AssignmentService::new(&state.db)
        .assign(req.bug_id, req.tester_id, req.developer_id)
        .await?;

    Ok(BugAssignmentApiResponse::assignment(
        StatusCode::CREATED,
        "Bug assigned successfully",
        assignment,
    ))
}

pub async fn history_for_bug(
    State(state): State<AppState>,
    ApiPath(bug_id): ApiPath<i64>,
) -> ApiResult<BugAssignmentApiResponse> {
    let history = AssignmentService::new(&state.db)
        .history_for_bug(bug_id)
        .await?;

    Ok(BugAssignmentApiResponse::assignment_list(
        "Assignment history retrieved",
        history,
    ))
}

pub async fn by_tester(
    State(state): State<AppState>,
    ApiPath(tester_id): ApiPath<i64>,
) -> ApiResult<BugAssignmentApiResponse> {
    let assignments = AssignmentService::new(&state.db)
        .assignments_by_tester(tester_id)
        .await?;

    Ok(BugAssignmentApiResponse::assignment_list(
        "Tester assignments retrieved",
        assignments,
    ))
}

pub async fn for_developer(
    State(state): State<AppState>,
    ApiPath(developer_id): ApiPath<i64>,
) -> ApiResult<BugAssignmentApiResponse> {
    let assignments = AssignmentService::new(&state.db)
        .assignments_for_developer(developer_id)
        .await?;

    Ok(BugAssignmentApiResponse::assignment_list(
        "Developer assignments retrieved",
        assignments,
    ))
}
