/// Bug endpoints
///
/// # Endpoints
///
/// - `POST  /api/bugs/create` - File a bug
/// - `GET   /api/bugs/allBugs?user_id=` - All bugs, or those assigned to a user
/// - `GET   /api/bugs/reported?user_id=` - Bugs reported by a user
/// - `GET   /api/bugs/:id` - Fetch one bug (soft-deleted bugs included, flagged)
/// - `PATCH /api/bugs/:id` - Partially update a bug
/// - `PUT   /api/bugs/delete/:id` - Soft-delete a bug

use crate::{
    app::AppState,
    dto::{CreateBugRequest, UpdateBugRequest, UserIdQuery},
    error::{ApiError, ApiResult},
    extract::{ApiPath, ApiQuery, ValidatedJson},
    response::BugApiResponse,
};
use axum::{extract::State, http::StatusCode};
use bugbridge_shared::services::BugService;

const MISSING_ID: &str = "Id Not provided";

fn parse_bug_id(raw: &str) -> ApiResult<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ApiError::BadRequest(MISSING_ID.to_string()))
}

/// File a bug
///
/// ```text
/// POST /api/bugs/create
/// Content-Type: application/json
///
/// { "reportedBy": 1, "assignedTo": 2, "description": "Crash on save", "priority": "high" }
/// ```
///
/// # Errors
///
/// - `404 Not Found`: Reporter or assignee does not exist
/// - `422 Unprocessable Entity`: Bad description or priority, or the assignee
///   is not a developer
pub async fn create_bug(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateBugRequest>,
) -> ApiResult<BugApiResponse> {
    let bug = BugService::new(&state.db).create_bug(req.into()).await?;

    Ok(BugApiResponse::bug(
        StatusCode::CREATED,
        "Bug created successfully",
        bug,
    ))
}

/// All bugs, or only those assigned to `user_id` when given
pub async fn list_bugs(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<UserIdQuery>,
) -> ApiResult<BugApiResponse> {
    let service = BugService::new(&state.db);

    let bugs = match query.user_id {
        Some(user_id) => service.find_by_assigned_to_id(user_id).await?,
        None => service.find_all().await?,
    };

    Ok(BugApiResponse::bug_list("Bugs retrieved", bugs))
}

pub async fn list_reported(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<UserIdQuery>,
) -> ApiResult<BugApiResponse> {
    let user_id = query
        .user_id
        .ok_or_else(|| ApiError::BadRequest("user_id is required".to_string()))?;

    let bugs = BugService::new(&state.db)
        .find_by_reported_by_id(user_id)
        .await?;

    Ok(BugApiResponse::bug_list("Reported bugs retrieved", bugs))
}

/// `GET /api/bugs` without an id
pub async fn missing_id() -> ApiError {
    ApiError::BadRequest(MISSING_ID.to_string())
}

/// Fetch one bug
///
/// # Errors
///
/// - `400 Bad Request`: Id is not a number ("Id Not provided")
/// - `404 Not Found`: No bug with that id ("Bug not found")
pub async fn find_bug(
    State(state): State<AppState>,
    ApiPath(raw_id): ApiPath<String>,
) -> ApiResult<BugApiResponse> {
    let id = parse_bug_id(&raw_id)?;
    let bug = BugService::new(&state.db).find_bug_by_id(id).await?;

    Ok(BugApiResponse::bug(StatusCode::OK, "Bug found", bug))
}

pub async fn update_bug(
    State(state): State<AppState>,
    ApiPath(raw_id): ApiPath<String>,
    ValidatedJson(req): ValidatedJson<UpdateBugRequest>,
) -> ApiResult<BugApiResponse> {
    let id = parse_bug_id(&raw_id)?;
    let bug = BugService::new(&state.db)
        .update_bug(id, req.into())
        .await?;

    Ok(BugApiResponse::bug(StatusCode::OK, "Bug updated successfully", bug))
}

/// Soft-delete a bug; it stays readable by id with `isDeleted: true`
pub async fn delete_bug(
    State(state): State<AppState>,
    ApiPath(raw_id): ApiPath<String>,
) -> ApiResult<BugApiResponse> {
    let id = parse_bug_id(&raw_id)?;
    BugService::new(&state.db).delete_bug(id).await?;

    Ok(BugApiResponse::message_only("Bug deleted successfully"))
}
