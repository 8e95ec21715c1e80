/// User endpoints
///
/// # Endpoints
///
/// - `POST   /api/users/register` - Register a developer or tester
/// - `GET    /api/users/tester` - List testers
/// - `GET    /api/users/developer` - List developers
/// - `GET    /api/users/members` - List developers and testers
/// - `GET    /api/users/all` - List every user (admin)
/// - `GET    /api/users/:id` - Fetch a user
/// - `GET    /api/users/by-email?email=` - Fetch a user by email
/// - `PUT    /api/users/:id` - Partially update a user (self or admin)
/// - `DELETE /api/users/by-email?email=` - Delete a user and everything tied to it (admin)

use crate::{
    app::AppState,
    dto::{EmailQuery, RegisterRequest, UpdateUserRequest},
    error::{ApiError, ApiResult},
    extract::{ApiPath, ApiQuery, ValidatedJson},
    response::UserApiResponse,
};
use axum::{extract::State, http::StatusCode, Extension};
use bugbridge_shared::{auth::context::AuthContext, services::UserService};

/// Register a new user
///
/// ```text
/// POST /api/users/register
/// Content-Type: application/json
///
/// { "name": "Alice", "email": "alice@x.com", "password": "secret123", "role": "TESTER" }
/// ```
///
/// # Errors
///
/// - `403 Forbidden`: Role `ADMIN` requested
/// - `409 Conflict`: Email already registered
/// - `422 Unprocessable Entity`: Name, email, password or role malformed
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<UserApiResponse> {
    let user = UserService::new(&state.db).register(req.into()).await?;

    Ok(UserApiResponse::user(
        StatusCode::CREATED,
        "User registered successfully",
        user,
    ))
}

pub async fn list_testers(State(state): State<AppState>) -> ApiResult<UserApiResponse> {
    let testers = UserService::new(&state.db).list_testers().await?;
    Ok(UserApiResponse::user_list("Testers retrieved", testers))
}

pub async fn list_developers(State(state): State<AppState>) -> ApiResult<UserApiResponse> {
    let developers = UserService::new(&state.db).list_developers().await?;
    Ok(UserApiResponse::user_list("Developers retrieved", developers))
}

pub async fn list_members(State(state): State<AppState>) -> ApiResult<UserApiResponse> {
    let members = UserService::new(&state.db)
        .list_developers_and_testers()
        .await?;
    Ok(UserApiResponse::user_list("Developers and testers retrieved", members))
}

/// Every account, admins included; admin callers only
pub async fn list_all(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthContext>,
) -> ApiResult<UserApiResponse> {
    let users = UserService::new(&state.db).list_all_users(&caller).await?;
    Ok(UserApiResponse::user_list("Users retrieved", users))
}

pub async fn find_by_id(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<UserApiResponse> {
    let user = UserService::new(&state.db)
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(UserApiResponse::user(StatusCode::OK, "User found", user))
}

pub async fn find_by_email(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<EmailQuery>,
) -> ApiResult<UserApiResponse> {
    let user = UserService::new(&state.db)
        .find_by_email(&query.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(UserApiResponse::user(StatusCode::OK, "User found", user))
}

/// Partially update a user
///
/// Only the fields present in the body change. Non-admins may only update
/// themselves and may not change their role.
///
/// # Errors
///
/// - `403 Forbidden`: Updating someone else, or a role, without being admin
/// - `404 Not Found`: No such user
/// - `409 Conflict`: New email belongs to another user
pub async fn update_user(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthContext>,
    ApiPath(id): ApiPath<i64>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<UserApiResponse> {
    let service = UserService::new(&state.db);
    let rows = service.update_user(&caller, id, req.into()).await?;

    let user = service
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(UserApiResponse::user(
        StatusCode::OK,
        format!("User updated successfully ({} row(s) affected)", rows),
        user,
    ))
}

/// Delete a user by email; admin callers only
///
/// Bugs the user reported or was assigned and their assignment records are
/// deleted with the account.
pub async fn delete_by_email(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthContext>,
    ApiQuery(query): ApiQuery<EmailQuery>,
) -> ApiResult<UserApiResponse> {
    UserService::new(&state.db)
        .delete_user(&caller, &query.email)
        .await?;

    Ok(UserApiResponse::message_only("User deleted successfully"))
}
