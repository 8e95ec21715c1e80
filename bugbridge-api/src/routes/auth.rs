/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/users/login` - Exchange email and password for tokens
/// - `POST /api/users/refresh` - Exchange a refresh token for a new access token
///
/// Registration lives with the other user endpoints in [`super::users`].

use crate::{
    app::AppState,
    dto::{LoginRequest, RefreshRequest, UserResponse},
    error::{ApiError, ApiResult},
    extract::ValidatedJson,
    response::{AuthApiResponse, AuthPayload, Envelope},
};
use axum::{extract::State, http::StatusCode};
use bugbridge_shared::{
    auth::jwt,
    services::UserService,
};

/// Login endpoint
///
/// ```text
/// POST /api/users/login
/// Content-Type: application/json
///
/// { "email": "alice@x.com", "password": "secret123" }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "timestamp": "...", "status": 200, "message": "Login successful",
///   "path": "/api/users/login",
///   "user": { "id": 1, "name": "Alice", "email": "alice@x.com", "role": "TESTER" },
///   "accessToken": "eyJ...",
///   "refreshToken": "eyJ...",
///   "expiresIn": 86400
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown email or wrong password (indistinguishable)
/// - `422 Unprocessable Entity`: Missing fields
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<AuthApiResponse> {
    let user = UserService::new(&state.db)
        .authenticate(&req.email, &req.password)
        .await?;

    let tokens = jwt::issue_token_pair(user.id, user.role, state.jwt_secret())?;

    tracing::info!(user_id = user.id, "User logged in");

    Ok(Envelope::new(
        StatusCode::OK,
        "Login successful",
        AuthPayload {
            user: Some(UserResponse::from(user)),
            access_token: tokens.access_token,
            refresh_token: Some(tokens.refresh_token),
            expires_in: tokens.expires_in,
        },
    ))
}

/// Token refresh endpoint
///
/// The user is reloaded so the new access token carries the current role; a
/// deleted user cannot refresh.
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid, expired or non-refresh token, or user gone
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RefreshRequest>,
) -> ApiResult<AuthApiResponse> {
    let claims = jwt::validate_refresh_token(&req.refresh_token, state.jwt_secret())?;

    let user = UserService::new(&state.db)
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User no longer exists".to_string()))?;

    let access_claims = jwt::Claims::new(user.id, user.role, jwt::TokenType::Access);
    let access_token = jwt::create_token(&access_claims, state.jwt_secret())?;

    Ok(Envelope::new(
        StatusCode::OK,
        "Token refreshed",
        AuthPayload {
            user: None,
            access_token,
            refresh_token: None,
            expires_in: jwt::seconds_left(&access_claims),
        },
    ))
}
