/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use bugbridge_api::{app::AppState, config::Config};
/// use bugbridge_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(DatabaseConfig {
///     url: config.database.url.clone(),
///     ..Default::default()
/// })
/// .await?;
/// let app = bugbridge_api::app::build_router(AppState::new(pool, config));
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error::ApiError,
    middleware::envelope::stamp_request_path,
    routes,
};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state, Next},
    response::Response,
    routing::{delete, get, patch, post, put},
    Router,
};
use bugbridge_shared::auth::{context::AuthContext, jwt};
use bugbridge_shared::models::user::User;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: SqlitePool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET  /health
/// ├── /api/users
/// │   ├── POST   /register | /login | /refresh
/// │   ├── GET    /tester | /developer | /members
/// │   ├── GET    /all                     (admin)
/// │   ├── GET    /by-email?email=
/// │   ├── DELETE /by-email?email=         (admin)
/// │   ├── GET    /:id
/// │   └── PUT    /:id                     (bearer token)
/// ├── /api/bugs
/// │   ├── POST  /create
/// │   ├── GET   /allBugs?user_id= | /reported?user_id=
/// │   ├── GET   /:id
/// │   ├── PATCH /:id
/// │   └── PUT   /delete/:id
/// └── /api/assignments
///     ├── POST /
///     └── GET  /bug/:id | /tester/:id | /developer/:id
/// ```
///
/// # Middleware Stack
///
/// Outermost first: CORS, request tracing, envelope path stamping, then
/// bearer-token authentication on the routes marked above.
pub fn build_router(state: AppState) -> Router {
    let auth = || from_fn_with_state(state.clone(), jwt_auth_layer);

    let user_routes = Router::new()
        .route("/register", post(routes::users::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh))
        .route("/tester", get(routes::users::list_testers))
        .route("/developer", get(routes::users::list_developers))
        .route("/members", get(routes::users::list_members))
        .route("/all", get(routes::users::list_all).route_layer(auth()))
        .route(
            "/by-email",
            get(routes::users::find_by_email)
                .merge(delete(routes::users::delete_by_email).route_layer(auth())),
        )
        .route(
            "/:id",
            get(routes::users::find_by_id)
                .merge(put(routes::users::update_user).route_layer(auth())),
        );

    let bug_routes = Router::new()
        .route("/", get(routes::bugs::missing_id))
        .route("/create", post(routes::bugs::create_bug))
        .route("/allBugs", get(routes::bugs::list_bugs))
        .route("/reported", get(routes::bugs::list_reported))
        .route(
            "/:id",
            get(routes::bugs::find_bug).merge(patch(routes::bugs::update_bug)),
        )
        .route("/delete/:id", put(routes::bugs::delete_bug));

    let assignment_routes = Router::new()
        .route("/", post(routes::assignments::assign_bug))
        .route("/bug/:id", get(routes::assignments::history_for_bug))
        .route("/tester/:id", get(routes::assignments::by_tester))
        .route("/developer/:id", get(routes::assignments::for_developer));

    let cors = if state.config.allows_any_origin() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api/users", user_routes)
        .nest("/api/bugs", bug_routes)
        .nest("/api/assignments", assignment_routes)
        .fallback(route_not_found)
        .layer(from_fn(stamp_request_path))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

async fn route_not_found() -> ApiError {
    ApiError::NotFound("No such endpoint".to_string())
}

/// JWT authentication middleware layer
///
/// Validates the bearer access token, reloads the user it names and injects
/// an [`AuthContext`] built from the stored row, so deleted users are locked
/// out and role changes take effect immediately.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("Expected Bearer token".to_string()))?;

    let claims = jwt::validate_access_token(token, state.jwt_secret())?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User no longer exists".to_string()))?;

    tracing::debug!(user_id = user.id, role = %user.role, "Request authenticated");
    req.extensions_mut().insert(AuthContext::from(&user));

    Ok(next.run(req).await)
}
