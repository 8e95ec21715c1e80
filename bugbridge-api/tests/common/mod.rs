//! Common test utilities for the HTTP tests
//!
//! Every [`TestContext`] owns a private in-memory database with the schema
//! applied and a bootstrap admin, plus the router built on top of it.
//! Requests go straight into the router; no socket is opened.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use bugbridge_api::app::{build_router, AppState};
use bugbridge_api::config::Config;
use bugbridge_shared::auth::jwt::{create_token, Claims, TokenType};
use bugbridge_shared::db::migrations::run_migrations;
use bugbridge_shared::db::pool::{create_pool, DatabaseConfig};
use bugbridge_shared::models::user::{User, UserRole};
use bugbridge_shared::services::UserService;
use serde_json::{json, Value};
use tower::ServiceExt;

pub const JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";
pub const ADMIN_EMAIL: &str = "admin@bugbridge.test";
pub const ADMIN_PASSWORD: &str = "admin-password-123";
pub const PASSWORD: &str = "secret123";

pub struct TestContext {
    pub app: axum::Router,
    pub db: sqlx::SqlitePool,
    pub config: Config,
    pub admin: User,
    pub admin_token: String,
}

impl TestContext {
    pub async fn new() -> anyhow::Result<Self> {
        let config = Config::from_lookup(|key| match key {
            "JWT_SECRET" => Some(JWT_SECRET.to_string()),
            "DATABASE_URL" => Some("sqlite::memory:".to_string()),
            _ => None,
        })?;

        let db = create_pool(DatabaseConfig::in_memory()).await?;
        run_migrations(&db).await?;

        let admin = UserService::new(&db)
            .ensure_admin("Site Admin", ADMIN_EMAIL, ADMIN_PASSWORD)
            .await?;
        let admin_token = token_for(admin.id, UserRole::Admin)?;

        let app = build_router(AppState::new(db.clone(), config.clone()));

        Ok(Self {
            app,
            db,
            config,
            admin,
            admin_token,
        })
    }

    /// Sends a request and returns the status and decoded JSON body
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        self.send_request(request).await
    }

    pub async fn send_request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                panic!("Non-JSON body ({}): {}", e, String::from_utf8_lossy(&bytes))
            })
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body), None).await
    }

    /// Registers a user through the API and returns the `user` object
    pub async fn register(&self, name: &str, email: &str, role: &str) -> Value {
        let (status, body) = self
            .post(
                "/api/users/register",
                json!({ "name": name, "email": email, "password": PASSWORD, "role": role }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        body["user"].clone()
    }

    /// Files a bug through the API and returns the `bug` object
    pub async fn create_bug(
        &self,
        reported_by: i64,
        assigned_to: Option<i64>,
        description: &str,
        priority: &str,
    ) -> Value {
        let (status, body) = self
            .post(
                "/api/bugs/create",
                json!({
                    "reportedBy": reported_by,
                    "assignedTo": assigned_to,
                    "description": description,
                    "priority": priority,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create bug failed: {}", body);
        body["bug"].clone()
    }
}

/// Access token for a user without going through login
pub fn token_for(user_id: i64, role: UserRole) -> anyhow::Result<String> {
    let claims = Claims::new(user_id, role, TokenType::Access);
    Ok(create_token(&claims, JWT_SECRET)?)
}

/// Id of a `user` / `bug` object returned by the API
pub fn id_of(value: &Value) -> i64 {
    value["id"].as_i64().expect("object has no numeric id")
}

/// Asserts the common envelope fields
pub fn assert_envelope(body: &Value, status: StatusCode, path: &str) {
    assert_eq!(body["status"], status.as_u16(), "envelope: {}", body);
    assert_eq!(body["path"], path, "envelope: {}", body);
    assert!(body["timestamp"].is_string(), "envelope: {}", body);
    assert!(body["message"].is_string(), "envelope: {}", body);
}
