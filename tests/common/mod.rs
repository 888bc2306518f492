//! Shared helpers for the HTTP integration tests.
//!
//! Every test gets its own in-memory database and media directory and drives
//! the full application (trailing slash normalization, CORS, stats layer)
//! through `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use tower_http::normalize_path::NormalizePath;

use gabi::api::{build_app, AppState};
use gabi::config::{MediaConfig, ServerConfig};
use gabi::db::{create_test_pool, migrations};
use gabi::models::{CreateUserInput, UserRole};

pub const ADMIN_PASSWORD: &str = "admin-secret-1";
pub const EDITOR_PASSWORD: &str = "editor-secret-1";

pub struct TestApp {
    pub app: NormalizePath<Router>,
    pub state: AppState,
    pub media_dir: TempDir,
}

/// Build the application over a fresh migrated database, as if deployed
/// behind a proxy that sets `X-Forwarded-For`
pub async fn spawn_app() -> TestApp {
    let server = ServerConfig {
        trust_proxy_headers: true,
        ..ServerConfig::default()
    };
    spawn_app_with(server, |_| {}).await
}

/// Build the application with an explicit server config and media tweaks
pub async fn spawn_app_with(
    server: ServerConfig,
    configure_media: impl FnOnce(&mut MediaConfig),
) -> TestApp {
    let pool = create_test_pool().await.expect("test pool");
    migrations::run_migrations(&pool).await.expect("migrations");

    let media_dir = tempfile::tempdir().expect("media dir");
    let mut media = MediaConfig {
        root: media_dir.path().to_path_buf(),
        ..MediaConfig::default()
    };
    configure_media(&mut media);

    let state = AppState::new(pool, media, None);
    let app = build_app(state.clone(), &server);

    TestApp {
        app,
        state,
        media_dir,
    }
}

/// Read a response body as JSON; empty bodies become `Value::Null`
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("JSON body")
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.expect("infallible")
    }

    pub async fn call(
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
        .expect("request");

        let response = self.send(request).await;
        let status = response.status();
        (status, body_json(response).await)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, None, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, Some(body), None).await
    }

    /// POST /api/core/lead from a given client address
    pub async fn post_lead(&self, client: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/core/lead/")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", client)
            .body(Body::from(body.to_string()))
            .expect("request");
        let response = self.send(request).await;
        let status = response.status();
        (status, body_json(response).await)
    }

    pub async fn create_user(&self, username: &str, password: &str, role: UserRole) {
        self.state
            .user_service
            .create_user(&CreateUserInput {
                username: username.to_string(),
                email: format!("{}@gabi.club", username),
                password: password.to_string(),
                role: Some(role),
            })
            .await
            .expect("create user");
    }

    pub async fn login(&self, username: &str, password: &str) -> String {
        let (status, body) = self
            .post(
                "/api/auth/login",
                serde_json::json!({"username_or_email": username, "password": password}),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["token"].as_str().expect("token").to_string()
    }

    /// Session token of a freshly created admin
    pub async fn admin_token(&self) -> String {
        self.create_user("admin", ADMIN_PASSWORD, UserRole::Admin).await;
        self.login("admin", ADMIN_PASSWORD).await
    }

    /// Session token of a freshly created editor
    pub async fn editor_token(&self) -> String {
        self.create_user("editor", EDITOR_PASSWORD, UserRole::Editor).await;
        self.login("editor", EDITOR_PASSWORD).await
    }

    /// Create through the admin API and return the created object
    pub async fn admin_create(&self, token: &str, uri: &str, body: Value) -> Value {
        let (status, created) = self.call(Method::POST, uri, Some(body), Some(token)).await;
        assert_eq!(status, StatusCode::CREATED, "create {} failed: {}", uri, created);
        created
    }
}
