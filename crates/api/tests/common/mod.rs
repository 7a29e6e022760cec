#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use portal_api::auth::jwt::{generate_access_token, JwtConfig};
use portal_api::auth::password::hash_password;
use portal_api::config::ServerConfig;
use portal_api::router::build_app_router;
use portal_api::state::AppState;
use portal_api::storage::AttachmentStore;
use portal_core::navigation::default_tree;
use portal_core::roles::{PERM_APPROVALS, ROLE_ADMIN, ROLE_USER};
use portal_core::types::DbId;
use portal_db::models::employee::CreateEmployee;
use portal_db::repositories::EmployeeRepo;
use portal_events::{EmailError, Mailer};

pub const TEST_PASSWORD: &str = "front-desk-2026!";

/// Build a test `ServerConfig` with safe defaults and the given upload root.
pub fn test_config(upload_dir: PathBuf) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-secret-for-portal-api".to_string(),
            access_token_expiry_mins: 60,
        },
        upload_dir,
        max_upload_bytes: 5 * 1024 * 1024,
    }
}

// ---------------------------------------------------------------------------
// Mail capture
// ---------------------------------------------------------------------------

/// One message handed to the mailer.
#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Mailer that records every message instead of sending it.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &[String], subject: &str, body: &str) -> Result<(), EmailError> {
        self.sent.lock().unwrap().push(SentMail {
            to: to.to_vec(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// The router plus everything a test may want to inspect.
pub struct TestApp {
    pub router: Router,
    pub mailer: Arc<RecordingMailer>,
    pub config: ServerConfig,
    /// Keeps the attachment root alive for the test's duration.
    pub upload_dir: tempfile::TempDir,
}

/// Build the full application router with the production middleware stack.
pub fn build_test_app(pool: PgPool) -> TestApp {
    let upload_dir = tempfile::tempdir().expect("temp upload dir");
    let config = test_config(upload_dir.path().to_path_buf());
    let mailer = Arc::new(RecordingMailer::default());

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        mailer: mailer.clone(),
        attachments: Arc::new(AttachmentStore::new(upload_dir.path())),
        navigation: Arc::new(default_tree()),
    };

    TestApp {
        router: build_app_router(state, &config),
        mailer,
        config,
        upload_dir,
    }
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

/// Create an active account; `approvals` grants the module flag.
pub async fn seed_user(pool: &PgPool, loginname: &str, admin: bool, approvals: bool) -> DbId {
    let role = if admin { ROLE_ADMIN } else { ROLE_USER };
    let password_hash = hash_password(TEST_PASSWORD).expect("hashing should succeed");
    let id: DbId = sqlx::query_scalar(
        "INSERT INTO users (loginname, display_name, password_hash, role)
         VALUES ($1, $1, $2, $3)
         RETURNING id",
    )
    .bind(loginname)
    .bind(&password_hash)
    .bind(role)
    .fetch_one(pool)
    .await
    .expect("user creation should succeed");
    if approvals {
        sqlx::query("INSERT INTO user_permissions (user_id, perm_key, value) VALUES ($1, $2, TRUE)")
            .bind(id)
            .bind(PERM_APPROVALS)
            .execute(pool)
            .await
            .expect("permission grant should succeed");
    }
    id
}

pub async fn seed_employee(pool: &PgPool, english_name: &str, name: &str, email: &str, dept: &str) {
    EmployeeRepo::create(
        pool,
        &CreateEmployee {
            english_name: english_name.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            department: dept.to_string(),
            ..Default::default()
        },
    )
    .await
    .expect("employee creation should succeed");
}

/// Bearer token for a seeded user.
pub fn token_for(app: &TestApp, user_id: DbId) -> String {
    generate_access_token(user_id, &app.config.jwt).expect("token generation should succeed")
}

/// Seed a user with module access and return their token.
pub async fn login_as(app: &TestApp, pool: &PgPool, loginname: &str) -> String {
    let id = seed_user(pool, loginname, false, true).await;
    token_for(app, id)
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes()
        .to_vec()
}

async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.expect("request should complete")
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::get(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_auth(app: &Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::get(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::post(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json_auth(
    app: &Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let request = Request::post(uri)
        .header(CONTENT_TYPE, "application/json")
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn put_json_auth(
    app: &Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let request = Request::put(uri)
        .header(CONTENT_TYPE, "application/json")
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn delete_auth(app: &Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::delete(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

const BOUNDARY: &str = "portal-test-boundary";

/// One part of a multipart body: `(name, Some(filename), bytes)` for files.
pub struct Part<'a> {
    pub name: &'a str,
    pub filename: Option<&'a str>,
    pub bytes: &'a [u8],
}

impl<'a> Part<'a> {
    pub fn text(name: &'a str, value: &'a str) -> Self {
        Self {
            name,
            filename: None,
            bytes: value.as_bytes(),
        }
    }

    pub fn file(name: &'a str, filename: &'a str, bytes: &'a [u8]) -> Self {
        Self {
            name,
            filename: Some(filename),
            bytes,
        }
    }
}

pub async fn post_multipart_auth(
    app: &Router,
    uri: &str,
    token: &str,
    parts: &[Part<'_>],
) -> Response<Body> {
    let mut body: Vec<u8> = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part.filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{filename}\"\r\n\
                     Content-Type: text/plain\r\n\r\n",
                    part.name
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.name)
                    .as_bytes(),
            ),
        }
        body.extend_from_slice(part.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let request = Request::post(uri)
        .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

// ---------------------------------------------------------------------------
// Workflow shortcuts
// ---------------------------------------------------------------------------

/// Submit a JSON request and return its id.
pub async fn create_approval(
    app: &TestApp,
    token: &str,
    subject: &str,
    approvers: &[&str],
    scope: &str,
) -> DbId {
    let response = post_json_auth(
        &app.router,
        "/api/v1/approvals",
        token,
        serde_json::json!({
            "subject": subject,
            "description": "<p>Details</p>",
            "approver_names": approvers,
            "visibility_scope": scope,
        }),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["data"]["id"]
        .as_i64()
        .expect("created approval id")
}

/// Record a decision and return the response.
pub async fn decide(
    app: &TestApp,
    token: &str,
    approval_id: DbId,
    action: &str,
    comment: Option<&str>,
) -> Response<Body> {
    post_json_auth(
        &app.router,
        &format!("/api/v1/approvals/{approval_id}/decision"),
        token,
        serde_json::json!({ "action": action, "comment": comment }),
    )
    .await
}

/// Fetch the detail view JSON (`data` field).
pub async fn detail(app: &TestApp, token: &str, approval_id: DbId) -> serde_json::Value {
    let response = get_auth(&app.router, &format!("/api/v1/approvals/{approval_id}"), token).await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    body_json(response).await["data"].clone()
}
