#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use flaskr_blog::register_user;
use flaskr_server::{config::ConfigOverrides, create_app, App};
use rusqlite::Connection;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

/// An initialized application with two users (`test`, `other`, password equal
/// to the name) and one post by `test`.
pub struct TestApp {
    pub app: App,
    pub dir: TempDir,
}

pub fn overrides_for(dir: &TempDir) -> ConfigOverrides {
    ConfigOverrides {
        secret_key: Some("test".to_string()),
        database: Some(dir.path().join("test.sqlite")),
        ..ConfigOverrides::default()
    }
}

pub fn test_app() -> TestApp {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let app = create_app(dir.path().join("instance"), Some(overrides_for(&dir)))
        .expect("failed to create app");
    app.init_db().expect("failed to initialize database");

    let conn = Connection::open(&app.config().database).expect("failed to open database");
    register_user(&conn, "test", "test").expect("failed to seed user");
    register_user(&conn, "other", "other").expect("failed to seed user");
    conn.execute(
        "INSERT INTO post (title, body, author_id, created)
         VALUES ('test title', 'test\nbody', 1, '2018-01-01 00:00:00')",
        [],
    )
    .expect("failed to seed post");

    TestApp { app, dir }
}

/// `Authorization` header value for HTTP Basic credentials.
pub fn basic_auth(username: &str, password: &str) -> String {
    use base64::Engine;
    let encoded =
        base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", username, password));
    format!("Basic {}", encoded)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: Value, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn send(router: Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.oneshot(req).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

pub async fn send_json(router: Router, req: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(router, req).await;
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

pub fn count_rows(app: &App, table: &str) -> i64 {
    let conn = Connection::open(&app.config().database).unwrap();
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
        row.get(0)
    })
    .unwrap()
}
