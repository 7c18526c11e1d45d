//! Handler tests for the users domain
//!
//! Drive the router with in-memory storage and real JWTs:
//! - login success and failure
//! - staff guard (missing token, customer token, deactivated account)
//! - admin-only account creation

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::Router;
use axum_helpers::{JwtAuth, JwtConfig};
use domain_users::*;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt; // For oneshot()

const SECRET: &str = "handler-test-secret-at-least-32-chars!";

async fn json_body<T: serde::de::DeserializeOwned>(body: Body) -> T {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

struct TestApp {
    app: Router,
    repo: InMemoryUserRepository,
    auth: JwtAuth,
}

async fn setup() -> TestApp {
    let repo = InMemoryUserRepository::new();
    let auth = JwtAuth::new(&JwtConfig::new(SECRET, 3600).unwrap());
    let service = UserService::new(repo.clone(), auth.clone());

    service
        .reset_admin("admin", "admin@example.com", "admin-pass")
        .await
        .unwrap();

    let guarded = auth.clone().with_staff_validator(service.principal_validator());
    TestApp {
        app: handlers::router(service, guarded),
        repo,
        auth,
    }
}

fn post_json(uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

async fn login_token(app: &Router, username: &str, password: &str) -> String {
    let response = app
        .clone()
        .oneshot(post_json(
            "/auth/login",
            json!({ "username": username, "password": password }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: LoginResponse = json_body(response.into_body()).await;
    body.access_token
}

#[tokio::test]
async fn test_login_returns_token_and_profile() {
    let t = setup().await;

    let response = t
        .app
        .oneshot(post_json(
            "/auth/login",
            json!({ "username": "admin", "password": "admin-pass" }),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = json_body(response.into_body()).await;
    assert!(body["access_token"].as_str().unwrap().len() > 20);
    assert_eq!(body["user"]["username"], "admin");
    assert_eq!(body["user"]["role"], "admin");
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_login_with_bad_password_returns_401() {
    let t = setup().await;

    let response = t
        .app
        .oneshot(post_json(
            "/auth/login",
            json!({ "username": "admin", "password": "nope-nope" }),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = json_body(response.into_body()).await;
    assert_eq!(body["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_me_requires_token() {
    let t = setup().await;

    let response = t.app.oneshot(get("/auth/me", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_rejects_customer_token() {
    let t = setup().await;
    let token = t
        .auth
        .create_customer_token(uuid::Uuid::now_v7(), "buyer@example.com")
        .unwrap();

    let response = t.app.oneshot(get("/auth/me", Some(&token))).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_me_returns_profile() {
    let t = setup().await;
    let token = login_token(&t.app, "admin", "admin-pass").await;

    let response = t.app.oneshot(get("/auth/me", Some(&token))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let user: UserResponse = json_body(response.into_body()).await;
    assert_eq!(user.username, "admin");
    assert_eq!(user.role, UserRole::Admin);
}

#[tokio::test]
async fn test_deactivated_user_token_is_rejected() {
    let t = setup().await;
    let token = login_token(&t.app, "admin", "admin-pass").await;

    let mut admin = t.repo.get_by_username("admin").await.unwrap().unwrap();
    admin.is_active = false;
    t.repo.update(admin).await.unwrap();

    let response = t.app.oneshot(get("/users", Some(&token))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_creates_user_and_duplicate_conflicts() {
    let t = setup().await;
    let token = login_token(&t.app, "admin", "admin-pass").await;

    let body = json!({
        "username": "manager1",
        "email": "manager1@example.com",
        "password": "secret1",
        "full_name": "Manager One"
    });

    let response = t
        .app
        .clone()
        .oneshot(post_json("/users", body.clone(), Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: UserResponse = json_body(response.into_body()).await;
    assert_eq!(created.role, UserRole::Manager);

    let response = t
        .app
        .oneshot(post_json("/users", body, Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_manager_cannot_create_users() {
    let t = setup().await;
    let admin_token = login_token(&t.app, "admin", "admin-pass").await;

    t.app
        .clone()
        .oneshot(post_json(
            "/users",
            json!({
                "username": "manager2",
                "email": "manager2@example.com",
                "password": "secret2"
            }),
            Some(&admin_token),
        ))
        .await
        .unwrap();

    let manager_token = login_token(&t.app, "manager2", "secret2").await;

    let response = t
        .app
        .oneshot(post_json(
            "/users",
            json!({
                "username": "manager3",
                "email": "manager3@example.com",
                "password": "secret3"
            }),
            Some(&manager_token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_user_validates_input() {
    let t = setup().await;
    let token = login_token(&t.app, "admin", "admin-pass").await;

    let response = t
        .app
        .oneshot(post_json(
            "/users",
            json!({ "username": "x", "email": "bad", "password": "1" }),
            Some(&token),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = json_body(response.into_body()).await;
    assert!(body["details"].get("username").is_some());
}

#[tokio::test]
async fn test_get_user_with_malformed_id_returns_400() {
    let t = setup().await;
    let token = login_token(&t.app, "admin", "admin-pass").await;

    let response = t
        .app
        .clone()
        .oneshot(get("/users/not-a-uuid", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = t
        .app
        .oneshot(get(&format!("/users/{}", uuid::Uuid::now_v7()), Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
