mod common;

use axum::http::StatusCode;
use common::{Credential, create_test_user, request, send, setup_test_app};
use lms::modules::users::model::UserRole;
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;

async fn login(app: &axum::Router, external_id: &str, password: &str) -> (StatusCode, serde_json::Value) {
    send(
        app,
        request(
            "POST",
            "/api/auth/login",
            Credential::None,
            Some(json!({ "external_id": external_id, "password": password })),
        ),
    )
    .await
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_success(pool: PgPool) {
    let user = create_test_user(&pool, UserRole::Student).await;
    let app = setup_test_app(pool);

    let (status, body) = login(&app, &user.external_id, &user.password).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Login successful");
    assert!(body["access_token"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(body["refresh_token"].as_str().is_some_and(|t| !t.is_empty()));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_sets_auth_and_csrf_cookies(pool: PgPool) {
    let user = create_test_user(&pool, UserRole::Teacher).await;
    let app = setup_test_app(pool);

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/auth/login",
            Credential::None,
            Some(json!({ "external_id": user.external_id, "password": user.password })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookies: Vec<String> = response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok().map(str::to_string))
        .collect();

    for name in [
        "access_token_cookie=",
        "refresh_token_cookie=",
        "csrf_access_token=",
        "csrf_refresh_token=",
    ] {
        assert!(
            cookies.iter().any(|c| c.starts_with(name)),
            "missing cookie {name}"
        );
    }
    let access = cookies
        .iter()
        .find(|c| c.starts_with("access_token_cookie="))
        .unwrap();
    assert!(access.contains("HttpOnly"));
    let csrf = cookies
        .iter()
        .find(|c| c.starts_with("csrf_access_token="))
        .unwrap();
    assert!(!csrf.contains("HttpOnly"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_wrong_password(pool: PgPool) {
    let user = create_test_user(&pool, UserRole::Student).await;
    let app = setup_test_app(pool);

    let (status, body) = login(&app, &user.external_id, "not-the-password").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Invalid credentials");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_unknown_user(pool: PgPool) {
    let app = setup_test_app(pool);

    let (status, body) = login(&app, "NOPE-404", "whatever").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_login_missing_fields(pool: PgPool) {
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/auth/login",
            Credential::None,
            Some(json!({ "external_id": "  " })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "External ID and password are required");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_verify_returns_identity(pool: PgPool) {
    let user = create_test_user(&pool, UserRole::Instructor).await;
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        request("GET", "/api/auth/verify", Credential::Bearer(&user.token()), None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["user_id"], user.id);
    assert_eq!(body["user"]["external_id"], user.external_id);
    assert_eq!(body["user"]["role"], "instructor");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_verify_without_token(pool: PgPool) {
    let app = setup_test_app(pool);

    let (status, body) = send(&app, request("GET", "/api/auth/verify", Credential::None, None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Missing authorization token");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_refresh_issues_new_access_token(pool: PgPool) {
    let user = create_test_user(&pool, UserRole::Student).await;
    let app = setup_test_app(pool);

    let (_, body) = login(&app, &user.external_id, &user.password).await;
    let refresh_token = body["refresh_token"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        request("POST", "/api/auth/refresh", Credential::Bearer(&refresh_token), None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let access_token = body["access_token"].as_str().unwrap();

    let (status, _) = send(
        &app,
        request("GET", "/api/auth/verify", Credential::Bearer(access_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_access_token_cannot_refresh(pool: PgPool) {
    let user = create_test_user(&pool, UserRole::Student).await;
    let app = setup_test_app(pool);

    let (status, _) = send(
        &app,
        request("POST", "/api/auth/refresh", Credential::Bearer(&user.token()), None),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_logout_revokes_access_token(pool: PgPool) {
    let user = create_test_user(&pool, UserRole::Student).await;
    let app = setup_test_app(pool);

    let (_, body) = login(&app, &user.external_id, &user.password).await;
    let access_token = body["access_token"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        request("POST", "/api/auth/logout", Credential::Bearer(&access_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logout successful");

    let (status, body) = send(
        &app,
        request("GET", "/api/auth/verify", Credential::Bearer(&access_token), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Token has been revoked");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_unknown_route_uses_error_envelope(pool: PgPool) {
    let app = setup_test_app(pool);

    let (status, body) = send(&app, request("GET", "/api/nothing-here", Credential::None, None)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Not found");
}
