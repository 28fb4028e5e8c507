#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, NaiveDate, Utc};
use http_body_util::BodyExt;
use lms::llm::ScriptedLlm;
use lms::modules::api_keys::service::ApiKeyService;
use lms::modules::users::model::UserRole;
use lms::modules::users::service::UserService;
use lms::router::init_router;
use lms::state::AppState;
use lms_auth::{TokenSubject, create_access_token};
use lms_config::{CorsConfig, JwtConfig, RateLimitConfig};
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "Password123";

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test_secret_key_for_testing_purposes".to_string(),
        access_token_expiry: 3600,
        refresh_token_expiry: 604800,
        cookie_secure: false,
    }
}

pub fn test_state(pool: PgPool, llm: ScriptedLlm, rate_limit_config: RateLimitConfig) -> AppState {
    AppState {
        db: pool,
        jwt_config: test_jwt_config(),
        cors_config: CorsConfig::from_list("http://localhost:5173"),
        rate_limit_config,
        llm: Arc::new(llm),
    }
}

/// Router with rate limiting off and a language model that always fails.
pub fn setup_test_app(pool: PgPool) -> Router {
    setup_test_app_with_llm(pool, ScriptedLlm::unavailable())
}

pub fn setup_test_app_with_llm(pool: PgPool, llm: ScriptedLlm) -> Router {
    init_router(test_state(pool, llm, RateLimitConfig::disabled()))
}

pub struct TestUser {
    pub id: i64,
    pub external_id: String,
    pub full_name: String,
    pub password: String,
    pub role: UserRole,
}

impl TestUser {
    pub fn token(&self) -> String {
        let subject = TokenSubject {
            user_id: self.id,
            role: self.role.as_str().to_string(),
            external_id: self.external_id.clone(),
            full_name: self.full_name.clone(),
        };
        create_access_token(&subject, &test_jwt_config()).unwrap()
    }
}

pub fn generate_unique_external_id() -> String {
    format!("T-{}", &Uuid::new_v4().simple().to_string()[..12])
}

pub async fn create_test_user(pool: &PgPool, role: UserRole) -> TestUser {
    let external_id = generate_unique_external_id();
    let full_name = format!("Test {}", role.as_str());
    let user = UserService::insert_user(pool, &external_id, &full_name, TEST_PASSWORD, role)
        .await
        .unwrap();

    TestUser {
        id: user.user_id,
        external_id: user.external_id,
        full_name: user.full_name,
        password: TEST_PASSWORD.to_string(),
        role,
    }
}

/// An administrator together with a freshly issued API key.
pub async fn create_admin_with_api_key(pool: &PgPool) -> (TestUser, String) {
    let admin = create_test_user(pool, UserRole::Admin).await;
    let (_, key) = ApiKeyService::generate(pool, admin.id, "test key").await.unwrap();
    (admin, key)
}

pub async fn create_course(pool: &PgPool, course_code: &str, course_title: &str) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO courses_master (course_code, course_title, description) VALUES ($1, $2, $3) RETURNING course_id",
    )
    .bind(course_code)
    .bind(course_title)
    .bind(format!("About {}", course_title))
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn create_instance(
    pool: &PgPool,
    course_id: i64,
    term_code: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO course_instances (course_id, term_code, start_date, end_date) VALUES ($1, $2, $3, $4) RETURNING instance_id",
    )
    .bind(course_id)
    .bind(term_code)
    .bind(start_date)
    .bind(end_date)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// An instance that started a month ago and runs for two more months.
pub async fn create_active_instance(pool: &PgPool, course_id: i64, term_code: &str) -> i64 {
    let today = Utc::now().date_naive();
    create_instance(
        pool,
        course_id,
        term_code,
        today - Duration::days(30),
        today + Duration::days(60),
    )
    .await
}

pub async fn enroll(pool: &PgPool, instance_id: i64, user_id: i64) {
    sqlx::query("INSERT INTO enrollments (instance_id, user_id) VALUES ($1, $2)")
        .bind(instance_id)
        .bind(user_id)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn create_module(pool: &PgPool, course_id: i64, position: i32, title: &str) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO modules_master (course_id, position, content_html) VALUES ($1, $2, $3) RETURNING module_id",
    )
    .bind(course_id)
    .bind(position)
    .bind(format!("<h2>{}</h2><p>Overview of {}</p>", title, title))
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn create_section(pool: &PgPool, module_id: i64, position: i32, title: &str) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO module_sections (module_id, position, title, content) VALUES ($1, $2, $3, $4) RETURNING section_id",
    )
    .bind(module_id)
    .bind(position)
    .bind(title)
    .bind(format!("<p>{} explained in detail.</p>", title))
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn create_activity(pool: &PgPool, module_id: i64, position: i32, title: &str) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO module_activities (module_id, position, title, instructions) VALUES ($1, $2, $3, $4) RETURNING activity_id",
    )
    .bind(module_id)
    .bind(position)
    .bind(title)
    .bind(format!("Complete the {} exercise.", title))
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn create_exam_item(pool: &PgPool, section_id: i64, question: &str, correct: &str) -> i64 {
    sqlx::query_scalar(
        r#"INSERT INTO exam_items (section_id, question, option_a, option_b, option_c, option_d, correct_answer)
           VALUES ($1, $2, 'Alpha', 'Beta', 'Gamma', 'Delta', $3) RETURNING item_id"#,
    )
    .bind(section_id)
    .bind(question)
    .bind(correct)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn create_exam_type(
    pool: &PgPool,
    exam_name: &str,
    category: &str,
    exam_period: &str,
    total_items: i32,
) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO exam_types (exam_name, category, exam_period, total_items) VALUES ($1, $2, $3, $4) RETURNING exam_type_id",
    )
    .bind(exam_name)
    .bind(category)
    .bind(exam_period)
    .bind(total_items)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn create_scope(pool: &PgPool, course_id: i64, exam_type_id: i64, module_id: i64) {
    sqlx::query("INSERT INTO assessment_scopes (course_id, exam_type_id, module_id) VALUES ($1, $2, $3)")
        .bind(course_id)
        .bind(exam_type_id)
        .bind(module_id)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn create_submission(
    pool: &PgPool,
    user_id: i64,
    activity_id: i64,
    status: &str,
    content: &str,
) -> i64 {
    sqlx::query_scalar(
        r#"INSERT INTO activity_submissions (user_id, activity_id, submission_content, status, submitted_at)
           VALUES ($1, $2, $3, $4, CASE WHEN $4 = 'draft' THEN NULL ELSE NOW() END)
           RETURNING submission_id"#,
    )
    .bind(user_id)
    .bind(activity_id)
    .bind(content)
    .bind(status)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// A course with one module, one section holding four exam items (answers
/// A, B, C, D in insertion order), one activity, and an active instance.
pub struct CourseFixture {
    pub course_id: i64,
    pub instance_id: i64,
    pub module_id: i64,
    pub section_id: i64,
    pub activity_id: i64,
    pub item_ids: Vec<i64>,
}

pub async fn create_course_fixture(pool: &PgPool, course_code: &str) -> CourseFixture {
    let course_id = create_course(pool, course_code, "Data Structures").await;
    let instance_id = create_active_instance(pool, course_id, "2025-1").await;
    let module_id = create_module(pool, course_id, 1, "Linked Lists").await;
    let section_id = create_section(pool, module_id, 1, "Nodes and Pointers").await;
    let activity_id = create_activity(pool, module_id, 1, "Reverse a list").await;

    let mut item_ids = Vec::new();
    for (i, letter) in ["A", "B", "C", "D"].iter().enumerate() {
        let question = format!("Question {} about nodes?", i + 1);
        item_ids.push(create_exam_item(pool, section_id, &question, letter).await);
    }

    CourseFixture {
        course_id,
        instance_id,
        module_id,
        section_id,
        activity_id,
        item_ids,
    }
}

pub enum Credential<'a> {
    None,
    Bearer(&'a str),
    ApiKey(&'a str),
}

pub fn request(method: &str, uri: &str, credential: Credential<'_>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    builder = match credential {
        Credential::None => builder,
        Credential::Bearer(token) => builder.header("authorization", format!("Bearer {}", token)),
        Credential::ApiKey(key) => builder.header("x-api-key", key),
    };

    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Sends the request and decodes the JSON body (`Value::Null` when empty).
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

const BOUNDARY: &str = "----lms-test-boundary";

/// Multipart form with `contents` in the `file` field.
pub fn csv_upload_request(uri: &str, credential: Credential<'_>, filename: &str, contents: &str) -> Request<Body> {
    csv_form_request(uri, credential, &[], filename, contents)
}

/// Multipart form with extra text `fields` ahead of the `file` field.
pub fn csv_form_request(
    uri: &str,
    credential: Credential<'_>,
    fields: &[(&str, &str)],
    filename: &str,
    contents: &str,
) -> Request<Body> {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: text/csv\r\n\r\n{contents}\r\n--{BOUNDARY}--\r\n"
    ));

    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"));
    builder = match credential {
        Credential::None => builder,
        Credential::Bearer(token) => builder.header("authorization", format!("Bearer {}", token)),
        Credential::ApiKey(key) => builder.header("x-api-key", key),
    };
    builder.body(Body::from(body)).unwrap()
}

/// Sends the request and returns the status, headers and raw body.
pub async fn send_raw(app: &Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, bytes.to_vec())
}
