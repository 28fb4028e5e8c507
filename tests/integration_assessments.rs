mod common;

use axum::http::StatusCode;
use common::{
    Credential, create_admin_with_api_key, create_course, create_course_fixture, create_exam_item,
    create_exam_type, create_module, create_scope, create_section, create_test_user, request, send,
    setup_test_app,
};
use lms::modules::users::model::UserRole;
use serde_json::json;
use sqlx::PgPool;

async fn scoped_modules(pool: &PgPool, course_id: i64, exam_type_id: i64) -> Vec<i64> {
    sqlx::query_scalar(
        "SELECT module_id FROM assessment_scopes WHERE course_id = $1 AND exam_type_id = $2 ORDER BY module_id",
    )
    .bind(course_id)
    .bind(exam_type_id)
    .fetch_all(pool)
    .await
    .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
async fn test_save_scope_replaces_selection(pool: PgPool) {
    let (_, key) = create_admin_with_api_key(&pool).await;
    let course_id = create_course(&pool, "DS101", "Data Structures").await;
    let first = create_module(&pool, course_id, 1, "Arrays").await;
    let second = create_module(&pool, course_id, 2, "Trees").await;
    let midterm = create_exam_type(&pool, "Midterm", "exam", "Midterm", 10).await;
    create_scope(&pool, course_id, midterm, first).await;
    let app = setup_test_app(pool.clone());

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/assessment_scopes/save",
            Credential::ApiKey(&key),
            Some(json!({ "course_id": course_id, "exam_type_id": midterm, "module_ids": [second] })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Assessment scope saved successfully");
    assert_eq!(scoped_modules(&pool, course_id, midterm).await, vec![second]);

    let (status, body) = send(
        &app,
        request(
            "GET",
            &format!("/api/assessment_scopes/modules?course_id={}&exam_type_id={}", course_id, midterm),
            Credential::ApiKey(&key),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["modules"].as_array().unwrap().len(), 2);
    assert_eq!(body["modules"][0]["title"], "Arrays");
    assert_eq!(body["modules"][1]["position"], 2);
    assert_eq!(body["selected_modules"], json!([second]));

    let (_, body) = send(
        &app,
        request(
            "GET",
            &format!("/api/assessment_scopes/count/{}", course_id),
            Credential::ApiKey(&key),
            None,
        ),
    )
    .await;
    assert_eq!(body["count"], 1);

    let (_, body) = send(
        &app,
        request(
            "GET",
            &format!("/api/assessment_scopes/exam_types?course_id={}", course_id),
            Credential::ApiKey(&key),
            None,
        ),
    )
    .await;
    assert_eq!(body["exam_types"][0]["exam_name"], "Midterm");
    assert_eq!(body["exam_types"][0]["has_scope"], true);

    let (_, body) = send(
        &app,
        request("GET", "/api/assessment_scopes/courses?search=DS1", Credential::ApiKey(&key), None),
    )
    .await;
    assert_eq!(body["courses"][0]["course_code"], "DS101");
    assert_eq!(body["courses"][0]["assessment_count"], 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_failed_save_keeps_previous_scope(pool: PgPool) {
    let (_, key) = create_admin_with_api_key(&pool).await;
    let course_id = create_course(&pool, "DS101", "Data Structures").await;
    let module_id = create_module(&pool, course_id, 1, "Arrays").await;
    let midterm = create_exam_type(&pool, "Midterm", "exam", "Midterm", 10).await;
    create_scope(&pool, course_id, midterm, module_id).await;
    let app = setup_test_app(pool.clone());

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/assessment_scopes/save",
            Credential::ApiKey(&key),
            Some(json!({ "course_id": course_id, "exam_type_id": midterm, "module_ids": [module_id, 999_999] })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Unknown course, exam type or module");
    assert_eq!(scoped_modules(&pool, course_id, midterm).await, vec![module_id]);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_scope_requests_need_ids(pool: PgPool) {
    let (_, key) = create_admin_with_api_key(&pool).await;
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/assessment_scopes/save",
            Credential::ApiKey(&key),
            Some(json!({ "course_id": 1, "module_ids": [] })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Course ID and Exam Type ID are required");

    let (status, body) = send(
        &app,
        request("GET", "/api/assessment_scopes/modules", Credential::ApiKey(&key), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Course ID is required");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_generate_preview_samples_scoped_items(pool: PgPool) {
    let user = create_test_user(&pool, UserRole::Instructor).await;
    let fixture = create_course_fixture(&pool, "DS101").await;
    let second_section = create_section(&pool, fixture.module_id, 2, "Traversal").await;
    create_exam_item(&pool, second_section, "How do you walk a list?", "B").await;
    let quiz = create_exam_type(&pool, "Quiz 1", "quiz", "Prelim", 3).await;
    create_scope(&pool, fixture.course_id, quiz, fixture.module_id).await;
    let token = user.token();
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/assessment_preview/generate-preview",
            Credential::Bearer(&token),
            Some(json!({ "course_id": fixture.course_id, "exam_type_id": quiz })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 3);
    assert!(questions.iter().all(|q| q["module_title"] == "Linked Lists"));
    assert!(questions.iter().all(|q| q.get("content_html").is_none()));
    assert_eq!(body["statistics"]["total_available"], 5);
    assert_eq!(body["statistics"]["module_distribution"]["1: Linked Lists"], 3);
    let section_total: u64 = body["statistics"]["section_distribution"]
        .as_object()
        .unwrap()
        .values()
        .map(|v| v.as_u64().unwrap())
        .sum();
    assert_eq!(section_total, 3);
    assert_eq!(body["assessment_info"]["exam_name"], "Quiz 1");
    assert_eq!(body["assessment_info"]["total_items"], 3);
    assert_eq!(body["assessment_info"]["selected_count"], 3);

    let (status, body) = send(
        &app,
        request(
            "GET",
            &format!("/api/assessment_preview/assessments/{}", fixture.course_id),
            Credential::Bearer(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["assessments"][0]["exam_name"], "Quiz 1");
    assert_eq!(body["assessments"][0]["module_count"], 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_generate_preview_errors(pool: PgPool) {
    let user = create_test_user(&pool, UserRole::Instructor).await;
    let fixture = create_course_fixture(&pool, "DS101").await;
    let final_exam = create_exam_type(&pool, "Final", "exam", "Final", 50).await;
    let unscoped = create_exam_type(&pool, "Quiz 2", "quiz", "Midterm", 2).await;
    create_scope(&pool, fixture.course_id, final_exam, fixture.module_id).await;
    let token = user.token();
    let app = setup_test_app(pool);

    let preview = |exam_type_id: i64| {
        request(
            "POST",
            "/api/assessment_preview/generate-preview",
            Credential::Bearer(&token),
            Some(json!({ "course_id": fixture.course_id, "exam_type_id": exam_type_id })),
        )
    };

    let (status, body) = send(&app, preview(final_exam)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Not enough questions available (4) to generate the requested number of items (50)"
    );

    let (status, body) = send(&app, preview(unscoped)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No questions found for this assessment scope");

    let (status, body) = send(&app, preview(999_999)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid exam_type_id");

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/assessment_preview/generate-preview",
            Credential::Bearer(&token),
            Some(json!({ "course_id": fixture.course_id })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "course_id and exam_type_id are required");
}
