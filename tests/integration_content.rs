mod common;

use axum::http::StatusCode;
use common::{
    Credential, create_admin_with_api_key, create_course, create_course_fixture, create_module,
    create_test_user, request, send, setup_test_app,
};
use http_body_util::BodyExt;
use lms::modules::users::model::UserRole;
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;

async fn module_titles(app: &axum::Router, key: &str, course_id: i64) -> Vec<String> {
    let (status, body) = send(
        app,
        request(
            "GET",
            &format!("/api/modules?course_id={}", course_id),
            Credential::ApiKey(key),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["modules"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["title"].as_str().unwrap().to_string())
        .collect()
}

#[sqlx::test(migrations = "./migrations")]
async fn test_content_accepts_either_credential(pool: PgPool) {
    let (_, key) = create_admin_with_api_key(&pool).await;
    let teacher = create_test_user(&pool, UserRole::Teacher).await;
    let course_id = create_course(&pool, "CS1", "Computing").await;
    let app = setup_test_app(pool);

    let uri = format!("/api/modules?course_id={}", course_id);
    let (status, _) = send(&app, request("GET", &uri, Credential::ApiKey(&key), None)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, request("GET", &uri, Credential::Bearer(&teacher.token()), None)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, request("GET", &uri, Credential::None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_modules_requires_course_id(pool: PgPool) {
    let (_, key) = create_admin_with_api_key(&pool).await;
    let app = setup_test_app(pool);

    let (status, body) = send(&app, request("GET", "/api/modules", Credential::ApiKey(&key), None)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "course_id is required");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_insert_module_shifts_later_positions(pool: PgPool) {
    let (_, key) = create_admin_with_api_key(&pool).await;
    let course_id = create_course(&pool, "CS1", "Computing").await;
    create_module(&pool, course_id, 1, "Basics").await;
    create_module(&pool, course_id, 2, "Loops").await;
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/modules/insert-module",
            Credential::ApiKey(&key),
            Some(json!({ "course_id": course_id, "after_position": 1 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["position"], 2);

    assert_eq!(
        module_titles(&app, &key, course_id).await,
        vec!["Basics", "New Module 2", "Loops"]
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_reorder_and_delete_module(pool: PgPool) {
    let (_, key) = create_admin_with_api_key(&pool).await;
    let course_id = create_course(&pool, "CS1", "Computing").await;
    let first = create_module(&pool, course_id, 1, "Basics").await;
    create_module(&pool, course_id, 2, "Loops").await;
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/modules/reorder",
            Credential::ApiKey(&key),
            Some(json!({ "module_id": first, "direction": "down" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Module moved down successfully");
    assert_eq!(module_titles(&app, &key, course_id).await, vec!["Loops", "Basics"]);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/modules/reorder",
            Credential::ApiKey(&key),
            Some(json!({ "module_id": first, "direction": "down" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Cannot move module further in this direction");

    let (status, _) = send(
        &app,
        request("DELETE", &format!("/api/modules/delete/{}", first), Credential::ApiKey(&key), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(module_titles(&app, &key, course_id).await, vec!["Loops"]);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_concurrent_moves_keep_positions_distinct(pool: PgPool) {
    let (_, key) = create_admin_with_api_key(&pool).await;
    let course_id = create_course(&pool, "CS1", "Computing").await;
    let first = create_module(&pool, course_id, 1, "Basics").await;
    create_module(&pool, course_id, 2, "Loops").await;
    let third = create_module(&pool, course_id, 3, "Functions").await;
    let app = setup_test_app(pool.clone());

    let move_down = send(
        &app,
        request(
            "POST",
            "/api/modules/reorder",
            Credential::ApiKey(&key),
            Some(json!({ "module_id": first, "direction": "down" })),
        ),
    );
    let move_up = send(
        &app,
        request(
            "POST",
            "/api/modules/reorder",
            Credential::ApiKey(&key),
            Some(json!({ "module_id": third, "direction": "up" })),
        ),
    );
    let ((down_status, _), (up_status, _)) = tokio::join!(move_down, move_up);
    assert_eq!(down_status, StatusCode::OK);
    assert_eq!(up_status, StatusCode::OK);

    let mut positions: Vec<i32> =
        sqlx::query_scalar("SELECT position FROM modules_master WHERE course_id = $1 ORDER BY position")
            .bind(course_id)
            .fetch_all(&pool)
            .await
            .unwrap();
    positions.dedup();
    assert_eq!(positions, vec![1, 2, 3]);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_module_rewrites_title(pool: PgPool) {
    let (_, key) = create_admin_with_api_key(&pool).await;
    let course_id = create_course(&pool, "CS1", "Computing").await;
    let module_id = create_module(&pool, course_id, 1, "Basics").await;
    let app = setup_test_app(pool);

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/modules/update",
            Credential::ApiKey(&key),
            Some(json!({ "module_id": module_id, "title": "Getting Started", "description": "Tools & setup" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(
        &app,
        request("GET", &format!("/api/modules?course_id={}", course_id), Credential::ApiKey(&key), None),
    )
    .await;
    assert_eq!(body["modules"][0]["title"], "Getting Started");
    assert!(
        body["modules"][0]["content_html"]
            .as_str()
            .unwrap()
            .contains("Tools &amp; setup")
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_sections_insert_and_update(pool: PgPool) {
    let (_, key) = create_admin_with_api_key(&pool).await;
    let fixture = create_course_fixture(&pool, "DS1").await;
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/modules/insert-section",
            Credential::ApiKey(&key),
            Some(json!({ "module_id": fixture.module_id, "after_position": 0 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let new_section = body["section_id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/modules/update-section",
            Credential::ApiKey(&key),
            Some(json!({ "section_id": new_section, "content": "<p>Warm-up</p>" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        request(
            "GET",
            &format!("/api/modules/sections?module_id={}", fixture.module_id),
            Credential::ApiKey(&key),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Retrieved 2 sections");
    let sections = body["sections"].as_array().unwrap();
    assert_eq!(sections[0]["section_id"], new_section);
    assert_eq!(sections[0]["title"], "New Section 1");
    assert_eq!(sections[0]["content"], "<p>Warm-up</p>");
    assert_eq!(sections[1]["section_id"], fixture.section_id);
    assert_eq!(sections[1]["position"], 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_manual_exam_item_validation(pool: PgPool) {
    let (_, key) = create_admin_with_api_key(&pool).await;
    let fixture = create_course_fixture(&pool, "DS1").await;
    let app = setup_test_app(pool);

    let item = json!({
        "section_id": fixture.section_id,
        "question": "Which node has no successor?",
        "option_a": "Head",
        "option_b": "Tail",
        "option_c": "Root",
        "option_d": "Leaf",
        "correct_answer": "e"
    });
    let (status, body) = send(
        &app,
        request("POST", "/api/modules/exam-items/manual-create", Credential::ApiKey(&key), Some(item.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Correct answer must be A, B, C, or D");

    let mut valid = item;
    valid["correct_answer"] = json!("b");
    let (status, body) = send(
        &app,
        request("POST", "/api/modules/exam-items/manual-create", Credential::ApiKey(&key), Some(valid)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let item_id = body["item_id"].as_i64().unwrap();

    let (_, body) = send(
        &app,
        request(
            "GET",
            &format!("/api/modules/exam-items?section_id={}", fixture.section_id),
            Credential::ApiKey(&key),
            None,
        ),
    )
    .await;
    let stored = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|i| i["item_id"] == item_id)
        .cloned()
        .unwrap();
    assert_eq!(stored["correct_answer"], "B");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_export_aiken_single_module(pool: PgPool) {
    let (_, key) = create_admin_with_api_key(&pool).await;
    let fixture = create_course_fixture(&pool, "DS1").await;
    let app = setup_test_app(pool);

    let response = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/modules/export-aiken-txt-single-module/{}", fixture.module_id),
            Credential::ApiKey(&key),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()["content-disposition"]
            .to_str()
            .unwrap()
            .contains("DS1_Module_1_Aiken_Format.txt")
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.starts_with("Question 1 about nodes?\nA. Alpha\nB. Beta\nC. Gamma\nD. Delta\nANSWER: A\n"));
    assert_eq!(text.matches("ANSWER:").count(), 4);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_export_aiken_course_headers(pool: PgPool) {
    let (_, key) = create_admin_with_api_key(&pool).await;
    let fixture = create_course_fixture(&pool, "DS1").await;
    create_module(&pool, fixture.course_id, 2, "Empty Module").await;
    let app = setup_test_app(pool);

    let response = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/modules/export-aiken-txt-all-modules/{}", fixture.course_id),
            Credential::ApiKey(&key),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("MODULE 1: Linked Lists"));
    assert!(!text.contains("Empty Module"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_save_description_rejects_blank(pool: PgPool) {
    let (_, key) = create_admin_with_api_key(&pool).await;
    let course_id = create_course(&pool, "CS1", "Computing").await;
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/modules/save-description",
            Credential::ApiKey(&key),
            Some(json!({ "course_id": course_id, "description": "   " })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Description cannot be empty");
}
