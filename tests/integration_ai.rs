mod common;

use axum::http::StatusCode;
use common::{
    Credential, create_admin_with_api_key, create_course, create_course_fixture, create_module,
    request, send, setup_test_app, setup_test_app_with_llm,
};
use lms::llm::ScriptedLlm;
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
async fn test_suggest_count_uses_model_answer(pool: PgPool) {
    let (_, key) = create_admin_with_api_key(&pool).await;
    let app = setup_test_app_with_llm(pool, ScriptedLlm::new(["I would suggest 8 modules."]));

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/modules/suggest-count",
            Credential::ApiKey(&key),
            Some(json!({ "course_title": "Operating Systems", "course_description": "Processes and memory" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["suggested_count"], 8);
    assert_eq!(body["message"], "Suggested 8 modules for the course");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_suggest_count_falls_back_when_model_fails(pool: PgPool) {
    let (_, key) = create_admin_with_api_key(&pool).await;
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/modules/suggest-count",
            Credential::ApiKey(&key),
            Some(json!({ "course_title": "Operating Systems" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["suggested_count"], 6);
    assert_eq!(body["message"], "Using default module count");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_suggest_count_requires_title(pool: PgPool) {
    let (_, key) = create_admin_with_api_key(&pool).await;
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        request("POST", "/api/modules/suggest-count", Credential::ApiKey(&key), Some(json!({}))),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Course title is required");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_generate_modules_fallback_replaces_existing(pool: PgPool) {
    let (_, key) = create_admin_with_api_key(&pool).await;
    let course_id = create_course(&pool, "OS1", "Operating Systems").await;
    create_module(&pool, course_id, 1, "Old Module").await;
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/modules/generate",
            Credential::ApiKey(&key),
            Some(json!({ "course_id": course_id, "module_count": 3 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "fallback");
    assert_eq!(body["message"], "Successfully overridden with 3 new modules");

    let (_, body) = send(
        &app,
        request("GET", &format!("/api/modules?course_id={}", course_id), Credential::ApiKey(&key), None),
    )
    .await;
    let titles: Vec<&str> = body["modules"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles.len(), 3);
    assert_eq!(titles[0], "Module 1: Operating Systems - Part 1");
    assert!(!titles.contains(&"Old Module"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_generate_modules_appends_model_output(pool: PgPool) {
    let (_, key) = create_admin_with_api_key(&pool).await;
    let course_id = create_course(&pool, "OS1", "Operating Systems").await;
    create_module(&pool, course_id, 1, "Processes").await;
    let llm = ScriptedLlm::new([
        r#"[{"title": "Memory Management", "description": "Paging and segmentation."},
            {"title": "File Systems", "description": "Inodes and journaling."}]"#,
    ]);
    let app = setup_test_app_with_llm(pool, llm);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/modules/generate",
            Credential::ApiKey(&key),
            Some(json!({ "course_id": course_id, "module_count": 2, "override_existing": false })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "ai");
    assert_eq!(body["message"], "Successfully added 2 new modules");

    let (_, body) = send(
        &app,
        request("GET", &format!("/api/modules?course_id={}", course_id), Credential::ApiKey(&key), None),
    )
    .await;
    let modules = body["modules"].as_array().unwrap();
    assert_eq!(modules.len(), 3);
    assert_eq!(modules[1]["title"], "Memory Management");
    assert_eq!(modules[1]["position"], 2);
    assert_eq!(modules[2]["description"], "Inodes and journaling.");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_generate_modules_rejects_large_count(pool: PgPool) {
    let (_, key) = create_admin_with_api_key(&pool).await;
    let course_id = create_course(&pool, "OS1", "Operating Systems").await;
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/modules/generate",
            Credential::ApiKey(&key),
            Some(json!({ "course_id": course_id, "module_count": 25 })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "module_count must be between 1 and 20");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_generate_sections_from_model(pool: PgPool) {
    let (_, key) = create_admin_with_api_key(&pool).await;
    let fixture = create_course_fixture(&pool, "DS1").await;
    let llm = ScriptedLlm::new([r#"["Singly Linked Lists", "Doubly Linked Lists", "Insertion", "Traversal"]"#]);
    let app = setup_test_app_with_llm(pool, llm);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/modules/generate-sections",
            Credential::ApiKey(&key),
            Some(json!({ "module_id": fixture.module_id })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "ai");
    assert_eq!(body["message"], "Generated 4 sections");
    let sections = body["sections"].as_array().unwrap();
    assert_eq!(sections[0]["title"], "Singly Linked Lists");
    assert_eq!(sections[3]["position"], 4);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_generate_exam_items_fallback(pool: PgPool) {
    let (_, key) = create_admin_with_api_key(&pool).await;
    let fixture = create_course_fixture(&pool, "DS1").await;
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/modules/generate-exam-items",
            Credential::ApiKey(&key),
            Some(json!({ "section_id": fixture.section_id, "difficulty": "hard" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "fallback");
    assert_eq!(body["created"], 5);
    assert_eq!(body["items"][0]["question"], "Hard Question 1 about Nodes and Pointers?");
    assert_eq!(body["items"][0]["correct_answer"], "A");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_generate_exam_items_rejects_unknown_difficulty(pool: PgPool) {
    let (_, key) = create_admin_with_api_key(&pool).await;
    let fixture = create_course_fixture(&pool, "DS1").await;
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/modules/generate-exam-items",
            Credential::ApiKey(&key),
            Some(json!({ "section_id": fixture.section_id, "difficulty": "extreme" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Difficulty must be easy, medium, or hard");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_ai_grade_requires_submission_data(pool: PgPool) {
    let (_, key) = create_admin_with_api_key(&pool).await;
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/modules/activity-grading/ai-grade",
            Credential::ApiKey(&key),
            Some(json!({ "submission_id": 1, "activity_instructions": "Reverse a list" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required data for AI grading");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_ai_grade_parses_model_suggestion(pool: PgPool) {
    let (_, key) = create_admin_with_api_key(&pool).await;
    let llm = ScriptedLlm::new([
        r#"Here is my assessment: {"grade": 88, "feedback": "Clear reasoning, missing edge cases.", "ai_detected": false}"#,
    ]);
    let app = setup_test_app_with_llm(pool, llm);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/modules/activity-grading/ai-grade",
            Credential::ApiKey(&key),
            Some(json!({
                "submission_id": 12,
                "activity_instructions": "<p>Reverse a singly linked list.</p>",
                "submission_content": "I walk the list once, flipping each next pointer."
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "ai");
    assert_eq!(body["grade"], 88.0);
    assert_eq!(body["feedback"], "Clear reasoning, missing edge cases.");
    assert_eq!(body["ai_detected"], false);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_ai_grade_falls_back(pool: PgPool) {
    let (_, key) = create_admin_with_api_key(&pool).await;
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/modules/activity-grading/ai-grade",
            Credential::ApiKey(&key),
            Some(json!({
                "submission_id": 12,
                "activity_instructions": "Reverse a list",
                "submission_content": "Done."
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "fallback");
    assert_eq!(body["grade"], 75.0);
}

async fn stored_outcomes(pool: &PgPool, module_id: i64) -> Option<serde_json::Value> {
    sqlx::query_scalar("SELECT learning_outcomes FROM modules_master WHERE module_id = $1")
        .bind(module_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
async fn test_regenerate_description_cleans_model_output(pool: PgPool) {
    let (_, key) = create_admin_with_api_key(&pool).await;
    let llm = ScriptedLlm::new(["Linked Lists\nDescription: \"Covers singly and doubly linked lists.\""]);
    let app = setup_test_app_with_llm(pool, llm);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/modules/regenerate",
            Credential::ApiKey(&key),
            Some(json!({ "module_title": "Linked Lists", "course_title": "Data Structures" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["description"], "Covers singly and doubly linked lists.");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_regenerate_description_falls_back(pool: PgPool) {
    let (_, key) = create_admin_with_api_key(&pool).await;
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/modules/regenerate",
            Credential::ApiKey(&key),
            Some(json!({ "module_title": "Linked Lists", "course_title": "Data Structures" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["description"],
        "This module covers important concepts related to Linked Lists within the context of Data Structures. \
         Students will explore key principles and practical applications specific to this topic."
    );

    let (status, body) = send(
        &app,
        request("POST", "/api/modules/regenerate", Credential::ApiKey(&key), Some(json!({ "module_title": " " }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Module title is required");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_generate_outcomes_for_module(pool: PgPool) {
    let (_, key) = create_admin_with_api_key(&pool).await;
    let fixture = create_course_fixture(&pool, "DS1").await;
    let llm = ScriptedLlm::new([r#"["Explain node pointers", "Build a singly linked list", "Reverse a list in place"]"#]);
    let app = setup_test_app_with_llm(pool.clone(), llm);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/modules/generate-outcomes",
            Credential::ApiKey(&key),
            Some(json!({ "module_id": fixture.module_id })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Learning outcomes regenerated for module");
    assert_eq!(body["updated"], 1);
    assert_eq!(
        stored_outcomes(&pool, fixture.module_id).await,
        Some(json!(["Explain node pointers", "Build a singly linked list", "Reverse a list in place"]))
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_generate_outcomes_for_course_fills_empty_modules(pool: PgPool) {
    let (_, key) = create_admin_with_api_key(&pool).await;
    let fixture = create_course_fixture(&pool, "DS1").await;
    let filled = create_module(&pool, fixture.course_id, 2, "Stacks").await;
    sqlx::query("UPDATE modules_master SET learning_outcomes = $1 WHERE module_id = $2")
        .bind(json!(["Use a stack"]))
        .bind(filled)
        .execute(&pool)
        .await
        .unwrap();
    let app = setup_test_app(pool.clone());

    let generate = || {
        request(
            "POST",
            "/api/modules/generate-outcomes",
            Credential::ApiKey(&key),
            Some(json!({ "course_id": fixture.course_id, "only_empty": true })),
        )
    };

    let (status, body) = send(&app, generate()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Learning outcomes generated for 1 modules");
    assert_eq!(body["updated"], 1);
    assert_eq!(
        stored_outcomes(&pool, fixture.module_id).await,
        Some(json!([
            "Students will be able to understand the key concepts of Linked Lists",
            "Students will be able to apply principles learned in Linked Lists",
            "Students will be able to analyze scenarios related to Linked Lists",
        ]))
    );
    assert_eq!(stored_outcomes(&pool, filled).await, Some(json!(["Use a stack"])));

    let (status, body) = send(&app, generate()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "All modules already have learning outcomes");
    assert_eq!(body["updated"], 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_generate_outcomes_needs_a_target(pool: PgPool) {
    let (_, key) = create_admin_with_api_key(&pool).await;
    let course_id = create_course(&pool, "OS1", "Operating Systems").await;
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        request("POST", "/api/modules/generate-outcomes", Credential::ApiKey(&key), Some(json!({}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Course ID or Module ID is required");

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/modules/generate-outcomes",
            Credential::ApiKey(&key),
            Some(json!({ "course_id": course_id })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No modules found for this course");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_generate_section_content_stores_model_html(pool: PgPool) {
    let (_, key) = create_admin_with_api_key(&pool).await;
    let fixture = create_course_fixture(&pool, "DS1").await;
    let html = "<h4>Nodes</h4>\n<p>Each node stores a value and a pointer to the next node in the list.</p>";
    let app = setup_test_app_with_llm(pool.clone(), ScriptedLlm::new([html]));

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/modules/generate-section-content",
            Credential::ApiKey(&key),
            Some(json!({ "section_id": fixture.section_id })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "ai");
    assert_eq!(body["content"], html);
    let stored: String = sqlx::query_scalar("SELECT content FROM module_sections WHERE section_id = $1")
        .bind(fixture.section_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stored, html);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_generate_section_content_short_answer_uses_overview(pool: PgPool) {
    let (_, key) = create_admin_with_api_key(&pool).await;
    let fixture = create_course_fixture(&pool, "DS1").await;
    let app = setup_test_app_with_llm(pool, ScriptedLlm::new(["<p>Too short.</p>"]));

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/modules/generate-section-content",
            Credential::ApiKey(&key),
            Some(json!({ "section_id": fixture.section_id })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "fallback");
    assert!(
        body["content"]
            .as_str()
            .unwrap()
            .starts_with("<h4>Overview</h4>\n<p>This section covers <strong>Nodes and Pointers</strong> in detail.")
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_generate_section_content_without_model(pool: PgPool) {
    let (_, key) = create_admin_with_api_key(&pool).await;
    let fixture = create_course_fixture(&pool, "DS1").await;
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/modules/generate-section-content",
            Credential::ApiKey(&key),
            Some(json!({ "section_id": fixture.section_id })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "fallback");
    assert!(body["content"].as_str().unwrap().starts_with(
        "<p>This section covers the essential concepts of Nodes and Pointers in the context of Data Structures."
    ));

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/modules/generate-section-content",
            Credential::ApiKey(&key),
            Some(json!({ "section_id": 999_999 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Section not found");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_generate_single_activity_appends_then_regenerates(pool: PgPool) {
    let (_, key) = create_admin_with_api_key(&pool).await;
    let fixture = create_course_fixture(&pool, "DS1").await;
    let instructions = "Implement a singly linked list with push, pop and reverse operations. \
                        Write tests for an empty list, a single node and a list of five nodes.";
    let llm = ScriptedLlm::new([json!({ "title": "Build a Linked List", "instructions": instructions }).to_string()]);
    let app = setup_test_app_with_llm(pool, llm);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/modules/generate-single-activity",
            Credential::ApiKey(&key),
            Some(json!({ "module_id": fixture.module_id, "activity_type": "practical" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Activity generated successfully");
    assert_eq!(body["source"], "ai");
    assert_eq!(body["activity"]["title"], "Build a Linked List");
    assert_eq!(body["activity"]["instructions"], instructions);
    assert_eq!(body["activity"]["position"], 2);
    let activity_id = body["activity"]["activity_id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/modules/generate-single-activity",
            Credential::ApiKey(&key),
            Some(json!({ "module_id": fixture.module_id, "activity_id": activity_id })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Activity regenerated successfully");
    assert_eq!(body["source"], "fallback");
    assert_eq!(body["activity"]["activity_id"], activity_id);
    assert_eq!(body["activity"]["title"], "Practical Application: Linked Lists");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_generate_single_activity_clears_existing(pool: PgPool) {
    let (_, key) = create_admin_with_api_key(&pool).await;
    let fixture = create_course_fixture(&pool, "DS1").await;
    let app = setup_test_app(pool.clone());

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/modules/generate-single-activity",
            Credential::ApiKey(&key),
            Some(json!({ "module_id": fixture.module_id, "activity_type": "analysis", "clear_existing": true })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["activity"]["title"], "Decision Analysis: Linked Lists");
    assert_eq!(body["activity"]["activity_type"], "analysis");
    assert_eq!(body["activity"]["position"], 1);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM module_activities WHERE module_id = $1")
        .bind(fixture.module_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_generate_single_activity_errors(pool: PgPool) {
    let (_, key) = create_admin_with_api_key(&pool).await;
    let fixture = create_course_fixture(&pool, "DS1").await;
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/modules/generate-single-activity",
            Credential::ApiKey(&key),
            Some(json!({ "module_id": fixture.module_id, "activity_type": "essay" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Unsupported activity type: essay");

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/modules/generate-single-activity",
            Credential::ApiKey(&key),
            Some(json!({ "module_id": fixture.module_id, "activity_id": 999_999 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Activity not found");
}
