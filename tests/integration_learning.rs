mod common;

use axum::Router;
use axum::http::StatusCode;
use common::{
    CourseFixture, Credential, TestUser, create_course_fixture, create_exam_type, create_scope,
    create_submission, create_test_user, enroll, request, send, setup_test_app,
};
use lms::modules::users::model::UserRole;
use serde_json::{Value, json};
use sqlx::PgPool;

struct Classroom {
    app: Router,
    student: TestUser,
    fixture: CourseFixture,
    quiz_id: i64,
}

/// An enrolled student in a course with one scoped four-item quiz.
async fn classroom(pool: PgPool) -> Classroom {
    let fixture = create_course_fixture(&pool, "DS1").await;
    let quiz_id = create_exam_type(&pool, "Quiz 1", "quiz", "Prelim", 4).await;
    create_scope(&pool, fixture.course_id, quiz_id, fixture.module_id).await;
    let student = create_test_user(&pool, UserRole::Student).await;
    enroll(&pool, fixture.instance_id, student.id).await;

    Classroom {
        app: setup_test_app(pool),
        student,
        fixture,
        quiz_id,
    }
}

impl Classroom {
    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        send(&self.app, request("GET", uri, Credential::Bearer(&self.student.token()), None)).await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        send(
            &self.app,
            request("POST", uri, Credential::Bearer(&self.student.token()), Some(body)),
        )
        .await
    }

    /// Answers the first three items correctly and the last one wrong.
    fn three_of_four(&self) -> Value {
        let ids = &self.fixture.item_ids;
        json!({
            ids[0].to_string(): "a",
            ids[1].to_string(): "B",
            ids[2].to_string(): " C ",
            ids[3].to_string(): "A",
        })
    }

    async fn submit_quiz(&self) -> (StatusCode, Value) {
        self.post(
            "/api/modules/student-quiz-submit",
            json!({
                "quiz_id": self.quiz_id,
                "instance_id": self.fixture.instance_id,
                "answers": self.three_of_four(),
            }),
        )
        .await
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_submit_activity_then_locked(pool: PgPool) {
    let room = classroom(pool).await;
    let activity_id = room.fixture.activity_id;

    let (status, body) = room
        .post(
            "/api/modules/activity-submissions/submit",
            json!({ "activity_id": activity_id, "submission_content": "fn reverse(list) { ... }" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Activity submitted successfully");

    let (status, body) = room
        .get(&format!("/api/modules/activity-submissions/check/{}", activity_id))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["has_submission"], true);
    assert_eq!(body["submission"]["status"], "submitted");

    let (status, body) = room
        .post(
            "/api/modules/activity-submissions/submit",
            json!({ "activity_id": activity_id, "submission_content": "second try" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Activity already submitted. Contact instructor to resubmit.");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_submit_activity_promotes_draft(pool: PgPool) {
    let fixture = create_course_fixture(&pool, "DS1").await;
    let student = create_test_user(&pool, UserRole::Student).await;
    create_submission(&pool, student.id, fixture.activity_id, "draft", "half done").await;
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/modules/activity-submissions/submit",
            Credential::Bearer(&student.token()),
            Some(json!({ "activity_id": fixture.activity_id, "submission_content": "finished" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Activity submission updated successfully");

    let (_, body) = send(
        &app,
        request(
            "GET",
            &format!("/api/modules/student-activities-with-grades/{}", fixture.module_id),
            Credential::Bearer(&student.token()),
            None,
        ),
    )
    .await;
    let activity = &body["activities"][0];
    assert_eq!(activity["status"], "submitted");
    assert_eq!(activity["has_submission"], true);
    assert_eq!(activity["is_graded"], false);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_submit_activity_requires_content(pool: PgPool) {
    let room = classroom(pool).await;

    let (status, body) = room
        .post(
            "/api/modules/activity-submissions/submit",
            json!({ "activity_id": room.fixture.activity_id, "submission_content": "   " }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Activity ID and content are required");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_student_quizzes_lists_scoped_quiz(pool: PgPool) {
    let room = classroom(pool).await;

    let (status, body) = room
        .get(&format!("/api/modules/student-quizzes/{}", room.fixture.course_id))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["instance_id"], room.fixture.instance_id);
    let quizzes = body["quizzes"].as_array().unwrap();
    assert_eq!(quizzes.len(), 1);
    assert_eq!(quizzes[0]["exam_name"], "Quiz 1");
    assert_eq!(quizzes[0]["is_taken"], false);
    assert!(quizzes[0]["score"].is_null());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_student_quizzes_requires_enrollment(pool: PgPool) {
    let fixture = create_course_fixture(&pool, "DS1").await;
    let outsider = create_test_user(&pool, UserRole::Student).await;
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        request(
            "GET",
            &format!("/api/modules/student-quizzes/{}", fixture.course_id),
            Credential::Bearer(&outsider.token()),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Student not enrolled in this course");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_quiz_questions_hide_answers(pool: PgPool) {
    let room = classroom(pool).await;

    let (status, body) = room
        .get(&format!(
            "/api/modules/student-quiz-questions/{}/{}",
            room.quiz_id, room.fixture.instance_id
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["exam_name"], "Quiz 1");
    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 4);
    for (i, question) in questions.iter().enumerate() {
        assert_eq!(question["question_number"], i + 1);
        assert!(question.get("correct_answer").is_none());
        assert_eq!(question["options"]["B"], "Beta");
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_questions_for_wrong_category(pool: PgPool) {
    let room = classroom(pool).await;

    let (status, body) = room
        .get(&format!(
            "/api/modules/student-exam-questions-unique/{}/{}",
            room.quiz_id, room.fixture.instance_id
        ))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Exam not found");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_questions_require_instance_enrollment(pool: PgPool) {
    let fixture = create_course_fixture(&pool, "DS1").await;
    let quiz_id = create_exam_type(&pool, "Quiz 1", "quiz", "Prelim", 4).await;
    create_scope(&pool, fixture.course_id, quiz_id, fixture.module_id).await;
    let outsider = create_test_user(&pool, UserRole::Student).await;
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        request(
            "GET",
            &format!("/api/modules/student-quiz-questions/{}/{}", quiz_id, fixture.instance_id),
            Credential::Bearer(&outsider.token()),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Student not enrolled in this course instance");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_unscoped_quiz_has_no_questions(pool: PgPool) {
    let room = classroom(pool.clone()).await;
    let unscoped = create_exam_type(&pool, "Quiz 2", "quiz", "Midterm", 5).await;

    let (status, body) = room
        .get(&format!(
            "/api/modules/student-quiz-questions/{}/{}",
            unscoped, room.fixture.instance_id
        ))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No questions available for this quiz");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_submit_quiz_scores_and_locks(pool: PgPool) {
    let room = classroom(pool).await;

    let (status, body) = room.submit_quiz().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Quiz submitted successfully");
    assert_eq!(body["score"], 75.0);
    assert_eq!(body["correct_answers"], 3);
    assert_eq!(body["total_questions"], 4);
    assert_eq!(body["submission_reason"], "manual");

    let (status, body) = room.submit_quiz().await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Quiz already submitted");

    let (status, body) = room
        .get(&format!(
            "/api/modules/student-quiz-questions/{}/{}",
            room.quiz_id, room.fixture.instance_id
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Quiz already taken");

    let (_, body) = room
        .get(&format!("/api/modules/student-quizzes/{}", room.fixture.course_id))
        .await;
    assert_eq!(body["quizzes"][0]["is_taken"], true);
    assert_eq!(body["quizzes"][0]["score"], 75.0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_submit_quiz_requires_answers(pool: PgPool) {
    let room = classroom(pool).await;

    let (status, body) = room
        .post(
            "/api/modules/student-quiz-submit",
            json!({ "quiz_id": room.quiz_id, "instance_id": room.fixture.instance_id, "answers": {} }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required data");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_submit_exam_without_answers(pool: PgPool) {
    let room = classroom(pool.clone()).await;
    let exam_id = create_exam_type(&pool, "Midterm Exam", "exam", "Midterm", 4).await;
    create_scope(&pool, room.fixture.course_id, exam_id, room.fixture.module_id).await;

    let (status, body) = room
        .post(
            "/api/modules/submit-exam-results-unique",
            json!({
                "exam_id": exam_id,
                "instance_id": room.fixture.instance_id,
                "submission_reason": "timeout"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Exam submitted successfully");
    assert_eq!(body["score"], 0.0);
    assert_eq!(body["submission_reason"], "timeout");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_module_progress_counts_tracked_sections(pool: PgPool) {
    let room = classroom(pool).await;

    let (status, _) = room
        .post(
            "/api/modules/student-progress/track-section",
            json!({ "section_id": room.fixture.section_id }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Tracking twice keeps a single completion.
    room.post(
        "/api/modules/student-progress/track-section",
        json!({ "section_id": room.fixture.section_id }),
    )
    .await;

    let (status, body) = room
        .get(&format!(
            "/api/modules/student-progress/module-progress/{}",
            room.fixture.module_id
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["completed_sections"], 1);
    assert_eq!(body["sections_percentage"], 100.0);
    assert_eq!(body["submitted_activities"], 0);
    assert_eq!(body["overall_percentage"], 50.0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_track_unknown_section(pool: PgPool) {
    let room = classroom(pool).await;

    let (status, body) = room
        .post("/api/modules/student-progress/track-section", json!({ "section_id": 987654 }))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Section not found");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_course_progress_and_overview(pool: PgPool) {
    let room = classroom(pool).await;
    room.post(
        "/api/modules/activity-submissions/submit",
        json!({ "activity_id": room.fixture.activity_id, "submission_content": "done" }),
    )
    .await;
    room.submit_quiz().await;

    let (status, body) = room
        .get(&format!(
            "/api/modules/student-course-progress-comprehensive/{}",
            room.fixture.course_id
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    // Sections 0%, activities 100%, quizzes 100%; exams carry no weight.
    assert_eq!(body["overall_progress"], 60.0);
    assert_eq!(body["components"]["activities"]["percentage"], 100.0);
    assert_eq!(body["components"]["exams"]["total"], 0);

    let (status, body) = room
        .get(&format!("/api/modules/course-overview-stats/{}", room.fixture.course_id))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["modules"], "0/1");
    assert_eq!(body["quizzes"], "1/1");
    assert_eq!(body["exams"], "0/0");
    assert_eq!(body["overall_grade"], 75.0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_comprehensive_grades(pool: PgPool) {
    let room = classroom(pool).await;
    room.post(
        "/api/modules/activity-submissions/submit",
        json!({ "activity_id": room.fixture.activity_id, "submission_content": "done" }),
    )
    .await;
    room.submit_quiz().await;

    let (status, body) = room
        .get(&format!(
            "/api/modules/student-comprehensive-grades/{}",
            room.fixture.course_id
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["course_info"]["course_code"], "DS1");
    assert_eq!(body["activity_grades"].as_array().unwrap().len(), 1);
    assert!(body["activity_grades"][0]["grade"].is_null());
    assert_eq!(body["quiz_grades"][0]["score"], 75.0);
    assert_eq!(body["summary"]["activities"]["count"], 1);
    assert_eq!(body["summary"]["activities"]["graded_count"], 0);
    assert_eq!(body["summary"]["quizzes"]["highest"], 75.0);
    assert_eq!(body["overall_grade"], 75.0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_overall_progress_without_enrollments(pool: PgPool) {
    let student = create_test_user(&pool, UserRole::Student).await;
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        request(
            "GET",
            "/api/modules/student-overall-learning-progress",
            Credential::Bearer(&student.token()),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["overall_progress"], 0.0);
    assert_eq!(body["enrolled_courses"], 0);
    assert_eq!(body["counts"]["sections"], "0/0");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_overall_progress_across_courses(pool: PgPool) {
    let room = classroom(pool).await;
    room.post(
        "/api/modules/student-progress/track-section",
        json!({ "section_id": room.fixture.section_id }),
    )
    .await;

    let (status, body) = room.get("/api/modules/student-overall-learning-progress").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enrolled_courses"], 1);
    assert_eq!(body["counts"]["sections"], "1/1");
    assert_eq!(body["counts"]["quizzes"], "0/1");
    assert_eq!(body["components"]["sections"], 100.0);
    // 100 * 0.3 over weights 0.3 + 0.2 + 0.25
    assert_eq!(body["overall_progress"], 40.0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_learning_routes_reject_api_key(pool: PgPool) {
    let (_, key) = common::create_admin_with_api_key(&pool).await;
    let app = setup_test_app(pool);

    let (status, _) = send(
        &app,
        request(
            "GET",
            "/api/modules/student-overall-learning-progress",
            Credential::ApiKey(&key),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
