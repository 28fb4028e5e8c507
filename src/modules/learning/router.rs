use axum::{
    Router,
    routing::{get, post},
};

use crate::modules::learning::controller::{
    check_submission, comprehensive_grades, course_overview_stats, course_progress,
    exam_questions, module_progress, overall_learning_progress, quiz_questions,
    student_activities, student_exams, student_quizzes, submit_activity, submit_exam,
    submit_quiz, track_section,
};
use crate::state::AppState;

pub fn init_learning_router() -> Router<AppState> {
    Router::new()
        .route("/activity-submissions/check/{activity_id}", get(check_submission))
        .route("/activity-submissions/submit", post(submit_activity))
        .route(
            "/student-activities-with-grades/{module_id}",
            get(student_activities),
        )
        .route("/student-quizzes/{course_id}", get(student_quizzes))
        .route("/student-exams/{course_id}", get(student_exams))
        .route(
            "/student-quiz-questions/{quiz_id}/{instance_id}",
            get(quiz_questions),
        )
        .route(
            "/student-exam-questions-unique/{exam_id}/{instance_id}",
            get(exam_questions),
        )
        .route("/student-quiz-submit", post(submit_quiz))
        .route("/submit-exam-results-unique", post(submit_exam))
        .route("/student-progress/track-section", post(track_section))
        .route(
            "/student-progress/module-progress/{module_id}",
            get(module_progress),
        )
        .route("/course-overview-stats/{course_id}", get(course_overview_stats))
        .route(
            "/student-course-progress-comprehensive/{course_id}",
            get(course_progress),
        )
        .route(
            "/student-comprehensive-grades/{course_id}",
            get(comprehensive_grades),
        )
        .route(
            "/student-overall-learning-progress",
            get(overall_learning_progress),
        )
}
