use axum::{
    Router,
    routing::{get, post},
};

use crate::modules::grading::controller::{
    courses_with_pending, grade_submission, grading_activities, grading_submission,
    pending_count, submission_tracking, submissions_for_activity,
};
use crate::state::AppState;

pub fn init_grading_router() -> Router<AppState> {
    Router::new()
        .route(
            "/activity-grading/submission/{submission_id}",
            get(grading_submission),
        )
        .route("/submission-tracking", get(submission_tracking))
        .route(
            "/activity-grading/courses-with-pending",
            get(courses_with_pending),
        )
        .route(
            "/activity-grading/pending-count/{course_id}",
            get(pending_count),
        )
        .route(
            "/activity-grading/activities/{instance_id}",
            get(grading_activities),
        )
        .route(
            "/activity-grading/submissions/{activity_id}",
            get(submissions_for_activity),
        )
        .route("/activity-grading/grade", post(grade_submission))
}
