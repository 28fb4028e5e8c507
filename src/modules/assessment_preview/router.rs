use axum::{
    Router,
    routing::{get, post},
};

use crate::modules::assessment_preview::controller::{
    generate_preview, list_assessments, list_courses,
};
use crate::state::AppState;

pub fn init_assessment_preview_router() -> Router<AppState> {
    Router::new()
        .route("/courses", get(list_courses))
        .route("/assessments/{course_id}", get(list_assessments))
        .route("/generate-preview", post(generate_preview))
}
