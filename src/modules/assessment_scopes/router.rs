use axum::{
    Router,
    routing::{get, post},
};

use crate::modules::assessment_scopes::controller::{
    count_scopes, list_courses, list_exam_types, list_modules, save_scope,
};
use crate::state::AppState;

pub fn init_assessment_scopes_router() -> Router<AppState> {
    Router::new()
        .route("/courses", get(list_courses))
        .route("/exam_types", get(list_exam_types))
        .route("/modules", get(list_modules))
        .route("/count/{course_id}", get(count_scopes))
        .route("/save", post(save_scope))
}
