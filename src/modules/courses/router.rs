use axum::{
    Router,
    routing::{get, post, put},
};

use crate::modules::courses::controller::{
    create_course, delete_course, export_courses_csv, generate_description, list_courses,
    update_course, upload_courses_csv,
};
use crate::state::AppState;

pub fn init_courses_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_courses).post(create_course))
        .route("/{course_id}", put(update_course).delete(delete_course))
        .route("/upload-csv", post(upload_courses_csv))
        .route("/generate-description", post(generate_description))
        .route("/export-csv", get(export_courses_csv))
}
