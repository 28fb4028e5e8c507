use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::modules::enrollments::controller::{
    bulk_enroll, create_enrollment, export_enrollments_csv, list_enrollments, list_instances,
    list_students, student_enrollments, upload_enrollments_csv,
};
use crate::modules::enrollments::model::MAX_UPLOAD_BYTES;
use crate::state::AppState;

/// Room for the multipart framing and form fields around the file.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn init_enrollments_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_enrollments).post(create_enrollment))
        .route("/student/{student_id}", get(student_enrollments))
        .route("/instances", get(list_instances))
        .route("/students", get(list_students))
        .route("/bulk-enroll", post(bulk_enroll))
        .route(
            "/upload-csv",
            post(upload_enrollments_csv)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD_BYTES)),
        )
        .route("/export-csv", get(export_enrollments_csv))
}
