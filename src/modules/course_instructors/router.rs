use axum::{
    Router,
    routing::{get, put},
};

use crate::modules::course_instructors::controller::{
    assign_instructor, available_instances, available_teachers, delete_assignment,
    list_assignments, update_assignment,
};
use crate::state::AppState;

pub fn init_course_instructors_router() -> Router<AppState> {
    Router::new()
        .route("/instructors", get(list_assignments).post(assign_instructor))
        .route(
            "/instructors/{course_instructor_id}",
            put(update_assignment).delete(delete_assignment),
        )
        .route("/available-teachers", get(available_teachers))
        .route("/available-instances", get(available_instances))
}
