use axum::{
    Router,
    routing::{get, put},
};

use crate::modules::exam_types::controller::{
    create_exam_type, delete_exam_type, list_exam_types, update_exam_type,
};
use crate::state::AppState;

pub fn init_exam_types_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_exam_types).post(create_exam_type))
        .route("/{exam_type_id}", put(update_exam_type).delete(delete_exam_type))
}
