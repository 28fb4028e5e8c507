use axum::{
    Router,
    routing::{get, post},
};

use crate::modules::instances::controller::{
    bulk_create_instances, delete_instance, export_instances_csv, get_instance, list_course_options,
    list_instances, list_terms, update_instance,
};
use crate::state::AppState;

pub fn init_instances_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_instances))
        .route("/terms", get(list_terms))
        .route("/courses", get(list_course_options))
        .route("/bulk-create", post(bulk_create_instances))
        .route("/export-csv", get(export_instances_csv))
        .route(
            "/{instance_id}",
            get(get_instance).put(update_instance).delete(delete_instance),
        )
}
