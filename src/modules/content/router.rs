use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::modules::content::controller::{
    course_details, create_exam_item, delete_activity, delete_exam_item, delete_module,
    delete_section, export_aiken_course, export_aiken_module, insert_module, insert_section,
    list_activities, list_courses, list_exam_items, list_modules, list_sections, reorder_module,
    save_description, update_activity, update_exam_item, update_module, update_section,
    update_section_full,
};
use crate::state::AppState;

pub fn init_content_router() -> Router<AppState> {
    Router::new()
        .route("/courses", get(list_courses))
        .route("/course-details/{course_id}", get(course_details))
        .route("/save-description", post(save_description))
        .route("/", get(list_modules))
        .route("/update", post(update_module))
        .route("/delete/{module_id}", delete(delete_module))
        .route("/reorder", post(reorder_module))
        .route("/insert-module", post(insert_module))
        .route("/sections", get(list_sections))
        .route("/update-section-full", post(update_section_full))
        .route("/update-section", post(update_section))
        .route("/insert-section", post(insert_section))
        .route("/delete-section/{section_id}", delete(delete_section))
        .route("/activities", get(list_activities))
        .route("/update-activity", post(update_activity))
        .route("/delete-activity/{activity_id}", delete(delete_activity))
        .route("/exam-items", get(list_exam_items))
        .route("/exam-items/manual-create", post(create_exam_item))
        .route("/update-exam-item", post(update_exam_item))
        .route("/delete-exam-item/{item_id}", delete(delete_exam_item))
        .route(
            "/export-aiken-txt-single-module/{module_id}",
            get(export_aiken_module),
        )
        .route(
            "/export-aiken-txt-all-modules/{course_id}",
            get(export_aiken_course),
        )
}
