use axum::{Router, routing::post};

use crate::modules::ai::controller::{
    ai_grade, generate_activity, generate_exam_items, generate_modules, generate_outcomes,
    generate_section_content, generate_sections, regenerate_description, suggest_count,
};
use crate::state::AppState;

pub fn init_ai_router() -> Router<AppState> {
    Router::new()
        .route("/suggest-count", post(suggest_count))
        .route("/generate", post(generate_modules))
        .route("/regenerate", post(regenerate_description))
        .route("/generate-outcomes", post(generate_outcomes))
        .route("/generate-sections", post(generate_sections))
        .route("/generate-section-content", post(generate_section_content))
        .route("/generate-single-activity", post(generate_activity))
        .route("/generate-exam-items", post(generate_exam_items))
        .route("/activity-grading/ai-grade", post(ai_grade))
}
