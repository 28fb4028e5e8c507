use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, Method, StatusCode, header};
use axum::{Router, middleware};
use tower_governor::GovernorLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use lms_core::AppError;

use crate::logging::logging_middleware;
use crate::metrics::metrics_middleware;
use crate::middleware::api_key::API_KEY_HEADER;
use crate::middleware::role::require_admin_api_key;
use crate::modules::ai::init_ai_router;
use crate::modules::api_keys::init_api_keys_router;
use crate::modules::assessment_preview::init_assessment_preview_router;
use crate::modules::assessment_scopes::init_assessment_scopes_router;
use crate::modules::auth::init_auth_router;
use crate::modules::content::init_content_router;
use crate::modules::course_instructors::init_course_instructors_router;
use crate::modules::courses::init_courses_router;
use crate::modules::dashboard::init_dashboard_router;
use crate::modules::database::init_database_router;
use crate::modules::enrollments::init_enrollments_router;
use crate::modules::exam_types::init_exam_types_router;
use crate::modules::grading::init_grading_router;
use crate::modules::instances::init_instances_router;
use crate::modules::learning::init_learning_router;
use crate::modules::users::init_users_router;
use crate::state::AppState;

async fn not_found() -> AppError {
    AppError::missing("Not found")
}

async fn method_not_allowed() -> AppError {
    AppError::new(StatusCode::METHOD_NOT_ALLOWED, anyhow::anyhow!("Method not allowed"))
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = state
        .cors_config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(API_KEY_HEADER),
            HeaderName::from_static("x-csrf-token"),
        ])
        .allow_credentials(true)
}

/// Everything under `/api/modules`: content management, generation, the
/// student views and the grading queue share one prefix.
fn modules_router() -> Router<AppState> {
    init_content_router()
        .merge(init_ai_router())
        .merge(init_learning_router())
        .merge(init_grading_router())
}

pub fn init_router(state: AppState) -> Router {
    let mut auth_router = init_auth_router();
    if let Some(config) = state.rate_limit_config.auth_governor_config() {
        auth_router = auth_router.layer(GovernorLayer::new(Arc::new(config)));
    }

    let mut api = Router::new()
        .nest("/auth", auth_router)
        .nest("/api_key", init_api_keys_router())
        .nest("/users", init_users_router())
        .nest("/courses", init_courses_router())
        .nest("/instances", init_instances_router())
        .nest("/course_instructors", init_course_instructors_router())
        .nest("/exam_types", init_exam_types_router())
        .nest("/assessment_scopes", init_assessment_scopes_router())
        .nest("/assessment_preview", init_assessment_preview_router())
        .nest("/dashboard", init_dashboard_router())
        .nest(
            "/database",
            init_database_router().route_layer(middleware::from_fn_with_state(
                state.clone(),
                require_admin_api_key,
            )),
        )
        .nest("/enrollments", init_enrollments_router())
        .nest("/modules", modules_router());

    if let Some(config) = state.rate_limit_config.general_governor_config() {
        api = api.layer(GovernorLayer::new(Arc::new(config)));
    }

    Router::new()
        .nest("/api", api)
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state.clone())
        .layer(cors_layer(&state))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
}
