use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::instrument;

use lms_core::AppError;

use crate::middleware::api_key::ApiKeyUser;
use crate::modules::assessment_scopes::model::{
    CourseQuery, SaveScopeDto, ScopeCountResponse, ScopeCoursesResponse, ScopeExamTypesResponse,
    ScopeModulesResponse,
};
use crate::modules::assessment_scopes::service::AssessmentScopeService;
use crate::modules::courses::model::SearchQuery;
use crate::state::AppState;
use crate::utils::response::MessageResponse;

#[instrument(skip(state, _caller))]
pub async fn list_courses(
    State(state): State<AppState>,
    _caller: ApiKeyUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ScopeCoursesResponse>, AppError> {
    let courses = AssessmentScopeService::courses(&state.db, &query).await?;
    Ok(Json(ScopeCoursesResponse {
        success: true,
        courses,
    }))
}

#[instrument(skip(state, _caller))]
pub async fn list_exam_types(
    State(state): State<AppState>,
    _caller: ApiKeyUser,
    Query(query): Query<CourseQuery>,
) -> Result<Json<ScopeExamTypesResponse>, AppError> {
    let exam_types = AssessmentScopeService::exam_types(&state.db, query.course_id).await?;
    Ok(Json(ScopeExamTypesResponse {
        success: true,
        exam_types,
    }))
}

/// Course modules plus the ones already scoped for an exam type
#[instrument(skip(state, _caller))]
pub async fn list_modules(
    State(state): State<AppState>,
    _caller: ApiKeyUser,
    Query(query): Query<CourseQuery>,
) -> Result<Json<ScopeModulesResponse>, AppError> {
    let course_id = query
        .course_id
        .ok_or_else(|| AppError::invalid("Course ID is required"))?;
    let (modules, selected_modules) =
        AssessmentScopeService::modules(&state.db, course_id, query.exam_type_id).await?;

    Ok(Json(ScopeModulesResponse {
        success: true,
        modules,
        selected_modules,
    }))
}

#[instrument(skip(state, _caller))]
pub async fn count_scopes(
    State(state): State<AppState>,
    _caller: ApiKeyUser,
    Path(course_id): Path<i64>,
) -> Result<Json<ScopeCountResponse>, AppError> {
    let count = AssessmentScopeService::count(&state.db, course_id).await?;
    Ok(Json(ScopeCountResponse {
        success: true,
        count,
    }))
}

#[instrument(skip(state, _caller))]
pub async fn save_scope(
    State(state): State<AppState>,
    _caller: ApiKeyUser,
    Json(dto): Json<SaveScopeDto>,
) -> Result<Json<MessageResponse>, AppError> {
    AssessmentScopeService::save(&state.db, dto).await?;
    Ok(Json(MessageResponse::ok("Assessment scope saved successfully")))
}
