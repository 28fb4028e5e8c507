use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::instrument;

use lms_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::modules::assessment_preview::model::{
    GeneratePreviewDto, PreviewResponse, ScopedAssessmentsResponse,
};
use crate::modules::assessment_preview::service::AssessmentPreviewService;
use crate::modules::courses::model::{CourseOptionsResponse, SearchQuery};
use crate::modules::courses::service::CourseService;
use crate::state::AppState;

#[instrument(skip(state, _auth))]
pub async fn list_courses(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<CourseOptionsResponse>, AppError> {
    let courses = CourseService::course_options(&state.db, &query).await?;
    Ok(Json(CourseOptionsResponse {
        success: true,
        courses,
    }))
}

#[instrument(skip(state, _auth))]
pub async fn list_assessments(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(course_id): Path<i64>,
) -> Result<Json<ScopedAssessmentsResponse>, AppError> {
    let assessments = AssessmentPreviewService::scoped_assessments(&state.db, course_id).await?;
    Ok(Json(ScopedAssessmentsResponse {
        success: true,
        assessments,
    }))
}

/// Draw a sample assessment exactly as a student would receive it
#[instrument(skip(state, _auth))]
pub async fn generate_preview(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(dto): Json<GeneratePreviewDto>,
) -> Result<Json<PreviewResponse>, AppError> {
    let (Some(course_id), Some(exam_type_id)) = (dto.course_id, dto.exam_type_id) else {
        return Err(AppError::invalid("course_id and exam_type_id are required"));
    };
    let preview = AssessmentPreviewService::generate_preview(&state.db, course_id, exam_type_id).await?;
    Ok(Json(preview))
}
