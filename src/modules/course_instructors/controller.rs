use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;

use lms_core::AppError;

use crate::middleware::api_key::ApiKeyUser;
use crate::modules::course_instructors::model::{
    AssignInstructorDto, AssignInstructorResponse, AssignmentFilter, AssignmentListResponse,
    InstanceOptionsResponse, TeachersResponse, UpdateAssignmentDto,
};
use crate::modules::course_instructors::service::CourseInstructorService;
use crate::state::AppState;
use crate::utils::response::MessageResponse;

#[instrument(skip(state, _caller))]
pub async fn list_assignments(
    State(state): State<AppState>,
    _caller: ApiKeyUser,
    Query(filter): Query<AssignmentFilter>,
) -> Result<Json<AssignmentListResponse>, AppError> {
    let instructors = CourseInstructorService::list_assignments(&state.db, filter).await?;
    Ok(Json(AssignmentListResponse {
        success: true,
        total: instructors.len(),
        instructors,
    }))
}

/// Assign an instructor or teacher to a course instance
#[instrument(skip(state, _caller))]
pub async fn assign_instructor(
    State(state): State<AppState>,
    _caller: ApiKeyUser,
    Json(dto): Json<AssignInstructorDto>,
) -> Result<(StatusCode, Json<AssignInstructorResponse>), AppError> {
    let course_instructor_id = CourseInstructorService::assign(&state.db, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(AssignInstructorResponse {
            success: true,
            message: "Course instructor assignment created successfully".to_string(),
            course_instructor_id,
        }),
    ))
}

#[instrument(skip(state, _caller))]
pub async fn update_assignment(
    State(state): State<AppState>,
    _caller: ApiKeyUser,
    Path(course_instructor_id): Path<i64>,
    Json(dto): Json<UpdateAssignmentDto>,
) -> Result<Json<MessageResponse>, AppError> {
    CourseInstructorService::update_role(&state.db, course_instructor_id, dto.role.as_deref())
        .await?;
    Ok(Json(MessageResponse::ok(
        "Course instructor assignment updated successfully",
    )))
}

#[instrument(skip(state, _caller))]
pub async fn delete_assignment(
    State(state): State<AppState>,
    _caller: ApiKeyUser,
    Path(course_instructor_id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    CourseInstructorService::remove(&state.db, course_instructor_id).await?;
    Ok(Json(MessageResponse::ok(
        "Course instructor assignment deleted successfully",
    )))
}

#[instrument(skip(state, _caller))]
pub async fn available_teachers(
    State(state): State<AppState>,
    _caller: ApiKeyUser,
) -> Result<Json<TeachersResponse>, AppError> {
    let teachers = CourseInstructorService::available_teachers(&state.db).await?;
    Ok(Json(TeachersResponse {
        success: true,
        teachers,
    }))
}

#[instrument(skip(state, _caller))]
pub async fn available_instances(
    State(state): State<AppState>,
    _caller: ApiKeyUser,
) -> Result<Json<InstanceOptionsResponse>, AppError> {
    let instances = CourseInstructorService::available_instances(&state.db).await?;
    Ok(Json(InstanceOptionsResponse {
        success: true,
        instances,
    }))
}
