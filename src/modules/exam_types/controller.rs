use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;

use lms_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::modules::exam_types::model::{
    ExamTypeDto, ExamTypeListQuery, ExamTypeListResponse, ExamTypeResponse, ValidExamType,
};
use crate::modules::exam_types::service::ExamTypeService;
use crate::state::AppState;
use crate::utils::response::MessageResponse;

#[instrument(skip(state, _auth))]
pub async fn list_exam_types(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<ExamTypeListQuery>,
) -> Result<Json<ExamTypeListResponse>, AppError> {
    Ok(Json(ExamTypeService::list_exam_types(&state.db, query).await?))
}

#[instrument(skip(state, _auth))]
pub async fn create_exam_type(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(dto): Json<ExamTypeDto>,
) -> Result<(StatusCode, Json<ExamTypeResponse>), AppError> {
    let exam_type = ExamTypeService::create(&state.db, ValidExamType::try_from(dto)?).await?;
    Ok((
        StatusCode::CREATED,
        Json(ExamTypeResponse {
            success: true,
            message: "Exam type created successfully".to_string(),
            exam_type,
        }),
    ))
}

#[instrument(skip(state, _auth))]
pub async fn update_exam_type(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(exam_type_id): Path<i64>,
    Json(dto): Json<ExamTypeDto>,
) -> Result<Json<ExamTypeResponse>, AppError> {
    let exam_type =
        ExamTypeService::update(&state.db, exam_type_id, ValidExamType::try_from(dto)?).await?;
    Ok(Json(ExamTypeResponse {
        success: true,
        message: "Exam type updated successfully".to_string(),
        exam_type,
    }))
}

#[instrument(skip(state, _auth))]
pub async fn delete_exam_type(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(exam_type_id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    ExamTypeService::delete(&state.db, exam_type_id).await?;
    Ok(Json(MessageResponse::ok("Exam type deleted successfully")))
}
