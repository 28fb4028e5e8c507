use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::instrument;

use lms_core::AppError;

use crate::middleware::current_user::CurrentUser;
use crate::modules::courses::model::SearchQuery;
use crate::modules::grading::model::{
    ActivitySubmissionsResponse, GradeDto, GradingActivitiesResponse, GradingSubmission,
    PendingCountResponse, PendingCoursesResponse, SubmissionTrackingResponse,
};
use crate::modules::grading::service::GradingService;
use crate::state::AppState;
use crate::utils::response::MessageResponse;

#[instrument(skip(state, _caller))]
pub async fn grading_submission(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Path(submission_id): Path<i64>,
) -> Result<Json<GradingSubmission>, AppError> {
    let submission = GradingService::submission(&state.db, submission_id).await?;
    Ok(Json(submission))
}

#[instrument(skip(state, _caller))]
pub async fn submission_tracking(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SubmissionTrackingResponse>, AppError> {
    let courses = GradingService::submission_tracking(&state.db, &query).await?;
    Ok(Json(SubmissionTrackingResponse {
        success: true,
        courses,
    }))
}

#[instrument(skip(state, _caller))]
pub async fn courses_with_pending(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<PendingCoursesResponse>, AppError> {
    let courses = GradingService::courses_with_pending(&state.db, &query).await?;
    Ok(Json(PendingCoursesResponse {
        success: true,
        courses,
    }))
}

#[instrument(skip(state, _caller))]
pub async fn pending_count(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Path(course_id): Path<i64>,
) -> Result<Json<PendingCountResponse>, AppError> {
    let count = GradingService::pending_count(&state.db, course_id).await?;
    Ok(Json(PendingCountResponse {
        success: true,
        count,
    }))
}

#[instrument(skip(state, _caller))]
pub async fn grading_activities(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Path(instance_id): Path<i64>,
) -> Result<Json<GradingActivitiesResponse>, AppError> {
    let activities = GradingService::activities(&state.db, instance_id).await?;
    Ok(Json(GradingActivitiesResponse {
        success: true,
        activities,
    }))
}

#[instrument(skip(state, _caller))]
pub async fn submissions_for_activity(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Path(activity_id): Path<i64>,
) -> Result<Json<ActivitySubmissionsResponse>, AppError> {
    let submissions = GradingService::submissions(&state.db, activity_id).await?;
    Ok(Json(ActivitySubmissionsResponse {
        success: true,
        submissions,
    }))
}

#[instrument(skip(state, _caller, dto))]
pub async fn grade_submission(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Json(dto): Json<GradeDto>,
) -> Result<Json<MessageResponse>, AppError> {
    let (Some(submission_id), Some(grade)) = (dto.submission_id, dto.grade) else {
        return Err(AppError::invalid("Submission ID and grade are required"));
    };
    let feedback = dto.feedback.as_deref().map(str::trim).unwrap_or_default();

    GradingService::grade(&state.db, submission_id, grade, feedback).await?;
    Ok(Json(MessageResponse::ok("Grade saved successfully")))
}
