use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::Response,
};
use tracing::instrument;

use lms_core::AppError;

use crate::metrics::track_enrollments_created;
use crate::middleware::auth::AuthUser;
use crate::modules::courses::model::SearchQuery;
use crate::modules::enrollments::model::{
    BulkEnrollDto, BulkEnrollResponse, CreateEnrollmentDto, CreateEnrollmentResponse,
    EnrollableInstancesResponse, EnrollmentListQuery, EnrollmentListResponse,
    EnrollmentUploadResponse, ExportQuery, MAX_UPLOAD_BYTES, StudentEnrollmentsResponse,
    StudentsResponse,
};
use crate::modules::enrollments::service::EnrollmentService;
use crate::state::AppState;
use crate::utils::csv::{attachment, parse_csv, read_csv_upload, write_csv};

#[instrument(skip(state, _auth))]
pub async fn student_enrollments(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(student_id): Path<i64>,
) -> Result<Json<StudentEnrollmentsResponse>, AppError> {
    let enrollments = EnrollmentService::for_student(&state.db, student_id).await?;
    Ok(Json(StudentEnrollmentsResponse {
        success: true,
        enrollments,
    }))
}

#[instrument(skip(state, _auth))]
pub async fn list_enrollments(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<EnrollmentListQuery>,
) -> Result<Json<EnrollmentListResponse>, AppError> {
    Ok(Json(EnrollmentService::list(&state.db, query).await?))
}

#[instrument(skip(state, _auth))]
pub async fn list_instances(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<EnrollableInstancesResponse>, AppError> {
    let instances = EnrollmentService::instances(&state.db, &query).await?;
    Ok(Json(EnrollableInstancesResponse {
        success: true,
        instances,
    }))
}

#[instrument(skip(state, _auth))]
pub async fn list_students(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<StudentsResponse>, AppError> {
    let students = EnrollmentService::students(&state.db, &query).await?;
    Ok(Json(StudentsResponse {
        success: true,
        students,
    }))
}

#[instrument(skip(state, _auth))]
pub async fn create_enrollment(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(dto): Json<CreateEnrollmentDto>,
) -> Result<(StatusCode, Json<CreateEnrollmentResponse>), AppError> {
    let (Some(instance_id), Some(user_id)) = (dto.instance_id, dto.user_id) else {
        return Err(AppError::invalid("instance_id and user_id are required"));
    };

    let enrollment_id = EnrollmentService::create(&state.db, instance_id, user_id).await?;
    track_enrollments_created("api", 1);

    Ok((
        StatusCode::CREATED,
        Json(CreateEnrollmentResponse {
            success: true,
            message: "Enrollment created successfully".to_string(),
            enrollment_id,
        }),
    ))
}

#[instrument(skip(state, _auth, dto))]
pub async fn bulk_enroll(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(dto): Json<BulkEnrollDto>,
) -> Result<Json<BulkEnrollResponse>, AppError> {
    let instance_id = dto
        .instance_id
        .ok_or_else(|| AppError::invalid("instance_id is required"))?;
    if dto.user_ids.is_empty() {
        return Err(AppError::invalid("user_ids must be a non-empty list"));
    }

    let result = EnrollmentService::bulk_enroll(&state.db, instance_id, &dto.user_ids).await?;
    track_enrollments_created("bulk", result.created);

    Ok(Json(BulkEnrollResponse {
        success: true,
        message: format!(
            "Bulk enrollment completed. {} users enrolled successfully.",
            result.created
        ),
        created: result.created,
        has_errors: result.has_errors(),
        errors: result.errors,
    }))
}

/// Enroll students listed in a CSV file into one instance
#[instrument(skip(state, _auth, multipart))]
pub async fn upload_enrollments_csv(
    State(state): State<AppState>,
    _auth: AuthUser,
    multipart: Multipart,
) -> Result<Json<EnrollmentUploadResponse>, AppError> {
    let upload = read_csv_upload(multipart, Some(MAX_UPLOAD_BYTES)).await?;
    let instance_id = upload
        .fields
        .get("instance_id")
        .and_then(|v| v.trim().parse::<i64>().ok())
        .ok_or_else(|| AppError::invalid("Course instance ID is required"))?;

    let course_info = EnrollmentService::course_info(&state.db, instance_id).await?;
    let (_, rows) = parse_csv(&upload.bytes)?;
    let result = EnrollmentService::import_rows(&state.db, instance_id, &rows).await?;
    track_enrollments_created("csv", result.created);

    Ok(Json(EnrollmentUploadResponse {
        success: true,
        message: format!("Enrollment CSV processed for {}", course_info),
        created: result.created,
        has_errors: result.has_errors(),
        errors: result.errors,
        course_info,
    }))
}

#[instrument(skip(state, _auth))]
pub async fn export_enrollments_csv(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let rows = EnrollmentService::export_rows(&state.db, query.instance_id).await?;
    let body = write_csv(
        &["USN", "Student Name", "Course Code", "Course Title", "Term"],
        rows,
        true,
    )?;
    Ok(attachment(body, "text/csv; charset=utf-8", &query.filename()))
}
