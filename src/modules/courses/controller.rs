use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::Response,
};
use tracing::instrument;

use lms_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::modules::courses::model::{
    CourseListQuery, CourseListResponse, CourseResponse, CreateCourseDto, GenerateDescriptionDto,
    GeneratedDescription, UpdateCourseDto,
};
use crate::modules::courses::service::CourseService;
use crate::state::AppState;
use crate::utils::csv::{attachment, parse_csv, read_csv_upload, write_csv};
use crate::utils::response::{BatchResult, MessageResponse};
use crate::validator::ValidatedJson;

/// List courses with search, sorting and pagination
#[instrument(skip(state, _auth))]
pub async fn list_courses(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<CourseListQuery>,
) -> Result<Json<CourseListResponse>, AppError> {
    Ok(Json(CourseService::list_courses(&state.db, query).await?))
}

#[instrument(skip(state, _auth))]
pub async fn create_course(
    State(state): State<AppState>,
    _auth: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateCourseDto>,
) -> Result<(StatusCode, Json<CourseResponse>), AppError> {
    let course = CourseService::create_course(&state.db, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(CourseResponse {
            success: true,
            message: "Course created successfully".to_string(),
            course,
        }),
    ))
}

#[instrument(skip(state, _auth))]
pub async fn update_course(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(course_id): Path<i64>,
    Json(dto): Json<UpdateCourseDto>,
) -> Result<Json<MessageResponse>, AppError> {
    let message = match CourseService::update_course(&state.db, course_id, dto).await? {
        Some(_) => "Course updated successfully",
        None => "No changes made",
    };
    Ok(Json(MessageResponse::ok(message)))
}

#[instrument(skip(state, _auth))]
pub async fn delete_course(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(course_id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    CourseService::delete_course(&state.db, course_id).await?;
    Ok(Json(MessageResponse::ok("Course deleted successfully")))
}

/// Import courses from a CSV file
#[instrument(skip(state, _auth, multipart))]
pub async fn upload_courses_csv(
    State(state): State<AppState>,
    _auth: AuthUser,
    multipart: Multipart,
) -> Result<Json<BatchResult>, AppError> {
    let upload = read_csv_upload(multipart, None).await?;
    let (_, rows) = parse_csv(&upload.bytes)?;
    Ok(Json(CourseService::import_rows(&state.db, &rows).await?))
}

/// Ask the language model for a catalogue description
#[instrument(skip(state, _auth))]
pub async fn generate_description(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(dto): Json<GenerateDescriptionDto>,
) -> Result<Json<GeneratedDescription>, AppError> {
    let course_title = dto.course_title.as_deref().map(str::trim).unwrap_or_default();
    if course_title.is_empty() {
        return Err(AppError::invalid("Course title is required"));
    }

    let description = CourseService::generate_description(
        state.llm.as_ref(),
        dto.course_code.as_deref().map(str::trim),
        course_title,
    )
    .await?;

    Ok(Json(GeneratedDescription {
        success: true,
        description,
        generated: true,
    }))
}

#[instrument(skip(state, _auth))]
pub async fn export_courses_csv(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Response, AppError> {
    let rows = CourseService::export_rows(&state.db).await?;
    let body = write_csv(&["course_code", "course_title", "description"], rows, false)?;
    Ok(attachment(body, "text/csv", "courses.csv"))
}
