use axum::{
    Json,
    extract::{Path, Query, State},
    response::Response,
};
use tracing::instrument;

use lms_core::AppError;

use crate::middleware::api_key::ApiKeyUser;
use crate::modules::courses::model::{CourseOptionsResponse, SearchQuery};
use crate::modules::courses::service::CourseService;
use crate::modules::instances::model::{
    BulkCreateInstancesDto, BulkCreateResponse, InstanceListQuery, InstanceListResponse,
    InstanceResponse, TermsResponse, UpdateInstanceDto,
};
use crate::modules::instances::service::InstanceService;
use crate::state::AppState;
use crate::utils::csv::{attachment, write_csv};
use crate::utils::response::MessageResponse;

#[instrument(skip(state, _caller))]
pub async fn list_instances(
    State(state): State<AppState>,
    _caller: ApiKeyUser,
    Query(query): Query<InstanceListQuery>,
) -> Result<Json<InstanceListResponse>, AppError> {
    Ok(Json(InstanceService::list_instances(&state.db, query).await?))
}

#[instrument(skip(state, _caller))]
pub async fn list_terms(
    State(state): State<AppState>,
    _caller: ApiKeyUser,
) -> Result<Json<TermsResponse>, AppError> {
    let terms = InstanceService::list_terms(&state.db).await?;
    Ok(Json(TermsResponse {
        success: true,
        terms,
    }))
}

/// Course picker for instance creation
#[instrument(skip(state, _caller))]
pub async fn list_course_options(
    State(state): State<AppState>,
    _caller: ApiKeyUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<CourseOptionsResponse>, AppError> {
    let courses = CourseService::course_options(&state.db, &query).await?;
    Ok(Json(CourseOptionsResponse {
        success: true,
        courses,
    }))
}

/// Create one instance per selected course for a term
#[instrument(skip(state, _caller))]
pub async fn bulk_create_instances(
    State(state): State<AppState>,
    _caller: ApiKeyUser,
    Json(dto): Json<BulkCreateInstancesDto>,
) -> Result<Json<BulkCreateResponse>, AppError> {
    let result = InstanceService::bulk_create(&state.db, dto).await?;
    Ok(Json(BulkCreateResponse {
        success: true,
        message: format!("Created {} course instance(s)", result.created),
        created: result.created,
        errors: result.errors,
    }))
}

#[instrument(skip(state, _caller))]
pub async fn update_instance(
    State(state): State<AppState>,
    _caller: ApiKeyUser,
    Path(instance_id): Path<i64>,
    Json(dto): Json<UpdateInstanceDto>,
) -> Result<Json<MessageResponse>, AppError> {
    let message = if InstanceService::update_instance(&state.db, instance_id, dto).await? {
        "Course instance updated successfully"
    } else {
        "No changes made"
    };
    Ok(Json(MessageResponse::ok(message)))
}

#[instrument(skip(state, _caller))]
pub async fn delete_instance(
    State(state): State<AppState>,
    _caller: ApiKeyUser,
    Path(instance_id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    InstanceService::delete_instance(&state.db, instance_id).await?;
    Ok(Json(MessageResponse::ok("Course instance deleted successfully")))
}

#[instrument(skip(state, _caller))]
pub async fn export_instances_csv(
    State(state): State<AppState>,
    _caller: ApiKeyUser,
) -> Result<Response, AppError> {
    let rows = InstanceService::export_rows(&state.db).await?;
    let body = write_csv(
        &["course_code", "course_title", "term_code", "start_date", "end_date"],
        rows,
        false,
    )?;
    Ok(attachment(body, "text/csv", "course_instances.csv"))
}

#[instrument(skip(state, _caller))]
pub async fn get_instance(
    State(state): State<AppState>,
    _caller: ApiKeyUser,
    Path(instance_id): Path<i64>,
) -> Result<Json<InstanceResponse>, AppError> {
    let instance = InstanceService::get_instance(&state.db, instance_id).await?;
    Ok(Json(InstanceResponse {
        success: true,
        instance,
    }))
}
