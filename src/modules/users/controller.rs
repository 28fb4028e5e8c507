use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use tracing::instrument;

use lms_core::AppError;

use crate::metrics::track_users_created;
use crate::middleware::api_key::ApiKeyUser;
use crate::modules::users::model::{
    CreateUserDto, UpdateOutcome, UpdateUserDto, UserResponse, UsersResponse,
};
use crate::modules::users::service::UserService;
use crate::state::AppState;
use crate::utils::csv::{parse_csv, read_csv_upload};
use crate::utils::response::{BatchResult, MessageResponse};

/// List all users, newest first
#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    _caller: ApiKeyUser,
) -> Result<Json<UsersResponse>, AppError> {
    let users = UserService::list_users(&state.db).await?;
    Ok(Json(UsersResponse {
        success: true,
        users,
    }))
}

/// Create a user
#[instrument(skip(state, dto))]
pub async fn create_user(
    State(state): State<AppState>,
    _caller: ApiKeyUser,
    Json(dto): Json<CreateUserDto>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = UserService::create_user(&state.db, dto).await?;
    track_users_created("api", 1);

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            success: true,
            message: "User created successfully".to_string(),
            user,
        }),
    ))
}

#[instrument(skip(state, dto))]
pub async fn update_user(
    State(state): State<AppState>,
    _caller: ApiKeyUser,
    Path(user_id): Path<i64>,
    Json(dto): Json<UpdateUserDto>,
) -> Result<Json<serde_json::Value>, AppError> {
    match UserService::update_user(&state.db, user_id, dto).await? {
        UpdateOutcome::Unchanged => Ok(Json(serde_json::to_value(MessageResponse::ok(
            "No changes made",
        ))?)),
        UpdateOutcome::Updated(user) => Ok(Json(serde_json::to_value(UserResponse {
            success: true,
            message: "User updated successfully".to_string(),
            user,
        })?)),
    }
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    _caller: ApiKeyUser,
    Path(user_id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    UserService::delete_user(&state.db, user_id).await?;
    Ok(Json(MessageResponse::ok("User deleted successfully")))
}

/// Bulk create users from a CSV upload
#[instrument(skip(state, multipart))]
pub async fn upload_users_csv(
    State(state): State<AppState>,
    _caller: ApiKeyUser,
    multipart: Multipart,
) -> Result<Json<BatchResult>, AppError> {
    let upload = read_csv_upload(multipart, None).await?;
    let (_, rows) = parse_csv(&upload.bytes)?;

    let result = UserService::import_rows(&state.db, &rows).await?;
    track_users_created("csv", result.created);

    Ok(Json(result))
}
