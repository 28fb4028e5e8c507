use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use lms_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::modules::api_keys::model::{ApiKeyListResponse, ApiKeyNameDto, GeneratedApiKey};
use crate::modules::api_keys::service::ApiKeyService;
use crate::state::AppState;
use crate::utils::response::MessageResponse;
use crate::validator::ValidatedJson;

/// Generate a new API key for the caller
#[instrument(skip(state, auth_user))]
pub async fn generate_api_key(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<ApiKeyNameDto>,
) -> Result<(StatusCode, Json<GeneratedApiKey>), AppError> {
    let name = dto.trimmed().ok_or_else(|| AppError::invalid("Name is required"))?;
    let (api_key_id, api_key) =
        ApiKeyService::generate(&state.db, auth_user.user_id()?, name).await?;

    Ok((
        StatusCode::CREATED,
        Json(GeneratedApiKey {
            success: true,
            message: "API key generated. Store it now; it will not be shown again.".to_string(),
            api_key,
            api_key_id,
            name: name.to_string(),
        }),
    ))
}

#[instrument(skip(state, auth_user))]
pub async fn list_api_keys(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<ApiKeyListResponse>, AppError> {
    let api_keys = ApiKeyService::list(&state.db, auth_user.user_id()?).await?;
    if api_keys.is_empty() {
        return Err(AppError::missing("No API keys found"));
    }

    Ok(Json(ApiKeyListResponse {
        success: true,
        api_keys,
    }))
}

#[instrument(skip(state, auth_user))]
pub async fn delete_api_key(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(api_key_id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    ApiKeyService::delete(&state.db, auth_user.user_id()?, api_key_id).await?;
    Ok(Json(MessageResponse::ok("API key deleted successfully")))
}

#[instrument(skip(state, auth_user))]
pub async fn edit_api_key(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(api_key_id): Path<i64>,
    ValidatedJson(dto): ValidatedJson<ApiKeyNameDto>,
) -> Result<Json<MessageResponse>, AppError> {
    let name = dto.trimmed().ok_or_else(|| AppError::invalid("Name is required"))?;
    ApiKeyService::rename(&state.db, auth_user.user_id()?, api_key_id, name).await?;
    Ok(Json(MessageResponse::ok("API key updated successfully")))
}
