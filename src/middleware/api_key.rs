use axum::{extract::FromRequestParts, http::request::Parts};
use sqlx::FromRow;
use tracing::{debug, instrument};

use lms_core::AppError;
use lms_core::password::find_matching_key;

use crate::metrics::track_api_key_auth;
use crate::state::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Clone, FromRow)]
struct StoredKey {
    hashed_api_key: String,
    user_id: i64,
    role: String,
    external_id: String,
    full_name: String,
}

/// Owner of the API key presented in `X-API-KEY`.
#[derive(Debug, Clone)]
pub struct ApiKeyUser {
    pub user_id: i64,
    pub role: String,
    pub external_id: String,
    pub full_name: String,
}

/// Checks `presented` against every stored key hash.
///
/// Keys are hashed with a per-key salt, so there is no index to look up by;
/// each hash is verified in turn and the first match wins.
#[instrument(skip_all)]
pub async fn authenticate_api_key(
    state: &AppState,
    presented: &str,
) -> Result<ApiKeyUser, AppError> {
    let stored = sqlx::query_as::<_, StoredKey>(
        r#"
        SELECT ak.api_key AS hashed_api_key, ak.user_id, u.role, u.external_id, u.full_name
        FROM api_keys ak
        JOIN users u ON ak.user_id = u.user_id
        ORDER BY ak.api_key_id
        "#,
    )
    .fetch_all(&state.db)
    .await?;

    let scanned = stored.len();
    let presented = presented.to_string();

    let matched = tokio::task::spawn_blocking(move || {
        find_matching_key(&presented, &stored, |key| key.hashed_api_key.as_str()).cloned()
    })
    .await?;

    match matched {
        Some(key) => {
            track_api_key_auth("valid", scanned);
            debug!(user_id = key.user_id, "API key accepted");
            Ok(ApiKeyUser {
                user_id: key.user_id,
                role: key.role,
                external_id: key.external_id,
                full_name: key.full_name,
            })
        }
        None => {
            track_api_key_auth("invalid", scanned);
            Err(AppError::forbidden("Invalid API key"))
        }
    }
}

pub fn api_key_from_parts(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|key| !key.is_empty())
}

impl FromRequestParts<AppState> for ApiKeyUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<ApiKeyUser>() {
            return Ok(user.clone());
        }

        let Some(presented) = api_key_from_parts(parts) else {
            track_api_key_auth("missing", 0);
            return Err(AppError::unauthorized("API key is missing"));
        };

        authenticate_api_key(state, presented).await
    }
}
