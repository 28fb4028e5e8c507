use axum::{extract::FromRequestParts, http::request::Parts};

use lms_core::AppError;

use crate::middleware::api_key::{ApiKeyUser, api_key_from_parts, authenticate_api_key};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    ApiKey,
    Jwt,
}

/// Caller identity from either credential.
///
/// An `X-API-KEY` header selects the API-key path; otherwise the request must
/// carry an access token.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: i64,
    pub role: String,
    pub external_id: String,
    pub full_name: String,
    pub method: AuthMethod,
}

impl From<ApiKeyUser> for CurrentUser {
    fn from(user: ApiKeyUser) -> Self {
        Self {
            user_id: user.user_id,
            role: user.role,
            external_id: user.external_id,
            full_name: user.full_name,
            method: AuthMethod::ApiKey,
        }
    }
}

impl TryFrom<AuthUser> for CurrentUser {
    type Error = AppError;

    fn try_from(user: AuthUser) -> Result<Self, Self::Error> {
        let user_id = user.user_id()?;
        let claims = user.0;
        Ok(Self {
            user_id,
            role: claims.role,
            external_id: claims.external_id,
            full_name: claims.full_name,
            method: AuthMethod::Jwt,
        })
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(presented) = api_key_from_parts(parts) {
            return authenticate_api_key(state, presented).await.map(Into::into);
        }

        AuthUser::from_request_parts(parts, state)
            .await
            .and_then(CurrentUser::try_from)
    }
}
