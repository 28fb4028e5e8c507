use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use axum_extra::extract::CookieJar;
use sqlx::PgPool;
use tracing::warn;

use lms_auth::{Claims, verify_refresh_token, verify_token};
use lms_core::AppError;

use crate::state::AppState;

pub const ACCESS_COOKIE: &str = "access_token_cookie";
pub const REFRESH_COOKIE: &str = "refresh_token_cookie";
pub const CSRF_ACCESS_COOKIE: &str = "csrf_access_token";
pub const CSRF_REFRESH_COOKIE: &str = "csrf_refresh_token";

/// Token from the `Authorization: Bearer` header, else from the named cookie.
pub fn token_from_parts(parts: &Parts, cookie_name: &str) -> Option<String> {
    let bearer = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(&parts.headers)
        .get(cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

/// Whether `jti` is on the blocklist. A failed lookup counts as revoked.
pub async fn is_token_revoked(db: &PgPool, jti: &str) -> bool {
    let result = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM token_blocklist WHERE jti = $1)",
    )
    .bind(jti)
    .fetch_one(db)
    .await;

    match result {
        Ok(revoked) => revoked,
        Err(e) => {
            warn!(error = %e, "Blocklist lookup failed, treating token as revoked");
            true
        }
    }
}

/// Extractor for a valid, unrevoked access token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn user_id(&self) -> Result<i64, AppError> {
        self.0
            .user_id()
            .ok_or_else(|| AppError::unauthorized("Invalid user ID in token"))
    }

    pub fn role(&self) -> &str {
        &self.0.role
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_parts(parts, ACCESS_COOKIE)
            .ok_or_else(|| AppError::unauthorized("Missing authorization token"))?;

        let claims = verify_token(&token, &state.jwt_config)?;

        if is_token_revoked(&state.db, &claims.jti).await {
            return Err(AppError::unauthorized("Token has been revoked"));
        }

        Ok(AuthUser(claims))
    }
}

/// Extractor for a valid, unrevoked refresh token.
#[derive(Debug, Clone)]
pub struct RefreshUser(pub Claims);

impl FromRequestParts<AppState> for RefreshUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_parts(parts, REFRESH_COOKIE)
            .ok_or_else(|| AppError::unauthorized("Missing refresh token"))?;

        let claims = verify_refresh_token(&token, &state.jwt_config)?;

        if is_token_revoked(&state.db, &claims.jti).await {
            return Err(AppError::unauthorized("Token has been revoked"));
        }

        Ok(RefreshUser(claims))
    }
}
