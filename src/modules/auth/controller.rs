use axum::{Json, extract::State};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::instrument;
use uuid::Uuid;

use lms_auth::verify_refresh_token;
use lms_core::AppError;

use crate::middleware::auth::{
    ACCESS_COOKIE, AuthUser, CSRF_ACCESS_COOKIE, CSRF_REFRESH_COOKIE, REFRESH_COOKIE, RefreshUser,
};
use crate::modules::auth::model::{LoginRequest, LoginResponse, RefreshResponse, VerifyResponse};
use crate::modules::auth::service::AuthService;
use crate::state::AppState;
use crate::utils::response::MessageResponse;
use crate::validator::ValidatedJson;

fn token_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

/// CSRF cookies are readable by scripts so the frontend can echo them.
fn csrf_cookie(name: &'static str, secure: bool) -> Cookie<'static> {
    Cookie::build((name, Uuid::new_v4().to_string()))
        .path("/")
        .http_only(false)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

fn expired(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, "")).path("/").build()
}

/// Exchange credentials for access and refresh tokens
#[instrument(skip(state, jar, dto))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let tokens = AuthService::login(&state.db, dto, &state.jwt_config).await?;
    let secure = state.jwt_config.cookie_secure;

    let jar = jar
        .add(token_cookie(ACCESS_COOKIE, tokens.access_token.clone(), secure))
        .add(token_cookie(REFRESH_COOKIE, tokens.refresh_token.clone(), secure))
        .add(csrf_cookie(CSRF_ACCESS_COOKIE, secure))
        .add(csrf_cookie(CSRF_REFRESH_COOKIE, secure));

    Ok((
        jar,
        Json(LoginResponse {
            success: true,
            message: "Login successful".to_string(),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        }),
    ))
}

/// Issue a new access token from a refresh token
#[instrument(skip(state, jar, refresh))]
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    refresh: RefreshUser,
) -> Result<(CookieJar, Json<RefreshResponse>), AppError> {
    let access_token = AuthService::refresh(&refresh.0, &state.jwt_config)?;
    let secure = state.jwt_config.cookie_secure;

    let jar = jar
        .add(token_cookie(ACCESS_COOKIE, access_token.clone(), secure))
        .add(csrf_cookie(CSRF_ACCESS_COOKIE, secure));

    Ok((
        jar,
        Json(RefreshResponse {
            success: true,
            message: "Token refreshed".to_string(),
            access_token,
        }),
    ))
}

/// Revoke the current tokens and clear the auth cookies
#[instrument(skip(state, jar, auth_user))]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    auth_user: AuthUser,
) -> Result<(CookieJar, Json<MessageResponse>), AppError> {
    AuthService::revoke(&state.db, &auth_user.0).await?;

    if let Some(cookie) = jar.get(REFRESH_COOKIE)
        && let Ok(refresh_claims) = verify_refresh_token(cookie.value(), &state.jwt_config)
    {
        AuthService::revoke(&state.db, &refresh_claims).await?;
    }

    let jar = jar
        .remove(expired(ACCESS_COOKIE))
        .remove(expired(REFRESH_COOKIE))
        .remove(expired(CSRF_ACCESS_COOKIE))
        .remove(expired(CSRF_REFRESH_COOKIE));

    Ok((jar, Json(MessageResponse::ok("Logout successful"))))
}

/// Return the authenticated user's identity
#[instrument(skip(state, auth_user))]
pub async fn verify(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<VerifyResponse>, AppError> {
    let user = AuthService::verify(&state.db, auth_user.user_id()?).await?;
    Ok(Json(VerifyResponse {
        success: true,
        user,
    }))
}
