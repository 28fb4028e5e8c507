//! Role checks layered on top of the credential extractors.

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use lms_core::AppError;

use crate::middleware::api_key::ApiKeyUser;
use crate::modules::users::model::UserRole;
use crate::state::AppState;

/// Requires an API key whose owner holds one of `allowed_roles`.
///
/// The resolved [`ApiKeyUser`] is stored in the request extensions so the
/// handler's own extractor does not scan the keys a second time.
pub async fn require_api_key_roles(
    State(state): State<AppState>,
    req: Request,
    next: Next,
    allowed_roles: &[UserRole],
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let user = ApiKeyUser::from_request_parts(&mut parts, &state).await?;
    let role = UserRole::parse(&user.role)
        .ok_or_else(|| AppError::forbidden(format!("Unknown role: {}", user.role)))?;

    if !allowed_roles.contains(&role) {
        return Err(AppError::forbidden(format!(
            "Access denied. Required role: {}",
            allowed_roles
                .iter()
                .map(|r| r.as_str())
                .collect::<Vec<_>>()
                .join(" or ")
        )));
    }

    parts.extensions.insert(user);
    Ok(next.run(Request::from_parts(parts, body)).await)
}

pub async fn require_admin_api_key(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    match require_api_key_roles(State(state), req, next, &[UserRole::Admin]).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}
