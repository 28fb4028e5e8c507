//! Token creation and verification (HS256).
//!
//! ```ignore
//! let subject = TokenSubject { user_id: 7, role: "admin".into(), .. };
//! let access = create_access_token(&subject, &config)?;
//! let claims = verify_token(&access, &config)?;
//! ```

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use lms_config::JwtConfig;
use lms_core::AppError;

use crate::claims::{Claims, TokenSubject, TokenType};

fn create_token(
    subject: &TokenSubject,
    token_type: TokenType,
    lifetime_secs: i64,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp();

    let claims = Claims {
        sub: subject.user_id.to_string(),
        role: subject.role.clone(),
        external_id: subject.external_id.clone(),
        full_name: subject.full_name.clone(),
        jti: Uuid::new_v4().to_string(),
        token_type,
        exp: now.saturating_add(lifetime_secs).max(0) as usize,
        iat: now.max(0) as usize,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal_error(format!("Failed to create token: {}", e)))
}

pub fn create_access_token(subject: &TokenSubject, jwt_config: &JwtConfig) -> Result<String, AppError> {
    create_token(
        subject,
        TokenType::Access,
        jwt_config.access_token_expiry,
        jwt_config,
    )
}

pub fn create_refresh_token(
    subject: &TokenSubject,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    create_token(
        subject,
        TokenType::Refresh,
        jwt_config.refresh_token_expiry,
        jwt_config,
    )
}

fn decode_claims(
    token: &str,
    expected: TokenType,
    jwt_config: &JwtConfig,
) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Invalid or expired token"))?;

    if claims.token_type != expected {
        return Err(AppError::unauthorized(format!(
            "Expected {} token",
            expected.as_str()
        )));
    }

    Ok(claims)
}

/// Verifies an access token's signature, expiry and type.
///
/// Revocation is checked by the caller against the blocklist table.
pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, AppError> {
    decode_claims(token, TokenType::Access, jwt_config)
}

pub fn verify_refresh_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, AppError> {
    decode_claims(token, TokenType::Refresh, jwt_config)
}
