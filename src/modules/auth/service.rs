use sqlx::PgPool;
use tracing::{info, instrument, warn};

use lms_auth::{Claims, TokenSubject, create_access_token, create_refresh_token};
use lms_config::JwtConfig;
use lms_core::{AppError, verify_password};

use crate::metrics::{track_jwt_issued, track_login};
use crate::modules::auth::model::{LoginRequest, TokenPair, VerifiedUser};
use crate::modules::users::service::UserService;

pub struct AuthService;

impl AuthService {
    #[instrument(skip(db, dto, jwt_config), fields(external_id = ?dto.external_id))]
    pub async fn login(
        db: &PgPool,
        dto: LoginRequest,
        jwt_config: &JwtConfig,
    ) -> Result<TokenPair, AppError> {
        let external_id = dto.external_id.as_deref().map(str::trim).unwrap_or_default();
        let password = dto.password.as_deref().unwrap_or_default();
        if external_id.is_empty() || password.is_empty() {
            return Err(AppError::invalid("External ID and password are required"));
        }

        let Some(user) = UserService::find_with_password(db, external_id).await? else {
            warn!("Login attempt for unknown user");
            track_login(false, "unknown");
            return Err(AppError::unauthorized("Invalid credentials"));
        };

        if !verify_password(password, &user.password_hash).unwrap_or(false) {
            warn!(user_id = user.user_id, "Login attempt with wrong password");
            track_login(false, &user.role);
            return Err(AppError::unauthorized("Invalid credentials"));
        }

        let subject = TokenSubject {
            user_id: user.user_id,
            role: user.role.clone(),
            external_id: user.external_id,
            full_name: user.full_name,
        };
        let access_token = create_access_token(&subject, jwt_config)?;
        let refresh_token = create_refresh_token(&subject, jwt_config)?;

        track_login(true, &user.role);
        track_jwt_issued("access");
        track_jwt_issued("refresh");
        info!(user_id = user.user_id, role = %user.role, "User logged in");

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Issues a new access token carrying the refresh token's identity.
    pub fn refresh(refresh_claims: &Claims, jwt_config: &JwtConfig) -> Result<String, AppError> {
        let subject = refresh_claims
            .subject()
            .ok_or_else(|| AppError::unauthorized("Invalid user ID in token"))?;
        let token = create_access_token(&subject, jwt_config)?;
        track_jwt_issued("access");
        Ok(token)
    }

    /// Adds a token's `jti` to the blocklist until it would have expired anyway.
    #[instrument(skip(db, claims), fields(jti = %claims.jti))]
    pub async fn revoke(db: &PgPool, claims: &Claims) -> Result<(), AppError> {
        sqlx::query(
            r#"INSERT INTO token_blocklist (jti, token_type, expires_at)
               VALUES ($1, $2, to_timestamp($3))
               ON CONFLICT (jti) DO NOTHING"#,
        )
        .bind(&claims.jti)
        .bind(claims.token_type.as_str())
        .bind(claims.exp as f64)
        .execute(db)
        .await?;

        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn verify(db: &PgPool, user_id: i64) -> Result<VerifiedUser, AppError> {
        sqlx::query_as::<_, VerifiedUser>(
            "SELECT user_id, external_id, full_name, role FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::missing("User not found"))
    }
}
