//! Administrative commands behind the `lms-cli` binary.

pub mod seeder;

use anyhow::{Context, anyhow};
use sqlx::PgPool;

use lms_core::text::{check_password_strength, sanitize_full_name};

use crate::modules::api_keys::service::ApiKeyService;
use crate::modules::users::model::{User, UserRole};
use crate::modules::users::service::UserService;

/// Creates an `admin` account. The password must pass the same strength
/// rules as the API.
pub async fn create_admin(
    db: &PgPool,
    external_id: &str,
    full_name: &str,
    password: &str,
) -> anyhow::Result<User> {
    let external_id = external_id.trim();
    if external_id.is_empty() {
        return Err(anyhow!("External ID is required"));
    }
    let full_name = sanitize_full_name(full_name);
    if full_name.is_empty() {
        return Err(anyhow!("Full name is required"));
    }
    check_password_strength(password).map_err(|e| anyhow!(e))?;

    UserService::insert_user(db, external_id, &full_name, password, UserRole::Admin)
        .await
        .map_err(|e| e.error)
}

/// Issues a new API key for the user with `external_id` and returns the
/// plaintext key. Only its hash is stored.
pub async fn generate_api_key(db: &PgPool, external_id: &str, name: &str) -> anyhow::Result<String> {
    let user_id = sqlx::query_scalar::<_, i64>("SELECT user_id FROM users WHERE external_id = $1")
        .bind(external_id.trim())
        .fetch_optional(db)
        .await
        .context("Failed to look up user")?
        .ok_or_else(|| anyhow!("No user with external ID '{}'", external_id.trim()))?;

    let (_, key) = ApiKeyService::generate(db, user_id, name.trim())
        .await
        .map_err(|e| e.error)?;
    Ok(key)
}
