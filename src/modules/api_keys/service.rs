use sqlx::PgPool;
use tracing::{info, instrument};

use lms_core::AppError;
use lms_core::password::generate_api_key;

use crate::modules::api_keys::model::ApiKeySummary;

pub struct ApiKeyService;

impl ApiKeyService {
    /// Creates a key for `user_id`, storing only its bcrypt hash.
    ///
    /// Returns the new key id and the plaintext key.
    #[instrument(skip(db))]
    pub async fn generate(db: &PgPool, user_id: i64, name: &str) -> Result<(i64, String), AppError> {
        let api_key = generate_api_key();
        let hashed = lms_core::hash_password(&api_key)?;

        let api_key_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO api_keys (user_id, api_key, name) VALUES ($1, $2, $3) RETURNING api_key_id",
        )
        .bind(user_id)
        .bind(&hashed)
        .bind(name)
        .fetch_one(db)
        .await?;

        info!(api_key_id, "API key generated");
        Ok((api_key_id, api_key))
    }

    #[instrument(skip(db))]
    pub async fn list(db: &PgPool, user_id: i64) -> Result<Vec<ApiKeySummary>, AppError> {
        let keys = sqlx::query_as::<_, ApiKeySummary>(
            r#"SELECT api_key_id, user_id, name, created_at
               FROM api_keys
               WHERE user_id = $1
               ORDER BY created_at DESC, api_key_id DESC"#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;

        Ok(keys)
    }

    #[instrument(skip(db))]
    pub async fn delete(db: &PgPool, user_id: i64, api_key_id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM api_keys WHERE api_key_id = $1 AND user_id = $2")
            .bind(api_key_id)
            .bind(user_id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::missing("API key not found"));
        }
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn rename(
        db: &PgPool,
        user_id: i64,
        api_key_id: i64,
        name: &str,
    ) -> Result<(), AppError> {
        let result =
            sqlx::query("UPDATE api_keys SET name = $1 WHERE api_key_id = $2 AND user_id = $3")
                .bind(name)
                .bind(api_key_id)
                .bind(user_id)
                .execute(db)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::missing("API key not found"));
        }
        Ok(())
    }
}
