use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;

use lms_config::{CorsConfig, JwtConfig, LlmConfig, RateLimitConfig};
use lms_db::init_db_pool;

use crate::llm::{HttpLlmProvider, SharedLlm};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
    pub rate_limit_config: RateLimitConfig,
    pub llm: SharedLlm,
}

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let db = init_db_pool()
        .await
        .context("Failed to connect to database")?;
    let llm = HttpLlmProvider::new(LlmConfig::from_env()).context("Failed to build LLM client")?;

    Ok(AppState {
        db,
        jwt_config: JwtConfig::from_env(),
        cors_config: CorsConfig::from_env(),
        rate_limit_config: RateLimitConfig::from_env(),
        llm: Arc::new(llm),
    })
}
