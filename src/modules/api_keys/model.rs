use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApiKeySummary {
    pub api_key_id: i64,
    pub user_id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ApiKeyNameDto {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
}

impl ApiKeyNameDto {
    pub fn trimmed(&self) -> Option<&str> {
        Some(self.name.trim()).filter(|n| !n.is_empty())
    }
}

/// Response to key generation. `api_key` is the only time the plaintext is shown.
#[derive(Debug, Serialize)]
pub struct GeneratedApiKey {
    pub success: bool,
    pub message: String,
    pub api_key: String,
    pub api_key_id: i64,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct ApiKeyListResponse {
    pub success: bool,
    pub api_keys: Vec<ApiKeySummary>,
}
