use serde::{Deserialize, Serialize};
use validator::Validate;

/// Login body. Both fields are optional at the JSON level so a missing field
/// gets the same message as a blank one.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct LoginRequest {
    pub external_id: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub success: bool,
    pub message: String,
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct VerifiedUser {
    pub user_id: i64,
    pub external_id: String,
    pub full_name: String,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub success: bool,
    pub user: VerifiedUser,
}
