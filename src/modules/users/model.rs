//! User records, roles and request DTOs.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Password given to accounts created without one.
pub const DEFAULT_PASSWORD: &str = "1234";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Instructor,
    Teacher,
    #[default]
    Student,
}

impl UserRole {
    pub const ALL: [UserRole; 4] = [
        UserRole::Admin,
        UserRole::Instructor,
        UserRole::Teacher,
        UserRole::Student,
    ];

    /// Case-insensitive parse of a stored or submitted role name.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(UserRole::Admin),
            "instructor" => Some(UserRole::Instructor),
            "teacher" => Some(UserRole::Teacher),
            "student" => Some(UserRole::Student),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Instructor => "instructor",
            UserRole::Teacher => "teacher",
            UserRole::Student => "student",
        }
    }

    /// Instructors and teachers may be assigned to course instances.
    pub fn can_teach(self) -> bool {
        matches!(self, UserRole::Instructor | UserRole::Teacher)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct User {
    pub user_id: i64,
    pub external_id: String,
    pub full_name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// A user row including the password hash, for credential checks.
#[derive(Debug, Clone, FromRow)]
pub struct UserWithPassword {
    pub user_id: i64,
    pub external_id: String,
    pub full_name: String,
    pub role: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateUserDto {
    pub external_id: Option<String>,
    pub full_name: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserDto {
    pub external_id: Option<String>,
    pub full_name: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub success: bool,
    pub users: Vec<User>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub success: bool,
    pub message: String,
    pub user: User,
}

pub enum UpdateOutcome {
    Updated(User),
    Unchanged,
}
