use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct DashboardStats {
    pub user_count: i64,
    pub course_count: i64,
    pub instance_count: i64,
    pub enrollment_count: i64,
}

#[derive(Debug, Serialize)]
pub struct DashboardStatsResponse {
    pub success: bool,
    #[serde(flatten)]
    pub stats: DashboardStats,
}
