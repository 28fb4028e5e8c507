use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use lms_core::{PageMeta, PageParams};

/// A course instance joined with its master course.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InstanceWithCourse {
    pub instance_id: i64,
    pub course_id: i64,
    pub term_code: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub course_code: String,
    pub course_title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InstanceDetail {
    pub instance_id: i64,
    pub course_id: i64,
    pub term_code: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub course_code: String,
    pub course_title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstanceListQuery {
    #[serde(flatten)]
    pub page: PageParams,
    pub search: Option<String>,
    pub term: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InstanceListResponse {
    pub success: bool,
    pub instances: Vec<InstanceWithCourse>,
    pub pagination: PageMeta,
}

#[derive(Debug, Serialize)]
pub struct TermsResponse {
    pub success: bool,
    pub terms: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkCreateInstancesDto {
    pub term_code: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(default)]
    pub course_ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct BulkCreateResponse {
    pub success: bool,
    pub message: String,
    pub created: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateInstanceDto {
    pub term_code: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InstanceResponse {
    pub success: bool,
    pub instance: InstanceDetail,
}

pub fn parse_date(value: &str) -> Result<NaiveDate, lms_core::AppError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| lms_core::AppError::invalid("Dates must use the YYYY-MM-DD format"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date(" 2025-08-01 ").unwrap(),
            NaiveDate::from_ymd_opt(2025, 8, 1).unwrap()
        );
        assert!(parse_date("08/01/2025").is_err());
        assert!(parse_date("2025-02-30").is_err());
    }
}
