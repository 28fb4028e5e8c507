use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use lms_core::serde::deserialize_optional_i64;
use lms_core::{PageMeta, PageParams};

/// Upload limit for enrollment CSV files.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// An enrollment as seen from the student's side.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StudentEnrollment {
    pub enrollment_id: i64,
    pub enrolled_at: DateTime<Utc>,
    pub instance_id: i64,
    pub course_id: i64,
    pub course_code: String,
    pub course_title: String,
    pub description: Option<String>,
    pub term_code: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EnrollmentRow {
    pub enrollment_id: i64,
    pub instance_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub external_id: String,
    pub full_name: String,
    pub course_code: String,
    pub course_title: String,
    pub term_code: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnrollmentListQuery {
    #[serde(flatten)]
    pub page: PageParams,
    pub search: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub instance_id: Option<i64>,
    pub term: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EnrollmentListResponse {
    pub success: bool,
    pub enrollments: Vec<EnrollmentRow>,
    pub pagination: PageMeta,
}

#[derive(Debug, Serialize)]
pub struct StudentEnrollmentsResponse {
    pub success: bool,
    pub enrollments: Vec<StudentEnrollment>,
}

/// Instance picker entry with its current head count.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EnrollableInstance {
    pub instance_id: i64,
    pub term_code: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub course_code: String,
    pub course_title: String,
    pub enrolled_count: i64,
}

#[derive(Debug, Serialize)]
pub struct EnrollableInstancesResponse {
    pub success: bool,
    pub instances: Vec<EnrollableInstance>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StudentOption {
    pub user_id: i64,
    pub external_id: String,
    pub full_name: String,
}

#[derive(Debug, Serialize)]
pub struct StudentsResponse {
    pub success: bool,
    pub students: Vec<StudentOption>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEnrollmentDto {
    pub instance_id: Option<i64>,
    pub user_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CreateEnrollmentResponse {
    pub success: bool,
    pub message: String,
    pub enrollment_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkEnrollDto {
    pub instance_id: Option<i64>,
    #[serde(default)]
    pub user_ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct BulkEnrollResponse {
    pub success: bool,
    pub message: String,
    pub created: usize,
    pub errors: Vec<String>,
    pub has_errors: bool,
}

#[derive(Debug, Serialize)]
pub struct EnrollmentUploadResponse {
    pub success: bool,
    pub message: String,
    pub created: usize,
    pub errors: Vec<String>,
    pub has_errors: bool,
    pub course_info: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportQuery {
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub instance_id: Option<i64>,
}

impl ExportQuery {
    pub fn filename(&self) -> String {
        match self.instance_id {
            Some(id) => format!("enrollments_instance_{}.csv", id),
            None => "all_enrollments.csv".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_filename() {
        assert_eq!(
            ExportQuery { instance_id: Some(12) }.filename(),
            "enrollments_instance_12.csv"
        );
        assert_eq!(ExportQuery::default().filename(), "all_enrollments.csv");
    }

    #[test]
    fn test_list_query_accepts_blank_instance() {
        let query: EnrollmentListQuery =
            serde_json::from_str(r#"{"instance_id": "", "page": "2"}"#).unwrap();
        assert_eq!(query.instance_id, None);
        assert_eq!(query.page.page(), 2);
    }
}
