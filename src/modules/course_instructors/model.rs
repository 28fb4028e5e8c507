use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use lms_core::serde::deserialize_optional_i64;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InstructorAssignment {
    pub course_instructor_id: i64,
    pub instance_id: i64,
    pub user_id: i64,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub instructor_name: String,
    pub instructor_external_id: String,
    pub course_code: String,
    pub course_title: String,
    pub term_code: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignmentFilter {
    pub search: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub instance_id: Option<i64>,
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AssignmentListResponse {
    pub success: bool,
    pub instructors: Vec<InstructorAssignment>,
    pub total: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignInstructorDto {
    pub instance_id: Option<i64>,
    pub user_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AssignInstructorResponse {
    pub success: bool,
    pub message: String,
    pub course_instructor_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAssignmentDto {
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TeacherOption {
    pub user_id: i64,
    pub full_name: String,
    pub external_id: String,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct TeachersResponse {
    pub success: bool,
    pub teachers: Vec<TeacherOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InstanceOption {
    pub instance_id: i64,
    pub course_id: i64,
    pub course_code: String,
    pub course_title: String,
    pub term_code: String,
}

#[derive(Debug, Serialize)]
pub struct InstanceOptionsResponse {
    pub success: bool,
    pub instances: Vec<InstanceOption>,
}
