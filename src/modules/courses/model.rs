//! Master course records.
//!
//! A master course (`courses_master`) is the catalogue entry. Term-specific
//! offerings live in `course_instances`, and modules hang off the master
//! course so every offering shares the same content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use lms_core::{PageMeta, PageParams};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct Course {
    pub course_id: i64,
    pub course_code: String,
    pub course_title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseListQuery {
    #[serde(flatten)]
    pub page: PageParams,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CourseListResponse {
    pub success: bool,
    pub courses: Vec<Course>,
    #[serde(flatten)]
    pub meta: PageMeta,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCourseDto {
    #[validate(length(min = 1, max = 50, message = "Course code is required"))]
    pub course_code: String,
    #[validate(length(min = 1, max = 255, message = "Course title is required"))]
    pub course_title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCourseDto {
    pub course_code: Option<String>,
    pub course_title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CourseResponse {
    pub success: bool,
    pub message: String,
    pub course: Course,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateDescriptionDto {
    pub course_code: Option<String>,
    pub course_title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GeneratedDescription {
    pub success: bool,
    pub description: String,
    pub generated: bool,
}

/// Minimal course row for selection lists.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct CourseOption {
    pub course_id: i64,
    pub course_code: String,
    pub course_title: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

impl SearchQuery {
    /// `%term%` for ILIKE, or `None` when the search is blank.
    pub fn pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s))
    }
}

#[derive(Debug, Serialize)]
pub struct CourseOptionsResponse {
    pub success: bool,
    pub courses: Vec<CourseOption>,
}
