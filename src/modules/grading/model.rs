use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use lms_core::serde::deserialize_optional_i64;
use lms_core::text::module_title_or_default;

pub const MAX_GRADE: f64 = 100.0;

/// A submission with enough context to grade it in isolation.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct GradingSubmission {
    pub submission_id: i64,
    pub submission_content: String,
    pub grade: Option<f64>,
    pub feedback: Option<String>,
    pub status: String,
    pub submitted_at: Option<DateTime<Utc>>,
    pub full_name: String,
    pub external_id: String,
    pub activity_id: i64,
    pub activity_title: String,
    pub activity_instructions: String,
    pub module_id: i64,
    pub module_position: i32,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SubmissionTracking {
    pub instance_id: i64,
    pub course_code: String,
    pub course_title: String,
    pub term_code: String,
    pub enrolled_students: i64,
    pub total_activities: i64,
    pub total_required: i64,
    pub submitted_count: i64,
    pub total_quizzes: i64,
    pub total_quizzes_required: i64,
    pub quizzes_completed: i64,
    pub total_exams: i64,
    pub total_exams_required: i64,
    pub exams_completed: i64,
}

#[derive(Debug, Serialize)]
pub struct SubmissionTrackingResponse {
    pub success: bool,
    pub courses: Vec<SubmissionTracking>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PendingCourse {
    pub instance_id: i64,
    pub course_id: i64,
    pub course_code: String,
    pub course_title: String,
    pub term_code: String,
    pub pending_count: i64,
    pub total_activities: i64,
}

#[derive(Debug, Serialize)]
pub struct PendingCoursesResponse {
    pub success: bool,
    pub courses: Vec<PendingCourse>,
}

#[derive(Debug, Serialize)]
pub struct PendingCountResponse {
    pub success: bool,
    pub count: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct GradingActivityRow {
    pub activity_id: i64,
    pub title: String,
    pub instructions: String,
    pub position: i32,
    pub module_id: i64,
    pub module_position: i32,
    pub content_html: Option<String>,
    pub submitted_count: i64,
    pub pending_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GradingActivity {
    pub activity_id: i64,
    pub title: String,
    pub instructions: String,
    pub position: i32,
    pub module_id: i64,
    pub module_title: String,
    pub submitted_count: i64,
    pub pending_count: i64,
}

impl From<GradingActivityRow> for GradingActivity {
    fn from(row: GradingActivityRow) -> Self {
        Self {
            module_title: module_title_or_default(row.content_html.as_deref(), row.module_position),
            activity_id: row.activity_id,
            title: row.title,
            instructions: row.instructions,
            position: row.position,
            module_id: row.module_id,
            submitted_count: row.submitted_count,
            pending_count: row.pending_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GradingActivitiesResponse {
    pub success: bool,
    pub activities: Vec<GradingActivity>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ActivitySubmission {
    pub submission_id: i64,
    pub submission_content: String,
    pub submitted_at: Option<DateTime<Utc>>,
    pub status: String,
    pub grade: Option<f64>,
    pub feedback: Option<String>,
    pub full_name: String,
    pub external_id: String,
}

#[derive(Debug, Serialize)]
pub struct ActivitySubmissionsResponse {
    pub success: bool,
    pub submissions: Vec<ActivitySubmission>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GradeDto {
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub submission_id: Option<i64>,
    pub grade: Option<f64>,
    pub feedback: Option<String>,
}
