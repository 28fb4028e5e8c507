use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use lms_core::serde::deserialize_optional_i64;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CourseWithAssessmentCount {
    pub course_id: i64,
    pub course_code: String,
    pub course_title: String,
    pub description: Option<String>,
    pub assessment_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExamTypeScopeFlag {
    pub exam_type_id: i64,
    pub exam_name: String,
    pub category: String,
    pub exam_period: String,
    pub description: Option<String>,
    pub total_items: i32,
    pub has_scope: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScopeModule {
    pub module_id: i64,
    pub position: i32,
    pub content_html: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScopeModuleView {
    pub module_id: i64,
    pub position: i32,
    pub title: String,
    pub content_html: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseQuery {
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub course_id: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub exam_type_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ScopeCoursesResponse {
    pub success: bool,
    pub courses: Vec<CourseWithAssessmentCount>,
}

#[derive(Debug, Serialize)]
pub struct ScopeExamTypesResponse {
    pub success: bool,
    pub exam_types: Vec<ExamTypeScopeFlag>,
}

#[derive(Debug, Serialize)]
pub struct ScopeModulesResponse {
    pub success: bool,
    pub modules: Vec<ScopeModuleView>,
    pub selected_modules: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct ScopeCountResponse {
    pub success: bool,
    pub count: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaveScopeDto {
    pub course_id: Option<i64>,
    pub exam_type_id: Option<i64>,
    #[serde(default)]
    pub module_ids: Vec<i64>,
}
