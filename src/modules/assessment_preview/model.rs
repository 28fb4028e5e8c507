use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::modules::assessment_preview::sampling::{Distribution, PoolItem};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScopedAssessment {
    pub exam_type_id: i64,
    pub exam_name: String,
    pub category: String,
    pub exam_period: String,
    pub total_items: i32,
    pub module_count: i64,
}

#[derive(Debug, Serialize)]
pub struct ScopedAssessmentsResponse {
    pub success: bool,
    pub assessments: Vec<ScopedAssessment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratePreviewDto {
    pub course_id: Option<i64>,
    pub exam_type_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreviewQuestion {
    #[serde(flatten)]
    pub item: PoolItem,
    pub module_title: String,
}

#[derive(Debug, Serialize)]
pub struct PreviewStatistics {
    #[serde(flatten)]
    pub distribution: Distribution,
    pub total_available: usize,
}

#[derive(Debug, Serialize)]
pub struct AssessmentInfo {
    pub exam_name: String,
    pub total_items: i32,
    pub selected_count: usize,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub success: bool,
    pub questions: Vec<PreviewQuestion>,
    pub statistics: PreviewStatistics,
    pub assessment_info: AssessmentInfo,
}
