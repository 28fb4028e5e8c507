use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use lms_core::serde::deserialize_optional_i64;

use crate::modules::learning::scoring::GradeSummary;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Submission {
    pub submission_id: i64,
    pub activity_id: i64,
    pub submission_content: String,
    pub status: String,
    pub grade: Option<f64>,
    pub feedback: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SubmissionCheckResponse {
    pub success: bool,
    pub has_submission: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission: Option<Submission>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitActivityDto {
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub activity_id: Option<i64>,
    pub submission_content: Option<String>,
}

/// An activity with the caller's submission, if any.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StudentActivity {
    pub activity_id: i64,
    pub title: String,
    pub instructions: String,
    pub activity_type: String,
    pub position: i32,
    pub submission_id: Option<i64>,
    pub status: Option<String>,
    pub grade: Option<f64>,
    pub feedback: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct StudentActivityView {
    #[serde(flatten)]
    pub activity: StudentActivity,
    pub is_graded: bool,
    pub has_submission: bool,
}

impl From<StudentActivity> for StudentActivityView {
    fn from(activity: StudentActivity) -> Self {
        Self {
            is_graded: activity.status.as_deref() == Some("graded"),
            has_submission: activity.submission_id.is_some(),
            activity,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StudentActivitiesResponse {
    pub success: bool,
    pub activities: Vec<StudentActivityView>,
}

/// A scoped quiz or exam with the caller's result for one instance.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StudentAssessment {
    pub exam_type_id: i64,
    pub exam_name: String,
    pub exam_period: String,
    pub description: Option<String>,
    pub total_items: i32,
    pub score: Option<f64>,
    pub completed_at: Option<DateTime<Utc>>,
    #[sqlx(skip)]
    pub is_taken: bool,
    #[sqlx(skip)]
    pub instance_id: i64,
}

#[derive(Debug, Serialize)]
pub struct StudentQuizzesResponse {
    pub success: bool,
    pub instance_id: i64,
    pub quizzes: Vec<StudentAssessment>,
}

#[derive(Debug, Serialize)]
pub struct StudentExamsResponse {
    pub success: bool,
    pub instance_id: i64,
    pub exams: Vec<StudentAssessment>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct QuestionOptions {
    #[serde(rename = "A")]
    pub a: String,
    #[serde(rename = "B")]
    pub b: String,
    #[serde(rename = "C")]
    pub c: String,
    #[serde(rename = "D")]
    pub d: String,
}

/// A question as shown to a student; the answer is never included.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StudentQuestion {
    pub question_number: usize,
    pub item_id: i64,
    pub question: String,
    pub options: QuestionOptions,
}

#[derive(Debug, Serialize)]
pub struct StudentQuestionsResponse {
    pub success: bool,
    pub exam_name: String,
    pub total_items: i32,
    pub questions: Vec<StudentQuestion>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuizSubmitDto {
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub quiz_id: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub instance_id: Option<i64>,
    #[serde(default)]
    pub answers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExamSubmitDto {
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub exam_id: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub instance_id: Option<i64>,
    #[serde(default)]
    pub answers: BTreeMap<String, String>,
    pub submission_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssessmentResult {
    pub score: f64,
    pub correct_answers: i32,
    pub total_questions: i32,
    pub submission_reason: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitAssessmentResponse {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub result: AssessmentResult,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackSectionDto {
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub section_id: Option<i64>,
}

#[derive(Debug, Clone, Default, FromRow)]
pub struct ModuleCounts {
    pub total_sections: i64,
    pub completed_sections: i64,
    pub total_activities: i64,
    pub submitted_activities: i64,
}

#[derive(Debug, Serialize)]
pub struct ModuleProgressResponse {
    pub success: bool,
    pub module_id: i64,
    pub total_sections: i64,
    pub completed_sections: i64,
    pub sections_percentage: f64,
    pub total_activities: i64,
    pub submitted_activities: i64,
    pub activities_percentage: f64,
    pub overall_percentage: f64,
}

/// Completion counts for a set of courses and the caller's instances of them.
#[derive(Debug, Clone, Default, FromRow)]
pub struct CourseCounts {
    pub total_modules: i64,
    pub completed_modules: i64,
    pub total_sections: i64,
    pub completed_sections: i64,
    pub total_activities: i64,
    pub submitted_activities: i64,
    pub total_quizzes: i64,
    pub completed_quizzes: i64,
    pub quiz_score_sum: f64,
    pub total_exams: i64,
    pub completed_exams: i64,
    pub exam_score_sum: f64,
}

#[derive(Debug, Serialize)]
pub struct CourseOverviewResponse {
    pub success: bool,
    pub modules: String,
    pub quizzes: String,
    pub exams: String,
    pub overall_grade: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentProgress {
    pub completed: i64,
    pub total: i64,
    pub percentage: f64,
}

#[derive(Debug, Serialize)]
pub struct ProgressComponents {
    pub sections: ComponentProgress,
    pub activities: ComponentProgress,
    pub quizzes: ComponentProgress,
    pub exams: ComponentProgress,
}

#[derive(Debug, Serialize)]
pub struct CourseProgressResponse {
    pub success: bool,
    pub overall_progress: f64,
    pub components: ProgressComponents,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CourseInfo {
    pub course_code: String,
    pub course_title: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ActivityGrade {
    pub activity_title: String,
    pub module_position: i32,
    pub activity_position: i32,
    pub activity_type: String,
    pub grade: Option<f64>,
    pub status: String,
    pub feedback: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AssessmentGrade {
    pub exam_name: String,
    pub exam_period: String,
    pub score: f64,
    pub total_questions: i32,
    pub correct_answers: i32,
    pub completed_at: DateTime<Utc>,
    pub submission_reason: String,
}

#[derive(Debug, Serialize)]
pub struct GradeSummaries {
    pub activities: GradeSummary,
    pub quizzes: GradeSummary,
    pub exams: GradeSummary,
}

#[derive(Debug, Serialize)]
pub struct ComprehensiveGradesResponse {
    pub success: bool,
    pub course_info: CourseInfo,
    pub activity_grades: Vec<ActivityGrade>,
    pub quiz_grades: Vec<AssessmentGrade>,
    pub exam_grades: Vec<AssessmentGrade>,
    pub summary: GradeSummaries,
    pub overall_grade: f64,
}

#[derive(Debug, Default, Serialize)]
pub struct ComponentPercentages {
    pub sections: f64,
    pub activities: f64,
    pub quizzes: f64,
    pub exams: f64,
}

#[derive(Debug, Default, Serialize)]
pub struct ComponentRatios {
    pub sections: String,
    pub activities: String,
    pub quizzes: String,
    pub exams: String,
}

#[derive(Debug, Serialize)]
pub struct OverallProgressResponse {
    pub success: bool,
    pub overall_progress: f64,
    pub components: ComponentPercentages,
    pub counts: ComponentRatios,
    pub enrolled_courses: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_activity_view_flags() {
        let activity = StudentActivity {
            activity_id: 1,
            title: "Essay".into(),
            instructions: "Write".into(),
            activity_type: "practical".into(),
            position: 1,
            submission_id: Some(4),
            status: Some("graded".into()),
            grade: Some(91.0),
            feedback: None,
            submitted_at: None,
        };
        let value = serde_json::to_value(StudentActivityView::from(activity)).unwrap();
        assert_eq!(value["is_graded"], true);
        assert_eq!(value["has_submission"], true);
        assert_eq!(value["title"], "Essay");
    }

    #[test]
    fn test_question_options_use_letters() {
        let question = StudentQuestion {
            question_number: 1,
            item_id: 9,
            question: "Q?".into(),
            options: QuestionOptions {
                a: "1".into(),
                b: "2".into(),
                c: "3".into(),
                d: "4".into(),
            },
        };
        let value = serde_json::to_value(question).unwrap();
        assert_eq!(value["options"], json!({"A": "1", "B": "2", "C": "3", "D": "4"}));
        assert!(value.get("correct_answer").is_none());
    }

    #[test]
    fn test_submit_dto_accepts_string_ids() {
        let dto: QuizSubmitDto =
            serde_json::from_value(json!({"quiz_id": "3", "instance_id": 4, "answers": {"10": "B"}}))
                .unwrap();
        assert_eq!(dto.quiz_id, Some(3));
        assert_eq!(dto.answers.get("10").map(String::as_str), Some("B"));
    }
}
