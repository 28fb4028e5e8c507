use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

use lms_core::AppError;
use lms_core::serde::deserialize_optional_i64;

use crate::modules::courses::model::Course;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CourseWithModuleCount {
    pub course_id: i64,
    pub course_code: String,
    pub course_title: String,
    pub description: Option<String>,
    pub module_count: i64,
}

#[derive(Debug, Serialize)]
pub struct ContentCoursesResponse {
    pub success: bool,
    pub courses: Vec<CourseWithModuleCount>,
}

#[derive(Debug, Serialize)]
pub struct CourseDetailsResponse {
    pub success: bool,
    pub course: Course,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaveDescriptionDto {
    pub course_id: Option<i64>,
    pub description: Option<String>,
}

/// A `modules_master` row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ModuleRecord {
    pub module_id: i64,
    pub course_id: i64,
    pub position: i32,
    pub content_html: Option<String>,
    pub learning_outcomes: Option<Value>,
}

impl ModuleRecord {
    pub fn title(&self) -> String {
        lms_core::text::module_title_or_default(self.content_html.as_deref(), self.position)
    }

    pub fn description(&self) -> String {
        self.content_html
            .as_deref()
            .and_then(lms_core::text::module_description)
            .unwrap_or_default()
    }

    /// Stored outcomes as strings; anything that is not an array of strings
    /// reads as empty.
    pub fn outcomes(&self) -> Vec<String> {
        match &self.learning_outcomes {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Section {
    pub section_id: i64,
    pub module_id: i64,
    pub position: i32,
    pub title: String,
    pub content: String,
    pub updated_at: DateTime<Utc>,
}

/// A module as rendered in the content editor.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleView {
    pub module_id: i64,
    pub course_id: i64,
    pub position: i32,
    pub title: String,
    pub description: String,
    pub content_html: Option<String>,
    pub learning_outcomes: Vec<String>,
    pub sections: Vec<Section>,
}

impl ModuleView {
    pub fn new(record: ModuleRecord, sections: Vec<Section>) -> Self {
        Self {
            title: record.title(),
            description: record.description(),
            learning_outcomes: record.outcomes(),
            module_id: record.module_id,
            course_id: record.course_id,
            position: record.position,
            content_html: record.content_html,
            sections,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseIdQuery {
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub course_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModuleIdQuery {
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub module_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SectionIdQuery {
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub section_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ModulesResponse {
    pub success: bool,
    pub modules: Vec<ModuleView>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateModuleDto {
    pub module_id: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn target(self, position: i32) -> i32 {
        match self {
            Direction::Up => position - 1,
            Direction::Down => position + 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReorderModuleDto {
    pub module_id: Option<i64>,
    pub direction: Option<Direction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InsertModuleDto {
    pub course_id: Option<i64>,
    #[serde(default)]
    pub after_position: i32,
}

#[derive(Debug, Serialize)]
pub struct InsertedModule {
    pub success: bool,
    pub message: String,
    pub module_id: i64,
    pub position: i32,
}

#[derive(Debug, Serialize)]
pub struct SectionsResponse {
    pub success: bool,
    pub message: String,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSectionFullDto {
    #[serde(alias = "section_id")]
    pub id: Option<i64>,
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSectionDto {
    pub section_id: Option<i64>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InsertSectionDto {
    pub module_id: Option<i64>,
    #[serde(default)]
    pub after_position: i32,
}

#[derive(Debug, Serialize)]
pub struct InsertedSection {
    pub success: bool,
    pub message: String,
    pub section_id: i64,
    pub position: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Activity {
    pub activity_id: i64,
    pub module_id: i64,
    pub position: i32,
    pub title: String,
    pub instructions: String,
    pub activity_type: String,
}

#[derive(Debug, Serialize)]
pub struct ActivitiesResponse {
    pub success: bool,
    pub message: String,
    pub activities: Vec<Activity>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateActivityDto {
    #[serde(alias = "activity_id")]
    pub id: Option<i64>,
    pub title: Option<String>,
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExamItem {
    pub item_id: i64,
    pub section_id: i64,
    pub question: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub correct_answer: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ExamItemsResponse {
    pub success: bool,
    pub items: Vec<ExamItem>,
}

/// Body of manual create and update requests.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExamItemDto {
    pub item_id: Option<i64>,
    pub section_id: Option<i64>,
    pub question: Option<String>,
    pub option_a: Option<String>,
    pub option_b: Option<String>,
    pub option_c: Option<String>,
    pub option_d: Option<String>,
    pub correct_answer: Option<String>,
}

/// A complete multiple-choice item: question, four options and the letter of
/// the right one.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ItemContent {
    pub question: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub correct_answer: String,
}

impl ItemContent {
    /// Trims every field and upper-cases the answer. `None` when a field is
    /// blank or the answer is not one of A to D.
    pub fn normalized(self) -> Option<Self> {
        let fields = [
            &self.question,
            &self.option_a,
            &self.option_b,
            &self.option_c,
            &self.option_d,
        ];
        if fields.iter().any(|f| f.trim().is_empty()) {
            return None;
        }

        let answer = self.correct_answer.trim().to_ascii_uppercase();
        if !matches!(answer.as_str(), "A" | "B" | "C" | "D") {
            return None;
        }

        Some(Self {
            question: self.question.trim().to_string(),
            option_a: self.option_a.trim().to_string(),
            option_b: self.option_b.trim().to_string(),
            option_c: self.option_c.trim().to_string(),
            option_d: self.option_d.trim().to_string(),
            correct_answer: answer,
        })
    }
}

impl TryFrom<&ExamItemDto> for ItemContent {
    type Error = AppError;

    fn try_from(dto: &ExamItemDto) -> Result<Self, Self::Error> {
        let required = |value: &Option<String>| -> Result<String, AppError> {
            value
                .as_deref()
                .filter(|v| !v.trim().is_empty())
                .map(str::to_string)
                .ok_or_else(|| AppError::invalid("All fields are required"))
        };

        ItemContent {
            question: required(&dto.question)?,
            option_a: required(&dto.option_a)?,
            option_b: required(&dto.option_b)?,
            option_c: required(&dto.option_c)?,
            option_d: required(&dto.option_d)?,
            correct_answer: required(&dto.correct_answer)?,
        }
        .normalized()
        .ok_or_else(|| AppError::invalid("Correct answer must be A, B, C, or D"))
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedExamItem {
    pub success: bool,
    pub message: String,
    pub item_id: i64,
}
