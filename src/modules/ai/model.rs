use serde::{Deserialize, Serialize};

use lms_core::AppError;
use lms_core::serde::{deserialize_optional_bool, deserialize_optional_i64};

use crate::modules::content::model::{Activity, ExamItem, Section};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuggestCountDto {
    pub course_title: Option<String>,
    pub course_description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SuggestCountResponse {
    pub success: bool,
    pub message: String,
    pub suggested_count: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateModulesDto {
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub course_id: Option<i64>,
    pub course_title: Option<String>,
    pub course_description: Option<String>,
    pub module_count: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub override_existing: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedModule {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Where a batch of generated content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentSource {
    Ai,
    Fallback,
}

#[derive(Debug, Serialize)]
pub struct GenerateModulesResponse {
    pub success: bool,
    pub message: String,
    pub modules: Vec<GeneratedModule>,
    pub source: ContentSource,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegenerateDto {
    #[serde(alias = "title")]
    pub module_title: Option<String>,
    pub course_title: Option<String>,
    pub course_description: Option<String>,
    #[serde(default)]
    pub existing_modules: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RegenerateResponse {
    pub success: bool,
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateOutcomesDto {
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub course_id: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub module_id: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub only_empty: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct GenerateOutcomesResponse {
    pub success: bool,
    pub message: String,
    pub updated: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateSectionsDto {
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub module_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct GenerateSectionsResponse {
    pub success: bool,
    pub message: String,
    pub sections: Vec<Section>,
    pub source: ContentSource,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SectionContentDto {
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub section_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SectionContentResponse {
    pub success: bool,
    pub content: String,
    pub source: ContentSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Practical,
    Analysis,
}

impl ActivityKind {
    /// Parses an optional type name; a missing or blank type means practical.
    pub fn parse(value: Option<&str>) -> Result<Self, AppError> {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            None => Ok(Self::Practical),
            Some(v) if v.eq_ignore_ascii_case("practical") => Ok(Self::Practical),
            Some(v) if v.eq_ignore_ascii_case("analysis") => Ok(Self::Analysis),
            Some(other) => Err(AppError::invalid(format!("Unsupported activity type: {}", other))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Practical => "practical",
            Self::Analysis => "analysis",
        }
    }

    /// Generated instructions must be strictly longer than this.
    pub fn min_instructions_len(self) -> usize {
        match self {
            Self::Practical => 100,
            Self::Analysis => 200,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateActivityDto {
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub module_id: Option<i64>,
    pub activity_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub activity_id: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub clear_existing: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeneratedActivity {
    pub title: String,
    pub instructions: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateActivityResponse {
    pub success: bool,
    pub message: String,
    pub activity: Activity,
    pub source: ContentSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn parse(value: Option<&str>) -> Result<Self, AppError> {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("medium") => Ok(Self::Medium),
            Some("easy") => Ok(Self::Easy),
            Some("hard") => Ok(Self::Hard),
            Some(_) => Err(AppError::invalid("Difficulty must be easy, medium, or hard")),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Easy => "comprehension and basic application",
            Self::Medium => "application and multi-step analysis",
            Self::Hard => "evaluation and creation",
        }
    }

    pub fn goal(self) -> &'static str {
        match self {
            Self::Easy => {
                "Create questions that check fundamental understanding and straightforward application \
                 of core concepts. Focus on clear recall, simple examples, and direct problem-solving."
            }
            Self::Medium => {
                "Create questions that require applying knowledge in unfamiliar contexts, breaking down \
                 problems into multiple steps, and connecting different ideas. Include moderate \
                 complexity and some critical thinking."
            }
            Self::Hard => {
                "Design advanced questions that demand original thought, deep evaluation, and the \
                 creation of new solutions or perspectives. Require integration of multiple concepts, \
                 handling ambiguity, and justifying reasoning with evidence."
            }
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateExamItemsDto {
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub section_id: Option<i64>,
    pub difficulty: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateExamItemsResponse {
    pub success: bool,
    pub items: Vec<ExamItem>,
    pub created: usize,
    pub source: ContentSource,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AiGradeDto {
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub submission_id: Option<i64>,
    pub activity_instructions: Option<String>,
    pub submission_content: Option<String>,
}

/// A suggested grade; nothing is persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeSuggestion {
    pub grade: f64,
    pub feedback: String,
    pub ai_detected: bool,
}

#[derive(Debug, Serialize)]
pub struct AiGradeResponse {
    pub success: bool,
    #[serde(flatten)]
    pub suggestion: GradeSuggestion,
    pub source: ContentSource,
}
