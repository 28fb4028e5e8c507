//! Assessment templates.
//!
//! An exam type names a quiz or exam, the grading period it belongs to and how
//! many items are drawn for each student. Which modules feed its question pool
//! is decided per course by the assessment scopes.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use lms_core::serde::deserialize_optional_i64;
use lms_core::{AppError, PageMeta, PageParams};

pub const MAX_TOTAL_ITEMS: i32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamCategory {
    Quiz,
    Exam,
}

impl ExamCategory {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "quiz" => Some(ExamCategory::Quiz),
            "exam" => Some(ExamCategory::Exam),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExamCategory::Quiz => "quiz",
            ExamCategory::Exam => "exam",
        }
    }
}

impl fmt::Display for ExamCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grading period, in term order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ExamPeriod {
    Prelim,
    Midterm,
    #[serde(rename = "Pre-Final")]
    PreFinal,
    Final,
}

impl ExamPeriod {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Prelim" => Some(ExamPeriod::Prelim),
            "Midterm" => Some(ExamPeriod::Midterm),
            "Pre-Final" => Some(ExamPeriod::PreFinal),
            "Final" => Some(ExamPeriod::Final),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExamPeriod::Prelim => "Prelim",
            ExamPeriod::Midterm => "Midterm",
            ExamPeriod::PreFinal => "Pre-Final",
            ExamPeriod::Final => "Final",
        }
    }

    /// SQL `CASE` expression ranking `column` by period order.
    pub fn order_sql(column: &str) -> String {
        format!(
            "CASE {column} WHEN 'Prelim' THEN 1 WHEN 'Midterm' THEN 2 WHEN 'Pre-Final' THEN 3 WHEN 'Final' THEN 4 ELSE 5 END"
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct ExamType {
    pub exam_type_id: i64,
    pub exam_name: String,
    pub category: String,
    pub exam_period: String,
    pub description: Option<String>,
    pub total_items: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExamTypeListQuery {
    #[serde(flatten)]
    pub page: PageParams,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExamTypeListResponse {
    pub success: bool,
    pub exam_types: Vec<ExamType>,
    pub pagination: PageMeta,
}

/// Body of both create and update requests.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExamTypeDto {
    pub exam_name: Option<String>,
    pub category: Option<String>,
    pub exam_period: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub total_items: Option<i64>,
}

/// An [`ExamTypeDto`] that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidExamType {
    pub exam_name: String,
    pub category: ExamCategory,
    pub exam_period: ExamPeriod,
    pub description: String,
    pub total_items: i32,
}

impl TryFrom<ExamTypeDto> for ValidExamType {
    type Error = AppError;

    fn try_from(dto: ExamTypeDto) -> Result<Self, Self::Error> {
        let exam_name = dto.exam_name.as_deref().map(str::trim).unwrap_or_default();
        if exam_name.is_empty() {
            return Err(AppError::invalid("Exam name is required"));
        }

        let category = dto
            .category
            .as_deref()
            .and_then(ExamCategory::parse)
            .ok_or_else(|| AppError::invalid("Category must be either \"quiz\" or \"exam\""))?;

        let exam_period = dto
            .exam_period
            .as_deref()
            .and_then(ExamPeriod::parse)
            .ok_or_else(|| AppError::invalid("Invalid exam period"))?;

        let total_items = dto.total_items.unwrap_or(1);
        if !(1..=MAX_TOTAL_ITEMS as i64).contains(&total_items) {
            return Err(AppError::invalid("Total items must be between 1 and 100"));
        }

        Ok(Self {
            exam_name: exam_name.to_string(),
            category,
            exam_period,
            description: dto.description.unwrap_or_default().trim().to_string(),
            total_items: total_items as i32,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ExamTypeResponse {
    pub success: bool,
    pub message: String,
    pub exam_type: ExamType,
}
