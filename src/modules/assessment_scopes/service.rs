use sqlx::PgPool;
use tracing::{info, instrument};

use lms_core::AppError;
use lms_core::text::module_title_or_default;

use crate::modules::assessment_scopes::model::{
    CourseWithAssessmentCount, ExamTypeScopeFlag, SaveScopeDto, ScopeModule, ScopeModuleView,
};
use crate::modules::courses::model::SearchQuery;
use crate::utils::db::is_foreign_key_violation;

pub struct AssessmentScopeService;

impl AssessmentScopeService {
    #[instrument(skip(db))]
    pub async fn courses(
        db: &PgPool,
        query: &SearchQuery,
    ) -> Result<Vec<CourseWithAssessmentCount>, AppError> {
        let courses = sqlx::query_as::<_, CourseWithAssessmentCount>(
            r#"SELECT c.course_id, c.course_code, c.course_title, c.description,
                      COUNT(DISTINCT a.exam_type_id) AS assessment_count
               FROM courses_master c
               LEFT JOIN assessment_scopes a ON c.course_id = a.course_id
               WHERE $1::TEXT IS NULL OR c.course_code ILIKE $1 OR c.course_title ILIKE $1
               GROUP BY c.course_id, c.course_code, c.course_title, c.description
               ORDER BY c.course_code"#,
        )
        .bind(query.pattern())
        .fetch_all(db)
        .await?;
        Ok(courses)
    }

    /// All exam types, flagged when the course already scopes modules for them.
    #[instrument(skip(db))]
    pub async fn exam_types(
        db: &PgPool,
        course_id: Option<i64>,
    ) -> Result<Vec<ExamTypeScopeFlag>, AppError> {
        let exam_types = sqlx::query_as::<_, ExamTypeScopeFlag>(
            r#"SELECT et.exam_type_id, et.exam_name, et.category, et.exam_period, et.description,
                      et.total_items,
                      EXISTS (
                          SELECT 1 FROM assessment_scopes a
                          WHERE a.exam_type_id = et.exam_type_id AND a.course_id = $1
                      ) AS has_scope
               FROM exam_types et
               ORDER BY et.exam_name"#,
        )
        .bind(course_id)
        .fetch_all(db)
        .await?;
        Ok(exam_types)
    }

    #[instrument(skip(db))]
    pub async fn modules(
        db: &PgPool,
        course_id: i64,
        exam_type_id: Option<i64>,
    ) -> Result<(Vec<ScopeModuleView>, Vec<i64>), AppError> {
        let modules = sqlx::query_as::<_, ScopeModule>(
            "SELECT module_id, position, content_html FROM modules_master WHERE course_id = $1 ORDER BY position",
        )
        .bind(course_id)
        .fetch_all(db)
        .await?;

        let selected = match exam_type_id {
            Some(exam_type_id) => {
                sqlx::query_scalar::<_, i64>(
                    r#"SELECT module_id FROM assessment_scopes
                       WHERE course_id = $1 AND exam_type_id = $2
                       ORDER BY module_id"#,
                )
                .bind(course_id)
                .bind(exam_type_id)
                .fetch_all(db)
                .await?
            }
            None => Vec::new(),
        };

        let views = modules
            .into_iter()
            .map(|m| ScopeModuleView {
                module_id: m.module_id,
                position: m.position,
                title: module_title_or_default(m.content_html.as_deref(), m.position),
                content_html: m.content_html,
            })
            .collect();

        Ok((views, selected))
    }

    #[instrument(skip(db))]
    pub async fn count(db: &PgPool, course_id: i64) -> Result<i64, AppError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM assessment_scopes WHERE course_id = $1")
                .bind(course_id)
                .fetch_one(db)
                .await?;
        Ok(count)
    }

    /// Replaces the scoped modules of one course/exam type pair.
    #[instrument(skip(db))]
    pub async fn save(db: &PgPool, dto: SaveScopeDto) -> Result<usize, AppError> {
        let (Some(course_id), Some(exam_type_id)) = (dto.course_id, dto.exam_type_id) else {
            return Err(AppError::invalid("Course ID and Exam Type ID are required"));
        };

        let mut tx = db.begin().await?;

        sqlx::query("DELETE FROM assessment_scopes WHERE course_id = $1 AND exam_type_id = $2")
            .bind(course_id)
            .bind(exam_type_id)
            .execute(&mut *tx)
            .await?;

        let mut saved = 0;
        for module_id in &dto.module_ids {
            sqlx::query(
                r#"INSERT INTO assessment_scopes (course_id, exam_type_id, module_id)
                   VALUES ($1, $2, $3)
                   ON CONFLICT (course_id, exam_type_id, module_id) DO NOTHING"#,
            )
            .bind(course_id)
            .bind(exam_type_id)
            .bind(module_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    return AppError::invalid("Unknown course, exam type or module");
                }
                AppError::from(e)
            })?;
            saved += 1;
        }

        tx.commit().await?;
        info!(course_id, exam_type_id, modules = saved, "Assessment scope saved");
        Ok(saved)
    }
}
