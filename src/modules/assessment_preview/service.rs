use sqlx::PgPool;
use tracing::{info, instrument};

use lms_core::AppError;

use crate::modules::assessment_preview::model::{
    AssessmentInfo, PreviewQuestion, PreviewResponse, PreviewStatistics, ScopedAssessment,
};
use crate::modules::assessment_preview::sampling::{
    PoolItem, distribution, sample_in_course_order,
};
use crate::modules::exam_types::service::ExamTypeService;

pub struct AssessmentPreviewService;

impl AssessmentPreviewService {
    #[instrument(skip(db))]
    pub async fn scoped_assessments(
        db: &PgPool,
        course_id: i64,
    ) -> Result<Vec<ScopedAssessment>, AppError> {
        let assessments = sqlx::query_as::<_, ScopedAssessment>(
            r#"SELECT et.exam_type_id, et.exam_name, et.category, et.exam_period, et.total_items,
                      COUNT(DISTINCT a.module_id) AS module_count
               FROM exam_types et
               JOIN assessment_scopes a ON et.exam_type_id = a.exam_type_id
               WHERE a.course_id = $1
               GROUP BY et.exam_type_id, et.exam_name, et.category, et.exam_period, et.total_items
               ORDER BY et.exam_name"#,
        )
        .bind(course_id)
        .fetch_all(db)
        .await?;
        Ok(assessments)
    }

    /// Every exam item reachable from the modules scoped to an assessment.
    #[instrument(skip(db))]
    pub async fn question_pool(
        db: &PgPool,
        course_id: i64,
        exam_type_id: i64,
    ) -> Result<Vec<PoolItem>, AppError> {
        let pool = sqlx::query_as::<_, PoolItem>(
            r#"SELECT m.module_id, m.position AS module_position, m.content_html,
                      ms.section_id, ms.title AS section_title, ms.position AS section_position,
                      ei.item_id, ei.question, ei.option_a, ei.option_b, ei.option_c, ei.option_d,
                      ei.correct_answer
               FROM assessment_scopes a
               JOIN modules_master m ON a.module_id = m.module_id
               JOIN module_sections ms ON m.module_id = ms.module_id
               JOIN exam_items ei ON ms.section_id = ei.section_id
               WHERE a.course_id = $1 AND a.exam_type_id = $2
               ORDER BY m.position, ms.position, ei.item_id"#,
        )
        .bind(course_id)
        .bind(exam_type_id)
        .fetch_all(db)
        .await?;
        Ok(pool)
    }

    #[instrument(skip(db))]
    pub async fn generate_preview(
        db: &PgPool,
        course_id: i64,
        exam_type_id: i64,
    ) -> Result<PreviewResponse, AppError> {
        let exam_type = ExamTypeService::find(db, exam_type_id)
            .await?
            .ok_or_else(|| AppError::invalid("Invalid exam_type_id"))?;

        let pool = Self::question_pool(db, course_id, exam_type_id).await?;
        if pool.is_empty() {
            return Err(AppError::missing(
                "No questions found for this assessment scope",
            ));
        }

        let needed = exam_type.total_items.max(0) as usize;
        if pool.len() < needed {
            return Err(AppError::invalid(format!(
                "Not enough questions available ({}) to generate the requested number of items ({})",
                pool.len(),
                needed
            )));
        }

        let selected = sample_in_course_order(&pool, needed, &mut rand::thread_rng());
        let stats = distribution(&selected);
        info!(
            course_id,
            exam_type_id,
            available = pool.len(),
            selected = selected.len(),
            "Assessment preview generated"
        );

        let selected_count = selected.len();
        let questions = selected
            .into_iter()
            .map(|item| PreviewQuestion {
                module_title: item.module_title(),
                item,
            })
            .collect();

        Ok(PreviewResponse {
            success: true,
            questions,
            statistics: PreviewStatistics {
                distribution: stats,
                total_available: pool.len(),
            },
            assessment_info: AssessmentInfo {
                exam_name: exam_type.exam_name,
                total_items: exam_type.total_items,
                selected_count,
            },
        })
    }
}
