use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use lms_core::pagination::sort_column;
use lms_core::{AppError, PageMeta, SortOrder};

use crate::modules::exam_types::model::{
    ExamType, ExamTypeListQuery, ExamTypeListResponse, ValidExamType,
};

const EXAM_TYPE_COLUMNS: &str = "exam_type_id, exam_name, category, exam_period, description, total_items, created_at, updated_at";
const SORT_COLUMNS: [(&str, &str); 7] = [
    ("exam_type_id", "exam_type_id"),
    ("category", "category"),
    ("exam_name", "exam_name"),
    ("description", "description"),
    ("total_items", "total_items"),
    ("created_at", "created_at"),
    ("updated_at", "updated_at"),
];

fn push_search<'a>(builder: &mut QueryBuilder<'a, Postgres>, search: Option<&str>) {
    if let Some(term) = search.map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", term);
        builder
            .push(" WHERE (exam_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

pub struct ExamTypeService;

impl ExamTypeService {
    #[instrument(skip(db))]
    pub async fn list_exam_types(
        db: &PgPool,
        query: ExamTypeListQuery,
    ) -> Result<ExamTypeListResponse, AppError> {
        let per_page = query.page.per_page(50);
        let offset = query.page.offset(50);

        let mut count: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM exam_types");
        push_search(&mut count, query.search.as_deref());
        let total = count.build_query_scalar::<i64>().fetch_one(db).await?;

        let column = sort_column(query.sort_by.as_deref(), &SORT_COLUMNS, "exam_name");
        let order = SortOrder::parse_or(query.sort_order.as_deref(), SortOrder::Asc);

        let mut select: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {EXAM_TYPE_COLUMNS} FROM exam_types"));
        push_search(&mut select, query.search.as_deref());
        select
            .push(format!(" ORDER BY {} {}, exam_type_id", column, order.as_sql()))
            .push(" LIMIT ")
            .push_bind(per_page)
            .push(" OFFSET ")
            .push_bind(offset);
        let exam_types = select.build_query_as::<ExamType>().fetch_all(db).await?;

        Ok(ExamTypeListResponse {
            success: true,
            exam_types,
            pagination: PageMeta::new(query.page.page(), per_page, total),
        })
    }

    #[instrument(skip(db))]
    pub async fn find(db: &PgPool, exam_type_id: i64) -> Result<Option<ExamType>, AppError> {
        let exam_type = sqlx::query_as::<_, ExamType>(&format!(
            "SELECT {EXAM_TYPE_COLUMNS} FROM exam_types WHERE exam_type_id = $1"
        ))
        .bind(exam_type_id)
        .fetch_optional(db)
        .await?;
        Ok(exam_type)
    }

    #[instrument(skip(db))]
    pub async fn create(db: &PgPool, exam_type: ValidExamType) -> Result<ExamType, AppError> {
        let created = sqlx::query_as::<_, ExamType>(&format!(
            r#"INSERT INTO exam_types (exam_name, category, exam_period, description, total_items)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING {EXAM_TYPE_COLUMNS}"#
        ))
        .bind(&exam_type.exam_name)
        .bind(exam_type.category.as_str())
        .bind(exam_type.exam_period.as_str())
        .bind(&exam_type.description)
        .bind(exam_type.total_items)
        .fetch_one(db)
        .await?;
        Ok(created)
    }

    #[instrument(skip(db))]
    pub async fn update(
        db: &PgPool,
        exam_type_id: i64,
        exam_type: ValidExamType,
    ) -> Result<ExamType, AppError> {
        sqlx::query_as::<_, ExamType>(&format!(
            r#"UPDATE exam_types
               SET exam_name = $1, category = $2, exam_period = $3, description = $4,
                   total_items = $5, updated_at = NOW()
               WHERE exam_type_id = $6
               RETURNING {EXAM_TYPE_COLUMNS}"#
        ))
        .bind(&exam_type.exam_name)
        .bind(exam_type.category.as_str())
        .bind(exam_type.exam_period.as_str())
        .bind(&exam_type.description)
        .bind(exam_type.total_items)
        .bind(exam_type_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::missing("Exam type not found"))
    }

    #[instrument(skip(db))]
    pub async fn delete(db: &PgPool, exam_type_id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM exam_types WHERE exam_type_id = $1")
            .bind(exam_type_id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::missing("Exam type not found"));
        }
        Ok(())
    }
}
