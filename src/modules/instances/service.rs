use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use lms_core::pagination::sort_column;
use lms_core::{AppError, PageMeta, SortOrder};

use crate::modules::instances::model::{
    BulkCreateInstancesDto, InstanceDetail, InstanceListQuery, InstanceListResponse,
    InstanceWithCourse, UpdateInstanceDto, parse_date,
};
use crate::utils::db::is_unique_violation;
use crate::utils::response::BatchResult;

const SORT_COLUMNS: [(&str, &str); 5] = [
    ("course_code", "cm.course_code"),
    ("term_code", "ci.term_code"),
    ("start_date", "ci.start_date"),
    ("end_date", "ci.end_date"),
    ("created_at", "ci.created_at"),
];

fn push_filters<'a>(builder: &mut QueryBuilder<'a, Postgres>, query: &InstanceListQuery) {
    builder.push(" WHERE TRUE");
    if let Some(term) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", term);
        builder
            .push(" AND (cm.course_code ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR cm.course_title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR ci.term_code ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(term) = query.term.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        builder.push(" AND ci.term_code = ").push_bind(term.to_string());
    }
}

pub struct InstanceService;

impl InstanceService {
    #[instrument(skip(db))]
    pub async fn list_instances(
        db: &PgPool,
        query: InstanceListQuery,
    ) -> Result<InstanceListResponse, AppError> {
        let per_page = query.page.per_page(10);
        let offset = query.page.offset(10);

        let mut count: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT COUNT(*) FROM course_instances ci JOIN courses_master cm ON ci.course_id = cm.course_id",
        );
        push_filters(&mut count, &query);
        let total = count.build_query_scalar::<i64>().fetch_one(db).await?;

        let column = sort_column(query.sort_by.as_deref(), &SORT_COLUMNS, "ci.created_at");
        let order = SortOrder::parse_or(query.sort_order.as_deref(), SortOrder::Desc);

        let mut select: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"SELECT ci.instance_id, ci.course_id, ci.term_code, ci.start_date, ci.end_date,
                      ci.created_at, cm.course_code, cm.course_title
               FROM course_instances ci
               JOIN courses_master cm ON ci.course_id = cm.course_id"#,
        );
        push_filters(&mut select, &query);
        select
            .push(format!(" ORDER BY {} {}, ci.instance_id DESC", column, order.as_sql()))
            .push(" LIMIT ")
            .push_bind(per_page)
            .push(" OFFSET ")
            .push_bind(offset);
        let instances = select
            .build_query_as::<InstanceWithCourse>()
            .fetch_all(db)
            .await?;

        Ok(InstanceListResponse {
            success: true,
            instances,
            pagination: PageMeta::new(query.page.page(), per_page, total),
        })
    }

    #[instrument(skip(db))]
    pub async fn list_terms(db: &PgPool) -> Result<Vec<String>, AppError> {
        let terms = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT term_code FROM course_instances ORDER BY term_code DESC",
        )
        .fetch_all(db)
        .await?;
        Ok(terms)
    }

    /// Creates one instance per course, collecting per-course failures.
    #[instrument(skip(db))]
    pub async fn bulk_create(
        db: &PgPool,
        dto: BulkCreateInstancesDto,
    ) -> Result<BatchResult, AppError> {
        let term_code = dto.term_code.as_deref().map(str::trim).unwrap_or_default();
        let (Some(start), Some(end)) = (dto.start_date.as_deref(), dto.end_date.as_deref()) else {
            return Err(AppError::invalid(
                "Term code, dates, and course selection required",
            ));
        };
        if term_code.is_empty() || dto.course_ids.is_empty() {
            return Err(AppError::invalid(
                "Term code, dates, and course selection required",
            ));
        }

        let start_date = parse_date(start)?;
        let end_date = parse_date(end)?;
        if start_date > end_date {
            return Err(AppError::invalid("Start date must be on or before end date"));
        }

        let mut result = BatchResult::new();
        for course_id in dto.course_ids {
            let course_code = sqlx::query_scalar::<_, String>(
                "SELECT course_code FROM courses_master WHERE course_id = $1",
            )
            .bind(course_id)
            .fetch_optional(db)
            .await?;

            let Some(course_code) = course_code else {
                result.error(format!("ID:{}: Course not found", course_id));
                continue;
            };

            let inserted = sqlx::query(
                "INSERT INTO course_instances (course_id, term_code, start_date, end_date) VALUES ($1, $2, $3, $4)",
            )
            .bind(course_id)
            .bind(term_code)
            .bind(start_date)
            .bind(end_date)
            .execute(db)
            .await;

            match inserted {
                Ok(_) => result.created += 1,
                Err(e) if is_unique_violation(&e) => result.error(format!(
                    "{}: Instance for term {} already exists",
                    course_code, term_code
                )),
                Err(e) => return Err(e.into()),
            }
        }

        Ok(result)
    }

    #[instrument(skip(db))]
    pub async fn update_instance(
        db: &PgPool,
        instance_id: i64,
        dto: UpdateInstanceDto,
    ) -> Result<bool, AppError> {
        let existing = sqlx::query_as::<_, (String, Option<NaiveDate>, Option<NaiveDate>)>(
            "SELECT term_code, start_date, end_date FROM course_instances WHERE instance_id = $1",
        )
        .bind(instance_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::missing("Course instance not found"))?;

        let term_code = dto
            .term_code
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| existing.0.clone());
        let start_date = match dto.start_date.as_deref().filter(|d| !d.trim().is_empty()) {
            Some(d) => Some(parse_date(d)?),
            None => existing.1,
        };
        let end_date = match dto.end_date.as_deref().filter(|d| !d.trim().is_empty()) {
            Some(d) => Some(parse_date(d)?),
            None => existing.2,
        };

        if let (Some(start), Some(end)) = (start_date, end_date)
            && start > end
        {
            return Err(AppError::invalid("Start date must be on or before end date"));
        }

        if (term_code.as_str(), start_date, end_date)
            == (existing.0.as_str(), existing.1, existing.2)
        {
            return Ok(false);
        }

        sqlx::query(
            "UPDATE course_instances SET term_code = $1, start_date = $2, end_date = $3 WHERE instance_id = $4",
        )
        .bind(&term_code)
        .bind(start_date)
        .bind(end_date)
        .bind(instance_id)
        .execute(db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return AppError::conflict(anyhow::anyhow!(
                    "An instance for this course and term already exists"
                ));
            }
            AppError::from(e)
        })?;

        Ok(true)
    }

    #[instrument(skip(db))]
    pub async fn delete_instance(db: &PgPool, instance_id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM course_instances WHERE instance_id = $1")
            .bind(instance_id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::missing("Course instance not found"));
        }
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn get_instance(db: &PgPool, instance_id: i64) -> Result<InstanceDetail, AppError> {
        sqlx::query_as::<_, InstanceDetail>(
            r#"SELECT ci.instance_id, ci.course_id, ci.term_code, ci.start_date, ci.end_date,
                      ci.created_at, cm.course_code, cm.course_title, cm.description
               FROM course_instances ci
               JOIN courses_master cm ON ci.course_id = cm.course_id
               WHERE ci.instance_id = $1"#,
        )
        .bind(instance_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::missing("Course instance not found"))
    }

    #[instrument(skip(db))]
    pub async fn export_rows(db: &PgPool) -> Result<Vec<Vec<String>>, AppError> {
        let rows = sqlx::query_as::<_, (String, String, String, Option<NaiveDate>, Option<NaiveDate>)>(
            r#"SELECT cm.course_code, cm.course_title, ci.term_code, ci.start_date, ci.end_date
               FROM course_instances ci
               JOIN courses_master cm ON ci.course_id = cm.course_id
               ORDER BY ci.term_code DESC, cm.course_code"#,
        )
        .fetch_all(db)
        .await?;

        let date = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();
        Ok(rows
            .into_iter()
            .map(|(code, title, term, start, end)| vec![code, title, term, date(start), date(end)])
            .collect())
    }
}
