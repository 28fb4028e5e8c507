use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, instrument};

use lms_core::pagination::sort_column;
use lms_core::{AppError, PageMeta, SortOrder};

use crate::modules::courses::model::SearchQuery;
use crate::modules::enrollments::model::{
    EnrollableInstance, EnrollmentListQuery, EnrollmentListResponse, EnrollmentRow,
    StudentEnrollment, StudentOption,
};
use crate::utils::csv::CsvRow;
use crate::utils::db::is_unique_violation;
use crate::utils::response::BatchResult;

const SORT_COLUMNS: [(&str, &str); 6] = [
    ("external_id", "u.external_id"),
    ("full_name", "u.full_name"),
    ("course_code", "cm.course_code"),
    ("course_title", "cm.course_title"),
    ("term_code", "ci.term_code"),
    ("created_at", "e.created_at"),
];

const LIST_FROM: &str = r#"
    FROM enrollments e
    JOIN course_instances ci ON e.instance_id = ci.instance_id
    JOIN courses_master cm ON ci.course_id = cm.course_id
    JOIN users u ON e.user_id = u.user_id"#;

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &EnrollmentListQuery) {
    builder.push(" WHERE TRUE");
    if let Some(term) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", term);
        builder.push(" AND (");
        let mut any = builder.separated(" OR ");
        for column in ["u.external_id", "u.full_name", "cm.course_code", "cm.course_title"] {
            any.push(format!("{} ILIKE ", column))
                .push_bind_unseparated(pattern.clone());
        }
        builder.push(")");
    }
    if let Some(instance_id) = query.instance_id {
        builder.push(" AND ci.instance_id = ").push_bind(instance_id);
    }
    if let Some(term) = query.term.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        builder.push(" AND ci.term_code = ").push_bind(term.to_string());
    }
}

/// Outcome of a single enrollment attempt inside a batch.
enum Enrolled {
    Created,
    AlreadyEnrolled,
}

async fn enroll(db: &PgPool, instance_id: i64, user_id: i64) -> Result<Enrolled, AppError> {
    let inserted = sqlx::query(
        "INSERT INTO enrollments (instance_id, user_id) VALUES ($1, $2) ON CONFLICT (instance_id, user_id) DO NOTHING",
    )
    .bind(instance_id)
    .bind(user_id)
    .execute(db)
    .await?;

    Ok(if inserted.rows_affected() == 0 {
        Enrolled::AlreadyEnrolled
    } else {
        Enrolled::Created
    })
}

pub struct EnrollmentService;

impl EnrollmentService {
    #[instrument(skip(db))]
    pub async fn for_student(db: &PgPool, user_id: i64) -> Result<Vec<StudentEnrollment>, AppError> {
        let enrollments = sqlx::query_as::<_, StudentEnrollment>(
            r#"SELECT e.enrollment_id, e.created_at AS enrolled_at, ci.instance_id,
                      cm.course_id, cm.course_code, cm.course_title, cm.description,
                      ci.term_code, ci.start_date, ci.end_date
               FROM enrollments e
               JOIN course_instances ci ON e.instance_id = ci.instance_id
               JOIN courses_master cm ON ci.course_id = cm.course_id
               WHERE e.user_id = $1
               ORDER BY ci.start_date DESC"#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(enrollments)
    }

    #[instrument(skip(db))]
    pub async fn list(
        db: &PgPool,
        query: EnrollmentListQuery,
    ) -> Result<EnrollmentListResponse, AppError> {
        let per_page = query.page.per_page(10);
        let offset = query.page.offset(10);

        let mut count: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*)");
        count.push(LIST_FROM);
        push_filters(&mut count, &query);
        let total = count.build_query_scalar::<i64>().fetch_one(db).await?;

        let column = sort_column(query.sort_by.as_deref(), &SORT_COLUMNS, "e.created_at");
        let order = SortOrder::parse_or(query.sort_order.as_deref(), SortOrder::Desc);

        let mut select: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"SELECT e.enrollment_id, e.instance_id, e.user_id, e.created_at,
                      u.external_id, u.full_name, cm.course_code, cm.course_title,
                      ci.term_code, ci.start_date, ci.end_date"#,
        );
        select.push(LIST_FROM);
        push_filters(&mut select, &query);
        select
            .push(format!(" ORDER BY {} {}, e.enrollment_id DESC", column, order.as_sql()))
            .push(" LIMIT ")
            .push_bind(per_page)
            .push(" OFFSET ")
            .push_bind(offset);
        let enrollments = select
            .build_query_as::<EnrollmentRow>()
            .fetch_all(db)
            .await?;

        Ok(EnrollmentListResponse {
            success: true,
            enrollments,
            pagination: PageMeta::new(query.page.page(), per_page, total),
        })
    }

    #[instrument(skip(db))]
    pub async fn instances(
        db: &PgPool,
        query: &SearchQuery,
    ) -> Result<Vec<EnrollableInstance>, AppError> {
        let instances = sqlx::query_as::<_, EnrollableInstance>(
            r#"SELECT ci.instance_id, ci.term_code, ci.start_date, ci.end_date,
                      cm.course_code, cm.course_title,
                      (SELECT COUNT(*) FROM enrollments e WHERE e.instance_id = ci.instance_id) AS enrolled_count
               FROM course_instances ci
               JOIN courses_master cm ON ci.course_id = cm.course_id
               WHERE $1::TEXT IS NULL
                  OR cm.course_code ILIKE $1 OR cm.course_title ILIKE $1 OR ci.term_code ILIKE $1
               ORDER BY ci.term_code DESC, cm.course_code"#,
        )
        .bind(query.pattern())
        .fetch_all(db)
        .await?;
        Ok(instances)
    }

    #[instrument(skip(db))]
    pub async fn students(db: &PgPool, query: &SearchQuery) -> Result<Vec<StudentOption>, AppError> {
        let students = sqlx::query_as::<_, StudentOption>(
            r#"SELECT user_id, external_id, full_name
               FROM users
               WHERE role = 'student'
                 AND ($1::TEXT IS NULL OR external_id ILIKE $1 OR full_name ILIKE $1)
               ORDER BY external_id"#,
        )
        .bind(query.pattern())
        .fetch_all(db)
        .await?;
        Ok(students)
    }

    async fn instance_exists(db: &PgPool, instance_id: i64) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM course_instances WHERE instance_id = $1)",
        )
        .bind(instance_id)
        .fetch_one(db)
        .await?;
        Ok(exists)
    }

    #[instrument(skip(db))]
    pub async fn create(db: &PgPool, instance_id: i64, user_id: i64) -> Result<i64, AppError> {
        if !Self::instance_exists(db, instance_id).await? {
            return Err(AppError::missing("Course instance not found"));
        }

        let user_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE user_id = $1)")
                .bind(user_id)
                .fetch_one(db)
                .await?;
        if !user_exists {
            return Err(AppError::missing("User not found"));
        }

        sqlx::query_scalar::<_, i64>(
            "INSERT INTO enrollments (instance_id, user_id) VALUES ($1, $2) RETURNING enrollment_id",
        )
        .bind(instance_id)
        .bind(user_id)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return AppError::invalid("Student is already enrolled in this course");
            }
            AppError::from(e)
        })
    }

    /// Enrolls every listed user, collecting per-user failures.
    #[instrument(skip(db, user_ids), fields(count = user_ids.len()))]
    pub async fn bulk_enroll(
        db: &PgPool,
        instance_id: i64,
        user_ids: &[i64],
    ) -> Result<BatchResult, AppError> {
        if !Self::instance_exists(db, instance_id).await? {
            return Err(AppError::missing("Course instance not found"));
        }

        let mut result = BatchResult::new();
        for &user_id in user_ids {
            let external_id = sqlx::query_scalar::<_, String>(
                "SELECT external_id FROM users WHERE user_id = $1",
            )
            .bind(user_id)
            .fetch_optional(db)
            .await?;

            let Some(external_id) = external_id else {
                result.error(format!("User ID {}: User not found", user_id));
                continue;
            };

            match enroll(db, instance_id, user_id).await? {
                Enrolled::Created => result.created += 1,
                Enrolled::AlreadyEnrolled => {
                    result.error(format!("User {}: Already enrolled in this course", external_id))
                }
            }
        }

        Ok(result)
    }

    /// `"CODE - TITLE"` for an instance, or 404.
    #[instrument(skip(db))]
    pub async fn course_info(db: &PgPool, instance_id: i64) -> Result<String, AppError> {
        let (code, title) = sqlx::query_as::<_, (String, String)>(
            r#"SELECT cm.course_code, cm.course_title
               FROM course_instances ci
               JOIN courses_master cm ON ci.course_id = cm.course_id
               WHERE ci.instance_id = $1"#,
        )
        .bind(instance_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::missing("Course instance not found"))?;

        Ok(format!("{} - {}", code, title))
    }

    /// Enrolls the students named by the `external_id` (or `usn`) column.
    #[instrument(skip(db, rows), fields(rows = rows.len()))]
    pub async fn import_rows(
        db: &PgPool,
        instance_id: i64,
        rows: &[CsvRow],
    ) -> Result<BatchResult, AppError> {
        let mut result = BatchResult::new();

        for row in rows {
            let Some(external_id) = row.get(&["external_id", "usn"]) else {
                result.error(format!("Row {}: Missing student USN", row.line));
                continue;
            };

            let student = sqlx::query_as::<_, (i64, String)>(
                "SELECT user_id, full_name FROM users WHERE external_id = $1 AND role = 'student'",
            )
            .bind(external_id)
            .fetch_optional(db)
            .await?;

            let Some((user_id, full_name)) = student else {
                result.error(format!(
                    "Row {}: Student with USN '{}' not found",
                    row.line, external_id
                ));
                continue;
            };

            match enroll(db, instance_id, user_id).await? {
                Enrolled::Created => result.created += 1,
                Enrolled::AlreadyEnrolled => result.error(format!(
                    "Row {}: {} ({}) already enrolled",
                    row.line, full_name, external_id
                )),
            }
        }

        debug!(created = result.created, errors = result.errors.len(), "Enrollment CSV processed");
        Ok(result)
    }

    #[instrument(skip(db))]
    pub async fn export_rows(
        db: &PgPool,
        instance_id: Option<i64>,
    ) -> Result<Vec<Vec<String>>, AppError> {
        let rows = sqlx::query_as::<_, (String, String, String, String, String)>(
            r#"SELECT u.external_id, u.full_name, cm.course_code, cm.course_title, ci.term_code
               FROM enrollments e
               JOIN course_instances ci ON e.instance_id = ci.instance_id
               JOIN courses_master cm ON ci.course_id = cm.course_id
               JOIN users u ON e.user_id = u.user_id
               WHERE $1::BIGINT IS NULL OR e.instance_id = $1
               ORDER BY ci.term_code DESC, cm.course_code, u.external_id"#,
        )
        .bind(instance_id)
        .fetch_all(db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(usn, name, code, title, term)| vec![usn, name, code, title, term])
            .collect())
    }
}
