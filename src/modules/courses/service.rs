use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{instrument, warn};

use lms_core::pagination::sort_column;
use lms_core::{AppError, PageMeta, SortOrder};

use crate::llm::LlmProvider;
use crate::llm::parse::first_sentences;
use crate::modules::courses::model::{
    Course, CourseListQuery, CourseListResponse, CourseOption, CreateCourseDto, SearchQuery,
    UpdateCourseDto,
};
use crate::utils::csv::CsvRow;
use crate::utils::db::is_unique_violation;
use crate::utils::response::BatchResult;

const COURSE_COLUMNS: &str = "course_id, course_code, course_title, description, created_at";
const SORT_COLUMNS: [(&str, &str); 3] = [
    ("course_code", "course_code"),
    ("course_title", "course_title"),
    ("created_at", "created_at"),
];
const SKIPPED_PREFIXES: [&str; 6] = ["Course:", "Description:", "**", "#", "-", "•"];

fn push_search<'a>(builder: &mut QueryBuilder<'a, Postgres>, search: Option<&str>) {
    if let Some(term) = search.map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", term);
        builder
            .push(" WHERE (course_code ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR course_title ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Reduces a raw completion to a catalogue paragraph of at most four sentences.
pub fn clean_course_description(raw: &str) -> String {
    let body = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !SKIPPED_PREFIXES.iter().any(|p| line.starts_with(p)))
        .collect::<Vec<_>>()
        .join(" ");

    let description = first_sentences(&body, 4);
    description
        .trim()
        .trim_start_matches("Description:")
        .trim()
        .to_string()
}

pub struct CourseService;

impl CourseService {
    #[instrument(skip(db))]
    pub async fn list_courses(
        db: &PgPool,
        query: CourseListQuery,
    ) -> Result<CourseListResponse, AppError> {
        let per_page = query.page.per_page(10);
        let offset = query.page.offset(10);

        let mut count: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM courses_master");
        push_search(&mut count, query.search.as_deref());
        let total = count.build_query_scalar::<i64>().fetch_one(db).await?;

        let column = sort_column(query.sort_by.as_deref(), &SORT_COLUMNS, "created_at");
        let order = SortOrder::parse_or(query.sort_order.as_deref(), SortOrder::Desc);

        let mut select: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {COURSE_COLUMNS} FROM courses_master"));
        push_search(&mut select, query.search.as_deref());
        select
            .push(format!(" ORDER BY {} {}, course_id {}", column, order.as_sql(), order.as_sql()))
            .push(" LIMIT ")
            .push_bind(per_page)
            .push(" OFFSET ")
            .push_bind(offset);
        let courses = select.build_query_as::<Course>().fetch_all(db).await?;

        Ok(CourseListResponse {
            success: true,
            courses,
            meta: PageMeta::new(query.page.page(), per_page, total),
        })
    }

    #[instrument(skip(db))]
    pub async fn find_course(db: &PgPool, course_id: i64) -> Result<Course, AppError> {
        sqlx::query_as::<_, Course>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses_master WHERE course_id = $1"
        ))
        .bind(course_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::missing("Course not found"))
    }

    #[instrument(skip(db))]
    pub async fn create_course(db: &PgPool, dto: CreateCourseDto) -> Result<Course, AppError> {
        let course_code = dto.course_code.trim();
        let course_title = dto.course_title.trim();
        if course_code.is_empty() || course_title.is_empty() {
            return Err(AppError::invalid("Course code and title are required"));
        }
        let description = dto.description.as_deref().map(str::trim).unwrap_or_default();

        sqlx::query_as::<_, Course>(&format!(
            "INSERT INTO courses_master (course_code, course_title, description) VALUES ($1, $2, $3) RETURNING {COURSE_COLUMNS}"
        ))
        .bind(course_code)
        .bind(course_title)
        .bind(description)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return AppError::conflict(anyhow::anyhow!(
                    "Course code '{}' already exists",
                    course_code
                ));
            }
            AppError::from(e)
        })
    }

    /// Returns `None` when no field differs from the stored course.
    #[instrument(skip(db))]
    pub async fn update_course(
        db: &PgPool,
        course_id: i64,
        dto: UpdateCourseDto,
    ) -> Result<Option<Course>, AppError> {
        let course_code = dto.course_code.as_deref().map(str::trim).unwrap_or_default();
        let course_title = dto.course_title.as_deref().map(str::trim).unwrap_or_default();
        if course_code.is_empty() || course_title.is_empty() {
            return Err(AppError::invalid("Course code and title are required"));
        }

        let existing = Self::find_course(db, course_id).await?;

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE courses_master SET ");
        let mut changes = builder.separated(", ");
        let mut changed = false;

        if course_code != existing.course_code {
            changes.push("course_code = ").push_bind_unseparated(course_code.to_string());
            changed = true;
        }
        if course_title != existing.course_title {
            changes.push("course_title = ").push_bind_unseparated(course_title.to_string());
            changed = true;
        }
        if let Some(description) = dto.description.as_deref().map(str::trim)
            && Some(description) != existing.description.as_deref()
        {
            changes.push("description = ").push_bind_unseparated(description.to_string());
            changed = true;
        }

        if !changed {
            return Ok(None);
        }

        builder
            .push(" WHERE course_id = ")
            .push_bind(course_id)
            .push(format!(" RETURNING {COURSE_COLUMNS}"));

        let course = builder
            .build_query_as::<Course>()
            .fetch_one(db)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    return AppError::conflict(anyhow::anyhow!("Course code already exists"));
                }
                AppError::from(e)
            })?;

        Ok(Some(course))
    }

    #[instrument(skip(db))]
    pub async fn delete_course(db: &PgPool, course_id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM courses_master WHERE course_id = $1")
            .bind(course_id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::missing("Course not found"));
        }
        Ok(())
    }

    #[instrument(skip(db, rows), fields(rows = rows.len()))]
    pub async fn import_rows(db: &PgPool, rows: &[CsvRow]) -> Result<BatchResult, AppError> {
        let mut result = BatchResult::new();

        for row in rows {
            let (Some(course_code), Some(course_title)) =
                (row.get(&["course_code"]), row.get(&["course_title"]))
            else {
                result.error(format!("Row {}: Missing required fields", row.line));
                continue;
            };
            let description = row.get(&["description"]).unwrap_or_default();

            let inserted = sqlx::query_scalar::<_, i64>(
                r#"INSERT INTO courses_master (course_code, course_title, description)
                   VALUES ($1, $2, $3)
                   ON CONFLICT (course_code) DO NOTHING
                   RETURNING course_id"#,
            )
            .bind(course_code)
            .bind(course_title)
            .bind(description)
            .fetch_optional(db)
            .await?;

            match inserted {
                Some(_) => result.created += 1,
                None => result.error(format!(
                    "Row {}: Course code '{}' already exists",
                    row.line, course_code
                )),
            }
        }

        Ok(result)
    }

    /// Courses matching `search` on code or title, for selection lists.
    #[instrument(skip(db))]
    pub async fn course_options(
        db: &PgPool,
        query: &SearchQuery,
    ) -> Result<Vec<CourseOption>, AppError> {
        let courses = sqlx::query_as::<_, CourseOption>(
            r#"SELECT course_id, course_code, course_title
               FROM courses_master
               WHERE $1::TEXT IS NULL OR course_code ILIKE $1 OR course_title ILIKE $1
               ORDER BY course_code"#,
        )
        .bind(query.pattern())
        .fetch_all(db)
        .await?;

        Ok(courses)
    }

    #[instrument(skip(db))]
    pub async fn export_rows(db: &PgPool) -> Result<Vec<Vec<String>>, AppError> {
        let rows = sqlx::query_as::<_, (String, String, Option<String>)>(
            "SELECT course_code, course_title, description FROM courses_master ORDER BY course_code",
        )
        .fetch_all(db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(code, title, description)| vec![code, title, description.unwrap_or_default()])
            .collect())
    }

    #[instrument(skip(llm))]
    pub async fn generate_description(
        llm: &dyn LlmProvider,
        course_code: Option<&str>,
        course_title: &str,
    ) -> Result<String, AppError> {
        let heading = match course_code.filter(|c| !c.is_empty()) {
            Some(code) => format!("{} - {}", code, course_title),
            None => course_title.to_string(),
        };
        let prompt = format!(
            "Generate ONLY a course description for: {heading}\n\n\
             Requirements:\n\
             - Write ONLY the course description paragraph\n\
             - Do NOT include course objectives, learning outcomes, prerequisites, or target audience\n\
             - Do NOT include any headers, titles, or formatting\n\
             - Keep it to exactly one paragraph (3-4 sentences)\n\
             - Focus on what the course covers and teaches\n\
             - Use academic language suitable for a course catalog\n\n\
             Course: {heading}\n\nDescription:"
        );

        let options = llm.default_options().with_temperature(0.7);
        let raw = llm.generate(&prompt, &options).await.map_err(|e| {
            warn!(error = %e, "Course description generation failed");
            AppError::bad_gateway(anyhow::anyhow!("Failed to generate description"))
        })?;

        let description = clean_course_description(&raw);
        if description.is_empty() {
            return Err(AppError::bad_gateway(anyhow::anyhow!(
                "Failed to generate description"
            )));
        }
        Ok(description)
    }
}
