use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{info, instrument};

use lms_core::AppError;

use crate::modules::course_instructors::model::{
    AssignInstructorDto, AssignmentFilter, InstanceOption, InstructorAssignment, TeacherOption,
};
use crate::modules::users::model::UserRole;
use crate::utils::db::is_unique_violation;

pub struct CourseInstructorService;

impl CourseInstructorService {
    #[instrument(skip(db))]
    pub async fn list_assignments(
        db: &PgPool,
        filter: AssignmentFilter,
    ) -> Result<Vec<InstructorAssignment>, AppError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"SELECT cin.course_instructor_id, cin.instance_id, cin.user_id, cin.role, cin.created_at,
                      u.full_name AS instructor_name, u.external_id AS instructor_external_id,
                      cm.course_code, cm.course_title, ci.term_code, ci.start_date, ci.end_date
               FROM course_instructors cin
               JOIN users u ON cin.user_id = u.user_id
               JOIN course_instances ci ON cin.instance_id = ci.instance_id
               JOIN courses_master cm ON ci.course_id = cm.course_id
               WHERE TRUE"#,
        );

        if let Some(term) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", term);
            builder
                .push(" AND (u.full_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR cm.course_code ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR cm.course_title ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(instance_id) = filter.instance_id {
            builder.push(" AND cin.instance_id = ").push_bind(instance_id);
        }
        if let Some(role) = filter.role.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            builder.push(" AND cin.role = ").push_bind(role.to_lowercase());
        }
        builder.push(" ORDER BY cm.course_code, ci.term_code, cin.role, u.full_name");

        let rows = builder
            .build_query_as::<InstructorAssignment>()
            .fetch_all(db)
            .await?;
        Ok(rows)
    }

    /// Assigns a teaching user to an instance; the assignment takes the user's role.
    #[instrument(skip(db))]
    pub async fn assign(db: &PgPool, dto: AssignInstructorDto) -> Result<i64, AppError> {
        let instance_id = dto
            .instance_id
            .ok_or_else(|| AppError::invalid("Missing required field: instance_id"))?;
        let user_id = dto
            .user_id
            .ok_or_else(|| AppError::invalid("Missing required field: user_id"))?;

        let role = sqlx::query_scalar::<_, String>("SELECT role FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(db)
            .await?
            .and_then(|r| UserRole::parse(&r))
            .filter(|r| r.can_teach())
            .ok_or_else(|| AppError::invalid("User is not an instructor"))?;

        let instance_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM course_instances WHERE instance_id = $1)",
        )
        .bind(instance_id)
        .fetch_one(db)
        .await?;
        if !instance_exists {
            return Err(AppError::missing("Course instance not found"));
        }

        let course_instructor_id = sqlx::query_scalar::<_, i64>(
            r#"INSERT INTO course_instructors (instance_id, user_id, role)
               VALUES ($1, $2, $3)
               RETURNING course_instructor_id"#,
        )
        .bind(instance_id)
        .bind(user_id)
        .bind(role.as_str())
        .fetch_one(db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return AppError::invalid("Instructor already assigned to this course instance");
            }
            AppError::from(e)
        })?;

        info!(course_instructor_id, instance_id, user_id, "Instructor assigned");
        Ok(course_instructor_id)
    }

    #[instrument(skip(db))]
    pub async fn update_role(
        db: &PgPool,
        course_instructor_id: i64,
        role: Option<&str>,
    ) -> Result<(), AppError> {
        let role = role
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or_else(|| AppError::invalid("Missing required field: role"))?;

        let result =
            sqlx::query("UPDATE course_instructors SET role = $1 WHERE course_instructor_id = $2")
                .bind(role.to_lowercase())
                .bind(course_instructor_id)
                .execute(db)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::missing("Course instructor assignment not found"));
        }
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn remove(db: &PgPool, course_instructor_id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM course_instructors WHERE course_instructor_id = $1")
            .bind(course_instructor_id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::missing("Course instructor assignment not found"));
        }
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn available_teachers(db: &PgPool) -> Result<Vec<TeacherOption>, AppError> {
        let teachers = sqlx::query_as::<_, TeacherOption>(
            r#"SELECT user_id, full_name, external_id, role
               FROM users
               WHERE role IN ('instructor', 'teacher')
               ORDER BY full_name"#,
        )
        .fetch_all(db)
        .await?;
        Ok(teachers)
    }

    #[instrument(skip(db))]
    pub async fn available_instances(db: &PgPool) -> Result<Vec<InstanceOption>, AppError> {
        let instances = sqlx::query_as::<_, InstanceOption>(
            r#"SELECT ci.instance_id, ci.course_id, cm.course_code, cm.course_title, ci.term_code
               FROM course_instances ci
               JOIN courses_master cm ON ci.course_id = cm.course_id
               ORDER BY cm.course_code, ci.term_code"#,
        )
        .fetch_all(db)
        .await?;
        Ok(instances)
    }
}
