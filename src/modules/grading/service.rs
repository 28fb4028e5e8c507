use sqlx::PgPool;
use tracing::{info, instrument};

use lms_core::AppError;

use crate::modules::courses::model::SearchQuery;
use crate::modules::grading::model::{
    ActivitySubmission, GradingActivity, GradingActivityRow, GradingSubmission, MAX_GRADE,
    PendingCourse, SubmissionTracking,
};

pub struct GradingService;

impl GradingService {
    #[instrument(skip(db))]
    pub async fn submission(db: &PgPool, submission_id: i64) -> Result<GradingSubmission, AppError> {
        sqlx::query_as::<_, GradingSubmission>(
            r#"SELECT s.submission_id, s.submission_content, s.grade::FLOAT8 AS grade, s.feedback,
                      s.status, s.submitted_at, u.full_name, u.external_id,
                      a.activity_id, a.title AS activity_title, a.instructions AS activity_instructions,
                      m.module_id, m.position AS module_position
               FROM activity_submissions s
               JOIN users u ON u.user_id = s.user_id
               JOIN module_activities a ON a.activity_id = s.activity_id
               JOIN modules_master m ON m.module_id = a.module_id
               WHERE s.submission_id = $1"#,
        )
        .bind(submission_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::missing("Submission not found"))
    }

    /// Per-instance expected versus received work. Required totals are
    /// enrolled students times the course's activities, quizzes or exams.
    #[instrument(skip(db))]
    pub async fn submission_tracking(
        db: &PgPool,
        query: &SearchQuery,
    ) -> Result<Vec<SubmissionTracking>, AppError> {
        let rows = sqlx::query_as::<_, SubmissionTracking>(
            r#"WITH per_instance AS (
                   SELECT ci.instance_id, ci.course_id, c.course_code, c.course_title, ci.term_code,
                          (SELECT COUNT(*) FROM enrollments e WHERE e.instance_id = ci.instance_id)
                              AS enrolled_students,
                          (SELECT COUNT(*) FROM module_activities a
                             JOIN modules_master m ON m.module_id = a.module_id
                            WHERE m.course_id = ci.course_id) AS total_activities,
                          (SELECT COUNT(*) FROM activity_submissions s
                             JOIN enrollments e ON e.user_id = s.user_id AND e.instance_id = ci.instance_id
                             JOIN module_activities a ON a.activity_id = s.activity_id
                             JOIN modules_master m ON m.module_id = a.module_id
                            WHERE m.course_id = ci.course_id AND s.status <> 'draft') AS submitted_count,
                          (SELECT COUNT(DISTINCT sc.exam_type_id) FROM assessment_scopes sc
                             JOIN exam_types et ON et.exam_type_id = sc.exam_type_id
                            WHERE sc.course_id = ci.course_id AND et.category = 'quiz') AS total_quizzes,
                          (SELECT COUNT(*) FROM quiz_results r WHERE r.instance_id = ci.instance_id)
                              AS quizzes_completed,
                          (SELECT COUNT(DISTINCT sc.exam_type_id) FROM assessment_scopes sc
                             JOIN exam_types et ON et.exam_type_id = sc.exam_type_id
                            WHERE sc.course_id = ci.course_id AND et.category = 'exam') AS total_exams,
                          (SELECT COUNT(*) FROM exam_results r WHERE r.instance_id = ci.instance_id)
                              AS exams_completed
                   FROM course_instances ci
                   JOIN courses_master c ON c.course_id = ci.course_id
                   WHERE $1::TEXT IS NULL OR c.course_code ILIKE $1 OR c.course_title ILIKE $1
               )
               SELECT instance_id, course_code, course_title, term_code, enrolled_students,
                      total_activities, enrolled_students * total_activities AS total_required,
                      submitted_count,
                      total_quizzes, enrolled_students * total_quizzes AS total_quizzes_required,
                      quizzes_completed,
                      total_exams, enrolled_students * total_exams AS total_exams_required,
                      exams_completed
               FROM per_instance
               ORDER BY course_code, term_code"#,
        )
        .bind(query.pattern())
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Active instances with submissions waiting for a grade.
    #[instrument(skip(db))]
    pub async fn courses_with_pending(
        db: &PgPool,
        query: &SearchQuery,
    ) -> Result<Vec<PendingCourse>, AppError> {
        let rows = sqlx::query_as::<_, PendingCourse>(
            r#"SELECT ci.instance_id, ci.course_id, c.course_code, c.course_title, ci.term_code,
                      COUNT(s.submission_id) FILTER (WHERE s.status = 'submitted') AS pending_count,
                      COUNT(DISTINCT a.activity_id) AS total_activities
               FROM course_instances ci
               JOIN courses_master c ON c.course_id = ci.course_id
               JOIN enrollments e ON e.instance_id = ci.instance_id
               JOIN modules_master m ON m.course_id = c.course_id
               JOIN module_activities a ON a.module_id = m.module_id
               LEFT JOIN activity_submissions s
                 ON s.activity_id = a.activity_id AND s.user_id = e.user_id
               WHERE ci.end_date >= CURRENT_DATE
                 AND ($1::TEXT IS NULL OR c.course_code ILIKE $1 OR c.course_title ILIKE $1)
               GROUP BY ci.instance_id, ci.course_id, c.course_code, c.course_title, ci.term_code
               HAVING COUNT(s.submission_id) FILTER (WHERE s.status = 'submitted') > 0
               ORDER BY c.course_code, ci.term_code"#,
        )
        .bind(query.pattern())
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    #[instrument(skip(db))]
    pub async fn pending_count(db: &PgPool, course_id: i64) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*)
               FROM activity_submissions s
               JOIN module_activities a ON a.activity_id = s.activity_id
               JOIN modules_master m ON m.module_id = a.module_id
               WHERE m.course_id = $1 AND s.status = 'submitted'"#,
        )
        .bind(course_id)
        .fetch_one(db)
        .await?;
        Ok(count)
    }

    /// Activities of the instance's course with submission counts from the
    /// instance's students only.
    #[instrument(skip(db))]
    pub async fn activities(db: &PgPool, instance_id: i64) -> Result<Vec<GradingActivity>, AppError> {
        let rows = sqlx::query_as::<_, GradingActivityRow>(
            r#"SELECT a.activity_id, a.title, a.instructions, a.position,
                      m.module_id, m.position AS module_position, m.content_html,
                      COUNT(s.submission_id) FILTER (WHERE s.status <> 'draft') AS submitted_count,
                      COUNT(s.submission_id) FILTER (WHERE s.status = 'submitted') AS pending_count
               FROM course_instances ci
               JOIN modules_master m ON m.course_id = ci.course_id
               JOIN module_activities a ON a.module_id = m.module_id
               LEFT JOIN activity_submissions s
                 ON s.activity_id = a.activity_id
                AND EXISTS (SELECT 1 FROM enrollments e
                             WHERE e.instance_id = ci.instance_id AND e.user_id = s.user_id)
               WHERE ci.instance_id = $1
               GROUP BY a.activity_id, a.title, a.instructions, a.position,
                        m.module_id, m.position, m.content_html
               ORDER BY m.position, a.position"#,
        )
        .bind(instance_id)
        .fetch_all(db)
        .await?;

        Ok(rows.into_iter().map(GradingActivity::from).collect())
    }

    #[instrument(skip(db))]
    pub async fn submissions(
        db: &PgPool,
        activity_id: i64,
    ) -> Result<Vec<ActivitySubmission>, AppError> {
        let rows = sqlx::query_as::<_, ActivitySubmission>(
            r#"SELECT s.submission_id, s.submission_content, s.submitted_at, s.status,
                      s.grade::FLOAT8 AS grade, s.feedback, u.full_name, u.external_id
               FROM activity_submissions s
               JOIN users u ON u.user_id = s.user_id
               WHERE s.activity_id = $1
               ORDER BY s.submitted_at DESC NULLS LAST"#,
        )
        .bind(activity_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    #[instrument(skip(db, feedback))]
    pub async fn grade(
        db: &PgPool,
        submission_id: i64,
        grade: f64,
        feedback: &str,
    ) -> Result<(), AppError> {
        if !(0.0..=MAX_GRADE).contains(&grade) {
            return Err(AppError::invalid("Grade must be between 0 and 100"));
        }

        let result = sqlx::query(
            r#"UPDATE activity_submissions
               SET grade = $1, feedback = $2, status = 'graded', updated_at = NOW()
               WHERE submission_id = $3"#,
        )
        .bind(grade)
        .bind(feedback)
        .bind(submission_id)
        .execute(db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::missing("Submission not found"));
        }

        info!(submission_id, grade, "Submission graded");
        Ok(())
    }
}
