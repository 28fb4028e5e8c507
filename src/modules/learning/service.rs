use std::collections::BTreeMap;

use sqlx::PgPool;
use sqlx::types::Json;
use tracing::{info, instrument};

use lms_core::AppError;

use crate::metrics::track_assessment_submitted;
use crate::modules::assessment_preview::sampling::sample_in_course_order;
use crate::modules::assessment_preview::service::AssessmentPreviewService;
use crate::modules::courses::service::CourseService;
use crate::modules::exam_types::model::{ExamCategory, ExamPeriod, ExamType};
use crate::modules::exam_types::service::ExamTypeService;
use crate::modules::learning::model::{
    ActivityGrade, AssessmentGrade, AssessmentResult, ComponentPercentages, ComponentProgress,
    ComponentRatios, ComprehensiveGradesResponse, CourseCounts, CourseInfo,
    CourseOverviewResponse, CourseProgressResponse, GradeSummaries, ModuleCounts,
    ModuleProgressResponse, OverallProgressResponse, ProgressComponents, QuestionOptions,
    StudentActivity, StudentActivityView, StudentAssessment, StudentQuestion, Submission,
};
use crate::modules::learning::scoring::{
    Component, GradeSummary, assessment_score, blended_grade, count_correct, mean, percentage,
    round_to, weighted_progress,
};
use crate::utils::db::is_foreign_key_violation;

const SUBMISSION_COLUMNS: &str = "submission_id, activity_id, submission_content, status, \
     grade::FLOAT8 AS grade, feedback, submitted_at, updated_at";

/// Completion counts over `course_ids` ($1) for user $2, with assessment
/// results limited to `instance_ids` ($3). Each scoped (course, exam type)
/// pair counts once.
const COURSE_COUNTS_SQL: &str = r#"
SELECT
    (SELECT COUNT(*) FROM modules_master m WHERE m.course_id = ANY($1)) AS total_modules,
    (SELECT COUNT(DISTINCT m.module_id)
       FROM modules_master m
       JOIN module_sections ms ON ms.module_id = m.module_id
       JOIN student_progress sp ON sp.section_id = ms.section_id
      WHERE m.course_id = ANY($1) AND sp.user_id = $2 AND sp.is_completed) AS completed_modules,
    (SELECT COUNT(*)
       FROM module_sections ms
       JOIN modules_master m ON m.module_id = ms.module_id
      WHERE m.course_id = ANY($1)) AS total_sections,
    (SELECT COUNT(*)
       FROM student_progress sp
       JOIN module_sections ms ON ms.section_id = sp.section_id
       JOIN modules_master m ON m.module_id = ms.module_id
      WHERE m.course_id = ANY($1) AND sp.user_id = $2 AND sp.is_completed) AS completed_sections,
    (SELECT COUNT(*)
       FROM module_activities a
       JOIN modules_master m ON m.module_id = a.module_id
      WHERE m.course_id = ANY($1)) AS total_activities,
    (SELECT COUNT(*)
       FROM activity_submissions s
       JOIN module_activities a ON a.activity_id = s.activity_id
       JOIN modules_master m ON m.module_id = a.module_id
      WHERE m.course_id = ANY($1) AND s.user_id = $2 AND s.status <> 'draft') AS submitted_activities,
    (SELECT COUNT(*) FROM (
        SELECT DISTINCT sc.course_id, sc.exam_type_id
          FROM assessment_scopes sc
          JOIN exam_types et ON et.exam_type_id = sc.exam_type_id
         WHERE sc.course_id = ANY($1) AND et.category = 'quiz') q) AS total_quizzes,
    (SELECT COUNT(*)
       FROM quiz_results r
       JOIN course_instances ci ON ci.instance_id = r.instance_id
      WHERE r.user_id = $2 AND r.instance_id = ANY($3)
        AND EXISTS (SELECT 1 FROM assessment_scopes sc
                     WHERE sc.course_id = ci.course_id AND sc.exam_type_id = r.exam_type_id)) AS completed_quizzes,
    (SELECT COALESCE(SUM(r.score), 0)::FLOAT8
       FROM quiz_results r
       JOIN course_instances ci ON ci.instance_id = r.instance_id
      WHERE r.user_id = $2 AND r.instance_id = ANY($3)
        AND EXISTS (SELECT 1 FROM assessment_scopes sc
                     WHERE sc.course_id = ci.course_id AND sc.exam_type_id = r.exam_type_id)) AS quiz_score_sum,
    (SELECT COUNT(*) FROM (
        SELECT DISTINCT sc.course_id, sc.exam_type_id
          FROM assessment_scopes sc
          JOIN exam_types et ON et.exam_type_id = sc.exam_type_id
         WHERE sc.course_id = ANY($1) AND et.category = 'exam') e) AS total_exams,
    (SELECT COUNT(*)
       FROM exam_results r
       JOIN course_instances ci ON ci.instance_id = r.instance_id
      WHERE r.user_id = $2 AND r.instance_id = ANY($3)
        AND EXISTS (SELECT 1 FROM assessment_scopes sc
                     WHERE sc.course_id = ci.course_id AND sc.exam_type_id = r.exam_type_id)) AS completed_exams,
    (SELECT COALESCE(SUM(r.score), 0)::FLOAT8
       FROM exam_results r
       JOIN course_instances ci ON ci.instance_id = r.instance_id
      WHERE r.user_id = $2 AND r.instance_id = ANY($3)
        AND EXISTS (SELECT 1 FROM assessment_scopes sc
                     WHERE sc.course_id = ci.course_id AND sc.exam_type_id = r.exam_type_id)) AS exam_score_sum
"#;

fn results_table(category: ExamCategory) -> &'static str {
    match category {
        ExamCategory::Quiz => "quiz_results",
        ExamCategory::Exam => "exam_results",
    }
}

fn label(category: ExamCategory) -> &'static str {
    match category {
        ExamCategory::Quiz => "Quiz",
        ExamCategory::Exam => "Exam",
    }
}

fn component(completed: i64, total: i64) -> ComponentProgress {
    ComponentProgress {
        completed,
        total,
        percentage: round_to(percentage(completed, total), 1),
    }
}

impl CourseCounts {
    fn sections(&self) -> Component {
        Component::new(self.completed_sections, self.total_sections)
    }

    fn activities(&self) -> Component {
        Component::new(self.submitted_activities, self.total_activities)
    }

    fn quizzes(&self) -> Component {
        Component::new(self.completed_quizzes, self.total_quizzes)
    }

    fn exams(&self) -> Component {
        Component::new(self.completed_exams, self.total_exams)
    }

    fn overall_progress(&self) -> f64 {
        weighted_progress(self.sections(), self.activities(), self.quizzes(), self.exams())
    }
}

pub struct LearningService;

impl LearningService {
    #[instrument(skip(db))]
    pub async fn find_submission(
        db: &PgPool,
        user_id: i64,
        activity_id: i64,
    ) -> Result<Option<Submission>, AppError> {
        let submission = sqlx::query_as::<_, Submission>(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM activity_submissions WHERE user_id = $1 AND activity_id = $2"
        ))
        .bind(user_id)
        .bind(activity_id)
        .fetch_optional(db)
        .await?;
        Ok(submission)
    }

    /// Submits an activity. Drafts are promoted; anything already handed in
    /// is locked until an instructor intervenes.
    #[instrument(skip(db, content))]
    pub async fn submit_activity(
        db: &PgPool,
        user_id: i64,
        activity_id: i64,
        content: &str,
    ) -> Result<&'static str, AppError> {
        if let Some(existing) = Self::find_submission(db, user_id, activity_id).await? {
            if existing.status != "draft" {
                return Err(AppError::invalid(
                    "Activity already submitted. Contact instructor to resubmit.",
                ));
            }

            sqlx::query(
                r#"UPDATE activity_submissions
                   SET submission_content = $1, status = 'submitted', submitted_at = NOW(), updated_at = NOW()
                   WHERE submission_id = $2"#,
            )
            .bind(content)
            .bind(existing.submission_id)
            .execute(db)
            .await?;
            return Ok("Activity submission updated successfully");
        }

        sqlx::query(
            r#"INSERT INTO activity_submissions (user_id, activity_id, submission_content, status, submitted_at)
               VALUES ($1, $2, $3, 'submitted', NOW())"#,
        )
        .bind(user_id)
        .bind(activity_id)
        .bind(content)
        .execute(db)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                return AppError::missing("Activity not found");
            }
            AppError::from(e)
        })?;

        info!(user_id, activity_id, "Activity submitted");
        Ok("Activity submitted successfully")
    }

    #[instrument(skip(db))]
    pub async fn activities_with_grades(
        db: &PgPool,
        user_id: i64,
        module_id: i64,
    ) -> Result<Vec<StudentActivityView>, AppError> {
        let rows = sqlx::query_as::<_, StudentActivity>(
            r#"SELECT a.activity_id, a.title, a.instructions, a.activity_type, a.position,
                      s.submission_id, s.status, s.grade::FLOAT8 AS grade, s.feedback, s.submitted_at
               FROM module_activities a
               LEFT JOIN activity_submissions s ON s.activity_id = a.activity_id AND s.user_id = $1
               WHERE a.module_id = $2
               ORDER BY a.position"#,
        )
        .bind(user_id)
        .bind(module_id)
        .fetch_all(db)
        .await?;

        Ok(rows.into_iter().map(StudentActivityView::from).collect())
    }

    /// The caller's most recent instance of a course.
    #[instrument(skip(db))]
    pub async fn enrolled_instance(db: &PgPool, user_id: i64, course_id: i64) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>(
            r#"SELECT ci.instance_id
               FROM enrollments e
               JOIN course_instances ci ON ci.instance_id = e.instance_id
               WHERE ci.course_id = $1 AND e.user_id = $2
               ORDER BY ci.start_date DESC, ci.instance_id DESC
               LIMIT 1"#,
        )
        .bind(course_id)
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::forbidden("Student not enrolled in this course"))
    }

    /// Course of an instance the caller is enrolled in.
    #[instrument(skip(db))]
    async fn enrolled_course(db: &PgPool, user_id: i64, instance_id: i64) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>(
            r#"SELECT ci.course_id
               FROM enrollments e
               JOIN course_instances ci ON ci.instance_id = e.instance_id
               WHERE e.instance_id = $1 AND e.user_id = $2"#,
        )
        .bind(instance_id)
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::forbidden("Student not enrolled in this course instance"))
    }

    #[instrument(skip(db))]
    pub async fn assessments(
        db: &PgPool,
        user_id: i64,
        course_id: i64,
        category: ExamCategory,
    ) -> Result<(i64, Vec<StudentAssessment>), AppError> {
        let instance_id = Self::enrolled_instance(db, user_id, course_id).await?;

        let sql = format!(
            r#"SELECT et.exam_type_id, et.exam_name, et.exam_period, et.description, et.total_items,
                      r.score::FLOAT8 AS score, r.completed_at
               FROM exam_types et
               LEFT JOIN {table} r
                 ON r.exam_type_id = et.exam_type_id AND r.user_id = $2 AND r.instance_id = $3
               WHERE et.category = $4
                 AND EXISTS (SELECT 1 FROM assessment_scopes sc
                             WHERE sc.exam_type_id = et.exam_type_id AND sc.course_id = $1)
               ORDER BY {period}, et.exam_name"#,
            table = results_table(category),
            period = ExamPeriod::order_sql("et.exam_period"),
        );

        let mut rows = sqlx::query_as::<_, StudentAssessment>(&sql)
            .bind(course_id)
            .bind(user_id)
            .bind(instance_id)
            .bind(category.as_str())
            .fetch_all(db)
            .await?;

        for row in &mut rows {
            row.is_taken = row.completed_at.is_some();
            row.instance_id = instance_id;
        }
        Ok((instance_id, rows))
    }

    async fn has_result(
        db: &PgPool,
        category: ExamCategory,
        user_id: i64,
        exam_type_id: i64,
        instance_id: i64,
    ) -> Result<bool, AppError> {
        let taken = sqlx::query_scalar::<_, bool>(&format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE user_id = $1 AND exam_type_id = $2 AND instance_id = $3)",
            results_table(category)
        ))
        .bind(user_id)
        .bind(exam_type_id)
        .bind(instance_id)
        .fetch_one(db)
        .await?;
        Ok(taken)
    }

    async fn assessment(
        db: &PgPool,
        category: ExamCategory,
        exam_type_id: i64,
    ) -> Result<ExamType, AppError> {
        ExamTypeService::find(db, exam_type_id)
            .await?
            .filter(|exam_type| ExamCategory::parse(&exam_type.category) == Some(category))
            .ok_or_else(|| AppError::missing(format!("{} not found", label(category))))
    }

    /// Draws a fresh question set for an untaken assessment. Correct answers
    /// are never part of the result.
    #[instrument(skip(db))]
    pub async fn questions(
        db: &PgPool,
        user_id: i64,
        category: ExamCategory,
        exam_type_id: i64,
        instance_id: i64,
    ) -> Result<(ExamType, Vec<StudentQuestion>), AppError> {
        let course_id = Self::enrolled_course(db, user_id, instance_id).await?;
        let exam_type = Self::assessment(db, category, exam_type_id).await?;

        if Self::has_result(db, category, user_id, exam_type_id, instance_id).await? {
            return Err(AppError::forbidden(format!("{} already taken", label(category))));
        }

        let pool = AssessmentPreviewService::question_pool(db, course_id, exam_type_id).await?;
        if pool.is_empty() {
            return Err(AppError::missing(format!(
                "No questions available for this {}",
                category.as_str()
            )));
        }

        let needed = exam_type.total_items.max(0) as usize;
        let picked = sample_in_course_order(&pool, needed, &mut rand::thread_rng());
        let questions = picked
            .into_iter()
            .enumerate()
            .map(|(i, item)| StudentQuestion {
                question_number: i + 1,
                item_id: item.item_id,
                question: item.question,
                options: QuestionOptions {
                    a: item.option_a,
                    b: item.option_b,
                    c: item.option_c,
                    d: item.option_d,
                },
            })
            .collect();

        Ok((exam_type, questions))
    }

    /// Grades and records an assessment attempt. Only items from the scoped
    /// modules score; the denominator is the assessment's `total_items`.
    #[instrument(skip(db, answers))]
    pub async fn submit_assessment(
        db: &PgPool,
        user_id: i64,
        category: ExamCategory,
        exam_type_id: i64,
        instance_id: i64,
        answers: &BTreeMap<String, String>,
        submission_reason: &str,
    ) -> Result<AssessmentResult, AppError> {
        let course_id = Self::enrolled_course(db, user_id, instance_id).await?;
        let exam_type = Self::assessment(db, category, exam_type_id).await?;
        let already = || AppError::forbidden(format!("{} already submitted", label(category)));

        if Self::has_result(db, category, user_id, exam_type_id, instance_id).await? {
            return Err(already());
        }

        let answer_key: Vec<(i64, String)> =
            AssessmentPreviewService::question_pool(db, course_id, exam_type_id)
                .await?
                .into_iter()
                .map(|item| (item.item_id, item.correct_answer))
                .collect();

        let total_items = exam_type.total_items;
        let correct = count_correct(&answer_key, answers).min(total_items.max(0));
        let score = assessment_score(correct, total_items);

        let inserted = sqlx::query_scalar::<_, i64>(&format!(
            r#"INSERT INTO {} (user_id, exam_type_id, instance_id, score, total_questions,
                                correct_answers, answers, submission_reason)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               ON CONFLICT (user_id, exam_type_id, instance_id) DO NOTHING
               RETURNING result_id"#,
            results_table(category)
        ))
        .bind(user_id)
        .bind(exam_type_id)
        .bind(instance_id)
        .bind(score)
        .bind(total_items)
        .bind(correct)
        .bind(Json(answers))
        .bind(submission_reason)
        .fetch_optional(db)
        .await?;

        if inserted.is_none() {
            return Err(already());
        }

        track_assessment_submitted(category.as_str());
        info!(user_id, exam_type_id, instance_id, score, "{} submitted", label(category));

        Ok(AssessmentResult {
            score,
            correct_answers: correct,
            total_questions: total_items,
            submission_reason: submission_reason.to_string(),
        })
    }

    #[instrument(skip(db))]
    pub async fn track_section(db: &PgPool, user_id: i64, section_id: i64) -> Result<(), AppError> {
        sqlx::query(
            r#"INSERT INTO student_progress (user_id, section_id, accessed_at, is_completed, completed_at)
               VALUES ($1, $2, NOW(), TRUE, NOW())
               ON CONFLICT (user_id, section_id) DO UPDATE
               SET accessed_at = NOW(),
                   is_completed = TRUE,
                   completed_at = COALESCE(student_progress.completed_at, NOW())"#,
        )
        .bind(user_id)
        .bind(section_id)
        .execute(db)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                return AppError::missing("Section not found");
            }
            AppError::from(e)
        })?;
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn module_progress(
        db: &PgPool,
        user_id: i64,
        module_id: i64,
    ) -> Result<ModuleProgressResponse, AppError> {
        let counts = sqlx::query_as::<_, ModuleCounts>(
            r#"SELECT
                   (SELECT COUNT(*) FROM module_sections WHERE module_id = $1) AS total_sections,
                   (SELECT COUNT(*) FROM student_progress sp
                      JOIN module_sections ms ON ms.section_id = sp.section_id
                     WHERE ms.module_id = $1 AND sp.user_id = $2 AND sp.is_completed) AS completed_sections,
                   (SELECT COUNT(*) FROM module_activities WHERE module_id = $1) AS total_activities,
                   (SELECT COUNT(*) FROM activity_submissions s
                      JOIN module_activities a ON a.activity_id = s.activity_id
                     WHERE a.module_id = $1 AND s.user_id = $2 AND s.status <> 'draft') AS submitted_activities"#,
        )
        .bind(module_id)
        .bind(user_id)
        .fetch_one(db)
        .await?;

        let done = counts.completed_sections + counts.submitted_activities;
        let total = counts.total_sections + counts.total_activities;
        Ok(ModuleProgressResponse {
            success: true,
            module_id,
            total_sections: counts.total_sections,
            completed_sections: counts.completed_sections,
            sections_percentage: round_to(
                percentage(counts.completed_sections, counts.total_sections),
                1,
            ),
            total_activities: counts.total_activities,
            submitted_activities: counts.submitted_activities,
            activities_percentage: round_to(
                percentage(counts.submitted_activities, counts.total_activities),
                1,
            ),
            overall_percentage: round_to(percentage(done, total), 1),
        })
    }

    async fn course_counts(
        db: &PgPool,
        user_id: i64,
        course_ids: &[i64],
        instance_ids: &[i64],
    ) -> Result<CourseCounts, AppError> {
        let counts = sqlx::query_as::<_, CourseCounts>(COURSE_COUNTS_SQL)
            .bind(course_ids)
            .bind(user_id)
            .bind(instance_ids)
            .fetch_one(db)
            .await?;
        Ok(counts)
    }

    #[instrument(skip(db))]
    pub async fn course_overview(
        db: &PgPool,
        user_id: i64,
        course_id: i64,
    ) -> Result<CourseOverviewResponse, AppError> {
        let instance_id = Self::enrolled_instance(db, user_id, course_id).await?;
        let counts = Self::course_counts(db, user_id, &[course_id], &[instance_id]).await?;

        Ok(CourseOverviewResponse {
            success: true,
            modules: Component::new(counts.completed_modules, counts.total_modules).ratio(),
            quizzes: counts.quizzes().ratio(),
            exams: counts.exams().ratio(),
            overall_grade: blended_grade(
                counts.quiz_score_sum,
                counts.total_quizzes,
                counts.exam_score_sum,
                counts.total_exams,
            ),
        })
    }

    #[instrument(skip(db))]
    pub async fn course_progress(
        db: &PgPool,
        user_id: i64,
        course_id: i64,
    ) -> Result<CourseProgressResponse, AppError> {
        let instance_id = Self::enrolled_instance(db, user_id, course_id).await?;
        let counts = Self::course_counts(db, user_id, &[course_id], &[instance_id]).await?;

        Ok(CourseProgressResponse {
            success: true,
            overall_progress: counts.overall_progress(),
            components: ProgressComponents {
                sections: component(counts.completed_sections, counts.total_sections),
                activities: component(counts.submitted_activities, counts.total_activities),
                quizzes: component(counts.completed_quizzes, counts.total_quizzes),
                exams: component(counts.completed_exams, counts.total_exams),
            },
        })
    }

    async fn assessment_grades(
        db: &PgPool,
        category: ExamCategory,
        user_id: i64,
        instance_id: i64,
    ) -> Result<Vec<AssessmentGrade>, AppError> {
        let grades = sqlx::query_as::<_, AssessmentGrade>(&format!(
            r#"SELECT et.exam_name, et.exam_period, r.score::FLOAT8 AS score, r.total_questions,
                      r.correct_answers, r.completed_at, r.submission_reason
               FROM {} r
               JOIN exam_types et ON et.exam_type_id = r.exam_type_id
               WHERE r.user_id = $1 AND r.instance_id = $2
               ORDER BY {}, r.completed_at"#,
            results_table(category),
            ExamPeriod::order_sql("et.exam_period"),
        ))
        .bind(user_id)
        .bind(instance_id)
        .fetch_all(db)
        .await?;
        Ok(grades)
    }

    #[instrument(skip(db))]
    pub async fn comprehensive_grades(
        db: &PgPool,
        user_id: i64,
        course_id: i64,
    ) -> Result<ComprehensiveGradesResponse, AppError> {
        let instance_id = Self::enrolled_instance(db, user_id, course_id).await?;
        let course = CourseService::find_course(db, course_id).await?;

        let activity_grades = sqlx::query_as::<_, ActivityGrade>(
            r#"SELECT a.title AS activity_title, m.position AS module_position,
                      a.position AS activity_position, a.activity_type,
                      s.grade::FLOAT8 AS grade, s.status, s.feedback, s.submitted_at
               FROM activity_submissions s
               JOIN module_activities a ON a.activity_id = s.activity_id
               JOIN modules_master m ON m.module_id = a.module_id
               WHERE s.user_id = $1 AND m.course_id = $2 AND s.status <> 'draft'
               ORDER BY m.position, a.position"#,
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_all(db)
        .await?;

        let quiz_grades = Self::assessment_grades(db, ExamCategory::Quiz, user_id, instance_id).await?;
        let exam_grades = Self::assessment_grades(db, ExamCategory::Exam, user_id, instance_id).await?;

        let activity_scores: Vec<f64> = activity_grades.iter().filter_map(|g| g.grade).collect();
        let quiz_scores: Vec<f64> = quiz_grades.iter().map(|g| g.score).collect();
        let exam_scores: Vec<f64> = exam_grades.iter().map(|g| g.score).collect();
        let assessment_scores: Vec<f64> = quiz_scores.iter().chain(&exam_scores).copied().collect();

        Ok(ComprehensiveGradesResponse {
            success: true,
            course_info: CourseInfo {
                course_code: course.course_code,
                course_title: course.course_title,
            },
            summary: GradeSummaries {
                activities: GradeSummary::new(activity_grades.len(), &activity_scores),
                quizzes: GradeSummary::new(quiz_grades.len(), &quiz_scores),
                exams: GradeSummary::new(exam_grades.len(), &exam_scores),
            },
            overall_grade: round_to(mean(&assessment_scores), 2),
            activity_grades,
            quiz_grades,
            exam_grades,
        })
    }

    /// Progress across every instance the caller is enrolled in that has not
    /// ended yet.
    #[instrument(skip(db))]
    pub async fn overall_progress(db: &PgPool, user_id: i64) -> Result<OverallProgressResponse, AppError> {
        let active: Vec<(i64, i64)> = sqlx::query_as(
            r#"SELECT ci.instance_id, ci.course_id
               FROM enrollments e
               JOIN course_instances ci ON ci.instance_id = e.instance_id
               WHERE e.user_id = $1 AND ci.end_date >= CURRENT_DATE"#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;

        if active.is_empty() {
            return Ok(OverallProgressResponse {
                success: true,
                overall_progress: 0.0,
                components: ComponentPercentages::default(),
                counts: ComponentRatios {
                    sections: Component::default().ratio(),
                    activities: Component::default().ratio(),
                    quizzes: Component::default().ratio(),
                    exams: Component::default().ratio(),
                },
                enrolled_courses: 0,
            });
        }

        let (instance_ids, mut course_ids): (Vec<i64>, Vec<i64>) = active.into_iter().unzip();
        course_ids.sort_unstable();
        course_ids.dedup();

        let counts = Self::course_counts(db, user_id, &course_ids, &instance_ids).await?;
        let pct = |c: Component| round_to(c.percentage(), 1);

        Ok(OverallProgressResponse {
            success: true,
            overall_progress: counts.overall_progress(),
            components: ComponentPercentages {
                sections: pct(counts.sections()),
                activities: pct(counts.activities()),
                quizzes: pct(counts.quizzes()),
                exams: pct(counts.exams()),
            },
            counts: ComponentRatios {
                sections: counts.sections().ratio(),
                activities: counts.activities().ratio(),
                quizzes: counts.quizzes().ratio(),
                exams: counts.exams().ratio(),
            },
            enrolled_courses: course_ids.len(),
        })
    }
}
