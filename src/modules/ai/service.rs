use std::collections::HashSet;

use sqlx::PgPool;
use sqlx::types::Json;
use tracing::{info, instrument};

use lms_core::AppError;
use lms_core::text::{module_shell_html, module_title_or_default, strip_html};

use crate::llm::LlmProvider;
use crate::llm::retry::first_valid;
use crate::modules::ai::model::{
    ActivityKind, ContentSource, Difficulty, GeneratedModule, GradeSuggestion,
};
use crate::modules::ai::prompts::{
    self, MIN_SECTION_CONTENT_CHARS, OutcomeContext, SectionContext,
};
use crate::modules::content::model::{Activity, ExamItem, ModuleRecord, Section};
use crate::modules::content::service::{ExamItemService, ModuleService, SectionService};
use crate::modules::courses::service::CourseService;

const ATTEMPTS_PER_PROMPT: usize = 3;
const GRADING_TEMPERATURE: f32 = 0.3;

/// Modules selected for outcome generation.
#[derive(Debug, Clone, Copy)]
pub enum OutcomeTarget {
    Module(i64),
    Course { course_id: i64, only_empty: bool },
}

/// Result of an outcome run: how many modules were written.
pub struct OutcomeRun {
    pub updated: usize,
    pub message: String,
}

#[derive(sqlx::FromRow)]
struct SectionWithContext {
    section_id: i64,
    module_id: i64,
    title: String,
    content: String,
    module_position: i32,
    content_html: Option<String>,
    course_title: String,
}

pub struct AiService;

impl AiService {
    #[instrument(skip(llm, course_description))]
    pub async fn suggest_count(
        llm: &dyn LlmProvider,
        course_title: &str,
        course_description: &str,
    ) -> (u32, ContentSource) {
        let cascade = vec![prompts::suggest_count_prompt(course_title, course_description)];
        match first_valid(llm, "suggest_count", &cascade, 1, &llm.default_options(), prompts::parse_module_count).await {
            Some(count) => (count, ContentSource::Ai),
            None => (prompts::DEFAULT_MODULE_COUNT, ContentSource::Fallback),
        }
    }

    /// Generates `count` modules for a course and stores them.
    ///
    /// With `override_existing` the course's modules are replaced. Otherwise
    /// the new ones are appended after the last existing position.
    #[instrument(skip(db, llm, course_title, course_description))]
    pub async fn generate_modules(
        db: &PgPool,
        llm: &dyn LlmProvider,
        course_id: i64,
        course_title: Option<&str>,
        course_description: Option<&str>,
        count: u32,
        override_existing: bool,
    ) -> Result<(Vec<GeneratedModule>, ContentSource), AppError> {
        let course = CourseService::find_course(db, course_id).await?;
        let title = course_title.unwrap_or(&course.course_title).to_string();
        let description = course_description
            .or(course.description.as_deref())
            .unwrap_or_default()
            .to_string();

        let existing = if override_existing {
            Vec::new()
        } else {
            ModuleService::for_course(db, course_id).await?
        };
        let summaries: Vec<(String, String)> = existing
            .iter()
            .map(|m| (m.title(), m.description()))
            .collect();

        let cascade = vec![
            prompts::modules_prompt(&title, &description, count, &summaries),
            prompts::modules_retry_prompt(&title, &description, count),
        ];
        let generated = first_valid(
            llm,
            "generate_modules",
            &cascade,
            ATTEMPTS_PER_PROMPT,
            &llm.default_options(),
            |text| prompts::parse_modules(text, count),
        )
        .await;

        let (modules, source) = match generated {
            Some(modules) => (modules, ContentSource::Ai),
            None => (prompts::fallback_modules(&title, count), ContentSource::Fallback),
        };

        let mut tx = db.begin().await?;
        if override_existing {
            sqlx::query("DELETE FROM modules_master WHERE course_id = $1")
                .bind(course_id)
                .execute(&mut *tx)
                .await?;
        }
        let start = existing.iter().map(|m| m.position).max().unwrap_or(0);

        for (offset, module) in (1..).zip(modules.iter()) {
            sqlx::query(
                "INSERT INTO modules_master (course_id, position, content_html) VALUES ($1, $2, $3)",
            )
            .bind(course_id)
            .bind(start + offset)
            .bind(module_shell_html(&module.title, &module.description))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        info!(course_id, count = modules.len(), ?source, "Modules generated");
        Ok((modules, source))
    }

    #[instrument(skip(llm, course_description, other_modules))]
    pub async fn regenerate_description(
        llm: &dyn LlmProvider,
        module_title: &str,
        course_title: &str,
        course_description: &str,
        other_modules: &[String],
    ) -> (String, ContentSource) {
        let cascade = vec![prompts::description_prompt(
            module_title,
            course_title,
            course_description,
            other_modules,
        )];
        let generated = first_valid(llm, "regenerate_description", &cascade, 1, &llm.default_options(), |text| {
            prompts::clean_description(text, module_title)
        })
        .await;

        match generated {
            Some(description) => (description, ContentSource::Ai),
            None => (
                prompts::fallback_description(module_title, course_title),
                ContentSource::Fallback,
            ),
        }
    }

    #[instrument(skip(db, llm))]
    pub async fn generate_outcomes(
        db: &PgPool,
        llm: &dyn LlmProvider,
        target: OutcomeTarget,
    ) -> Result<OutcomeRun, AppError> {
        let (course_id, targets, single) = match target {
            OutcomeTarget::Module(module_id) => {
                let module = ModuleService::find(db, module_id).await?;
                (module.course_id, vec![module], true)
            }
            OutcomeTarget::Course {
                course_id,
                only_empty,
            } => {
                let modules = ModuleService::for_course(db, course_id).await?;
                if modules.is_empty() {
                    return Err(AppError::missing("No modules found for this course"));
                }
                let targets: Vec<ModuleRecord> = modules
                    .into_iter()
                    .filter(|m| !only_empty || m.outcomes().is_empty())
                    .collect();
                if targets.is_empty() {
                    return Ok(OutcomeRun {
                        updated: 0,
                        message: "All modules already have learning outcomes".to_string(),
                    });
                }
                (course_id, targets, false)
            }
        };

        let course = CourseService::find_course(db, course_id).await?;
        let all_modules = ModuleService::for_course(db, course_id).await?;
        let course_description = course.description.clone().unwrap_or_default();

        for module in &targets {
            let title = module.title();
            let description = module.description();
            let others: Vec<String> = all_modules
                .iter()
                .filter(|m| m.module_id != module.module_id)
                .map(ModuleRecord::title)
                .collect();

            let ctx = OutcomeContext {
                course_title: &course.course_title,
                course_description: &course_description,
                module_title: &title,
                module_description: &description,
                other_modules: &others,
            };
            let cascade = vec![prompts::outcomes_prompt(&ctx)];
            let outcomes = first_valid(llm, "generate_outcomes", &cascade, 1, &llm.default_options(), prompts::parse_outcomes)
                .await
                .unwrap_or_else(|| prompts::fallback_outcomes(&title));

            sqlx::query("UPDATE modules_master SET learning_outcomes = $1 WHERE module_id = $2")
                .bind(Json(&outcomes))
                .bind(module.module_id)
                .execute(db)
                .await?;
        }

        let updated = targets.len();
        info!(course_id, updated, "Learning outcomes generated");

        let message = if single {
            "Learning outcomes regenerated for module".to_string()
        } else {
            format!("Learning outcomes generated for {} modules", updated)
        };
        Ok(OutcomeRun { updated, message })
    }

    /// Replaces a module's sections with generated titles.
    #[instrument(skip(db, llm))]
    pub async fn generate_sections(
        db: &PgPool,
        llm: &dyn LlmProvider,
        module_id: i64,
    ) -> Result<(Vec<Section>, ContentSource), AppError> {
        let module = ModuleService::find(db, module_id).await?;
        let course = CourseService::find_course(db, module.course_id).await?;
        let title = module.title();

        let cascade = prompts::section_prompts(&course.course_title, &title, &module.description());
        let (titles, source) =
            match first_valid(llm, "generate_sections", &cascade, 1, &llm.default_options(), prompts::parse_section_titles).await {
                Some(titles) => (titles, ContentSource::Ai),
                None => (prompts::fallback_section_titles(&title), ContentSource::Fallback),
            };

        let mut tx = db.begin().await?;
        sqlx::query("DELETE FROM module_sections WHERE module_id = $1")
            .bind(module_id)
            .execute(&mut *tx)
            .await?;
        for (position, section_title) in (1..).zip(titles.iter()) {
            sqlx::query(
                "INSERT INTO module_sections (module_id, position, title, content) VALUES ($1, $2, $3, '')",
            )
            .bind(module_id)
            .bind(position)
            .bind(section_title)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        info!(module_id, count = titles.len(), ?source, "Sections generated");
        Ok((SectionService::for_module(db, module_id).await?, source))
    }

    /// Writes generated HTML into a section and returns it.
    #[instrument(skip(db, llm))]
    pub async fn generate_section_content(
        db: &PgPool,
        llm: &dyn LlmProvider,
        section_id: i64,
    ) -> Result<(String, ContentSource), AppError> {
        let section = sqlx::query_as::<_, SectionWithContext>(
            r#"SELECT s.section_id, s.module_id, s.title, s.content,
                      m.position AS module_position, m.content_html, c.course_title
               FROM module_sections s
               JOIN modules_master m ON s.module_id = m.module_id
               JOIN courses_master c ON m.course_id = c.course_id
               WHERE s.section_id = $1"#,
        )
        .bind(section_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::missing("Section not found"))?;

        let others: Vec<String> = SectionService::for_module(db, section.module_id)
            .await?
            .into_iter()
            .filter(|s| s.section_id != section.section_id)
            .map(|s| s.title)
            .collect();
        let module_title =
            module_title_or_default(section.content_html.as_deref(), section.module_position);

        let ctx = SectionContext {
            course_title: &section.course_title,
            module_title: &module_title,
            section_title: &section.title,
            other_sections: &others,
        };
        let cascade = prompts::section_content_prompts(&ctx);
        let generated = first_valid(
            llm,
            "generate_section_content",
            &cascade,
            ATTEMPTS_PER_PROMPT,
            &llm.default_options(),
            prompts::clean_section_content,
        )
        .await;

        let (content, source) = match generated {
            Some(content) if content.chars().count() >= MIN_SECTION_CONTENT_CHARS => {
                (content, ContentSource::Ai)
            }
            Some(_) => (
                prompts::overview_section_content(&section.title),
                ContentSource::Fallback,
            ),
            None => (
                prompts::templated_section_content(&section.title, &section.course_title),
                ContentSource::Fallback,
            ),
        };

        if !section.content.is_empty() {
            info!(section_id, "Replacing existing section content");
        }
        SectionService::update_content(db, section_id, &content).await?;
        Ok((content, source))
    }

    /// Generates one activity for a module.
    ///
    /// `activity_id` regenerates that activity in place. Otherwise the new
    /// activity is appended, after removing the module's activities when
    /// `clear_existing` is set.
    #[instrument(skip(db, llm))]
    pub async fn generate_activity(
        db: &PgPool,
        llm: &dyn LlmProvider,
        module_id: i64,
        kind: ActivityKind,
        activity_id: Option<i64>,
        clear_existing: bool,
    ) -> Result<(Activity, ContentSource), AppError> {
        let module = ModuleService::find(db, module_id).await?;
        let course = CourseService::find_course(db, module.course_id).await?;
        let title = module.title();

        let cascade =
            prompts::activity_prompts(kind, &title, &course.course_title, &module.outcomes());
        let (generated, source) = match first_valid(
            llm,
            "generate_activity",
            &cascade,
            ATTEMPTS_PER_PROMPT,
            &llm.default_options(),
            |text| prompts::parse_activity(text, kind),
        )
        .await
        {
            Some(activity) => (activity, ContentSource::Ai),
            None => (
                prompts::fallback_activity(kind, &title, &course.course_title),
                ContentSource::Fallback,
            ),
        };

        let activity = match activity_id {
            Some(activity_id) => sqlx::query_as::<_, Activity>(
                r#"UPDATE module_activities
                   SET title = $1, instructions = $2, activity_type = $3
                   WHERE activity_id = $4
                   RETURNING activity_id, module_id, position, title, instructions, activity_type"#,
            )
            .bind(&generated.title)
            .bind(&generated.instructions)
            .bind(kind.as_str())
            .bind(activity_id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::missing("Activity not found"))?,
            None => {
                let mut tx = db.begin().await?;
                if clear_existing {
                    sqlx::query("DELETE FROM module_activities WHERE module_id = $1")
                        .bind(module_id)
                        .execute(&mut *tx)
                        .await?;
                }
                let activity = sqlx::query_as::<_, Activity>(
                    r#"INSERT INTO module_activities (module_id, position, title, instructions, activity_type)
                       SELECT $1, COALESCE(MAX(position), 0) + 1, $2, $3, $4
                       FROM module_activities WHERE module_id = $1
                       RETURNING activity_id, module_id, position, title, instructions, activity_type"#,
                )
                .bind(module_id)
                .bind(&generated.title)
                .bind(&generated.instructions)
                .bind(kind.as_str())
                .fetch_one(&mut *tx)
                .await?;
                tx.commit().await?;
                activity
            }
        };

        info!(module_id, activity_id = activity.activity_id, kind = kind.as_str(), ?source, "Activity generated");
        Ok((activity, source))
    }

    /// Generates multiple-choice items from a section's text.
    ///
    /// Questions already present in the section, or produced earlier in the
    /// same run, are skipped (case-insensitive).
    #[instrument(skip(db, llm))]
    pub async fn generate_exam_items(
        db: &PgPool,
        llm: &dyn LlmProvider,
        section_id: i64,
        difficulty: Difficulty,
    ) -> Result<(Vec<ExamItem>, ContentSource), AppError> {
        let section = SectionService::find(db, section_id).await?;
        let mut seen: HashSet<String> = ExamItemService::for_section(db, section_id)
            .await?
            .into_iter()
            .map(|item| item.question.to_lowercase())
            .collect();

        let plain = strip_html(&section.content);
        let mut generated = Vec::new();

        for chunk in prompts::content_chunks(&plain) {
            let cascade = prompts::exam_item_prompts(&section.title, &chunk, difficulty);
            let Some(items) = first_valid(
                llm,
                "generate_exam_items",
                &cascade,
                ATTEMPTS_PER_PROMPT,
                &llm.default_options(),
                prompts::parse_exam_items,
            )
            .await
            else {
                continue;
            };

            for item in items {
                if seen.insert(item.question.to_lowercase()) {
                    generated.push(item);
                }
            }
        }

        let (items, source) = if generated.is_empty() {
            (
                prompts::fallback_exam_items(difficulty, &section.title),
                ContentSource::Fallback,
            )
        } else {
            (generated, ContentSource::Ai)
        };

        let mut tx = db.begin().await?;
        let mut stored = Vec::with_capacity(items.len());
        for item in &items {
            let row = sqlx::query_as::<_, ExamItem>(
                r#"INSERT INTO exam_items
                       (section_id, question, option_a, option_b, option_c, option_d, correct_answer)
                   VALUES ($1, $2, $3, $4, $5, $6, $7)
                   RETURNING item_id, section_id, question, option_a, option_b, option_c, option_d,
                             correct_answer, created_at"#,
            )
            .bind(section_id)
            .bind(&item.question)
            .bind(&item.option_a)
            .bind(&item.option_b)
            .bind(&item.option_c)
            .bind(&item.option_d)
            .bind(&item.correct_answer)
            .fetch_one(&mut *tx)
            .await?;
            stored.push(row);
        }
        tx.commit().await?;

        info!(section_id, created = stored.len(), difficulty = difficulty.as_str(), ?source, "Exam items generated");
        Ok((stored, source))
    }

    /// Suggests a grade for a submission. Nothing is stored.
    #[instrument(skip(llm, instructions, submission))]
    pub async fn suggest_grade(
        llm: &dyn LlmProvider,
        submission_id: i64,
        instructions: &str,
        submission: &str,
    ) -> (GradeSuggestion, ContentSource) {
        let cascade = prompts::grading_prompts(&strip_html(instructions), submission);
        let options = llm.default_options().with_temperature(GRADING_TEMPERATURE);

        match first_valid(llm, "ai_grade", &cascade, ATTEMPTS_PER_PROMPT, &options, prompts::parse_grade).await {
            Some(suggestion) => (suggestion, ContentSource::Ai),
            None => (prompts::fallback_grade(), ContentSource::Fallback),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedLlm;

    #[tokio::test]
    async fn test_suggest_count_falls_back_to_default() {
        let llm = ScriptedLlm::new(["20"]);
        let (count, source) = AiService::suggest_count(&llm, "Rust", "Systems").await;
        assert_eq!(count, prompts::DEFAULT_MODULE_COUNT);
        assert_eq!(source, ContentSource::Fallback);

        let llm = ScriptedLlm::new(["8"]);
        assert_eq!(AiService::suggest_count(&llm, "Rust", "Systems").await, (8, ContentSource::Ai));
    }

    #[tokio::test]
    async fn test_regenerate_uses_fallback_for_short_output() {
        let llm = ScriptedLlm::new(["Ok."]);
        let (description, source) =
            AiService::regenerate_description(&llm, "Traits", "Rust", "", &[]).await;
        assert_eq!(source, ContentSource::Fallback);
        assert!(description.contains("Traits"));
    }

    #[tokio::test]
    async fn test_suggest_grade_retries_then_accepts() {
        let llm = ScriptedLlm::new([
            "no json here",
            r#"{"grade": 140, "feedback": "too high"}"#,
            r#"{"grade": 82, "feedback": "I noticed solid reasoning.", "ai_detected": false}"#,
        ]);
        let (suggestion, source) =
            AiService::suggest_grade(&llm, 1, "<p>Write an essay</p>", "My essay").await;
        assert_eq!(source, ContentSource::Ai);
        assert_eq!(suggestion.grade, 82.0);
        assert!(llm.prompts()[0].contains("ASSIGNMENT: Write an essay"));
    }

    #[tokio::test]
    async fn test_suggest_grade_fallback_after_nine_attempts() {
        let llm = ScriptedLlm::unavailable();
        let (suggestion, source) = AiService::suggest_grade(&llm, 1, "Task", "Answer").await;
        assert_eq!(source, ContentSource::Fallback);
        assert_eq!(suggestion.grade, prompts::FALLBACK_GRADE);
        assert_eq!(llm.prompts().len(), 9);
    }
}
