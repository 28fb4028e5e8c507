use std::collections::HashMap;

use sqlx::PgPool;
use tracing::{info, instrument};

use lms_core::AppError;
use lms_core::text::{default_module_html, module_title_or_default, rewrite_module_html};

use crate::modules::content::aiken::AikenModule;
use crate::modules::content::model::{
    Activity, CourseWithModuleCount, Direction, ExamItem, ItemContent, ModuleRecord, ModuleView,
    Section,
};
use crate::modules::courses::model::SearchQuery;
use crate::utils::db::is_foreign_key_violation;

/// Export row: the module an item belongs to plus the item itself.
#[derive(sqlx::FromRow)]
struct AikenRow {
    module_id: i64,
    module_position: i32,
    content_html: Option<String>,
    question: String,
    option_a: String,
    option_b: String,
    option_c: String,
    option_d: String,
    correct_answer: String,
}

impl AikenRow {
    fn item(self) -> ItemContent {
        ItemContent {
            question: self.question,
            option_a: self.option_a,
            option_b: self.option_b,
            option_c: self.option_c,
            option_d: self.option_d,
            correct_answer: self.correct_answer,
        }
    }
}

pub struct ModuleService;

impl ModuleService {
    #[instrument(skip(db))]
    pub async fn courses(
        db: &PgPool,
        query: &SearchQuery,
    ) -> Result<Vec<CourseWithModuleCount>, AppError> {
        let courses = sqlx::query_as::<_, CourseWithModuleCount>(
            r#"SELECT c.course_id, c.course_code, c.course_title, c.description,
                      COUNT(m.module_id) AS module_count
               FROM courses_master c
               LEFT JOIN modules_master m ON c.course_id = m.course_id
               WHERE $1::TEXT IS NULL OR c.course_code ILIKE $1 OR c.course_title ILIKE $1
               GROUP BY c.course_id, c.course_code, c.course_title, c.description
               ORDER BY c.course_code"#,
        )
        .bind(query.pattern())
        .fetch_all(db)
        .await?;
        Ok(courses)
    }

    /// Stores a non-blank course description.
    #[instrument(skip(db, description))]
    pub async fn save_description(
        db: &PgPool,
        course_id: i64,
        description: &str,
    ) -> Result<(), AppError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(AppError::invalid("Description cannot be empty"));
        }

        let result = sqlx::query("UPDATE courses_master SET description = $1 WHERE course_id = $2")
            .bind(description)
            .bind(course_id)
            .execute(db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::missing("Course not found"));
        }
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn find(db: &PgPool, module_id: i64) -> Result<ModuleRecord, AppError> {
        sqlx::query_as::<_, ModuleRecord>(
            "SELECT module_id, course_id, position, content_html, learning_outcomes FROM modules_master WHERE module_id = $1",
        )
        .bind(module_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::missing("Module not found"))
    }

    #[instrument(skip(db))]
    pub async fn for_course(db: &PgPool, course_id: i64) -> Result<Vec<ModuleRecord>, AppError> {
        let modules = sqlx::query_as::<_, ModuleRecord>(
            r#"SELECT module_id, course_id, position, content_html, learning_outcomes
               FROM modules_master
               WHERE course_id = $1
               ORDER BY position"#,
        )
        .bind(course_id)
        .fetch_all(db)
        .await?;
        Ok(modules)
    }

    /// Modules of a course with their sections attached.
    #[instrument(skip(db))]
    pub async fn views(db: &PgPool, course_id: i64) -> Result<Vec<ModuleView>, AppError> {
        let modules = Self::for_course(db, course_id).await?;
        let module_ids: Vec<i64> = modules.iter().map(|m| m.module_id).collect();

        let sections = sqlx::query_as::<_, Section>(
            r#"SELECT section_id, module_id, position, title, content, updated_at
               FROM module_sections
               WHERE module_id = ANY($1)
               ORDER BY module_id, position"#,
        )
        .bind(&module_ids)
        .fetch_all(db)
        .await?;

        let mut by_module: HashMap<i64, Vec<Section>> = HashMap::new();
        for section in sections {
            by_module.entry(section.module_id).or_default().push(section);
        }

        Ok(modules
            .into_iter()
            .map(|m| {
                let sections = by_module.remove(&m.module_id).unwrap_or_default();
                ModuleView::new(m, sections)
            })
            .collect())
    }

    #[instrument(skip(db, title, description))]
    pub async fn update(
        db: &PgPool,
        module_id: i64,
        title: &str,
        description: &str,
    ) -> Result<(), AppError> {
        let module = Self::find(db, module_id).await?;
        let html = rewrite_module_html(
            module.content_html.as_deref().unwrap_or_default(),
            title,
            description,
        );

        sqlx::query("UPDATE modules_master SET content_html = $1 WHERE module_id = $2")
            .bind(html)
            .bind(module_id)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Deletes a module and shifts the later modules of its course down.
    #[instrument(skip(db))]
    pub async fn delete(db: &PgPool, module_id: i64) -> Result<(), AppError> {
        let mut tx = db.begin().await?;

        let deleted = sqlx::query_as::<_, (i64, i32)>(
            "DELETE FROM modules_master WHERE module_id = $1 RETURNING course_id, position",
        )
        .bind(module_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some((course_id, position)) = deleted else {
            return Err(AppError::missing("Module not found"));
        };

        sqlx::query(
            "UPDATE modules_master SET position = position - 1 WHERE course_id = $1 AND position > $2",
        )
        .bind(course_id)
        .bind(position)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Swaps a module with its neighbour in the given direction.
    ///
    /// Every module of the course is locked in id order first, so concurrent
    /// moves within one course run one after another.
    #[instrument(skip(db))]
    pub async fn reorder(db: &PgPool, module_id: i64, direction: Direction) -> Result<(), AppError> {
        let course_id = Self::find(db, module_id).await?.course_id;

        let mut tx = db.begin().await?;
        let positions = sqlx::query_as::<_, (i64, i32)>(
            "SELECT module_id, position FROM modules_master WHERE course_id = $1 ORDER BY module_id FOR UPDATE",
        )
        .bind(course_id)
        .fetch_all(&mut *tx)
        .await?;

        let position = positions
            .iter()
            .find(|(id, _)| *id == module_id)
            .map(|(_, position)| *position)
            .ok_or_else(|| AppError::missing("Module not found"))?;
        let target = direction.target(position);
        let neighbour = positions
            .iter()
            .find(|(_, p)| *p == target)
            .map(|(id, _)| *id)
            .ok_or_else(|| AppError::invalid("Cannot move module further in this direction"))?;

        sqlx::query("UPDATE modules_master SET position = $1 WHERE module_id = $2")
            .bind(position)
            .bind(neighbour)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE modules_master SET position = $1 WHERE module_id = $2")
            .bind(target)
            .bind(module_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!(module_id, from = position, to = target, "Module moved");
        Ok(())
    }

    /// Opens a slot after `after_position` and fills it with a placeholder module.
    #[instrument(skip(db))]
    pub async fn insert(db: &PgPool, course_id: i64, after_position: i32) -> Result<(i64, i32), AppError> {
        let after_position = after_position.max(0);
        let position = after_position + 1;
        let mut tx = db.begin().await?;

        sqlx::query(
            "UPDATE modules_master SET position = position + 1 WHERE course_id = $1 AND position > $2",
        )
        .bind(course_id)
        .bind(after_position)
        .execute(&mut *tx)
        .await?;

        let module_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO modules_master (course_id, position, content_html) VALUES ($1, $2, $3) RETURNING module_id",
        )
        .bind(course_id)
        .bind(position)
        .bind(default_module_html(position))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                return AppError::missing("Course not found");
            }
            AppError::from(e)
        })?;

        tx.commit().await?;
        Ok((module_id, position))
    }

    /// `(course_code, position, items)` for a single-module export.
    #[instrument(skip(db))]
    pub async fn aiken_module(
        db: &PgPool,
        module_id: i64,
    ) -> Result<(String, i32, Vec<ItemContent>), AppError> {
        let (course_code, position) = sqlx::query_as::<_, (String, i32)>(
            r#"SELECT c.course_code, m.position
               FROM modules_master m
               JOIN courses_master c ON m.course_id = c.course_id
               WHERE m.module_id = $1"#,
        )
        .bind(module_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::missing("Module not found"))?;

        let items = sqlx::query_as::<_, AikenRow>(
            r#"SELECT m.module_id, m.position AS module_position, m.content_html,
                      e.question, e.option_a, e.option_b, e.option_c, e.option_d, e.correct_answer
               FROM modules_master m
               JOIN module_sections s ON m.module_id = s.module_id
               JOIN exam_items e ON s.section_id = e.section_id
               WHERE m.module_id = $1
               ORDER BY s.position, e.item_id"#,
        )
        .bind(module_id)
        .fetch_all(db)
        .await?
        .into_iter()
        .map(AikenRow::item)
        .collect();

        Ok((course_code, position, items))
    }

    /// `(course_code, modules)` for a whole-course export.
    #[instrument(skip(db))]
    pub async fn aiken_course(
        db: &PgPool,
        course_id: i64,
    ) -> Result<(String, Vec<AikenModule>), AppError> {
        let course_code = sqlx::query_scalar::<_, String>(
            "SELECT course_code FROM courses_master WHERE course_id = $1",
        )
        .bind(course_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::missing("Course not found"))?;

        let rows = sqlx::query_as::<_, AikenRow>(
            r#"SELECT m.module_id, m.position AS module_position, m.content_html,
                      e.question, e.option_a, e.option_b, e.option_c, e.option_d, e.correct_answer
               FROM modules_master m
               JOIN module_sections s ON m.module_id = s.module_id
               JOIN exam_items e ON s.section_id = e.section_id
               WHERE m.course_id = $1
               ORDER BY m.position, s.position, e.item_id"#,
        )
        .bind(course_id)
        .fetch_all(db)
        .await?;

        let mut modules: Vec<(i64, AikenModule)> = Vec::new();
        for row in rows {
            let starts_module = modules.last().is_none_or(|(id, _)| *id != row.module_id);
            if starts_module {
                let module = AikenModule {
                    position: row.module_position,
                    title: module_title_or_default(row.content_html.as_deref(), row.module_position),
                    items: Vec::new(),
                };
                modules.push((row.module_id, module));
            }
            if let Some((_, module)) = modules.last_mut() {
                module.items.push(row.item());
            }
        }

        Ok((course_code, modules.into_iter().map(|(_, m)| m).collect()))
    }
}

pub struct SectionService;

impl SectionService {
    #[instrument(skip(db))]
    pub async fn for_module(db: &PgPool, module_id: i64) -> Result<Vec<Section>, AppError> {
        let sections = sqlx::query_as::<_, Section>(
            r#"SELECT section_id, module_id, position, title, content, updated_at
               FROM module_sections
               WHERE module_id = $1
               ORDER BY position"#,
        )
        .bind(module_id)
        .fetch_all(db)
        .await?;
        Ok(sections)
    }

    #[instrument(skip(db))]
    pub async fn find(db: &PgPool, section_id: i64) -> Result<Section, AppError> {
        sqlx::query_as::<_, Section>(
            "SELECT section_id, module_id, position, title, content, updated_at FROM module_sections WHERE section_id = $1",
        )
        .bind(section_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::missing("Section not found"))
    }

    #[instrument(skip(db, content))]
    pub async fn update_full(
        db: &PgPool,
        section_id: i64,
        title: &str,
        content: &str,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE module_sections SET title = $1, content = $2, updated_at = NOW() WHERE section_id = $3",
        )
        .bind(title)
        .bind(content)
        .bind(section_id)
        .execute(db)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::missing("Section not found"));
        }
        Ok(())
    }

    #[instrument(skip(db, content))]
    pub async fn update_content(db: &PgPool, section_id: i64, content: &str) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE module_sections SET content = $1, updated_at = NOW() WHERE section_id = $2",
        )
        .bind(content)
        .bind(section_id)
        .execute(db)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::missing("Section not found"));
        }
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn insert(db: &PgPool, module_id: i64, after_position: i32) -> Result<(i64, i32), AppError> {
        ModuleService::find(db, module_id).await?;

        let after_position = after_position.max(0);
        let position = after_position + 1;
        let mut tx = db.begin().await?;

        sqlx::query(
            "UPDATE module_sections SET position = position + 1 WHERE module_id = $1 AND position > $2",
        )
        .bind(module_id)
        .bind(after_position)
        .execute(&mut *tx)
        .await?;

        let section_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO module_sections (module_id, position, title, content) VALUES ($1, $2, $3, '') RETURNING section_id",
        )
        .bind(module_id)
        .bind(position)
        .bind(format!("New Section {}", position))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((section_id, position))
    }

    #[instrument(skip(db))]
    pub async fn delete(db: &PgPool, section_id: i64) -> Result<(), AppError> {
        let mut tx = db.begin().await?;

        let deleted = sqlx::query_as::<_, (i64, i32)>(
            "DELETE FROM module_sections WHERE section_id = $1 RETURNING module_id, position",
        )
        .bind(section_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some((module_id, position)) = deleted else {
            return Err(AppError::missing("Section not found"));
        };

        sqlx::query(
            "UPDATE module_sections SET position = position - 1 WHERE module_id = $1 AND position > $2",
        )
        .bind(module_id)
        .bind(position)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

pub struct ActivityService;

impl ActivityService {
    #[instrument(skip(db))]
    pub async fn for_module(db: &PgPool, module_id: i64) -> Result<Vec<Activity>, AppError> {
        let activities = sqlx::query_as::<_, Activity>(
            r#"SELECT activity_id, module_id, position, title, instructions, activity_type
               FROM module_activities
               WHERE module_id = $1
               ORDER BY position"#,
        )
        .bind(module_id)
        .fetch_all(db)
        .await?;
        Ok(activities)
    }

    #[instrument(skip(db, instructions))]
    pub async fn update(
        db: &PgPool,
        activity_id: i64,
        title: &str,
        instructions: &str,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE module_activities SET title = $1, instructions = $2 WHERE activity_id = $3",
        )
        .bind(title)
        .bind(instructions)
        .bind(activity_id)
        .execute(db)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::missing("Activity not found"));
        }
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn delete(db: &PgPool, activity_id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM module_activities WHERE activity_id = $1")
            .bind(activity_id)
            .execute(db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::missing("Activity not found"));
        }
        Ok(())
    }
}

pub struct ExamItemService;

impl ExamItemService {
    #[instrument(skip(db))]
    pub async fn for_section(db: &PgPool, section_id: i64) -> Result<Vec<ExamItem>, AppError> {
        let items = sqlx::query_as::<_, ExamItem>(
            r#"SELECT item_id, section_id, question, option_a, option_b, option_c, option_d,
                      correct_answer, created_at
               FROM exam_items
               WHERE section_id = $1
               ORDER BY created_at, item_id"#,
        )
        .bind(section_id)
        .fetch_all(db)
        .await?;
        Ok(items)
    }

    #[instrument(skip(db, item))]
    pub async fn create(db: &PgPool, section_id: i64, item: &ItemContent) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>(
            r#"INSERT INTO exam_items
                   (section_id, question, option_a, option_b, option_c, option_d, correct_answer)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING item_id"#,
        )
        .bind(section_id)
        .bind(&item.question)
        .bind(&item.option_a)
        .bind(&item.option_b)
        .bind(&item.option_c)
        .bind(&item.option_d)
        .bind(&item.correct_answer)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                return AppError::missing("Section not found");
            }
            AppError::from(e)
        })
    }

    #[instrument(skip(db, item))]
    pub async fn update(db: &PgPool, item_id: i64, item: &ItemContent) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"UPDATE exam_items
               SET question = $1, option_a = $2, option_b = $3, option_c = $4, option_d = $5,
                   correct_answer = $6
               WHERE item_id = $7"#,
        )
        .bind(&item.question)
        .bind(&item.option_a)
        .bind(&item.option_b)
        .bind(&item.option_c)
        .bind(&item.option_d)
        .bind(&item.correct_answer)
        .bind(item_id)
        .execute(db)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::missing("Exam item not found"));
        }
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn delete(db: &PgPool, item_id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM exam_items WHERE item_id = $1")
            .bind(item_id)
            .execute(db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::missing("Exam item not found"));
        }
        Ok(())
    }
}
