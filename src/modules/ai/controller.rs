use axum::{Json, extract::State};
use tracing::instrument;

use lms_core::AppError;

use crate::middleware::current_user::CurrentUser;
use crate::modules::ai::model::{
    ActivityKind, AiGradeDto, AiGradeResponse, ContentSource, Difficulty, GenerateActivityDto,
    GenerateActivityResponse, GenerateExamItemsDto, GenerateExamItemsResponse,
    GenerateModulesDto, GenerateModulesResponse, GenerateOutcomesDto, GenerateOutcomesResponse,
    GenerateSectionsDto, GenerateSectionsResponse, RegenerateDto, RegenerateResponse,
    SectionContentDto, SectionContentResponse, SuggestCountDto, SuggestCountResponse,
};
use crate::modules::ai::prompts::DEFAULT_MODULE_COUNT;
use crate::modules::ai::service::{AiService, OutcomeTarget};
use crate::state::AppState;

const MAX_GENERATED_MODULES: u32 = 20;

fn text(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[instrument(skip(state, _caller, dto))]
pub async fn suggest_count(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Json(dto): Json<SuggestCountDto>,
) -> Result<Json<SuggestCountResponse>, AppError> {
    let title = text(&dto.course_title).ok_or_else(|| AppError::invalid("Course title is required"))?;
    let (count, source) = AiService::suggest_count(
        state.llm.as_ref(),
        title,
        text(&dto.course_description).unwrap_or_default(),
    )
    .await;

    let message = match source {
        ContentSource::Ai => format!("Suggested {} modules for the course", count),
        ContentSource::Fallback => "Using default module count".to_string(),
    };
    Ok(Json(SuggestCountResponse {
        success: true,
        message,
        suggested_count: count,
    }))
}

#[instrument(skip(state, _caller, dto))]
pub async fn generate_modules(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Json(dto): Json<GenerateModulesDto>,
) -> Result<Json<GenerateModulesResponse>, AppError> {
    let course_id = dto
        .course_id
        .ok_or_else(|| AppError::invalid("Course ID required"))?;
    let count = dto.module_count.unwrap_or(DEFAULT_MODULE_COUNT);
    if !(1..=MAX_GENERATED_MODULES).contains(&count) {
        return Err(AppError::invalid(format!(
            "module_count must be between 1 and {}",
            MAX_GENERATED_MODULES
        )));
    }
    let override_existing = dto.override_existing.unwrap_or(true);

    let (modules, source) = AiService::generate_modules(
        &state.db,
        state.llm.as_ref(),
        course_id,
        text(&dto.course_title),
        text(&dto.course_description),
        count,
        override_existing,
    )
    .await?;

    let verb = if override_existing {
        "overridden with"
    } else {
        "added"
    };
    Ok(Json(GenerateModulesResponse {
        success: true,
        message: format!("Successfully {} {} new modules", verb, modules.len()),
        modules,
        source,
    }))
}

#[instrument(skip(state, _caller, dto))]
pub async fn regenerate_description(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Json(dto): Json<RegenerateDto>,
) -> Result<Json<RegenerateResponse>, AppError> {
    let module_title =
        text(&dto.module_title).ok_or_else(|| AppError::invalid("Module title is required"))?;
    let (description, _) = AiService::regenerate_description(
        state.llm.as_ref(),
        module_title,
        text(&dto.course_title).unwrap_or_default(),
        text(&dto.course_description).unwrap_or_default(),
        &dto.existing_modules,
    )
    .await;

    Ok(Json(RegenerateResponse {
        success: true,
        description,
    }))
}

#[instrument(skip(state, _caller))]
pub async fn generate_outcomes(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Json(dto): Json<GenerateOutcomesDto>,
) -> Result<Json<GenerateOutcomesResponse>, AppError> {
    let target = match (dto.module_id, dto.course_id) {
        (Some(module_id), _) => OutcomeTarget::Module(module_id),
        (None, Some(course_id)) => OutcomeTarget::Course {
            course_id,
            only_empty: dto.only_empty.unwrap_or(false),
        },
        (None, None) => return Err(AppError::invalid("Course ID or Module ID is required")),
    };

    let run = AiService::generate_outcomes(&state.db, state.llm.as_ref(), target).await?;
    Ok(Json(GenerateOutcomesResponse {
        success: true,
        message: run.message,
        updated: run.updated,
    }))
}

#[instrument(skip(state, _caller))]
pub async fn generate_sections(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Json(dto): Json<GenerateSectionsDto>,
) -> Result<Json<GenerateSectionsResponse>, AppError> {
    let module_id = dto
        .module_id
        .ok_or_else(|| AppError::invalid("Module ID is required"))?;
    let (sections, source) =
        AiService::generate_sections(&state.db, state.llm.as_ref(), module_id).await?;

    Ok(Json(GenerateSectionsResponse {
        success: true,
        message: format!("Generated {} sections", sections.len()),
        sections,
        source,
    }))
}

#[instrument(skip(state, _caller))]
pub async fn generate_section_content(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Json(dto): Json<SectionContentDto>,
) -> Result<Json<SectionContentResponse>, AppError> {
    let section_id = dto
        .section_id
        .ok_or_else(|| AppError::invalid("Section ID is required"))?;
    let (content, source) =
        AiService::generate_section_content(&state.db, state.llm.as_ref(), section_id).await?;

    Ok(Json(SectionContentResponse {
        success: true,
        content,
        source,
    }))
}

#[instrument(skip(state, _caller))]
pub async fn generate_activity(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Json(dto): Json<GenerateActivityDto>,
) -> Result<Json<GenerateActivityResponse>, AppError> {
    let module_id = dto
        .module_id
        .ok_or_else(|| AppError::invalid("Module ID is required"))?;
    let kind = ActivityKind::parse(dto.activity_type.as_deref())?;

    let (activity, source) = AiService::generate_activity(
        &state.db,
        state.llm.as_ref(),
        module_id,
        kind,
        dto.activity_id,
        dto.clear_existing.unwrap_or(false),
    )
    .await?;

    let message = if dto.activity_id.is_some() {
        "Activity regenerated successfully"
    } else {
        "Activity generated successfully"
    };
    Ok(Json(GenerateActivityResponse {
        success: true,
        message: message.to_string(),
        activity,
        source,
    }))
}

#[instrument(skip(state, _caller))]
pub async fn generate_exam_items(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Json(dto): Json<GenerateExamItemsDto>,
) -> Result<Json<GenerateExamItemsResponse>, AppError> {
    let section_id = dto
        .section_id
        .ok_or_else(|| AppError::invalid("Section ID is required"))?;
    let difficulty = Difficulty::parse(dto.difficulty.as_deref())?;

    let (items, source) =
        AiService::generate_exam_items(&state.db, state.llm.as_ref(), section_id, difficulty)
            .await?;

    Ok(Json(GenerateExamItemsResponse {
        success: true,
        created: items.len(),
        items,
        source,
    }))
}

#[instrument(skip(state, _caller, dto))]
pub async fn ai_grade(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Json(dto): Json<AiGradeDto>,
) -> Result<Json<AiGradeResponse>, AppError> {
    let (Some(submission_id), Some(instructions), Some(content)) = (
        dto.submission_id,
        text(&dto.activity_instructions),
        text(&dto.submission_content),
    ) else {
        return Err(AppError::invalid("Missing required data for AI grading"));
    };

    let (suggestion, source) =
        AiService::suggest_grade(state.llm.as_ref(), submission_id, instructions, content).await;

    Ok(Json(AiGradeResponse {
        success: true,
        suggestion,
        source,
    }))
}
