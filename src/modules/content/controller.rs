use axum::{
    Json,
    extract::{Path, Query, State},
    response::Response,
};
use tracing::instrument;

use lms_core::AppError;

use crate::middleware::current_user::CurrentUser;
use crate::modules::content::aiken::{course_filename, module_filename, render_course, render_module};
use crate::modules::content::model::{
    ActivitiesResponse, ContentCoursesResponse, CourseDetailsResponse, CourseIdQuery,
    CreatedExamItem, ExamItemDto, ExamItemsResponse, InsertModuleDto, InsertSectionDto,
    InsertedModule, InsertedSection, ItemContent, ModuleIdQuery, ModulesResponse,
    ReorderModuleDto, SaveDescriptionDto, SectionIdQuery, SectionsResponse, UpdateActivityDto,
    UpdateModuleDto, UpdateSectionDto, UpdateSectionFullDto,
};
use crate::modules::content::service::{
    ActivityService, ExamItemService, ModuleService, SectionService,
};
use crate::modules::courses::model::SearchQuery;
use crate::modules::courses::service::CourseService;
use crate::state::AppState;
use crate::utils::csv::attachment;
use crate::utils::response::MessageResponse;

fn required(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[instrument(skip(state, _caller))]
pub async fn list_courses(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ContentCoursesResponse>, AppError> {
    let courses = ModuleService::courses(&state.db, &query).await?;
    Ok(Json(ContentCoursesResponse {
        success: true,
        courses,
    }))
}

#[instrument(skip(state, _caller))]
pub async fn course_details(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Path(course_id): Path<i64>,
) -> Result<Json<CourseDetailsResponse>, AppError> {
    let course = CourseService::find_course(&state.db, course_id).await?;
    Ok(Json(CourseDetailsResponse {
        success: true,
        course,
    }))
}

#[instrument(skip(state, _caller, dto))]
pub async fn save_description(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Json(dto): Json<SaveDescriptionDto>,
) -> Result<Json<MessageResponse>, AppError> {
    let course_id = dto
        .course_id
        .ok_or_else(|| AppError::invalid("Missing course_id"))?;
    ModuleService::save_description(&state.db, course_id, dto.description.as_deref().unwrap_or_default())
        .await?;
    Ok(Json(MessageResponse::ok("Course description updated successfully")))
}

#[instrument(skip(state, _caller))]
pub async fn list_modules(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Query(query): Query<CourseIdQuery>,
) -> Result<Json<ModulesResponse>, AppError> {
    let course_id = query
        .course_id
        .ok_or_else(|| AppError::invalid("course_id is required"))?;
    let modules = ModuleService::views(&state.db, course_id).await?;
    Ok(Json(ModulesResponse {
        success: true,
        modules,
    }))
}

/// Rewrite a module's title and description inside its HTML
#[instrument(skip(state, _caller, dto))]
pub async fn update_module(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Json(dto): Json<UpdateModuleDto>,
) -> Result<Json<MessageResponse>, AppError> {
    let module_id = dto
        .module_id
        .ok_or_else(|| AppError::invalid("module_id is required"))?;
    let title = required(dto.title.as_deref())
        .ok_or_else(|| AppError::invalid("Title is required"))?;
    ModuleService::update(
        &state.db,
        module_id,
        title,
        dto.description.as_deref().unwrap_or_default().trim(),
    )
    .await?;
    Ok(Json(MessageResponse::ok("Module updated successfully")))
}

#[instrument(skip(state, _caller))]
pub async fn delete_module(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Path(module_id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    ModuleService::delete(&state.db, module_id).await?;
    Ok(Json(MessageResponse::ok("Module deleted successfully")))
}

#[instrument(skip(state, _caller))]
pub async fn reorder_module(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Json(dto): Json<ReorderModuleDto>,
) -> Result<Json<MessageResponse>, AppError> {
    let (Some(module_id), Some(direction)) = (dto.module_id, dto.direction) else {
        return Err(AppError::invalid("module_id and direction are required"));
    };
    ModuleService::reorder(&state.db, module_id, direction).await?;
    Ok(Json(MessageResponse::ok(format!(
        "Module moved {} successfully",
        direction.as_str()
    ))))
}

#[instrument(skip(state, _caller))]
pub async fn insert_module(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Json(dto): Json<InsertModuleDto>,
) -> Result<Json<InsertedModule>, AppError> {
    let course_id = dto
        .course_id
        .ok_or_else(|| AppError::invalid("Course ID required"))?;
    let (module_id, position) =
        ModuleService::insert(&state.db, course_id, dto.after_position).await?;
    Ok(Json(InsertedModule {
        success: true,
        message: "Module inserted successfully".to_string(),
        module_id,
        position,
    }))
}

#[instrument(skip(state, _caller))]
pub async fn list_sections(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Query(query): Query<ModuleIdQuery>,
) -> Result<Json<SectionsResponse>, AppError> {
    let module_id = query
        .module_id
        .ok_or_else(|| AppError::invalid("Module ID required"))?;
    let sections = SectionService::for_module(&state.db, module_id).await?;
    Ok(Json(SectionsResponse {
        success: true,
        message: format!("Retrieved {} sections", sections.len()),
        sections,
    }))
}

#[instrument(skip(state, _caller, dto))]
pub async fn update_section_full(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Json(dto): Json<UpdateSectionFullDto>,
) -> Result<Json<MessageResponse>, AppError> {
    let (Some(section_id), Some(title)) = (dto.id, required(dto.title.as_deref())) else {
        return Err(AppError::invalid("Section ID and title required"));
    };
    SectionService::update_full(
        &state.db,
        section_id,
        title,
        dto.content.as_deref().unwrap_or_default(),
    )
    .await?;
    Ok(Json(MessageResponse::ok("Section updated successfully")))
}

#[instrument(skip(state, _caller, dto))]
pub async fn update_section(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Json(dto): Json<UpdateSectionDto>,
) -> Result<Json<MessageResponse>, AppError> {
    let (Some(section_id), Some(content)) = (dto.section_id, dto.content.as_deref()) else {
        return Err(AppError::invalid("Section ID and content required"));
    };
    SectionService::update_content(&state.db, section_id, content).await?;
    Ok(Json(MessageResponse::ok("Section updated successfully")))
}

#[instrument(skip(state, _caller))]
pub async fn insert_section(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Json(dto): Json<InsertSectionDto>,
) -> Result<Json<InsertedSection>, AppError> {
    let module_id = dto
        .module_id
        .ok_or_else(|| AppError::invalid("Module ID required"))?;
    let (section_id, position) =
        SectionService::insert(&state.db, module_id, dto.after_position).await?;
    Ok(Json(InsertedSection {
        success: true,
        message: "Section inserted successfully".to_string(),
        section_id,
        position,
    }))
}

#[instrument(skip(state, _caller))]
pub async fn delete_section(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Path(section_id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    SectionService::delete(&state.db, section_id).await?;
    Ok(Json(MessageResponse::ok("Section deleted successfully")))
}

#[instrument(skip(state, _caller))]
pub async fn list_activities(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Query(query): Query<ModuleIdQuery>,
) -> Result<Json<ActivitiesResponse>, AppError> {
    let module_id = query
        .module_id
        .ok_or_else(|| AppError::invalid("Module ID is required"))?;
    let activities = ActivityService::for_module(&state.db, module_id).await?;
    Ok(Json(ActivitiesResponse {
        success: true,
        message: format!("Retrieved {} activities", activities.len()),
        activities,
    }))
}

#[instrument(skip(state, _caller, dto))]
pub async fn update_activity(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Json(dto): Json<UpdateActivityDto>,
) -> Result<Json<MessageResponse>, AppError> {
    let (Some(activity_id), Some(title), Some(instructions)) = (
        dto.id,
        required(dto.title.as_deref()),
        required(dto.instructions.as_deref()),
    ) else {
        return Err(AppError::invalid(
            "Activity ID, title, and instructions are required",
        ));
    };
    ActivityService::update(&state.db, activity_id, title, instructions).await?;
    Ok(Json(MessageResponse::ok("Activity updated successfully")))
}

#[instrument(skip(state, _caller))]
pub async fn delete_activity(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Path(activity_id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    ActivityService::delete(&state.db, activity_id).await?;
    Ok(Json(MessageResponse::ok("Activity deleted successfully")))
}

#[instrument(skip(state, _caller))]
pub async fn list_exam_items(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Query(query): Query<SectionIdQuery>,
) -> Result<Json<ExamItemsResponse>, AppError> {
    let section_id = query
        .section_id
        .ok_or_else(|| AppError::invalid("Section ID required"))?;
    let items = ExamItemService::for_section(&state.db, section_id).await?;
    Ok(Json(ExamItemsResponse {
        success: true,
        items,
    }))
}

#[instrument(skip(state, _caller, dto))]
pub async fn create_exam_item(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Json(dto): Json<ExamItemDto>,
) -> Result<Json<CreatedExamItem>, AppError> {
    let section_id = dto
        .section_id
        .ok_or_else(|| AppError::invalid("All fields are required"))?;
    let item = ItemContent::try_from(&dto)?;
    let item_id = ExamItemService::create(&state.db, section_id, &item).await?;
    Ok(Json(CreatedExamItem {
        success: true,
        message: "Exam item created successfully".to_string(),
        item_id,
    }))
}

#[instrument(skip(state, _caller, dto))]
pub async fn update_exam_item(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Json(dto): Json<ExamItemDto>,
) -> Result<Json<MessageResponse>, AppError> {
    let item_id = dto
        .item_id
        .ok_or_else(|| AppError::invalid("All fields are required"))?;
    let item = ItemContent::try_from(&dto)?;
    ExamItemService::update(&state.db, item_id, &item).await?;
    Ok(Json(MessageResponse::ok("Exam item updated successfully")))
}

#[instrument(skip(state, _caller))]
pub async fn delete_exam_item(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Path(item_id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    ExamItemService::delete(&state.db, item_id).await?;
    Ok(Json(MessageResponse::ok("Exam item deleted successfully")))
}

/// Download one module's exam items as Aiken text
#[instrument(skip(state, _caller))]
pub async fn export_aiken_module(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Path(module_id): Path<i64>,
) -> Result<Response, AppError> {
    let (course_code, position, items) = ModuleService::aiken_module(&state.db, module_id).await?;
    Ok(attachment(
        render_module(&items).into_bytes(),
        "text/plain; charset=utf-8",
        &module_filename(&course_code, position),
    ))
}

/// Download every module's exam items as Aiken text
#[instrument(skip(state, _caller))]
pub async fn export_aiken_course(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Path(course_id): Path<i64>,
) -> Result<Response, AppError> {
    let (course_code, modules) = ModuleService::aiken_course(&state.db, course_id).await?;
    Ok(attachment(
        render_course(&modules).into_bytes(),
        "text/plain; charset=utf-8",
        &course_filename(&course_code),
    ))
}
