use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use lms_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::modules::exam_types::model::ExamCategory;
use crate::modules::learning::model::{
    ComprehensiveGradesResponse, CourseOverviewResponse, CourseProgressResponse, ExamSubmitDto,
    ModuleProgressResponse, OverallProgressResponse, QuizSubmitDto, StudentActivitiesResponse,
    StudentExamsResponse, StudentQuestionsResponse, StudentQuizzesResponse,
    SubmissionCheckResponse, SubmitActivityDto, SubmitAssessmentResponse, TrackSectionDto,
};
use crate::modules::learning::service::LearningService;
use crate::state::AppState;
use crate::utils::response::MessageResponse;

const DEFAULT_SUBMISSION_REASON: &str = "manual";

#[instrument(skip(state, auth))]
pub async fn check_submission(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(activity_id): Path<i64>,
) -> Result<Json<SubmissionCheckResponse>, AppError> {
    let submission = LearningService::find_submission(&state.db, auth.user_id()?, activity_id).await?;
    Ok(Json(SubmissionCheckResponse {
        success: true,
        has_submission: submission.is_some(),
        submission,
    }))
}

#[instrument(skip(state, auth, dto))]
pub async fn submit_activity(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(dto): Json<SubmitActivityDto>,
) -> Result<Json<MessageResponse>, AppError> {
    let content = dto
        .submission_content
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    let (Some(activity_id), Some(content)) = (dto.activity_id, content) else {
        return Err(AppError::invalid("Activity ID and content are required"));
    };

    let message =
        LearningService::submit_activity(&state.db, auth.user_id()?, activity_id, content).await?;
    Ok(Json(MessageResponse::ok(message)))
}

#[instrument(skip(state, auth))]
pub async fn student_activities(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(module_id): Path<i64>,
) -> Result<Json<StudentActivitiesResponse>, AppError> {
    let activities =
        LearningService::activities_with_grades(&state.db, auth.user_id()?, module_id).await?;
    Ok(Json(StudentActivitiesResponse {
        success: true,
        activities,
    }))
}

#[instrument(skip(state, auth))]
pub async fn student_quizzes(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(course_id): Path<i64>,
) -> Result<Json<StudentQuizzesResponse>, AppError> {
    let (instance_id, quizzes) =
        LearningService::assessments(&state.db, auth.user_id()?, course_id, ExamCategory::Quiz)
            .await?;
    Ok(Json(StudentQuizzesResponse {
        success: true,
        instance_id,
        quizzes,
    }))
}

#[instrument(skip(state, auth))]
pub async fn student_exams(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(course_id): Path<i64>,
) -> Result<Json<StudentExamsResponse>, AppError> {
    let (instance_id, exams) =
        LearningService::assessments(&state.db, auth.user_id()?, course_id, ExamCategory::Exam)
            .await?;
    Ok(Json(StudentExamsResponse {
        success: true,
        instance_id,
        exams,
    }))
}

async fn questions(
    state: &AppState,
    auth: &AuthUser,
    category: ExamCategory,
    exam_type_id: i64,
    instance_id: i64,
) -> Result<Json<StudentQuestionsResponse>, AppError> {
    let (exam_type, questions) = LearningService::questions(
        &state.db,
        auth.user_id()?,
        category,
        exam_type_id,
        instance_id,
    )
    .await?;

    Ok(Json(StudentQuestionsResponse {
        success: true,
        exam_name: exam_type.exam_name,
        total_items: exam_type.total_items,
        questions,
    }))
}

#[instrument(skip(state, auth))]
pub async fn quiz_questions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((quiz_id, instance_id)): Path<(i64, i64)>,
) -> Result<Json<StudentQuestionsResponse>, AppError> {
    questions(&state, &auth, ExamCategory::Quiz, quiz_id, instance_id).await
}

#[instrument(skip(state, auth))]
pub async fn exam_questions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((exam_id, instance_id)): Path<(i64, i64)>,
) -> Result<Json<StudentQuestionsResponse>, AppError> {
    questions(&state, &auth, ExamCategory::Exam, exam_id, instance_id).await
}

#[instrument(skip(state, auth, dto))]
pub async fn submit_quiz(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(dto): Json<QuizSubmitDto>,
) -> Result<Json<SubmitAssessmentResponse>, AppError> {
    let (Some(quiz_id), Some(instance_id)) = (dto.quiz_id, dto.instance_id) else {
        return Err(AppError::invalid("Missing required data"));
    };
    if dto.answers.is_empty() {
        return Err(AppError::invalid("Missing required data"));
    }

    let result = LearningService::submit_assessment(
        &state.db,
        auth.user_id()?,
        ExamCategory::Quiz,
        quiz_id,
        instance_id,
        &dto.answers,
        DEFAULT_SUBMISSION_REASON,
    )
    .await?;

    Ok(Json(SubmitAssessmentResponse {
        success: true,
        message: "Quiz submitted successfully".to_string(),
        result,
    }))
}

/// Exams may be submitted with no answers, e.g. when the timer runs out.
#[instrument(skip(state, auth, dto))]
pub async fn submit_exam(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(dto): Json<ExamSubmitDto>,
) -> Result<Json<SubmitAssessmentResponse>, AppError> {
    let (Some(exam_id), Some(instance_id)) = (dto.exam_id, dto.instance_id) else {
        return Err(AppError::invalid("Missing required fields"));
    };
    let reason = dto
        .submission_reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(DEFAULT_SUBMISSION_REASON);

    let result = LearningService::submit_assessment(
        &state.db,
        auth.user_id()?,
        ExamCategory::Exam,
        exam_id,
        instance_id,
        &dto.answers,
        reason,
    )
    .await?;

    Ok(Json(SubmitAssessmentResponse {
        success: true,
        message: "Exam submitted successfully".to_string(),
        result,
    }))
}

#[instrument(skip(state, auth))]
pub async fn track_section(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(dto): Json<TrackSectionDto>,
) -> Result<Json<MessageResponse>, AppError> {
    let section_id = dto
        .section_id
        .ok_or_else(|| AppError::invalid("Section ID is required"))?;
    LearningService::track_section(&state.db, auth.user_id()?, section_id).await?;
    Ok(Json(MessageResponse::ok("Section progress tracked")))
}

#[instrument(skip(state, auth))]
pub async fn module_progress(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(module_id): Path<i64>,
) -> Result<Json<ModuleProgressResponse>, AppError> {
    let progress = LearningService::module_progress(&state.db, auth.user_id()?, module_id).await?;
    Ok(Json(progress))
}

#[instrument(skip(state, auth))]
pub async fn course_overview_stats(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(course_id): Path<i64>,
) -> Result<Json<CourseOverviewResponse>, AppError> {
    let stats = LearningService::course_overview(&state.db, auth.user_id()?, course_id).await?;
    Ok(Json(stats))
}

#[instrument(skip(state, auth))]
pub async fn course_progress(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(course_id): Path<i64>,
) -> Result<Json<CourseProgressResponse>, AppError> {
    let progress = LearningService::course_progress(&state.db, auth.user_id()?, course_id).await?;
    Ok(Json(progress))
}

#[instrument(skip(state, auth))]
pub async fn comprehensive_grades(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(course_id): Path<i64>,
) -> Result<Json<ComprehensiveGradesResponse>, AppError> {
    let grades =
        LearningService::comprehensive_grades(&state.db, auth.user_id()?, course_id).await?;
    Ok(Json(grades))
}

#[instrument(skip(state, auth))]
pub async fn overall_learning_progress(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<OverallProgressResponse>, AppError> {
    let progress = LearningService::overall_progress(&state.db, auth.user_id()?).await?;
    Ok(Json(progress))
}
