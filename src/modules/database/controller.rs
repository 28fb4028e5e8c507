use axum::{
    Json,
    extract::{Query, State},
};
use tracing::instrument;

use lms_core::AppError;

use crate::modules::database::model::{
    ExecuteQueryDto, QueryOutcome, TableDataQuery, TableDataResponse, TablesResponse,
};
use crate::modules::database::service::DatabaseService;
use crate::state::AppState;

#[instrument(skip(state))]
pub async fn list_tables(State(state): State<AppState>) -> Result<Json<TablesResponse>, AppError> {
    let tables = DatabaseService::list_tables(&state.db).await?;
    Ok(Json(TablesResponse {
        success: true,
        tables,
    }))
}

#[instrument(skip(state))]
pub async fn table_data(
    State(state): State<AppState>,
    Query(query): Query<TableDataQuery>,
) -> Result<Json<TableDataResponse>, AppError> {
    let table = query
        .table
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::invalid("Table name is required"))?;

    let data =
        DatabaseService::table_data(&state.db, table, query.page.page(), query.page.per_page).await?;
    Ok(Json(data))
}

/// Run an ad hoc statement; writes require `confirmed: true`
#[instrument(skip(state, dto), fields(confirmed = dto.confirmed))]
pub async fn execute_query(
    State(state): State<AppState>,
    Json(dto): Json<ExecuteQueryDto>,
) -> Result<Json<QueryOutcome>, AppError> {
    let query = dto.query.as_deref().unwrap_or_default();
    let outcome = DatabaseService::execute(&state.db, query, dto.confirmed).await?;
    Ok(Json(outcome))
}
