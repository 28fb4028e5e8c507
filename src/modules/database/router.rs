use axum::{
    Router,
    routing::{get, post},
};

use crate::modules::database::controller::{execute_query, list_tables, table_data};
use crate::state::AppState;

/// Routes are mounted behind the admin API-key layer in the app router.
pub fn init_database_router() -> Router<AppState> {
    Router::new()
        .route("/tables", get(list_tables))
        .route("/table-data", get(table_data))
        .route("/execute-query", post(execute_query))
}
