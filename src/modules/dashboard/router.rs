use axum::{Router, routing::get};

use crate::modules::dashboard::controller::get_stats;
use crate::state::AppState;

pub fn init_dashboard_router() -> Router<AppState> {
    Router::new().route("/stats", get(get_stats))
}
