use axum::{
    Router,
    routing::{get, post},
};

use crate::modules::auth::controller::{login, logout, refresh, verify};
use crate::state::AppState;

pub fn init_auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/verify", get(verify))
}
