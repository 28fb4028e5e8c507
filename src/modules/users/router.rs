use axum::{
    Router,
    routing::{get, post, put},
};

use crate::modules::users::controller::{
    create_user, delete_user, list_users, update_user, upload_users_csv,
};
use crate::state::AppState;

pub fn init_users_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/{user_id}", put(update_user).delete(delete_user))
        .route("/upload-csv", post(upload_users_csv))
}
