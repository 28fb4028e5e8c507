use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::modules::api_keys::controller::{
    delete_api_key, edit_api_key, generate_api_key, list_api_keys,
};
use crate::state::AppState;

pub fn init_api_keys_router() -> Router<AppState> {
    Router::new()
        .route("/generate", post(generate_api_key))
        .route("/list", get(list_api_keys))
        .route("/delete/{api_key_id}", delete(delete_api_key))
        .route("/edit/{api_key_id}", put(edit_api_key))
}
