//! Credential extractors and role middleware.
//!
//! - [`auth`]: access/refresh tokens from the `Authorization` header or cookies
//! - [`api_key`]: `X-API-KEY` verification against every stored key hash
//! - [`current_user`]: either credential, API key first
//! - [`role`]: role gates applied as route layers
//!
//! ```ignore
//! async fn list(State(state): State<AppState>, auth_user: AuthUser) -> ... {}
//! async fn users(State(state): State<AppState>, _key: ApiKeyUser) -> ... {}
//! async fn modules(State(state): State<AppState>, user: CurrentUser) -> ... {}
//! ```

pub mod api_key;
pub mod auth;
pub mod current_user;
pub mod role;
