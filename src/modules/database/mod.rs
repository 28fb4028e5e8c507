//! Administrative SQL console.
//!
//! Every route here sits behind an admin-owned API key; see
//! [`crate::middleware::role::require_admin_api_key`].

pub mod controller;
pub mod model;
pub mod router;
pub mod service;

pub use model::*;
pub use router::init_database_router;
