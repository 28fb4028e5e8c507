//! Student-facing learning routes: submissions, assessments, progress and
//! grades. Every route acts on the caller identified by the access token.

pub mod controller;
pub mod model;
pub mod router;
pub mod scoring;
pub mod service;

pub use model::*;
pub use router::init_learning_router;
