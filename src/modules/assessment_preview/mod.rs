pub mod controller;
pub mod model;
pub mod router;
pub mod sampling;
pub mod service;

pub use model::*;
pub use router::init_assessment_preview_router;
