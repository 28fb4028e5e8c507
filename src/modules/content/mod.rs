//! Course content: modules, their sections and activities, and the exam
//! items written against each section.
//!
//! Modules are ordered by a 1-based `position` within their course and
//! sections by a `position` within their module. Inserts and deletes keep both
//! sequences gap-free.

pub mod aiken;
pub mod controller;
pub mod model;
pub mod router;
pub mod service;

pub use model::*;
pub use router::init_content_router;
