//! LLM-backed content generation for course modules.
//!
//! Every operation runs a prompt cascade through [`crate::llm::retry::first_valid`]
//! and falls back to canned content when the model never produces usable
//! output, so these endpoints answer even with the backend down.

pub mod controller;
pub mod model;
pub mod prompts;
pub mod router;
pub mod service;

pub use model::*;
pub use router::init_ai_router;
