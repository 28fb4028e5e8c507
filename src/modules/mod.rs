pub mod ai;
pub mod api_keys;
pub mod assessment_preview;
pub mod assessment_scopes;
pub mod auth;
pub mod content;
pub mod course_instructors;
pub mod courses;
pub mod dashboard;
pub mod database;
pub mod enrollments;
pub mod exam_types;
pub mod grading;
pub mod instances;
pub mod learning;
pub mod users;
