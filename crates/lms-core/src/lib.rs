//! # LMS Core
//!
//! Foundational types shared by every crate in the workspace:
//!
//! - [`errors`]: `AppError` and its JSON response conversion
//! - [`pagination`]: page/per_page parameters, page metadata and sort helpers
//! - [`password`]: bcrypt hashing for passwords and API keys
//! - [`serde`]: lenient deserializers for query parameters
//! - [`text`]: HTML stripping, name sanitizing and module fragment helpers

pub mod errors;
pub mod pagination;
pub mod password;
pub mod serde;
pub mod text;

pub use errors::AppError;
pub use pagination::{PageMeta, PageParams, SortOrder};
pub use password::{hash_password, verify_password};
