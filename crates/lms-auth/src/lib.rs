//! # LMS Auth
//!
//! JWT claims and token utilities.
//!
//! - [`claims`]: the shared claim layout for access and refresh tokens
//! - [`jwt`]: HS256 token creation and verification

pub mod claims;
pub mod jwt;

pub use claims::{Claims, TokenSubject, TokenType};
pub use jwt::{create_access_token, create_refresh_token, verify_refresh_token, verify_token};
