//! # LMS Config
//!
//! Configuration structures loaded from environment variables:
//!
//! - [`jwt`]: token signing and cookie settings
//! - [`cors`]: allowed origins
//! - [`rate_limit`]: governor settings for general and auth routes
//! - [`llm`]: text-generation backend settings

pub mod cors;
pub mod jwt;
pub mod llm;
pub mod rate_limit;

pub use cors::CorsConfig;
pub use jwt::JwtConfig;
pub use llm::LlmConfig;
pub use rate_limit::RateLimitConfig;
