//! Helpers shared by the feature modules.
//!
//! - [`csv`]: multipart CSV uploads, row parsing and CSV downloads
//! - [`db`]: classification of database errors
//! - [`response`]: common response envelopes

pub mod csv;
pub mod db;
pub mod response;
