//! HTTP request handlers.
//!
//! - [`materials`]: material table listing
//! - [`quotes`]: model upload and quoting
//! - [`static_assets`]: the embedded quote page
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`], which renders as an `{"error": ...}` JSON body with
//! status 200.

pub mod materials;
pub mod quotes;
pub mod static_assets;
