//! Request and response types for the HTTP API.

pub mod materials;
pub mod quotes;
