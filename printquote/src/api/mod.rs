//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures
//!
//! # API Structure
//!
//! - **Quote page** (`/`): the embedded upload page and its static assets
//! - **Quotes** (`/upload`): multipart model upload, answered with a weight and price
//! - **Materials** (`/materials`): the material table used for pricing
//!
//! Every quote response has HTTP status 200. Whether the quote succeeded is carried by the JSON
//! shape: `{"weight", "price"}` on success, `{"error"}` on failure.

pub mod handlers;
pub mod models;
