use crate::materials::Material;
use crate::quote::Quote;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Successful quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct QuoteResponse {
    /// Estimated part weight in grams, rounded to one decimal place
    #[schema(example = 1240.0)]
    pub weight: f64,
    /// Estimated price in dollars, rounded to two decimal places
    #[schema(example = 148.8)]
    pub price: f64,
}

impl From<Quote> for QuoteResponse {
    fn from(quote: Quote) -> Self {
        Self {
            weight: quote.weight,
            price: quote.price,
        }
    }
}

/// Failed quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human readable description of what went wrong
    #[schema(example = "Unsupported file type")]
    pub error: String,
}

/// Multipart form accepted by the upload endpoint (documentation only)
#[derive(ToSchema)]
#[allow(unused)]
pub struct UploadForm {
    /// The model file. The filename must end in `.stl`, `.obj` or `.3mf`.
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    /// Material to quote for
    pub material: Material,
}
