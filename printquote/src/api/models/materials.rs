use crate::materials::Material;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A material available for quoting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MaterialResponse {
    /// Material identifier to send as the `material` form field
    #[schema(example = "PLA")]
    pub id: String,
    /// Price in dollars per gram
    #[schema(example = 0.12)]
    pub price_per_gram: f64,
    /// Density in grams per cubic centimetre
    #[schema(example = 1.24)]
    pub density: f64,
}

impl From<Material> for MaterialResponse {
    fn from(material: Material) -> Self {
        Self {
            id: material.id().to_string(),
            price_per_gram: material.price_per_gram(),
            density: material.density(),
        }
    }
}
