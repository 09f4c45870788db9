//! The fixed set of print materials and their constants.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::errors::Error;

/// A print material offered for quoting.
///
/// The set is closed: parsing any other identifier fails with [`Error::UnknownMaterial`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Material {
    Pla,
    Petg,
    Tpu,
}

impl Material {
    pub const ALL: [Material; 3] = [Material::Pla, Material::Petg, Material::Tpu];

    /// Identifier used on the wire, e.g. `PLA`.
    pub fn id(&self) -> &'static str {
        match self {
            Material::Pla => "PLA",
            Material::Petg => "PETG",
            Material::Tpu => "TPU",
        }
    }

    /// Price in dollars per gram.
    pub fn price_per_gram(&self) -> f64 {
        match self {
            Material::Pla => 0.12,
            Material::Petg => 0.12,
            Material::Tpu => 0.20,
        }
    }

    /// Density in grams per cubic centimetre.
    pub fn density(&self) -> f64 {
        match self {
            Material::Pla => 1.24,
            Material::Petg => 1.27,
            Material::Tpu => 1.20,
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Material {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Material::ALL
            .into_iter()
            .find(|material| material.id() == s)
            .ok_or_else(|| Error::UnknownMaterial { key: s.to_string() })
    }
}
