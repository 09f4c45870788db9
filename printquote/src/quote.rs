//! Quote computation: mesh volume to weight and price.
//!
//! ```text
//! volume_cm3 = volume_mm3 / 1000
//! weight     = round(volume_cm3 * density, 1)          grams
//! price      = round(weight * price_per_gram, 2)       dollars
//! ```
//!
//! The price is computed from the already-rounded weight, so the displayed numbers always agree
//! with each other.

use bytes::Bytes;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, instrument};

use crate::errors::{Error, Result};
use crate::materials::Material;
use crate::mesh::{self, MeshFormat};

/// Volumes smaller than this (in mm³) are floating point noise from a flat or degenerate mesh.
const ZERO_VOLUME_TOLERANCE_MM3: f64 = 1e-9;

const MM3_PER_CM3: f64 = 1000.0;

/// A computed quote.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    /// Grams, one decimal place.
    pub weight: f64,
    /// Dollars, two decimal places.
    pub price: f64,
}

/// A model upload, fully buffered.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub material: String,
    pub data: Bytes,
}

/// Round half away from zero to `decimals` places.
///
/// The exact binary value is rounded, so a product such as `8.75 * 1.24`, which lands just below
/// `10.85`, rounds down to `10.8`. Values outside the decimal range are returned unchanged.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

/// Apply the volume policy: reject NaN, infinite and negative volumes, and snap float noise
/// around zero to exactly zero.
pub fn checked_volume(volume_mm3: f64) -> Result<f64> {
    if !volume_mm3.is_finite() {
        return Err(Error::InvalidVolume {
            message: format!("mesh volume is not a finite number ({volume_mm3})"),
        });
    }

    if volume_mm3.abs() < ZERO_VOLUME_TOLERANCE_MM3 {
        return Ok(0.0);
    }

    if volume_mm3 < 0.0 {
        return Err(Error::InvalidVolume {
            message: format!("mesh has negative volume ({volume_mm3:.3} mm³); its faces may be inverted"),
        });
    }

    Ok(volume_mm3)
}

/// Quote a volume given in cubic millimetres.
pub fn quote_for_volume(volume_mm3: f64, material: Material) -> Result<Quote> {
    let volume_cm3 = checked_volume(volume_mm3)? / MM3_PER_CM3;
    let weight = round_to(volume_cm3 * material.density(), 1);
    let price = round_to(weight * material.price_per_gram(), 2);

    Ok(Quote { weight, price })
}

/// Quote an uploaded model file.
///
/// The file type is checked first, so unsupported uploads are never parsed. The material is
/// checked next, before paying for a mesh decode.
#[instrument(skip_all, fields(filename = %upload.filename, material = %upload.material, size = upload.data.len()))]
pub fn quote_upload(upload: &Upload) -> Result<Quote> {
    let format = MeshFormat::from_filename(&upload.filename).ok_or_else(|| Error::UnsupportedFileType {
        filename: upload.filename.clone(),
    })?;
    let material: Material = upload.material.parse()?;

    let mesh = mesh::load(&upload.data, format)?;
    let volume_mm3 = mesh.volume();
    let quote = quote_for_volume(volume_mm3, material)?;

    debug!(
        format = %format,
        volume_mm3 = volume_mm3,
        weight = quote.weight,
        price = quote.price,
        "Computed quote"
    );

    Ok(quote)
}
