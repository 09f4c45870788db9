//! Triangle mesh decoding and volume measurement.
//!
//! Uploaded models arrive as raw bytes plus a filename. The filename suffix selects a
//! [`MeshFormat`], [`load`] decodes the bytes into an indexed [`Mesh`], and [`Mesh::volume`]
//! integrates the enclosed volume in cubic millimetres.
//!
//! # Supported formats
//!
//! - **STL** - binary and ASCII, via [`stl_io`]
//! - **OBJ** - Wavefront text geometry (`v` and `f` statements)
//! - **3MF** - read with [`lib3mf`], including build item transforms, components across model
//!   parts, and unit conversion
//!
//! # Volume
//!
//! Volume uses the signed tetrahedron decomposition: every triangle forms a tetrahedron with the
//! origin, and the signed volumes sum to the enclosed volume of a closed, consistently wound
//! surface. Outward-facing (counter-clockwise) winding gives a positive result; an inverted mesh
//! comes out negative.

mod error;
mod obj;
mod stl;
mod threemf;

pub use error::{MeshError, MeshResult};

use nalgebra::Point3;
use serde::Serialize;
use std::fmt;
use utoipa::ToSchema;

/// Mesh file formats accepted for quoting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MeshFormat {
    Stl,
    Obj,
    #[serde(rename = "3mf")]
    ThreeMf,
}

impl MeshFormat {
    pub const ALL: [MeshFormat; 3] = [MeshFormat::Stl, MeshFormat::Obj, MeshFormat::ThreeMf];

    /// Detect the format from a filename suffix, ignoring case.
    ///
    /// Only the suffix is considered; `model.STL` and `archive.tar.3mf` are accepted, while
    /// `model.stl.zip` and `stl` are not.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let filename = filename.to_lowercase();
        Self::ALL.into_iter().find(|format| filename.ends_with(format.suffix()))
    }

    /// The filename suffix for this format, including the leading dot.
    pub fn suffix(&self) -> &'static str {
        match self {
            MeshFormat::Stl => ".stl",
            MeshFormat::Obj => ".obj",
            MeshFormat::ThreeMf => ".3mf",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MeshFormat::Stl => "STL",
            MeshFormat::Obj => "OBJ",
            MeshFormat::ThreeMf => "3MF",
        }
    }
}

impl fmt::Display for MeshFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An indexed triangle mesh in millimetres.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Point3<f64>>,
    pub triangles: Vec<[usize; 3]>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append another mesh, offsetting its triangle indices past the current vertices.
    pub fn append(&mut self, other: Mesh) {
        let offset = self.vertices.len();
        self.vertices.extend(other.vertices);
        self.triangles
            .extend(other.triangles.into_iter().map(|[a, b, c]| [a + offset, b + offset, c + offset]));
    }

    /// Check that the mesh has triangles and that every index refers to a vertex.
    pub fn validate(&self) -> MeshResult<()> {
        if self.triangles.is_empty() {
            return Err(MeshError::Empty);
        }

        let vertex_count = self.vertices.len();
        for (triangle, indices) in self.triangles.iter().enumerate() {
            if let Some(&index) = indices.iter().find(|&&i| i >= vertex_count) {
                return Err(MeshError::IndexOutOfRange {
                    triangle,
                    index,
                    vertex_count,
                });
            }
        }

        Ok(())
    }

    /// Signed enclosed volume in cubic millimetres.
    ///
    /// Assumes a validated mesh; triangles with out-of-range indices are skipped.
    pub fn volume(&self) -> f64 {
        let signed_sum: f64 = self
            .triangles
            .iter()
            .filter_map(|&[a, b, c]| {
                let a = self.vertices.get(a)?.coords;
                let b = self.vertices.get(b)?.coords;
                let c = self.vertices.get(c)?.coords;
                Some(a.dot(&b.cross(&c)))
            })
            .sum();

        signed_sum / 6.0
    }
}

/// Decode `bytes` as a mesh of the given format and validate it.
pub fn load(bytes: &[u8], format: MeshFormat) -> MeshResult<Mesh> {
    let mesh = match format {
        MeshFormat::Stl => stl::decode(bytes)?,
        MeshFormat::Obj => obj::decode(bytes)?,
        MeshFormat::ThreeMf => threemf::decode(bytes)?,
    };

    mesh.validate()?;

    tracing::debug!(
        format = %format,
        vertices = mesh.vertices.len(),
        triangles = mesh.triangles.len(),
        "Decoded mesh"
    );

    Ok(mesh)
}
