//! STL decoding.
//!
//! Both binary and ASCII STL are handled by [`stl_io`], which merges coincident vertices into an
//! indexed mesh.

use std::io::Cursor;

use nalgebra::Point3;

use super::{Mesh, MeshError, MeshResult};

pub(super) fn decode(bytes: &[u8]) -> MeshResult<Mesh> {
    let mut cursor = Cursor::new(bytes);
    let indexed = stl_io::read_stl(&mut cursor).map_err(|e| MeshError::invalid_content("STL", e.to_string()))?;

    let vertices = indexed
        .vertices
        .iter()
        .map(|v| Point3::new(f64::from(v.0[0]), f64::from(v.0[1]), f64::from(v.0[2])))
        .collect();
    let triangles = indexed.faces.iter().map(|face| face.vertices).collect();

    Ok(Mesh { vertices, triangles })
}
