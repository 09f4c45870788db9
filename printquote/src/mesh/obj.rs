//! Wavefront OBJ decoding.
//!
//! Only geometry statements matter for volume:
//!
//! ```text
//! v x y z [w]        vertex position (w is ignored)
//! f v1 v2 v3 ...     polygon face; each reference is v, v/vt, v//vn or v/vt/vn
//! ```
//!
//! Indices are 1-based; negative indices count back from the most recently declared vertex.
//! Polygons with more than three corners are fan-triangulated. Everything else (normals, texture
//! coordinates, groups, materials, comments) is ignored.

use nalgebra::Point3;

use super::{Mesh, MeshError, MeshResult};

const FORMAT: &str = "OBJ";

pub(super) fn decode(bytes: &[u8]) -> MeshResult<Mesh> {
    let text = std::str::from_utf8(bytes).map_err(|e| MeshError::invalid_content(FORMAT, format!("file is not valid UTF-8 text: {e}")))?;

    let mut mesh = Mesh::new();

    for (line_index, raw_line) in text.lines().enumerate() {
        let line_number = line_index + 1;
        let line = raw_line.split('#').next().unwrap_or("").trim();
        let mut tokens = line.split_whitespace();

        match tokens.next() {
            Some("v") => {
                let vertex = parse_vertex(tokens, line_number)?;
                mesh.vertices.push(vertex);
            }
            Some("f") => {
                let corners = tokens
                    .map(|token| resolve_index(token, mesh.vertices.len(), line_number))
                    .collect::<MeshResult<Vec<usize>>>()?;

                if corners.len() < 3 {
                    return Err(MeshError::invalid_content(
                        FORMAT,
                        format!("face on line {line_number} has {} vertices, at least 3 are required", corners.len()),
                    ));
                }

                for pair in corners[1..].windows(2) {
                    mesh.triangles.push([corners[0], pair[0], pair[1]]);
                }
            }
            _ => {}
        }
    }

    Ok(mesh)
}

fn parse_vertex<'a>(tokens: impl Iterator<Item = &'a str>, line_number: usize) -> MeshResult<Point3<f64>> {
    let coords = tokens
        .take(3)
        .map(|token| {
            token
                .parse::<f64>()
                .map_err(|e| MeshError::invalid_content(FORMAT, format!("bad vertex coordinate '{token}' on line {line_number}: {e}")))
        })
        .collect::<MeshResult<Vec<f64>>>()?;

    match coords[..] {
        [x, y, z] => Ok(Point3::new(x, y, z)),
        _ => Err(MeshError::invalid_content(
            FORMAT,
            format!("vertex on line {line_number} needs 3 coordinates, found {}", coords.len()),
        )),
    }
}

/// Resolve a face corner reference to a 0-based vertex index.
fn resolve_index(token: &str, vertex_count: usize, line_number: usize) -> MeshResult<usize> {
    let position = token.split('/').next().unwrap_or("");
    let index: i64 = position
        .parse()
        .map_err(|_| MeshError::invalid_content(FORMAT, format!("bad face index '{token}' on line {line_number}")))?;

    let resolved = match index {
        0 => None,
        i if i > 0 => usize::try_from(i - 1).ok(),
        i => vertex_count.checked_sub(usize::try_from(i.unsigned_abs()).unwrap_or(usize::MAX)),
    };

    resolved.ok_or_else(|| MeshError::invalid_content(FORMAT, format!("face index {index} on line {line_number} is out of range")))
}
