//! Shared fixtures for tests: in-memory model files and a ready-to-use test server.

use std::fmt::Write as _;
use std::io::{Cursor, Write};

use axum_test::TestServer;
use nalgebra::Point3;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::config::Config;
use crate::mesh::Mesh;
use crate::{AppState, build_router};

/// Outward-facing triangles of an axis-aligned cube with one corner at the origin.
const CUBE_TRIANGLES: [[usize; 3]; 12] = [
    [0, 2, 1],
    [0, 3, 2],
    [4, 5, 6],
    [4, 6, 7],
    [0, 1, 5],
    [0, 5, 4],
    [3, 7, 6],
    [3, 6, 2],
    [0, 4, 7],
    [0, 7, 3],
    [1, 2, 6],
    [1, 6, 5],
];

fn cube_vertices(size: f64) -> [[f64; 3]; 8] {
    let s = size;
    [
        [0.0, 0.0, 0.0],
        [s, 0.0, 0.0],
        [s, s, 0.0],
        [0.0, s, 0.0],
        [0.0, 0.0, s],
        [s, 0.0, s],
        [s, s, s],
        [0.0, s, s],
    ]
}

pub fn cube_mesh(size: f64) -> Mesh {
    Mesh {
        vertices: cube_vertices(size).iter().map(|&[x, y, z]| Point3::new(x, y, z)).collect(),
        triangles: CUBE_TRIANGLES.to_vec(),
    }
}

/// A single flat triangle: a valid mesh that encloses no volume.
pub fn flat_triangle_mesh() -> Mesh {
    Mesh {
        vertices: vec![Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 0.0, 0.0), Point3::new(0.0, 10.0, 0.0)],
        triangles: vec![[0, 1, 2]],
    }
}

pub fn binary_stl(mesh: &Mesh) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(84 + mesh.triangles.len() * 50);

    let mut header = [0u8; 80];
    let label = b"binary test fixture";
    header[..label.len()].copy_from_slice(label);
    bytes.extend_from_slice(&header);
    bytes.extend_from_slice(&(mesh.triangles.len() as u32).to_le_bytes());

    for triangle in &mesh.triangles {
        for _ in 0..3 {
            bytes.extend_from_slice(&0f32.to_le_bytes());
        }
        for &index in triangle {
            let vertex = mesh.vertices[index];
            for coord in [vertex.x, vertex.y, vertex.z] {
                bytes.extend_from_slice(&(coord as f32).to_le_bytes());
            }
        }
        bytes.extend_from_slice(&0u16.to_le_bytes());
    }

    bytes
}

pub fn ascii_stl(mesh: &Mesh) -> String {
    let mut out = String::from("solid fixture\n");
    for triangle in &mesh.triangles {
        out.push_str("  facet normal 0 0 0\n    outer loop\n");
        for &index in triangle {
            let vertex = mesh.vertices[index];
            let _ = writeln!(out, "      vertex {} {} {}", vertex.x, vertex.y, vertex.z);
        }
        out.push_str("    endloop\n  endfacet\n");
    }
    out.push_str("endsolid fixture\n");
    out
}

pub fn cube_obj(size: f64) -> String {
    let mut out = String::from("# cube\no cube\n");
    for [x, y, z] in cube_vertices(size) {
        let _ = writeln!(out, "v {x} {y} {z}");
    }
    for [a, b, c] in CUBE_TRIANGLES {
        let _ = writeln!(out, "f {} {} {}", a + 1, b + 1, c + 1);
    }
    out
}

pub fn cube_object_xml(id: u32, size: f64) -> String {
    let mut out = format!(r#"<object id="{id}" type="model"><mesh><vertices>"#);
    for [x, y, z] in cube_vertices(size) {
        let _ = write!(out, r#"<vertex x="{x}" y="{y}" z="{z}"/>"#);
    }
    out.push_str("</vertices><triangles>");
    for [a, b, c] in CUBE_TRIANGLES {
        let _ = write!(out, r#"<triangle v1="{a}" v2="{b}" v3="{c}"/>"#);
    }
    out.push_str("</triangles></mesh></object>");
    out
}

pub fn model_xml(unit: &str, objects: &str, items: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<model unit="{unit}" xml:lang="en-US" xmlns="http://schemas.microsoft.com/3dmanufacturing/core/2015/02">
  <resources>{objects}</resources>
  <build>{items}</build>
</model>"#
    )
}

/// Package a root model part into a minimal 3MF archive.
pub fn threemf_archive(model: &str) -> Vec<u8> {
    threemf_package(&[("3D/3dmodel.model", model)])
}

/// Package model parts into a 3MF archive. The first part is the root model.
pub fn threemf_package(parts: &[(&str, &str)]) -> Vec<u8> {
    const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="model" ContentType="application/vnd.ms-package.3dmanufacturing-3dmodel+xml"/>
</Types>"#;

    let rels = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Target="/{}" Id="rel0" Type="http://schemas.microsoft.com/3dmanufacturing/2013/01/3dmodel"/>
</Relationships>"#,
        parts[0].0
    );

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let entries = [("[Content_Types].xml", CONTENT_TYPES), ("_rels/.rels", rels.as_str())];
    for (name, content) in entries.into_iter().chain(parts.iter().copied()) {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        writer.start_file(name, options).expect("start zip entry");
        writer.write_all(content.as_bytes()).expect("write zip entry");
    }
    writer.finish().expect("finish zip archive").into_inner()
}

pub fn cube_threemf(size: f64, unit: &str) -> Vec<u8> {
    threemf_archive(&model_xml(unit, &cube_object_xml(1, size), r#"<item objectid="1"/>"#))
}

/// Build a test server around the full router with the given configuration.
pub fn create_test_server(config: Config) -> TestServer {
    let state = AppState::new(config);
    let router = build_router(&state).expect("Failed to build router");
    TestServer::new(router).expect("Failed to create test server")
}
