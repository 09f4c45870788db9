//! 3MF (3D Manufacturing Format) decoding.
//!
//! The OPC package and the model XML are read with [`lib3mf`]. This module assembles the printable
//! geometry from the parsed model parts:
//!
//! - build items decide what gets printed, each instancing an object with its transform
//! - component objects expand recursively, possibly into other model parts of the package
//!   (production extension `p:path`)
//! - coordinates are converted from the `unit` of the part that defines them to millimetres
//! - mirroring transforms flip triangle winding, so instanced geometry keeps outward normals
//!
//! A component graph may reference the same object several times at every level, so the number of
//! instances and of instanced triangles is capped.
//!
//! Materials, colors, textures, slices and beam lattices are ignored.

use std::collections::HashMap;
use std::io::Cursor;
use std::rc::Rc;

use lib3mf::opc::Package;
use nalgebra::{Matrix4, Point3};
use zip::ZipArchive;

use super::{Mesh, MeshError, MeshResult};

const FORMAT: &str = "3MF";

/// Guard against cyclic or absurdly deep component graphs.
const MAX_COMPONENT_DEPTH: usize = 32;

/// Declared uncompressed size limit for a single archive entry.
const MAX_ENTRY_SIZE: u64 = 1 << 30;

/// Caps on the geometry one package may instance.
#[derive(Debug, Clone, Copy)]
struct Limits {
    instances: usize,
    triangles: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            instances: 1_000_000,
            triangles: 5_000_000,
        }
    }
}

pub(super) fn decode(bytes: &[u8]) -> MeshResult<Mesh> {
    decode_with_limits(bytes, Limits::default())
}

fn decode_with_limits(bytes: &[u8], limits: Limits) -> MeshResult<Mesh> {
    check_entry_sizes(bytes)?;

    let mut package = Package::open(Cursor::new(bytes))?;
    let root = Rc::new(Part::parse(&package.get_model()?)?);

    let mut assembly = Assembly {
        package,
        parts: HashMap::new(),
        limits,
        instances: 0,
        mesh: Mesh::new(),
    };

    for item in &root.build {
        assembly.instantiate(&root, item, &Matrix4::identity(), 0)?;
    }

    Ok(assembly.mesh)
}

/// Reject archives that declare oversized entries before anything is inflated.
fn check_entry_sizes(bytes: &[u8]) -> MeshResult<()> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    for index in 0..archive.len() {
        let entry = archive.by_index_raw(index)?;
        if entry.size() > MAX_ENTRY_SIZE {
            return Err(MeshError::invalid_content(
                FORMAT,
                format!("entry '{}' exceeds {MAX_ENTRY_SIZE} bytes when decompressed", entry.name()),
            ));
        }
    }
    Ok(())
}

/// A reference to an object, from a build item or from a component.
#[derive(Debug, Clone)]
struct Reference {
    object_id: usize,
    /// Model part holding the object, when it is not the referencing part.
    path: Option<String>,
    /// Placement in millimetres.
    transform: Matrix4<f64>,
}

#[derive(Debug, Default)]
struct PartObject {
    /// Geometry in millimetres.
    mesh: Option<Mesh>,
    components: Vec<Reference>,
}

/// One model part of the package, converted to millimetres.
#[derive(Debug)]
struct Part {
    objects: HashMap<usize, Rc<PartObject>>,
    build: Vec<Reference>,
}

impl Part {
    fn parse(xml: &str) -> MeshResult<Self> {
        let model = lib3mf::parser::parse_model_xml(xml)?;
        let scale = unit_scale(&model.unit)?;

        let mut objects = HashMap::with_capacity(model.resources.objects.len());
        for object in &model.resources.objects {
            let mesh = match &object.mesh {
                Some(mesh) if !mesh.triangles.is_empty() => Some(object_mesh(mesh, scale)?),
                _ => None,
            };
            let components = object
                .components
                .iter()
                .map(|component| Reference {
                    object_id: component.objectid,
                    path: component.path.clone(),
                    transform: placement(component.transform, scale),
                })
                .collect();

            objects.insert(object.id, Rc::new(PartObject { mesh, components }));
        }

        let build = model
            .build
            .items
            .iter()
            .map(|item| Reference {
                object_id: item.objectid,
                path: item.production_path.clone(),
                transform: placement(item.transform, scale),
            })
            .collect();

        Ok(Self { objects, build })
    }
}

struct Assembly<'a> {
    package: Package<Cursor<&'a [u8]>>,
    /// Model parts other than the root, by archive entry name.
    parts: HashMap<String, Rc<Part>>,
    limits: Limits,
    instances: usize,
    mesh: Mesh,
}

impl Assembly<'_> {
    fn part(&mut self, path: &str) -> MeshResult<Rc<Part>> {
        // Part names are absolute (`/3D/other.model`); archive entry names are not.
        let name = path.trim_start_matches('/');
        if let Some(part) = self.parts.get(name) {
            return Ok(Rc::clone(part));
        }

        let part = Rc::new(Part::parse(&self.package.get_file(name)?)?);
        self.parts.insert(name.to_string(), Rc::clone(&part));
        Ok(part)
    }

    fn instantiate(&mut self, current: &Rc<Part>, reference: &Reference, parent: &Matrix4<f64>, depth: usize) -> MeshResult<()> {
        if depth > MAX_COMPONENT_DEPTH {
            return Err(MeshError::invalid_content(
                FORMAT,
                format!("components nested deeper than {MAX_COMPONENT_DEPTH} levels"),
            ));
        }

        self.instances += 1;
        if self.instances > self.limits.instances {
            return Err(MeshError::invalid_content(
                FORMAT,
                format!("model places more than {} object instances", self.limits.instances),
            ));
        }

        let part = match &reference.path {
            Some(path) => self.part(path)?,
            None => Rc::clone(current),
        };
        let object = part
            .objects
            .get(&reference.object_id)
            .cloned()
            .ok_or_else(|| MeshError::invalid_content(FORMAT, format!("reference to undefined object {}", reference.object_id)))?;
        let transform = parent * reference.transform;

        if let Some(mesh) = &object.mesh {
            if self.mesh.triangles.len() + mesh.triangles.len() > self.limits.triangles {
                return Err(MeshError::invalid_content(
                    FORMAT,
                    format!("model has more than {} triangles once instanced", self.limits.triangles),
                ));
            }
            self.mesh.append(transformed(mesh, &transform));
        }

        for component in &object.components {
            self.instantiate(&part, component, &transform, depth + 1)?;
        }

        Ok(())
    }
}

/// Convert one object's mesh to millimetres and check its triangle indices.
fn object_mesh(mesh: &lib3mf::Mesh, scale: f64) -> MeshResult<Mesh> {
    let converted = Mesh {
        vertices: mesh
            .vertices
            .iter()
            .map(|vertex| Point3::new(vertex.x, vertex.y, vertex.z) * scale)
            .collect(),
        triangles: mesh.triangles.iter().map(|triangle| [triangle.v1, triangle.v2, triangle.v3]).collect(),
    };

    converted.validate()?;
    Ok(converted)
}

fn transformed(mesh: &Mesh, transform: &Matrix4<f64>) -> Mesh {
    let mut mesh = mesh.clone();
    if *transform == Matrix4::identity() {
        return mesh;
    }

    for vertex in &mut mesh.vertices {
        *vertex = transform.transform_point(vertex);
    }

    if transform.fixed_view::<3, 3>(0, 0).determinant() < 0.0 {
        for triangle in &mut mesh.triangles {
            triangle.swap(1, 2);
        }
    }

    mesh
}

/// Convert a 3MF `transform` into a placement in millimetres.
///
/// The twelve values `m00 m01 m02 m10 m11 m12 m20 m21 m22 m30 m31 m32` form a 4x3 matrix applied to
/// row vectors, with the last row holding the translation. nalgebra works on column vectors, so
/// the matrix is transposed into the upper 3x4 block of a homogeneous matrix. The translation is in
/// the unit of the part that holds the reference and is scaled by `scale`.
fn placement(transform: Option<[f64; 12]>, scale: f64) -> Matrix4<f64> {
    let Some(m) = transform else {
        return Matrix4::identity();
    };

    #[rustfmt::skip]
    let matrix = Matrix4::new(
        m[0], m[3], m[6], m[9] * scale,
        m[1], m[4], m[7], m[10] * scale,
        m[2], m[5], m[8], m[11] * scale,
        0.0,  0.0,  0.0,  1.0,
    );

    matrix
}

/// Millimetres per model unit.
fn unit_scale(unit: &str) -> MeshResult<f64> {
    match unit {
        "micron" => Ok(0.001),
        "millimeter" => Ok(1.0),
        "centimeter" => Ok(10.0),
        "inch" => Ok(25.4),
        "foot" => Ok(304.8),
        "meter" => Ok(1000.0),
        other => Err(MeshError::invalid_content(FORMAT, format!("unknown unit '{other}'"))),
    }
}
