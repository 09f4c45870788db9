//! Error types for mesh decoding.

use thiserror::Error;

/// Result type for mesh decoding operations.
pub type MeshResult<T> = Result<T, MeshError>;

/// Errors that can occur while decoding an uploaded mesh.
///
/// The `Display` output of every variant is shown to the user as-is, so messages are written to
/// be readable without further context.
#[derive(Debug, Error)]
pub enum MeshError {
    /// The file content could not be interpreted as the declared format.
    #[error("invalid {format} file: {message}")]
    InvalidContent { format: &'static str, message: String },

    /// A face references a vertex that does not exist.
    #[error("triangle {triangle} references vertex {index}, but the mesh only has {vertex_count} vertices")]
    IndexOutOfRange {
        triangle: usize,
        index: usize,
        vertex_count: usize,
    },

    /// The decoded mesh has no triangles to measure.
    #[error("mesh contains no triangles")]
    Empty,

    /// The 3MF container is not a readable ZIP archive.
    #[error("invalid 3MF archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The 3MF package or one of its model parts could not be read.
    #[error("invalid 3MF file: {0}")]
    ThreeMf(#[from] lib3mf::Error),

    /// I/O error while reading the upload.
    #[error("failed to read mesh data: {0}")]
    Io(#[from] std::io::Error),
}

impl MeshError {
    /// Create an `InvalidContent` error for the given format.
    pub fn invalid_content(format: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidContent {
            format,
            message: message.into(),
        }
    }
}
