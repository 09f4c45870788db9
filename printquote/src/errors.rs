use crate::api::models::quotes::ErrorResponse;
use crate::mesh::MeshError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Filename suffix is not one of the supported mesh formats
    #[error("Unsupported file type")]
    UnsupportedFileType { filename: String },

    /// A required multipart field was not sent
    #[error("Missing required field: '{field}'")]
    MissingField { field: &'static str },

    /// Material key is not in the material table
    #[error("Unknown material: {key}")]
    UnknownMaterial { key: String },

    /// Malformed multipart body, or a body over the upload size limit
    #[error("{message}")]
    Multipart { message: String },

    /// The uploaded file could not be decoded as a mesh
    #[error(transparent)]
    Mesh(#[from] MeshError),

    /// The mesh decoded but its volume cannot be quoted
    #[error("{message}")]
    InvalidVolume { message: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },
}

impl Error {
    /// Returns the message shown to the user.
    ///
    /// Decoding errors are forwarded verbatim so the user can see what is wrong with their file.
    pub fn user_message(&self) -> String {
        match self {
            Error::Internal { .. } => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Error::Internal { .. } => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Mesh(_) | Error::InvalidVolume { .. } => {
                tracing::warn!("Mesh rejected: {}", self);
            }
            Error::UnsupportedFileType { filename } => {
                tracing::debug!(filename = %filename, "Client error: {}", self);
            }
            Error::MissingField { .. } | Error::UnknownMaterial { .. } | Error::Multipart { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        // Failures are reported in the payload shape, never in the status code
        let body = ErrorResponse {
            error: self.user_message(),
        };
        (StatusCode::OK, Json(body)).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        let err = Error::UnsupportedFileType {
            filename: "model.step".to_string(),
        };
        assert_eq!(err.user_message(), "Unsupported file type");

        let err = Error::MissingField { field: "material" };
        assert_eq!(err.user_message(), "Missing required field: 'material'");

        let err = Error::UnknownMaterial { key: "ABS".to_string() };
        assert_eq!(err.user_message(), "Unknown material: ABS");

        let err = Error::from(MeshError::Empty);
        assert_eq!(err.user_message(), "mesh contains no triangles");
    }

    #[test]
    fn test_internal_errors_are_not_leaked() {
        let err = Error::Internal {
            operation: "join mesh decoding task: panicked".to_string(),
        };
        assert_eq!(err.user_message(), "Internal server error");
    }

    #[test]
    fn test_error_response_is_transport_success() {
        let response = Error::UnknownMaterial { key: "ABS".to_string() }.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
