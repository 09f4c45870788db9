//! HTTP handler for model uploads.

use axum::{
    Json,
    extract::{
        Multipart,
        multipart::{MultipartError, MultipartRejection},
    },
};
use tracing::instrument;

use crate::api::models::quotes::{QuoteResponse, UploadForm};
use crate::errors::{Error, Result};
use crate::quote::{self, Upload};

#[utoipa::path(
    post,
    path = "/upload",
    tag = "quotes",
    summary = "Quote a model",
    description = "Upload an STL, OBJ or 3MF model and a material. The model's volume is converted to a weight \
        using the material density, and the weight to a price.

The response status is always 200. A failed quote (unsupported file type, unknown material, unreadable \
        model) returns an object with a single `error` field instead of `weight` and `price`.",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Quote computed. On failure the body is an `ErrorResponse` instead.", body = QuoteResponse),
    )
)]
#[instrument(skip_all)]
pub async fn upload(multipart: std::result::Result<Multipart, MultipartRejection>) -> Result<Json<QuoteResponse>> {
    let multipart = multipart.map_err(|e| Error::Multipart {
        message: format!("Expected a multipart form upload: {}", e.body_text()),
    })?;

    let upload = read_upload(multipart).await?;

    // Decoding and volume integration are CPU bound, keep them off the async workers
    let quote = tokio::task::spawn_blocking(move || quote::quote_upload(&upload))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("join mesh decoding task: {e}"),
        })??;

    Ok(Json(quote.into()))
}

/// Collect the `file` and `material` fields, buffering the file in memory.
async fn read_upload(mut multipart: Multipart) -> Result<Upload> {
    let mut file = None;
    let mut material = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let data = field.bytes().await.map_err(multipart_error)?;

                tracing::debug!(filename = %filename, size = data.len(), "Received model file");
                file = Some((filename, data));
            }
            "material" => {
                material = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {
                // Ignore unknown fields (forward compatibility)
            }
        }
    }

    let (filename, data) = file.ok_or(Error::MissingField { field: "file" })?;
    let material = material.ok_or(Error::MissingField { field: "material" })?;

    Ok(Upload { filename, material, data })
}

fn multipart_error(e: MultipartError) -> Error {
    Error::Multipart {
        message: format!("Failed to read upload: {}", e.body_text()),
    }
}
