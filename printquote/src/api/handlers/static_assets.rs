//! The upload page and its assets, compiled into the binary from `static/`.

use axum::{
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use rust_embed::RustEmbed;
use tracing::instrument;

#[derive(RustEmbed)]
#[folder = "static/"]
struct QuotePage;

const INDEX: &str = "index.html";

/// Map a request path onto an embedded file name. `/` is the upload page.
fn asset_name(uri: &Uri) -> &str {
    match uri.path().trim_start_matches('/') {
        "" => INDEX,
        name => name,
    }
}

/// Serve the embedded upload page and its assets, or 404.
///
/// Assets change only with the binary, so responses are marked `no-cache` and revalidated.
#[instrument]
pub async fn serve_embedded_asset(uri: Uri) -> Response {
    let name = asset_name(&uri);
    let Some(file) = QuotePage::get(name) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let content_type = mime_guess::from_path(name).first_or_octet_stream();
    (
        [
            (header::CONTENT_TYPE, content_type.essence_str().to_string()),
            (header::CACHE_CONTROL, "no-cache".to_string()),
        ],
        file.data.into_owned(),
    )
        .into_response()
}
