//! OpenAPI documentation for the quote API.
//!
//! The document is served as JSON at `/api-docs/openapi.json` and rendered with Scalar at `/docs`.

use utoipa::OpenApi;

use crate::api;
use crate::materials::Material;
use crate::mesh::MeshFormat;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "printquote",
        description = "Instant 3D print quotes. Upload an STL, OBJ or 3MF model with a material and get back \
            the estimated weight and price."
    ),
    paths(api::handlers::quotes::upload, api::handlers::materials::list_materials),
    components(schemas(
        api::models::quotes::QuoteResponse,
        api::models::quotes::ErrorResponse,
        api::models::quotes::UploadForm,
        api::models::materials::MaterialResponse,
        Material,
        MeshFormat,
    )),
    tags(
        (name = "quotes", description = "Model upload and quoting"),
        (name = "materials", description = "Material table"),
    )
)]
pub struct ApiDoc;
