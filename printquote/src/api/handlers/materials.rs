//! HTTP handler for the material table.

use axum::Json;

use crate::api::models::materials::MaterialResponse;
use crate::materials::Material;

#[utoipa::path(
    get,
    path = "/materials",
    tag = "materials",
    summary = "List materials",
    description = "Materials that can be quoted, with their price per gram and density.",
    responses(
        (status = 200, description = "Material table", body = [MaterialResponse]),
    )
)]
#[tracing::instrument]
pub async fn list_materials() -> Json<Vec<MaterialResponse>> {
    Json(Material::ALL.into_iter().map(MaterialResponse::from).collect())
}
