use axum::extract::{Extension, Json, Path};
use serde::{Deserialize, Serialize};

use crate::entities::{Field, GeoPoint, Page};
use crate::error::Error;
use crate::server::DynAPI;

#[derive(Serialize, Deserialize)]
pub struct SearchParams {
    query: String,
}

#[derive(Serialize, Deserialize)]
pub struct EditFieldParams {
    text: String,
}

pub async fn click(
    Extension(api): Extension<DynAPI>,
    Json(point): Json<GeoPoint>,
) -> Result<Json<Page>, Error> {
    let page = api.click(point).await?;

    Ok(page.into())
}

pub async fn search(
    Extension(api): Extension<DynAPI>,
    Json(params): Json<SearchParams>,
) -> Result<Json<Page>, Error> {
    let page = api.search_address(params.query).await?;

    Ok(page.into())
}

pub async fn edit_field(
    Extension(api): Extension<DynAPI>,
    Path(field): Path<Field>,
    Json(params): Json<EditFieldParams>,
) -> Result<Json<Page>, Error> {
    let page = api.edit_field(field, params.text).await?;

    Ok(page.into())
}

pub async fn calculate(Extension(api): Extension<DynAPI>) -> Result<Json<Page>, Error> {
    let page = api.calculate().await?;

    Ok(page.into())
}

pub async fn reset(Extension(api): Extension<DynAPI>) -> Result<Json<Page>, Error> {
    let page = api.reset().await?;

    Ok(page.into())
}
