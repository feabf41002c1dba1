use axum::extract::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::entities::Page;
use crate::error::Error;
use crate::server::DynAPI;

#[derive(Serialize, Deserialize)]
pub struct SelectStateParams {
    id: u32,
}

#[derive(Serialize, Deserialize)]
pub struct SelectCityParams {
    name: String,
}

pub async fn load_states(Extension(api): Extension<DynAPI>) -> Result<Json<Page>, Error> {
    let page = api.load_states().await?;

    Ok(page.into())
}

pub async fn select_state(
    Extension(api): Extension<DynAPI>,
    Json(params): Json<SelectStateParams>,
) -> Result<Json<Page>, Error> {
    let page = api.select_state(params.id).await?;

    Ok(page.into())
}

pub async fn select_city(
    Extension(api): Extension<DynAPI>,
    Json(params): Json<SelectCityParams>,
) -> Result<Json<Page>, Error> {
    let page = api.select_city(params.name).await?;

    Ok(page.into())
}

pub async fn submit(Extension(api): Extension<DynAPI>) -> Result<Json<Page>, Error> {
    let page = api.submit().await?;

    Ok(page.into())
}
