use axum::extract::{Extension, Json};
use axum::http::header;

use crate::entities::Page;
use crate::error::Error;
use crate::server::DynAPI;

pub async fn show(Extension(api): Extension<DynAPI>) -> Json<Page> {
    api.page().await.into()
}

pub async fn snapshot(
    Extension(api): Extension<DynAPI>,
) -> Result<([(header::HeaderName, &'static str); 1], Vec<u8>), Error> {
    let png = api.snapshot().await?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}
