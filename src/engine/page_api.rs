use super::Engine;

use async_trait::async_trait;

use crate::{
    api::PageAPI,
    entities::Page,
    error::{not_found_error, Error},
};

#[async_trait]
impl PageAPI for Engine {
    async fn page(&self) -> Page {
        self.controller.lock().await.page().clone()
    }

    async fn snapshot(&self) -> Result<Vec<u8>, Error> {
        let controller = self.controller.lock().await;
        let raster = controller.snapshot().ok_or_else(not_found_error)?;

        Ok(raster.png.clone())
    }
}
