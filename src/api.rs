use async_trait::async_trait;

use crate::entities::{Field, GeoPoint, Page};
use crate::error::Error;

/// State/city selectors and the submit action.
#[async_trait]
pub trait FormAPI {
    async fn load_states(&self) -> Result<Page, Error>;
    async fn select_state(&self, state_id: u32) -> Result<Page, Error>;
    async fn select_city(&self, name: String) -> Result<Page, Error>;
    async fn submit(&self) -> Result<Page, Error>;
}

/// Interactions with the live map.
#[async_trait]
pub trait MapAPI {
    async fn click(&self, point: GeoPoint) -> Result<Page, Error>;
    async fn search_address(&self, query: String) -> Result<Page, Error>;
    async fn edit_field(&self, field: Field, text: String) -> Result<Page, Error>;
    async fn calculate(&self) -> Result<Page, Error>;
    async fn reset(&self) -> Result<Page, Error>;
}

#[async_trait]
pub trait PageAPI {
    async fn page(&self) -> Page;
    /// PNG bytes of the last exported snapshot.
    async fn snapshot(&self) -> Result<Vec<u8>, Error>;
}

pub trait API: FormAPI + MapAPI + PageAPI {}
