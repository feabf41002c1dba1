//! Clients of the services the controller depends on but does not own.

pub mod backend;
pub mod ibge;
pub mod nominatim;

use async_trait::async_trait;

use crate::entities::{City, Extract, GeoPoint, RouteResult, State};
use crate::error::Error;

#[async_trait]
pub trait BackendGateway {
    async fn extract(&self, city: &str, state: &str) -> Result<Extract, Error>;
    async fn shortest_path(
        &self,
        filename: &str,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> Result<RouteResult, Error>;
}

#[async_trait]
pub trait LocalityGateway {
    async fn states(&self) -> Result<Vec<State>, Error>;
    async fn cities(&self, state_id: u32) -> Result<Vec<City>, Error>;
}

#[async_trait]
pub trait Geocoder {
    /// Best match for a free-text address, `None` when nothing matches.
    async fn geocode(&self, query: &str) -> Result<Option<GeoPoint>, Error>;
}
