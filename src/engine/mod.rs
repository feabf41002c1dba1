mod form_api;
mod map_api;
mod page_api;
mod tokens;

#[cfg(test)]
pub(crate) mod fakes;

pub use tokens::{Operation, RequestToken, RequestTokens};

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    api::API,
    config::Config,
    controller::Controller,
    error::Error,
    external::{
        backend::HttpBackend, ibge::Ibge, nominatim::Nominatim, BackendGateway, Geocoder,
        LocalityGateway,
    },
    map::{MapFactory, RasterMapFactory},
};

pub type DynBackend = Arc<dyn BackendGateway + Send + Sync>;
pub type DynLocalities = Arc<dyn LocalityGateway + Send + Sync>;
pub type DynGeocoder = Arc<dyn Geocoder + Send + Sync>;

/// Drives the controller from async callers. The controller lock is never held
/// while a request is in flight; responses are matched against request tokens
/// when they come back.
pub struct Engine {
    backend: DynBackend,
    localities: DynLocalities,
    geocoder: DynGeocoder,
    controller: Mutex<Controller>,
    tokens: RequestTokens,
}

impl Engine {
    #[tracing::instrument(name = "Engine::new", skip_all)]
    pub fn new(config: &Config) -> Result<Self, Error> {
        let backend = Arc::new(HttpBackend::new(&config.backend_url)?);
        let localities = Arc::new(Ibge::new(&config.ibge_url)?);
        let geocoder = Arc::new(Nominatim::new(&config.geocoder_url)?);

        let factory = Arc::new(RasterMapFactory {
            width: config.snapshot_width,
            height: config.snapshot_height,
        });

        tracing::info!(backend = %config.backend_url, "engine ready");

        Ok(Self::with_gateways(
            factory,
            config.selection_zoom,
            backend,
            localities,
            geocoder,
        ))
    }

    pub fn with_gateways(
        factory: Arc<dyn MapFactory>,
        selection_zoom: u8,
        backend: DynBackend,
        localities: DynLocalities,
        geocoder: DynGeocoder,
    ) -> Self {
        Self {
            backend,
            localities,
            geocoder,
            controller: Mutex::new(Controller::new(factory, selection_zoom)),
            tokens: RequestTokens::new(),
        }
    }
}

impl API for Engine {}
