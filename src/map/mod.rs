//! The interactive map as the controller sees it: a widget that holds layers,
//! frames a view, queues the events it raises, and can rasterise itself.

mod listeners;
mod raster;

pub use listeners::{Action, EventBus, Subscription};
pub use raster::{RasterMap, RasterMapFactory};

use serde::{Deserialize, Serialize};

use crate::entities::{BoundingBox, GeoPoint};
use crate::error::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LayerId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerRole {
    Origin,
    Destination,
    Start,
    End,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Layer {
    Marker { point: GeoPoint, role: MarkerRole },
    Polyline { points: Vec<GeoPoint> },
    /// Highlighted vertices drawn and removed as one overlay.
    VertexGroup { points: Vec<GeoPoint> },
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MapEvent {
    Click { point: GeoPoint },
    Geocoded { point: GeoPoint },
    /// The view stopped moving after a pan, zoom or fit.
    ViewSettled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    Geocoded,
    ViewSettled,
}

impl MapEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Click { point: _ } => EventKind::Click,
            Self::Geocoded { point: _ } => EventKind::Geocoded,
            Self::ViewSettled => EventKind::ViewSettled,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub center: GeoPoint,
    pub zoom: u8,
    pub bounds: BoundingBox,
}

/// PNG bytes of the visible area.
#[derive(Clone, Debug, PartialEq)]
pub struct Raster {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

pub trait MapWidget: Send {
    fn view(&self) -> View;
    fn set_view(&mut self, center: GeoPoint, zoom: u8);
    fn fit_bounds(&mut self, bounds: BoundingBox);
    /// Recomputes the widget size; needed once the container becomes visible.
    fn invalidate_size(&mut self);
    fn add_layer(&mut self, layer: Layer) -> LayerId;
    fn remove_layer(&mut self, id: LayerId) -> Option<Layer>;
    fn layers(&self) -> Vec<(LayerId, Layer)>;
    /// Drains the events raised since the last call, oldest first.
    fn take_events(&mut self) -> Vec<MapEvent>;
    fn render(&self) -> Result<Raster, Error>;
}

pub trait MapFactory: Send + Sync {
    fn create(&self, frame: BoundingBox) -> Box<dyn MapWidget>;
}
