//! The map-session controller. Owns the single live [`MapSession`] and the
//! page it is shown on; every mutation of either goes through here.

mod render;
mod selection;
mod session;
mod snapshot;

pub use session::MapSession;
pub use snapshot::SNAPSHOT_CAPTION;

use std::sync::Arc;

use crate::entities::Page;
use crate::map::{Action, EventBus, MapEvent, MapFactory, Raster};

pub struct Controller {
    factory: Arc<dyn MapFactory>,
    bus: EventBus,
    selection_zoom: u8,
    session: Option<MapSession>,
    page: Page,
    snapshot: Option<Raster>,
}

impl Controller {
    pub fn new(factory: Arc<dyn MapFactory>, selection_zoom: u8) -> Self {
        Self {
            factory,
            bus: EventBus::new(),
            selection_zoom,
            session: None,
            page: Page::new(),
            snapshot: None,
        }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub fn session(&self) -> Option<&MapSession> {
        self.session.as_ref()
    }

    pub fn listeners(&self) -> &EventBus {
        &self.bus
    }

    /// Last exported raster, if any.
    pub fn snapshot(&self) -> Option<&Raster> {
        self.snapshot.as_ref()
    }

    /// Delivers a widget event to the attached listeners, then drains whatever
    /// the widget raised while they ran.
    #[tracing::instrument(skip(self))]
    pub fn dispatch(&mut self, event: MapEvent) {
        self.deliver(event);
        self.pump();
    }

    pub fn pump(&mut self) {
        loop {
            let events = match self.session.as_mut() {
                Some(session) => session.widget.take_events(),
                None => return,
            };

            if events.is_empty() {
                return;
            }

            for event in events {
                self.deliver(event);
            }
        }
    }

    fn deliver(&mut self, event: MapEvent) {
        if self.session.is_none() {
            tracing::debug!(?event, "no live session, event dropped");
            return;
        }

        for action in self.bus.deliver(event.kind()) {
            match (action, event) {
                (Action::Select, MapEvent::Click { point })
                | (Action::Select, MapEvent::Geocoded { point }) => self.handle_selection(point),
                (Action::ExportSnapshot, MapEvent::ViewSettled) => self.export_snapshot(),
                (action, event) => {
                    tracing::warn!(?action, ?event, "listener does not handle this event")
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn test_controller() -> Controller {
    use crate::map::RasterMapFactory;

    let factory = RasterMapFactory {
        width: 200,
        height: 150,
    };

    Controller::new(Arc::new(factory), 16)
}

#[cfg(test)]
pub(crate) fn test_extract() -> crate::entities::Extract {
    use crate::entities::{BoundingBox, Extract};

    Extract {
        filename: "belo_horizonte_minas_gerais_osm.json".into(),
        bbox: BoundingBox::new(-20.0, -44.0, -19.0, -43.0).unwrap(),
    }
}
