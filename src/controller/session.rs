use uuid::Uuid;

use super::Controller;
use crate::entities::{Extract, GeoPoint, SelectionState};
use crate::map::{Action, EventKind, LayerId, MapWidget, Subscription, View};

pub const INSTRUCTIONS_PICK_ORIGIN: &str =
    "Click on the map or search for an address to choose the origin.";

/// One live map widget with everything attached to it.
pub struct MapSession {
    pub id: Uuid,
    pub filename: String,
    pub selection: SelectionState,
    pub(super) widget: Box<dyn MapWidget>,
    pub(super) origin_marker: Option<LayerId>,
    pub(super) destination_marker: Option<LayerId>,
    pub(super) route_line: Option<LayerId>,
    pub(super) vertex_group: Option<LayerId>,
    pub(super) listeners: Vec<Subscription>,
    /// One-shot settle listener of the last drawn route.
    pub(super) pending_snapshot: Option<Subscription>,
}

impl MapSession {
    pub fn widget(&self) -> &dyn MapWidget {
        self.widget.as_ref()
    }

    pub fn view(&self) -> View {
        self.widget.view()
    }

    pub(super) fn remove_markers(&mut self) {
        for id in [self.origin_marker.take(), self.destination_marker.take()]
            .into_iter()
            .flatten()
        {
            self.widget.remove_layer(id);
        }
    }

    pub(super) fn remove_route(&mut self) {
        for id in [self.route_line.take(), self.vertex_group.take()]
            .into_iter()
            .flatten()
        {
            self.widget.remove_layer(id);
        }
        self.pending_snapshot = None;
    }

    fn teardown(mut self) {
        self.remove_route();
        self.remove_markers();
        self.listeners.clear();
        self.widget.take_events();
    }
}

impl Controller {
    /// Tears down the live session, if any, and clears the controls bound to it.
    #[tracing::instrument(skip(self))]
    pub fn reset_session(&mut self, hide_viewport: bool) {
        if let Some(session) = self.session.take() {
            tracing::info!(session = %session.id, "tearing down map session");
            session.teardown();
        }

        let page = &mut self.page;
        page.origin_field.clear();
        page.destination_field.clear();
        page.calculate_enabled = false;
        page.status.clear();
        page.alert = None;
        page.clear_route_summary();

        if hide_viewport {
            page.viewport_visible = false;
            page.instructions_visible = false;
            page.snapshot = None;
            self.snapshot = None;
        }
    }

    /// Creates a fresh session framed to the extract. Returns the initial view centre.
    #[tracing::instrument(skip(self), fields(filename = %extract.filename))]
    pub fn init_session(&mut self, extract: &Extract) -> GeoPoint {
        self.reset_session(false);

        let center = extract.bbox.center();
        let mut widget = self.factory.create(extract.bbox);

        let listeners = vec![
            self.bus.subscribe(EventKind::Click, Action::Select),
            self.bus.subscribe(EventKind::Geocoded, Action::Select),
        ];

        self.page.viewport_visible = true;
        self.page.instructions_visible = true;
        self.page.instructions = INSTRUCTIONS_PICK_ORIGIN.into();

        // tiles only lay out correctly once the container is visible
        widget.invalidate_size();
        widget.take_events();

        let session = MapSession {
            id: Uuid::new_v4(),
            filename: extract.filename.clone(),
            selection: SelectionState::Empty,
            widget,
            origin_marker: None,
            destination_marker: None,
            route_line: None,
            vertex_group: None,
            listeners,
            pending_snapshot: None,
        };

        tracing::info!(session = %session.id, lat = center.lat, lng = center.lng, "map session created");

        self.session = Some(session);
        center
    }
}

#[cfg(test)]
use super::{test_controller, test_extract};
#[cfg(test)]
use crate::entities::chain;
#[cfg(test)]
use crate::map::MapEvent;

#[test]
fn init_centers_on_the_extract() {
    let mut controller = test_controller();
    let center = controller.init_session(&test_extract());

    assert_eq!(center, GeoPoint::new(-19.5, -43.5));

    let session = controller.session().unwrap();
    assert_eq!(session.view().center, GeoPoint::new(-19.5, -43.5));
    assert_eq!(session.selection, SelectionState::Empty);
    assert!(controller.page().viewport_visible);
    assert!(controller.page().instructions_visible);
    assert_eq!(controller.listeners().len(), 2);
}

#[test]
fn reset_is_idempotent() {
    let mut controller = test_controller();
    controller.reset_session(true);
    controller.reset_session(true);

    assert!(controller.session().is_none());
    assert!(controller.listeners().is_empty());
    assert!(!controller.page().viewport_visible);
}

#[test]
fn reset_detaches_everything() {
    let mut controller = test_controller();
    controller.init_session(&test_extract());
    controller.dispatch(MapEvent::Click {
        point: GeoPoint::new(-19.6, -43.6),
    });
    assert!(!controller.page().origin_field.is_empty());

    controller.reset_session(true);

    let page = controller.page();
    assert!(controller.session().is_none());
    assert!(controller.listeners().is_empty());
    assert!(page.origin_field.is_empty());
    assert!(page.destination_field.is_empty());
    assert!(!page.calculate_enabled);
    assert!(page.status.is_empty());
    assert!(!page.viewport_visible);
    assert!(!page.instructions_visible);

    // clicks after reset go nowhere
    controller.dispatch(MapEvent::Click {
        point: GeoPoint::new(-19.6, -43.6),
    });
    assert!(controller.page().origin_field.is_empty());
}

#[test]
fn reset_drops_the_previous_snapshot() {
    let mut controller = test_controller();
    controller.init_session(&test_extract());
    controller
        .render_route(&chain(&[(-19.90, -43.90), (-19.91, -43.91)]))
        .unwrap();
    assert!(controller.snapshot().is_some());
    assert!(controller.page().snapshot.is_some());

    controller.reset_session(true);

    assert!(controller.snapshot().is_none());
    assert!(controller.page().snapshot.is_none());
}

#[test]
fn reset_without_hiding_keeps_the_viewport() {
    let mut controller = test_controller();
    controller.init_session(&test_extract());
    controller.reset_session(false);

    assert!(controller.session().is_none());
    assert!(controller.page().viewport_visible);
}

#[test]
fn reinit_leaves_a_single_session() {
    let mut controller = test_controller();

    controller.init_session(&test_extract());
    let first = controller.session().unwrap().id;

    controller.reset_session(true);
    controller.init_session(&test_extract());

    // init without a reset in between still replaces the old session
    controller.init_session(&test_extract());

    assert_ne!(controller.session().unwrap().id, first);
    assert_eq!(controller.listeners().count(EventKind::Click), 1);
    assert_eq!(controller.listeners().count(EventKind::Geocoded), 1);

    controller.dispatch(MapEvent::Click {
        point: GeoPoint::new(-19.6, -43.6),
    });

    let session = controller.session().unwrap();
    assert_eq!(
        session.selection,
        SelectionState::OriginSet {
            origin: GeoPoint::new(-19.6, -43.6)
        }
    );
    assert_eq!(session.widget().layers().len(), 1);
}
