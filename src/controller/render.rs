use super::Controller;
use crate::entities::{Edge, Path};
use crate::error::{invalid_state_error, Error};
use crate::map::{Action, EventKind, Layer, MarkerRole};

impl Controller {
    /// Draws a computed route on the live session: the path as one line, every
    /// vertex in a single overlay, start and end markers, then fits the view
    /// and exports a snapshot once it settles.
    ///
    /// An empty edge list changes nothing. A list whose edges do not chain is
    /// rejected before anything is removed.
    #[tracing::instrument(skip(self, edges), fields(edges = edges.len()))]
    pub fn render_route(&mut self, edges: &[Edge]) -> Result<(), Error> {
        let session = self.session.as_mut().ok_or_else(invalid_state_error)?;

        let path = match Path::from_edges(edges)? {
            Some(path) => path,
            None => {
                tracing::info!("empty route, nothing to draw");
                return Ok(());
            }
        };

        session.remove_route();
        session.remove_markers();

        let vertices = path.vertices();
        session.route_line = Some(session.widget.add_layer(Layer::Polyline {
            points: vertices.clone(),
        }));
        session.vertex_group = Some(
            session
                .widget
                .add_layer(Layer::VertexGroup { points: vertices }),
        );
        session.origin_marker = Some(session.widget.add_layer(Layer::Marker {
            point: path.start(),
            role: MarkerRole::Start,
        }));
        session.destination_marker = Some(session.widget.add_layer(Layer::Marker {
            point: path.end(),
            role: MarkerRole::End,
        }));

        session.widget.fit_bounds(path.bounds());
        session.pending_snapshot = Some(
            self.bus
                .subscribe_once(EventKind::ViewSettled, Action::ExportSnapshot),
        );

        self.page.vertex_count = Some(path.vertex_count());
        self.page.edge_count = Some(path.edge_count());

        tracing::info!(
            vertices = path.vertex_count(),
            length_m = path.length_meters(),
            "route drawn"
        );

        self.pump();
        Ok(())
    }
}

#[cfg(test)]
use super::{test_controller, test_extract};
#[cfg(test)]
use crate::entities::{chain, GeoPoint};

#[cfg(test)]
fn drawn(controller: &Controller) -> Vec<Layer> {
    controller
        .session()
        .unwrap()
        .widget()
        .layers()
        .into_iter()
        .map(|(_, layer)| layer)
        .collect()
}

#[test]
fn route_has_one_more_vertex_than_edges() {
    let mut controller = test_controller();
    controller.init_session(&test_extract());

    for n in 1..=5 {
        let points: Vec<(f64, f64)> = (0..=n)
            .map(|i| (-19.9 + i as f64 * 0.01, -43.9 - i as f64 * 0.005))
            .collect();
        let edges = chain(&points);

        controller.render_route(&edges).unwrap();

        assert_eq!(controller.page().vertex_count, Some(n + 1));
        assert_eq!(controller.page().edge_count, Some(n));

        let layers = drawn(&controller);
        let line = layers.iter().find_map(|l| match l {
            Layer::Polyline { points } => Some(points.len()),
            _ => None,
        });
        assert_eq!(line, Some(n + 1));
    }
}

#[test]
fn route_replaces_previous_layers() {
    let mut controller = test_controller();
    controller.init_session(&test_extract());

    controller.handle_selection(GeoPoint::new(-19.90, -43.90));
    controller.handle_selection(GeoPoint::new(-19.92, -43.92));

    let edges = chain(&[(-19.90, -43.90), (-19.91, -43.91), (-19.92, -43.92)]);
    controller.render_route(&edges).unwrap();
    controller.render_route(&edges).unwrap();

    let layers = drawn(&controller);
    assert_eq!(layers.len(), 4);
    assert!(layers.contains(&Layer::Marker {
        point: GeoPoint::new(-19.90, -43.90),
        role: MarkerRole::Start
    }));
    assert!(layers.contains(&Layer::Marker {
        point: GeoPoint::new(-19.92, -43.92),
        role: MarkerRole::End
    }));
    assert!(layers
        .iter()
        .any(|l| matches!(l, Layer::VertexGroup { points } if points.len() == 3)));
}

#[test]
fn route_fits_the_view() {
    let mut controller = test_controller();
    controller.init_session(&test_extract());

    let edges = chain(&[(-19.90, -43.90), (-19.95, -43.85)]);
    controller.render_route(&edges).unwrap();

    let view = controller.session().unwrap().view();
    assert!(view.bounds.contains(&GeoPoint::new(-19.90, -43.90)));
    assert!(view.bounds.contains(&GeoPoint::new(-19.95, -43.85)));
    assert!(view.center.approx_eq(&GeoPoint::new(-19.925, -43.875)));
}

#[test]
fn empty_route_changes_nothing() {
    let mut controller = test_controller();
    controller.init_session(&test_extract());
    controller.handle_selection(GeoPoint::new(-19.90, -43.90));

    let before_layers = drawn(&controller);
    let before_view = controller.session().unwrap().view();

    controller.render_route(&[]).unwrap();

    assert_eq!(drawn(&controller), before_layers);
    assert_eq!(controller.session().unwrap().view(), before_view);
    assert_eq!(controller.page().vertex_count, None);
    assert!(controller.snapshot().is_none());
}

#[test]
fn broken_chain_leaves_the_map_alone() {
    let mut controller = test_controller();
    controller.init_session(&test_extract());
    controller.handle_selection(GeoPoint::new(-19.90, -43.90));
    controller.handle_selection(GeoPoint::new(-19.92, -43.92));

    let mut edges = chain(&[(-19.90, -43.90), (-19.91, -43.91), (-19.92, -43.92)]);
    edges[1].origin = GeoPoint::new(-19.0, -43.0);

    let before = drawn(&controller);
    let err = controller.render_route(&edges).unwrap_err();

    assert_eq!(err.code, 103);
    assert_eq!(drawn(&controller), before);
}

#[test]
fn render_without_session_fails() {
    let mut controller = test_controller();
    let edges = chain(&[(-19.90, -43.90), (-19.91, -43.91)]);

    assert_eq!(controller.render_route(&edges).unwrap_err().code, 100);
}

#[test]
fn settled_route_is_exported() {
    let mut controller = test_controller();
    controller.init_session(&test_extract());

    let edges = chain(&[(-19.90, -43.90), (-19.91, -43.91)]);
    controller.render_route(&edges).unwrap();

    assert!(controller.snapshot().is_some());
    assert!(controller.page().snapshot.is_some());
    // the one-shot listener is gone, only click and geocode remain
    assert_eq!(controller.listeners().len(), 2);
}
