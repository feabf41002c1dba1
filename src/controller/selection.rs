use super::Controller;
use crate::entities::{Field, GeoPoint, SelectionState};
use crate::map::{Layer, MarkerRole};

pub const INSTRUCTIONS_PICK_DESTINATION: &str = "Now choose the destination.";
pub const INSTRUCTIONS_CALCULATE: &str = "Press calculate to find the shortest path.";

impl Controller {
    /// Feeds one chosen point into the origin/destination cycle. A third point
    /// starts a new cycle as the origin.
    #[tracing::instrument(skip(self))]
    pub fn handle_selection(&mut self, point: GeoPoint) {
        let zoom = self.selection_zoom;
        let page = &mut self.page;

        let session = match self.session.as_mut() {
            Some(session) => session,
            None => {
                tracing::warn!("selection without a live session");
                return;
            }
        };

        match session.selection {
            SelectionState::Empty => {
                let marker = session.widget.add_layer(Layer::Marker {
                    point,
                    role: MarkerRole::Origin,
                });
                session.origin_marker = Some(marker);
                session.widget.set_view(point, zoom);
                session.selection = SelectionState::OriginSet { origin: point };

                page.set_field(Field::Origin, Some(point));
                page.instructions = INSTRUCTIONS_PICK_DESTINATION.into();
            }
            SelectionState::OriginSet { origin } => {
                let marker = session.widget.add_layer(Layer::Marker {
                    point,
                    role: MarkerRole::Destination,
                });
                session.destination_marker = Some(marker);
                session.selection = SelectionState::BothSet {
                    origin,
                    destination: point,
                };

                page.set_field(Field::Destination, Some(point));
                page.calculate_enabled = true;
                page.instructions = INSTRUCTIONS_CALCULATE.into();
            }
            SelectionState::BothSet {
                origin: _,
                destination: _,
            } => {
                session.remove_markers();
                session.selection = SelectionState::Empty;

                page.set_field(Field::Origin, None);
                page.set_field(Field::Destination, None);
                page.calculate_enabled = false;

                self.handle_selection(point);
            }
        }
    }
}

#[cfg(test)]
use super::{test_controller, test_extract};
#[cfg(test)]
use crate::map::MapEvent;

#[cfg(test)]
fn markers(controller: &Controller) -> Vec<(GeoPoint, MarkerRole)> {
    controller
        .session()
        .unwrap()
        .widget()
        .layers()
        .into_iter()
        .filter_map(|(_, layer)| match layer {
            Layer::Marker { point, role } => Some((point, role)),
            _ => None,
        })
        .collect()
}

#[test]
fn first_point_becomes_the_origin() {
    let mut controller = test_controller();
    controller.init_session(&test_extract());

    let p1 = GeoPoint::new(-19.91, -43.93);
    controller.handle_selection(p1);

    let session = controller.session().unwrap();
    assert_eq!(session.selection, SelectionState::OriginSet { origin: p1 });
    assert_eq!(session.view().center, p1);
    assert_eq!(session.view().zoom, 16);
    assert_eq!(markers(&controller), vec![(p1, MarkerRole::Origin)]);
    assert_eq!(controller.page().origin_field, "-19.910000, -43.930000");
    assert!(controller.page().destination_field.is_empty());
    assert!(!controller.page().calculate_enabled);
}

#[test]
fn second_point_enables_calculate() {
    let mut controller = test_controller();
    controller.init_session(&test_extract());

    let p1 = GeoPoint::new(-19.91, -43.93);
    let p2 = GeoPoint::new(-19.95, -43.90);
    controller.handle_selection(p1);
    controller.handle_selection(p2);

    let session = controller.session().unwrap();
    assert_eq!(
        session.selection,
        SelectionState::BothSet {
            origin: p1,
            destination: p2
        }
    );
    assert_eq!(
        markers(&controller),
        vec![(p1, MarkerRole::Origin), (p2, MarkerRole::Destination)]
    );
    assert_eq!(controller.page().destination_field, "-19.950000, -43.900000");
    assert!(controller.page().calculate_enabled);
}

#[test]
fn third_point_starts_over() {
    let mut controller = test_controller();
    controller.init_session(&test_extract());

    let p1 = GeoPoint::new(-19.91, -43.93);
    let p2 = GeoPoint::new(-19.95, -43.90);
    let p3 = GeoPoint::new(-19.80, -43.95);
    controller.handle_selection(p1);
    controller.handle_selection(p2);
    controller.handle_selection(p3);

    let session = controller.session().unwrap();
    assert_eq!(session.selection, SelectionState::OriginSet { origin: p3 });
    assert_eq!(markers(&controller), vec![(p3, MarkerRole::Origin)]);
    assert_eq!(controller.page().origin_field, "-19.800000, -43.950000");
    assert!(controller.page().destination_field.is_empty());
    assert!(!controller.page().calculate_enabled);
}

#[test]
fn geocoded_results_select_like_clicks() {
    let mut controller = test_controller();
    controller.init_session(&test_extract());

    let p1 = GeoPoint::new(-19.91, -43.93);
    let p2 = GeoPoint::new(-19.95, -43.90);
    controller.dispatch(MapEvent::Click { point: p1 });
    controller.dispatch(MapEvent::Geocoded { point: p2 });

    assert!(controller.session().unwrap().selection.is_complete());
}

#[test]
fn selection_without_session_is_ignored() {
    let mut controller = test_controller();
    controller.handle_selection(GeoPoint::new(-19.91, -43.93));

    assert!(controller.session().is_none());
    assert!(controller.page().origin_field.is_empty());
}
