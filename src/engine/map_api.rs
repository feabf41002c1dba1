use super::{Engine, Operation};

use async_trait::async_trait;

use crate::{
    api::MapAPI,
    entities::{Field, GeoPoint, Page},
    error::{invalid_coordinates_error, invalid_state_error, not_found_error, Error},
    map::MapEvent,
};

pub const ALERT_INVALID_COORDINATES: &str =
    "Invalid coordinates. Use the format \"latitude, longitude\".";
pub const INSTRUCTIONS_CALCULATING: &str = "Calculating the shortest path...";

#[async_trait]
impl MapAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn click(&self, point: GeoPoint) -> Result<Page, Error> {
        if !point.is_valid() {
            return Err(invalid_coordinates_error(&point.to_string()));
        }

        let mut controller = self.controller.lock().await;
        if controller.session().is_none() {
            return Err(invalid_state_error());
        }

        controller.dispatch(MapEvent::Click { point });

        Ok(controller.page().clone())
    }

    #[tracing::instrument(skip(self))]
    async fn search_address(&self, query: String) -> Result<Page, Error> {
        if self.controller.lock().await.session().is_none() {
            return Err(invalid_state_error());
        }

        let found = self.geocoder.geocode(&query).await?;

        let mut controller = self.controller.lock().await;
        if controller.session().is_none() {
            return Err(invalid_state_error());
        }

        match found {
            Some(point) => {
                controller.dispatch(MapEvent::Geocoded { point });
                Ok(controller.page().clone())
            }
            None => {
                tracing::info!(%query, "address not found");
                Err(not_found_error())
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn edit_field(&self, field: Field, text: String) -> Result<Page, Error> {
        let mut controller = self.controller.lock().await;
        let page = controller.page_mut();

        match field {
            Field::Origin => page.origin_field = text,
            Field::Destination => page.destination_field = text,
        }

        Ok(page.clone())
    }

    /// Requests the shortest path between the two coordinate fields and draws
    /// it. Fields that do not parse never reach the backend.
    #[tracing::instrument(skip(self))]
    async fn calculate(&self) -> Result<Page, Error> {
        let (token, session_id, filename, origin, destination) = {
            let mut controller = self.controller.lock().await;
            controller.page_mut().alert = None;

            let (session_id, filename) = match controller.session() {
                Some(session) => (session.id, session.filename.clone()),
                None => return Err(invalid_state_error()),
            };

            let page = controller.page_mut();
            if !page.calculate_enabled {
                return Err(invalid_state_error());
            }

            let origin = page.field(Field::Origin).parse::<GeoPoint>();
            let destination = page.field(Field::Destination).parse::<GeoPoint>();

            let (origin, destination) = match (origin, destination) {
                (Ok(origin), Ok(destination)) => (origin, destination),
                (Err(err), _) | (_, Err(err)) => {
                    tracing::warn!("rejecting coordinates: {}", err);
                    page.alert = Some(ALERT_INVALID_COORDINATES.into());
                    return Err(err);
                }
            };

            page.loading = true;
            page.instructions = INSTRUCTIONS_CALCULATING.into();

            let token = self.tokens.issue(Operation::Route);
            page.clear_route_summary();

            (token, session_id, filename, origin, destination)
        };

        let result = self
            .backend
            .shortest_path(&filename, origin, destination)
            .await;

        let mut controller = self.controller.lock().await;

        if !self.tokens.is_latest(token) {
            tracing::info!("discarding route of a superseded request");
            return Ok(controller.page().clone());
        }

        controller.page_mut().loading = false;

        if controller.session().map(|s| s.id) != Some(session_id) {
            tracing::info!(session = %session_id, "discarding route of a closed session");
            return Ok(controller.page().clone());
        }

        let route = match result {
            Ok(route) => route,
            Err(err) => {
                tracing::warn!("route request failed: {}", err);
                controller.page_mut().instructions = err.message.clone();
                return Err(err);
            }
        };

        if let Err(err) = controller.render_route(&route.edges) {
            tracing::error!("could not draw route: {}", err);
            controller.page_mut().instructions = err.message.clone();
            return Err(err);
        }

        let page = controller.page_mut();
        let distance = route.distance_text();
        page.instructions = match (page.vertex_count, page.edge_count) {
            (Some(vertices), Some(edges)) => format!(
                "Distance: {} | Vertices: {} | Edges: {}",
                distance, vertices, edges
            ),
            _ => format!("Distance: {}", distance),
        };
        page.distance_text = Some(distance);

        Ok(page.clone())
    }

    #[tracing::instrument(skip(self))]
    async fn reset(&self) -> Result<Page, Error> {
        let mut controller = self.controller.lock().await;

        // answers to anything still in flight belong to the old session
        self.tokens.issue(Operation::Extract);
        self.tokens.issue(Operation::Route);

        controller.reset_session(true);
        controller.page_mut().loading = false;

        Ok(controller.page().clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio_test::block_on;

    use super::*;
    use crate::api::{FormAPI, PageAPI};
    use crate::controller::SNAPSHOT_CAPTION;
    use crate::engine::fakes::{engine_with, route_of, FakeBackend, FakeLocalities};
    use crate::entities::{RouteResult, SelectionState};
    use crate::error::rejected_error;
    use crate::map::{Layer, MarkerRole};

    fn engine_with_session(backend: FakeBackend) -> Engine {
        let engine = engine_with(backend, FakeLocalities::new());

        block_on(async {
            engine.load_states().await.unwrap();
            engine.select_state(31).await.unwrap();
            engine.select_city("Belo Horizonte".into()).await.unwrap();
            engine.submit().await.unwrap();
        });

        engine
    }

    fn pick_both(engine: &Engine) {
        block_on(engine.click(GeoPoint::new(-19.90, -43.90))).unwrap();
        block_on(engine.click(GeoPoint::new(-19.93, -43.92))).unwrap();
    }

    fn markers(engine: &Engine) -> Vec<MarkerRole> {
        let controller = block_on(engine.controller.lock());
        controller
            .session()
            .unwrap()
            .widget()
            .layers()
            .into_iter()
            .filter_map(|(_, layer)| match layer {
                Layer::Marker { point: _, role } => Some(role),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn clicks_need_a_session() {
        let engine = engine_with(FakeBackend::new(), FakeLocalities::new());
        let err = block_on(engine.click(GeoPoint::new(-19.9, -43.9))).unwrap_err();

        assert_eq!(err.code, 100);
    }

    #[test]
    fn two_clicks_enable_calculate() {
        let engine = engine_with_session(FakeBackend::new());
        pick_both(&engine);

        let page = block_on(engine.page());
        assert_eq!(page.origin_field, "-19.900000, -43.900000");
        assert_eq!(page.destination_field, "-19.930000, -43.920000");
        assert!(page.calculate_enabled);
    }

    #[test]
    fn calculate_draws_the_route() {
        let backend = FakeBackend::new();
        backend.answer_route(Ok(route_of(2500.0, 4)));

        let engine = engine_with_session(backend.clone());
        pick_both(&engine);

        let page = block_on(engine.calculate()).unwrap();

        assert_eq!(page.distance_text.as_deref(), Some("2.50 km"));
        assert_eq!(page.vertex_count, Some(5));
        assert_eq!(page.edge_count, Some(4));
        assert_eq!(page.instructions, "Distance: 2.50 km | Vertices: 5 | Edges: 4");
        assert!(!page.loading);
        assert_eq!(page.snapshot.unwrap().caption, SNAPSHOT_CAPTION);
        assert!(!block_on(engine.snapshot()).unwrap().is_empty());

        let requests = backend.route_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].1, GeoPoint::new(-19.90, -43.90));
        assert_eq!(requests[0].2, GeoPoint::new(-19.93, -43.92));
        assert_eq!(markers(&engine), vec![MarkerRole::Start, MarkerRole::End]);
    }

    #[test]
    fn route_errors_keep_the_markers() {
        let backend = FakeBackend::new();
        backend.answer_route(Err(rejected_error("no path".into())));

        let engine = engine_with_session(backend);
        pick_both(&engine);

        let err = block_on(engine.calculate()).unwrap_err();
        assert_eq!(err.message, "no path");

        let page = block_on(engine.page());
        assert_eq!(page.instructions, "no path");
        assert!(page.calculate_enabled);
        assert!(!page.loading);
        assert_eq!(
            markers(&engine),
            vec![MarkerRole::Origin, MarkerRole::Destination]
        );

        let controller = block_on(engine.controller.lock());
        assert!(controller.session().unwrap().selection.is_complete());
    }

    #[test]
    fn malformed_fields_never_reach_the_backend() {
        let backend = FakeBackend::new();
        let engine = engine_with_session(backend.clone());
        pick_both(&engine);

        block_on(engine.edit_field(Field::Origin, "north of here".into())).unwrap();
        let err = block_on(engine.calculate()).unwrap_err();

        assert_eq!(err.code, 101);
        assert!(backend.route_requests().is_empty());
        assert_eq!(
            block_on(engine.page()).alert.as_deref(),
            Some(ALERT_INVALID_COORDINATES)
        );
    }

    #[test]
    fn edited_fields_are_what_gets_sent() {
        let backend = FakeBackend::new();
        backend.answer_route(Ok(route_of(1200.0, 1)));

        let engine = engine_with_session(backend.clone());
        pick_both(&engine);

        block_on(engine.edit_field(Field::Destination, "-19.95,-43.97".into())).unwrap();
        block_on(engine.calculate()).unwrap();

        assert_eq!(backend.route_requests()[0].2, GeoPoint::new(-19.95, -43.97));
    }

    #[test]
    fn calculate_needs_both_points() {
        let engine = engine_with_session(FakeBackend::new());
        block_on(engine.click(GeoPoint::new(-19.90, -43.90))).unwrap();

        assert_eq!(block_on(engine.calculate()).unwrap_err().code, 100);
    }

    #[test]
    fn search_selects_the_found_address() {
        let engine = engine_with_session(FakeBackend::new());
        let page = block_on(engine.search_address("Praça Sete, Belo Horizonte".into())).unwrap();

        assert_eq!(page.origin_field, "-19.919100, -43.938600");

        let err = block_on(engine.search_address("nowhere".into())).unwrap_err();
        assert_eq!(err.code, 104);
    }

    #[test]
    fn route_after_reset_is_dropped() {
        let backend = FakeBackend::new();
        backend.answer_route(Ok(route_of(2500.0, 3)));
        let release = backend.hold_route();

        let engine = Arc::new(engine_with_session(backend));
        pick_both(&engine);

        block_on(async {
            let reset_then_release = async {
                tokio::task::yield_now().await;
                engine.reset().await.unwrap();
                release.send(()).unwrap();
            };

            let (page, _) = tokio::join!(engine.calculate(), reset_then_release);
            let page = page.unwrap();
            assert_eq!(page.distance_text, None);
        });

        let page = block_on(engine.page());
        assert!(!page.viewport_visible);
        assert!(!page.loading);
        assert_eq!(page.vertex_count, None);
        assert!(block_on(engine.controller.lock()).session().is_none());
    }

    #[test]
    fn third_click_starts_a_new_cycle() {
        let engine = engine_with_session(FakeBackend::new());
        pick_both(&engine);
        block_on(engine.click(GeoPoint::new(-19.80, -43.80))).unwrap();

        let controller = block_on(engine.controller.lock());
        assert_eq!(
            controller.session().unwrap().selection,
            SelectionState::OriginSet {
                origin: GeoPoint::new(-19.80, -43.80)
            }
        );
        assert!(!controller.page().calculate_enabled);
    }

    #[test]
    fn empty_route_only_reports_distance() {
        let backend = FakeBackend::new();
        backend.answer_route(Ok(RouteResult {
            total_distance_meters: 0.0,
            edges: vec![],
        }));

        let engine = engine_with_session(backend);
        pick_both(&engine);

        let page = block_on(engine.calculate()).unwrap();
        assert_eq!(page.instructions, "Distance: 0.00 km");
        assert_eq!(page.vertex_count, None);
        assert_eq!(
            markers(&engine),
            vec![MarkerRole::Origin, MarkerRole::Destination]
        );
    }

    #[test]
    fn empty_route_replaces_the_previous_summary() {
        let backend = FakeBackend::new();
        backend.answer_route(Ok(route_of(2500.0, 4)));

        let engine = engine_with_session(backend.clone());
        pick_both(&engine);
        block_on(engine.calculate()).unwrap();

        backend.answer_route(Ok(RouteResult {
            total_distance_meters: 0.0,
            edges: vec![],
        }));
        let page = block_on(engine.calculate()).unwrap();

        assert_eq!(page.instructions, "Distance: 0.00 km");
        assert_eq!(page.distance_text.as_deref(), Some("0.00 km"));
        assert_eq!(page.vertex_count, None);
        assert_eq!(page.edge_count, None);
    }

    #[test]
    fn failed_route_clears_the_previous_summary() {
        let backend = FakeBackend::new();
        backend.answer_route(Ok(route_of(2500.0, 4)));

        let engine = engine_with_session(backend.clone());
        pick_both(&engine);
        block_on(engine.calculate()).unwrap();

        backend.answer_route(Err(rejected_error("no path".into())));
        let err = block_on(engine.calculate()).unwrap_err();
        assert_eq!(err.message, "no path");

        let page = block_on(engine.page());
        assert_eq!(page.instructions, "no path");
        assert_eq!(page.distance_text, None);
        assert_eq!(page.vertex_count, None);
        assert_eq!(page.edge_count, None);
    }

    #[test]
    fn second_route_reports_its_own_counts() {
        let backend = FakeBackend::new();
        backend.answer_route(Ok(route_of(2500.0, 4)));

        let engine = engine_with_session(backend.clone());
        pick_both(&engine);
        block_on(engine.calculate()).unwrap();

        backend.answer_route(Ok(route_of(1200.0, 2)));
        let page = block_on(engine.calculate()).unwrap();

        assert_eq!(page.instructions, "Distance: 1.20 km | Vertices: 3 | Edges: 2");
        assert_eq!(page.vertex_count, Some(3));
        assert_eq!(page.edge_count, Some(2));
    }

    #[test]
    fn reset_drops_the_snapshot() {
        let backend = FakeBackend::new();
        backend.answer_route(Ok(route_of(2500.0, 4)));

        let engine = engine_with_session(backend);
        pick_both(&engine);
        block_on(engine.calculate()).unwrap();
        assert!(block_on(engine.snapshot()).is_ok());

        let page = block_on(engine.reset()).unwrap();

        assert!(page.snapshot.is_none());
        assert_eq!(block_on(engine.snapshot()).unwrap_err().code, 104);
    }
}
