use super::{Engine, Operation};

use async_trait::async_trait;

use crate::{
    api::FormAPI,
    entities::{
        page::{
            CITIES_ERROR_PLACEHOLDER, CITIES_LOADING_PLACEHOLDER, CITY_PLACEHOLDER,
            STATES_ERROR_PLACEHOLDER, STATE_PLACEHOLDER,
        },
        Page,
    },
    error::{invalid_input_error, Error},
};

pub const STATUS_LOADING_MAP: &str = "Loading map data...";
pub const STATUS_MAP_FAILED: &str = "Failed to load map data.";

#[async_trait]
impl FormAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn load_states(&self) -> Result<Page, Error> {
        let result = self.localities.states().await;

        let mut controller = self.controller.lock().await;
        let page = controller.page_mut();

        match result {
            Ok(states) => {
                tracing::info!(count = states.len(), "states loaded");
                page.states = states;
                page.state_placeholder = STATE_PLACEHOLDER.into();
            }
            Err(err) => {
                tracing::error!("could not load states: {}", err);
                page.states.clear();
                page.state_placeholder = STATES_ERROR_PLACEHOLDER.into();
            }
        }

        Ok(page.clone())
    }

    #[tracing::instrument(skip(self))]
    async fn select_state(&self, state_id: u32) -> Result<Page, Error> {
        {
            let mut controller = self.controller.lock().await;
            let page = controller.page_mut();

            let state = page
                .states
                .iter()
                .find(|s| s.id == state_id)
                .cloned()
                .ok_or_else(invalid_input_error)?;

            page.selected_state = Some(state);
            page.selected_city = None;
            page.cities.clear();
            page.city_selector_enabled = false;
            page.city_placeholder = CITIES_LOADING_PLACEHOLDER.into();
        }

        let token = self.tokens.issue(Operation::RegionChange);
        let result = self.localities.cities(state_id).await;

        let mut controller = self.controller.lock().await;
        let page = controller.page_mut();

        if !self.tokens.is_latest(token) {
            tracing::info!(state_id, "discarding city list of a superseded state");
            return Ok(page.clone());
        }

        match result {
            Ok(cities) => {
                tracing::info!(state_id, count = cities.len(), "cities loaded");
                page.cities = cities;
                page.city_selector_enabled = true;
                page.city_placeholder = CITY_PLACEHOLDER.into();
            }
            Err(err) => {
                tracing::error!(state_id, "could not load cities: {}", err);
                page.city_selector_enabled = false;
                page.city_placeholder = CITIES_ERROR_PLACEHOLDER.into();
            }
        }

        Ok(page.clone())
    }

    #[tracing::instrument(skip(self))]
    async fn select_city(&self, name: String) -> Result<Page, Error> {
        let mut controller = self.controller.lock().await;
        let page = controller.page_mut();

        if !page.city_selector_enabled || !page.cities.iter().any(|c| c.nome == name) {
            return Err(invalid_input_error());
        }

        page.selected_city = Some(name);

        Ok(page.clone())
    }

    /// Drops the current session, then asks the backend for the extract of the
    /// selected city and opens a new session on it.
    #[tracing::instrument(skip(self))]
    async fn submit(&self) -> Result<Page, Error> {
        let (state, city) = {
            let mut controller = self.controller.lock().await;

            let page = controller.page();
            let state = page.selected_state.clone().ok_or_else(invalid_input_error)?;
            let city = page.selected_city.clone().ok_or_else(invalid_input_error)?;

            controller.reset_session(true);

            let page = controller.page_mut();
            page.status = STATUS_LOADING_MAP.into();
            page.loading = true;

            (state, city)
        };

        let token = self.tokens.issue(Operation::Extract);
        let result = self.backend.extract(&city, &state.nome).await;

        let mut controller = self.controller.lock().await;

        if !self.tokens.is_latest(token) {
            tracing::info!(%city, "discarding extract of a superseded submission");
            return Ok(controller.page().clone());
        }

        controller.page_mut().loading = false;

        match result {
            Ok(extract) => {
                controller.init_session(&extract);
                controller.page_mut().status = format!("Map data loaded for {}.", city);

                Ok(controller.page().clone())
            }
            Err(err) => {
                tracing::error!(%city, "extract request failed: {}", err);
                controller.page_mut().status = STATUS_MAP_FAILED.into();

                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio_test::block_on;

    use super::*;
    use crate::api::{FormAPI, PageAPI};
    use crate::engine::fakes::{bh_extract, cities_of, engine_with, FakeBackend, FakeLocalities};
    use crate::error::upstream_error;

    #[test]
    fn states_fill_the_selector() {
        let engine = engine_with(FakeBackend::new(), FakeLocalities::new());
        let page = block_on(engine.load_states()).unwrap();

        assert_eq!(page.states.len(), 2);
        assert_eq!(page.state_placeholder, STATE_PLACEHOLDER);
        assert!(!page.city_selector_enabled);
    }

    #[test]
    fn unreachable_states_service_is_not_fatal() {
        let localities = FakeLocalities::new();
        localities.fail_states();

        let engine = engine_with(FakeBackend::new(), localities);
        let page = block_on(engine.load_states()).unwrap();

        assert!(page.states.is_empty());
        assert_eq!(page.state_placeholder, STATES_ERROR_PLACEHOLDER);
    }

    #[test]
    fn choosing_a_state_enables_the_cities() {
        let engine = engine_with(FakeBackend::new(), FakeLocalities::new());
        block_on(engine.load_states()).unwrap();

        let page = block_on(engine.select_state(31)).unwrap();

        assert_eq!(page.selected_state.unwrap().nome, "Minas Gerais");
        assert!(page.city_selector_enabled);
        assert_eq!(page.cities, cities_of(31));
        assert_eq!(page.city_placeholder, CITY_PLACEHOLDER);
    }

    #[test]
    fn failed_city_lookup_disables_the_selector() {
        let localities = FakeLocalities::new();
        localities.fail_cities();

        let engine = engine_with(FakeBackend::new(), localities);
        block_on(engine.load_states()).unwrap();

        let page = block_on(engine.select_state(31)).unwrap();

        assert!(!page.city_selector_enabled);
        assert!(page.cities.is_empty());
        assert_eq!(page.city_placeholder, CITIES_ERROR_PLACEHOLDER);
    }

    #[test]
    fn unknown_state_or_city_is_rejected() {
        let engine = engine_with(FakeBackend::new(), FakeLocalities::new());
        block_on(engine.load_states()).unwrap();

        assert_eq!(block_on(engine.select_state(99)).unwrap_err().code, 101);

        block_on(engine.select_state(31)).unwrap();
        assert_eq!(
            block_on(engine.select_city("Atlantis".into())).unwrap_err().code,
            101
        );
    }

    #[test]
    fn latest_state_choice_wins() {
        let localities = FakeLocalities::new();
        let release_mg = localities.hold_cities(31);
        let release_sp = localities.hold_cities(35);

        let engine = Arc::new(engine_with(FakeBackend::new(), localities));
        block_on(engine.load_states()).unwrap();

        block_on(async {
            let releases = async {
                // the newer request answers first, the older one last
                tokio::task::yield_now().await;
                release_sp.send(()).unwrap();
                tokio::task::yield_now().await;
                release_mg.send(()).unwrap();
            };

            let (mg, sp, _) = tokio::join!(engine.select_state(31), engine.select_state(35), releases);
            mg.unwrap();
            sp.unwrap();
        });

        let page = block_on(engine.page());
        assert_eq!(page.selected_state.unwrap().id, 35);
        assert_eq!(page.cities, cities_of(35));
    }

    #[test]
    fn submit_opens_a_session() {
        let backend = FakeBackend::new();
        let engine = engine_with(backend.clone(), FakeLocalities::new());
        block_on(engine.load_states()).unwrap();
        block_on(engine.select_state(31)).unwrap();
        block_on(engine.select_city("Belo Horizonte".into())).unwrap();

        let page = block_on(engine.submit()).unwrap();

        assert!(page.viewport_visible);
        assert!(!page.loading);
        assert_eq!(page.status, "Map data loaded for Belo Horizonte.");
        assert_eq!(
            backend.extract_requests(),
            vec![("Belo Horizonte".to_string(), "Minas Gerais".to_string())]
        );

        let controller = block_on(engine.controller.lock());
        let session = controller.session().unwrap();
        assert_eq!(session.filename, bh_extract().filename);
    }

    #[test]
    fn submit_needs_state_and_city() {
        let engine = engine_with(FakeBackend::new(), FakeLocalities::new());
        assert_eq!(block_on(engine.submit()).unwrap_err().code, 101);
    }

    #[test]
    fn failed_extract_creates_no_session() {
        let backend = FakeBackend::new();
        backend.fail_extract(upstream_error());

        let engine = engine_with(backend, FakeLocalities::new());
        block_on(engine.load_states()).unwrap();
        block_on(engine.select_state(31)).unwrap();
        block_on(engine.select_city("Belo Horizonte".into())).unwrap();

        assert!(block_on(engine.submit()).is_err());

        let page = block_on(engine.page());
        assert_eq!(page.status, STATUS_MAP_FAILED);
        assert!(!page.loading);
        assert!(!page.viewport_visible);
        assert!(block_on(engine.controller.lock()).session().is_none());
    }

    #[test]
    fn resubmitting_replaces_the_session() {
        let engine = engine_with(FakeBackend::new(), FakeLocalities::new());
        block_on(engine.load_states()).unwrap();
        block_on(engine.select_state(31)).unwrap();
        block_on(engine.select_city("Belo Horizonte".into())).unwrap();

        block_on(engine.submit()).unwrap();
        let first = block_on(engine.controller.lock()).session().unwrap().id;

        block_on(engine.submit()).unwrap();
        let controller = block_on(engine.controller.lock());

        assert_ne!(controller.session().unwrap().id, first);
        assert_eq!(controller.listeners().len(), 2);
    }

    #[test]
    fn superseded_extract_is_dropped() {
        let backend = FakeBackend::new();
        let release_first = backend.hold_extract();

        let engine = Arc::new(engine_with(backend.clone(), FakeLocalities::new()));
        block_on(engine.load_states()).unwrap();
        block_on(engine.select_state(31)).unwrap();
        block_on(engine.select_city("Belo Horizonte".into())).unwrap();

        block_on(async {
            let later = async {
                tokio::task::yield_now().await;
                let page = engine.submit().await.unwrap();
                release_first.send(()).unwrap();
                page
            };

            let (first, second) = tokio::join!(engine.submit(), later);
            first.unwrap();
            assert!(second.viewport_visible);
        });

        let controller = block_on(engine.controller.lock());
        assert_eq!(backend.extract_requests().len(), 2);
        // only the second submission opened a session
        assert_eq!(controller.listeners().len(), 2);
        assert!(controller.session().is_some());
    }
}
