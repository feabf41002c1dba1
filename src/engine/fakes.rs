//! In-memory stand-ins for the external services, with gates that let a test
//! decide when a response arrives.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::oneshot;

use super::Engine;
use crate::entities::{chain, BoundingBox, City, Extract, GeoPoint, RouteResult, State};
use crate::error::{upstream_error, Error};
use crate::external::{BackendGateway, Geocoder, LocalityGateway};
use crate::map::RasterMapFactory;

pub fn bh_extract() -> Extract {
    Extract {
        filename: "cache/belo_horizonte_osm.json".into(),
        bbox: BoundingBox::new(-20.06, -44.06, -19.77, -43.86).unwrap(),
    }
}

/// A chained route of `edges` hops from (-19.90, -43.90) to (-19.93, -43.92).
pub fn route_of(distance: f64, edges: usize) -> RouteResult {
    let points: Vec<(f64, f64)> = (0..=edges)
        .map(|i| {
            let t = i as f64 / edges as f64;
            (-19.90 - 0.03 * t, -43.90 - 0.02 * t)
        })
        .collect();

    RouteResult {
        total_distance_meters: distance,
        edges: chain(&points),
    }
}

pub fn cities_of(state_id: u32) -> Vec<City> {
    match state_id {
        31 => vec![
            City {
                id: 3106200,
                nome: "Belo Horizonte".into(),
            },
            City {
                id: 3118601,
                nome: "Contagem".into(),
            },
        ],
        35 => vec![
            City {
                id: 3509502,
                nome: "Campinas".into(),
            },
            City {
                id: 3550308,
                nome: "São Paulo".into(),
            },
        ],
        _ => vec![],
    }
}

pub fn engine_with(backend: FakeBackend, localities: FakeLocalities) -> Engine {
    let factory = RasterMapFactory {
        width: 200,
        height: 150,
    };

    Engine::with_gateways(
        Arc::new(factory),
        16,
        Arc::new(backend),
        Arc::new(localities),
        Arc::new(FakeGeocoder),
    )
}

#[derive(Default)]
struct BackendState {
    extract_error: Option<Error>,
    route: Option<Result<RouteResult, Error>>,
    extract_gate: Option<oneshot::Receiver<()>>,
    route_gate: Option<oneshot::Receiver<()>>,
    extract_requests: Vec<(String, String)>,
    route_requests: Vec<(String, GeoPoint, GeoPoint)>,
}

#[derive(Clone, Default)]
pub struct FakeBackend {
    inner: Arc<Mutex<BackendState>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_extract(&self, err: Error) {
        self.inner.lock().unwrap().extract_error = Some(err);
    }

    pub fn answer_route(&self, result: Result<RouteResult, Error>) {
        self.inner.lock().unwrap().route = Some(result);
    }

    /// The next extract request waits until the returned sender fires.
    pub fn hold_extract(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.inner.lock().unwrap().extract_gate = Some(rx);
        tx
    }

    pub fn hold_route(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.inner.lock().unwrap().route_gate = Some(rx);
        tx
    }

    pub fn extract_requests(&self) -> Vec<(String, String)> {
        self.inner.lock().unwrap().extract_requests.clone()
    }

    pub fn route_requests(&self) -> Vec<(String, GeoPoint, GeoPoint)> {
        self.inner.lock().unwrap().route_requests.clone()
    }
}

#[async_trait]
impl BackendGateway for FakeBackend {
    async fn extract(&self, city: &str, state: &str) -> Result<Extract, Error> {
        let gate = {
            let mut inner = self.inner.lock().unwrap();
            inner.extract_requests.push((city.into(), state.into()));
            inner.extract_gate.take()
        };

        if let Some(gate) = gate {
            gate.await.ok();
        }

        match self.inner.lock().unwrap().extract_error.clone() {
            Some(err) => Err(err),
            None => Ok(bh_extract()),
        }
    }

    async fn shortest_path(
        &self,
        filename: &str,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> Result<RouteResult, Error> {
        let gate = {
            let mut inner = self.inner.lock().unwrap();
            inner
                .route_requests
                .push((filename.into(), origin, destination));
            inner.route_gate.take()
        };

        if let Some(gate) = gate {
            gate.await.ok();
        }

        let answer = self.inner.lock().unwrap().route.clone();
        answer.unwrap_or_else(|| Ok(route_of(1000.0, 2)))
    }
}

#[derive(Default)]
struct LocalityState {
    states_down: bool,
    cities_down: bool,
    gates: HashMap<u32, oneshot::Receiver<()>>,
}

#[derive(Clone, Default)]
pub struct FakeLocalities {
    inner: Arc<Mutex<LocalityState>>,
}

impl FakeLocalities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_states(&self) {
        self.inner.lock().unwrap().states_down = true;
    }

    pub fn fail_cities(&self) {
        self.inner.lock().unwrap().cities_down = true;
    }

    pub fn hold_cities(&self, state_id: u32) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.inner.lock().unwrap().gates.insert(state_id, rx);
        tx
    }
}

#[async_trait]
impl LocalityGateway for FakeLocalities {
    async fn states(&self) -> Result<Vec<State>, Error> {
        if self.inner.lock().unwrap().states_down {
            return Err(upstream_error());
        }

        Ok(vec![
            State {
                id: 31,
                sigla: "MG".into(),
                nome: "Minas Gerais".into(),
            },
            State {
                id: 35,
                sigla: "SP".into(),
                nome: "São Paulo".into(),
            },
        ])
    }

    async fn cities(&self, state_id: u32) -> Result<Vec<City>, Error> {
        let gate = self.inner.lock().unwrap().gates.remove(&state_id);

        if let Some(gate) = gate {
            gate.await.ok();
        }

        if self.inner.lock().unwrap().cities_down {
            return Err(upstream_error());
        }

        Ok(cities_of(state_id))
    }
}

pub struct FakeGeocoder;

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<GeoPoint>, Error> {
        if query == "nowhere" {
            return Ok(None);
        }

        Ok(Some(GeoPoint::new(-19.9191, -43.9386)))
    }
}
