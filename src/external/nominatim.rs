use async_trait::async_trait;
use serde::Deserialize;

use super::Geocoder;
use crate::{
    entities::GeoPoint,
    error::{upstream_error, Error},
};

const USER_AGENT: &str = concat!("caminho/", env!("CARGO_PKG_VERSION"));

#[derive(Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

fn to_point(place: &Place) -> Result<GeoPoint, Error> {
    format!("{},{}", place.lat, place.lon).parse()
}

/// Address search against a Nominatim-compatible endpoint.
pub struct Nominatim {
    client: reqwest::Client,
    base: String,
}

impl Nominatim {
    pub fn new(base: &str) -> Result<Self, Error> {
        Ok(Self {
            client: reqwest::Client::builder().user_agent(USER_AGENT).build()?,
            base: base.trim_end_matches('/').into(),
        })
    }
}

#[async_trait]
impl Geocoder for Nominatim {
    #[tracing::instrument(skip(self))]
    async fn geocode(&self, query: &str) -> Result<Option<GeoPoint>, Error> {
        let url = format!("{}/search", self.base);

        let res = self
            .client
            .get(url)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(upstream_error());
        }

        let places: Vec<Place> = res.json().await?;

        places.first().map(to_point).transpose()
    }
}

#[test]
fn decodes_search_results() {
    let body = r#"[{"place_id": 1, "lat": "-19.9227318", "lon": "-43.9450948", "display_name": "Praça Sete"}]"#;
    let places: Vec<Place> = serde_json::from_str(body).unwrap();

    let point = to_point(&places[0]).unwrap();
    assert_eq!(point, GeoPoint::new(-19.9227318, -43.9450948));
}
