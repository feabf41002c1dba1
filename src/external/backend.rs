use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::BackendGateway;
use crate::{
    entities::{BoundingBox, Edge, Extract, GeoPoint, RouteResult},
    error::{rejected_error, upstream_error, Error},
};

#[derive(Serialize)]
struct ExtractParams<'a> {
    cidade: &'a str,
    estado: &'a str,
}

#[derive(Deserialize)]
struct ExtractResponse {
    filename: String,
    bbox: BoundingBox,
}

#[derive(Serialize)]
struct ShortestPathParams<'a> {
    filename: &'a str,
    origem: GeoPoint,
    destino: GeoPoint,
}

#[derive(Deserialize)]
struct ShortestPathResponse {
    distancia: f64,
    arestas: Vec<WireEdge>,
}

/// Endpoints arrive as `"lat,lng"` strings.
#[derive(Deserialize)]
struct WireEdge {
    origem: String,
    destino: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

fn into_route(res: ShortestPathResponse) -> Result<RouteResult, Error> {
    let edges = res
        .arestas
        .iter()
        .map(|edge| -> Result<Edge, Error> {
            Ok(Edge::new(edge.origem.parse()?, edge.destino.parse()?))
        })
        .collect::<Result<Vec<Edge>, Error>>()?;

    Ok(RouteResult {
        total_distance_meters: res.distancia,
        edges,
    })
}

pub struct HttpBackend {
    client: reqwest::Client,
    base: String,
}

impl HttpBackend {
    pub fn new(base: &str) -> Result<Self, Error> {
        Ok(Self {
            client: reqwest::Client::builder().build()?,
            base: base.trim_end_matches('/').into(),
        })
    }

    async fn post<P: Serialize + Sync, R: DeserializeOwned>(
        &self,
        path: &str,
        params: &P,
    ) -> Result<R, Error> {
        let url = format!("{}{}", self.base, path);
        let res = self.client.post(url).json(params).send().await?;

        let status = res.status();
        if !status.is_success() {
            tracing::warn!(%status, path, "backend refused the request");

            let body: Option<ErrorBody> = res.json().await.ok();
            return Err(body
                .and_then(|b| b.error)
                .map(rejected_error)
                .unwrap_or_else(upstream_error));
        }

        Ok(res.json().await?)
    }
}

#[async_trait]
impl BackendGateway for HttpBackend {
    #[tracing::instrument(skip(self))]
    async fn extract(&self, city: &str, state: &str) -> Result<Extract, Error> {
        let params = ExtractParams {
            cidade: city,
            estado: state,
        };

        let data: ExtractResponse = self.post("/json/cidade", &params).await?;

        Ok(Extract {
            filename: data.filename,
            bbox: data.bbox,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn shortest_path(
        &self,
        filename: &str,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> Result<RouteResult, Error> {
        let params = ShortestPathParams {
            filename,
            origem: origin,
            destino: destination,
        };

        let data: ShortestPathResponse = self.post("/dijkstra/shortest-path", &params).await?;

        into_route(data)
    }
}

#[test]
fn decodes_shortest_path_response() {
    let body = r#"{
        "distancia": 2500,
        "arestas": [
            {"origem": "-19.9191,-43.9386", "destino": "-19.9200,-43.9390"},
            {"origem": "-19.9200,-43.9390", "destino": "-19.9210,-43.9401"}
        ]
    }"#;

    let res: ShortestPathResponse = serde_json::from_str(body).unwrap();
    let route = into_route(res).unwrap();

    assert_eq!(route.edges.len(), 2);
    assert_eq!(route.edges[0].origin, GeoPoint::new(-19.9191, -43.9386));
    assert_eq!(route.edges[1].destination, GeoPoint::new(-19.9210, -43.9401));
    assert_eq!(route.distance_text(), "2.50 km");
}

#[test]
fn rejects_unparseable_edges() {
    let body = r#"{"distancia": 10, "arestas": [{"origem": "x,y", "destino": "-19.92,-43.93"}]}"#;

    let res: ShortestPathResponse = serde_json::from_str(body).unwrap();
    assert_eq!(into_route(res).unwrap_err().code, 101);
}

#[test]
fn decodes_extract_response() {
    let body = r#"{"filename": "cache/belo_horizonte_osm.json", "bbox": [-20.06, -44.06, -19.77, -43.86]}"#;

    let res: ExtractResponse = serde_json::from_str(body).unwrap();
    assert_eq!(res.filename, "cache/belo_horizonte_osm.json");
    assert_eq!(res.bbox.south, -20.06);
    assert_eq!(res.bbox.east, -43.86);
}

#[test]
fn encodes_requests_with_backend_field_names() {
    let params = ShortestPathParams {
        filename: "bh.json",
        origem: GeoPoint::new(-19.9, -43.9),
        destino: GeoPoint::new(-19.8, -43.8),
    };

    let json = serde_json::to_value(&params).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "filename": "bh.json",
            "origem": {"lat": -19.9, "lng": -43.9},
            "destino": {"lat": -19.8, "lng": -43.8}
        })
    );

    let json = serde_json::to_value(&ExtractParams {
        cidade: "Belo Horizonte",
        estado: "Minas Gerais",
    })
    .unwrap();
    assert_eq!(
        json,
        serde_json::json!({"cidade": "Belo Horizonte", "estado": "Minas Gerais"})
    );
}
