use geo_types::{coord, Coord, LineString, Rect};
use serde::{Deserialize, Serialize};

use crate::entities::{BoundingBox, GeoPoint};
use crate::error::{malformed_route_error, Error};

/// A map data slice prepared by the backend for one city.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Extract {
    pub filename: String,
    pub bbox: BoundingBox,
}

/// One directed hop of a computed path.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub origin: GeoPoint,
    pub destination: GeoPoint,
}

impl Edge {
    pub fn new(origin: GeoPoint, destination: GeoPoint) -> Self {
        Self {
            origin,
            destination,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    pub total_distance_meters: f64,
    pub edges: Vec<Edge>,
}

impl RouteResult {
    /// Kilometers with two decimals, e.g. `2500.0` meters is `"2.50 km"`.
    pub fn distance_text(&self) -> String {
        format!("{:.2} km", self.total_distance_meters / 1000.0)
    }
}

/// The ordered vertices of a route: the first edge's origin followed by every
/// edge's destination. Held as a line string in `x = lng`, `y = lat` order.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    line: LineString<f64>,
}

impl Path {
    /// `None` for an empty edge list. Fails when an edge does not start where
    /// the previous one ended.
    pub fn from_edges(edges: &[Edge]) -> Result<Option<Self>, Error> {
        let first = match edges.first() {
            Some(edge) => edge,
            None => return Ok(None),
        };

        let mut coords: Vec<Coord<f64>> = Vec::with_capacity(edges.len() + 1);
        coords.push(first.origin.into());

        for (i, edge) in edges.iter().enumerate() {
            if i > 0 && !edges[i - 1].destination.approx_eq(&edge.origin) {
                return Err(malformed_route_error(i));
            }
            coords.push(edge.destination.into());
        }

        Ok(Some(Self {
            line: LineString::new(coords),
        }))
    }

    pub fn vertices(&self) -> Vec<GeoPoint> {
        self.line.coords().map(|&c| GeoPoint::from(c)).collect()
    }

    pub fn vertex_count(&self) -> usize {
        self.line.0.len()
    }

    pub fn edge_count(&self) -> usize {
        self.line.lines().count()
    }

    pub fn start(&self) -> GeoPoint {
        self.line.0[0].into()
    }

    pub fn end(&self) -> GeoPoint {
        self.line.0[self.line.0.len() - 1].into()
    }

    pub fn bounds(&self) -> BoundingBox {
        let first = self.line.0[0];

        self.line
            .coords()
            .fold(Rect::new(first, first), |rect, c| {
                Rect::new(
                    coord! { x: rect.min().x.min(c.x), y: rect.min().y.min(c.y) },
                    coord! { x: rect.max().x.max(c.x), y: rect.max().y.max(c.y) },
                )
            })
            .into()
    }

    /// Sum of the great-circle lengths of the hops.
    pub fn length_meters(&self) -> f64 {
        self.line
            .lines()
            .map(|hop| GeoPoint::from(hop.start).haversine(&GeoPoint::from(hop.end)))
            .sum()
    }
}

#[cfg(test)]
pub(crate) fn chain(points: &[(f64, f64)]) -> Vec<Edge> {
    points
        .windows(2)
        .map(|pair| {
            Edge::new(
                GeoPoint::new(pair[0].0, pair[0].1),
                GeoPoint::new(pair[1].0, pair[1].1),
            )
        })
        .collect()
}

#[test]
fn vertices_are_one_more_than_edges() {
    let edges = chain(&[(-19.90, -43.90), (-19.91, -43.91), (-19.92, -43.90), (-19.93, -43.92)]);
    let path = Path::from_edges(&edges).unwrap().unwrap();

    assert_eq!(path.vertex_count(), edges.len() + 1);
    assert_eq!(path.edge_count(), edges.len());
    assert_eq!(path.start(), edges[0].origin);
    assert_eq!(path.end(), edges[2].destination);
    assert_eq!(path.vertices().len(), 4);
}

#[test]
fn length_follows_the_hops() {
    let edges = chain(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0)]);
    let path = Path::from_edges(&edges).unwrap().unwrap();

    let expected = GeoPoint::new(0.0, 0.0).haversine(&GeoPoint::new(0.0, 1.0))
        + GeoPoint::new(0.0, 1.0).haversine(&GeoPoint::new(1.0, 1.0));
    assert!((path.length_meters() - expected).abs() < 1e-6);
}

#[test]
fn empty_edges_have_no_path() {
    assert_eq!(Path::from_edges(&[]).unwrap(), None);
}

#[test]
fn broken_chain_is_rejected() {
    let mut edges = chain(&[(-19.90, -43.90), (-19.91, -43.91), (-19.92, -43.90)]);
    edges[1].origin = GeoPoint::new(-19.5, -43.5);

    let err = Path::from_edges(&edges).unwrap_err();
    assert_eq!(err.code, 103);
}

#[test]
fn bounds_enclose_every_vertex() {
    let edges = chain(&[(-19.90, -43.90), (-19.95, -43.80), (-19.85, -43.95)]);
    let path = Path::from_edges(&edges).unwrap().unwrap();
    let bounds = path.bounds();

    assert_eq!(bounds, BoundingBox::new(-19.95, -43.95, -19.85, -43.80).unwrap());
    assert!(path.vertices().iter().all(|v| bounds.contains(v)));
}

#[test]
fn distance_text_in_kilometers() {
    let result = RouteResult {
        total_distance_meters: 2500.0,
        edges: vec![],
    };
    assert_eq!(result.distance_text(), "2.50 km");
}
