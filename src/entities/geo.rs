use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{invalid_coordinates_error, invalid_input_error, Error};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Equality up to the precision coordinates survive a round trip through text.
    pub fn approx_eq(&self, other: &GeoPoint) -> bool {
        (self.lat - other.lat).abs() < 1e-9 && (self.lng - other.lng).abs() < 1e-9
    }

    /// Great-circle distance in meters.
    pub fn haversine(&self, other: &GeoPoint) -> f64 {
        const EARTH_RADIUS: f64 = 6_371_000.0;

        let phi1 = self.lat.to_radians();
        let phi2 = other.lat.to_radians();
        let d_phi = (other.lat - self.lat).to_radians();
        let d_lambda = (other.lng - self.lng).to_radians();

        let a = (d_phi / 2.0).sin().powi(2)
            + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);

        2.0 * EARTH_RADIUS * a.sqrt().asin()
    }
}

/// Six decimals, the precision the coordinate fields show.
impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lng)
    }
}

/// Accepts `"lat,lng"` as sent by the backend and `"lat, lng"` as typed in the fields.
impl FromStr for GeoPoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lng) = s
            .split_once(',')
            .ok_or_else(|| invalid_coordinates_error(s))?;

        let lat: f64 = lat
            .trim()
            .parse()
            .map_err(|_| invalid_coordinates_error(s))?;
        let lng: f64 = lng
            .trim()
            .parse()
            .map_err(|_| invalid_coordinates_error(s))?;

        let point = GeoPoint::new(lat, lng);
        if !point.is_valid() {
            return Err(invalid_coordinates_error(s));
        }

        Ok(point)
    }
}

impl From<GeoPoint> for geo_types::Coord<f64> {
    fn from(point: GeoPoint) -> Self {
        geo_types::coord! { x: point.lng, y: point.lat }
    }
}

impl From<geo_types::Coord<f64>> for GeoPoint {
    fn from(coord: geo_types::Coord<f64>) -> Self {
        GeoPoint::new(coord.y, coord.x)
    }
}

/// Degrees; travels on the wire as `[south, west, north, east]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Result<Self, Error> {
        let finite = [south, west, north, east].iter().all(|v| v.is_finite());
        if !finite || south > north || west > east {
            return Err(invalid_input_error());
        }

        Ok(Self {
            south,
            west,
            north,
            east,
        })
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        point.lat >= self.south
            && point.lat <= self.north
            && point.lng >= self.west
            && point.lng <= self.east
    }
}

impl TryFrom<[f64; 4]> for BoundingBox {
    type Error = Error;

    fn try_from([south, west, north, east]: [f64; 4]) -> Result<Self, Self::Error> {
        BoundingBox::new(south, west, north, east)
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(bbox: BoundingBox) -> Self {
        [bbox.south, bbox.west, bbox.north, bbox.east]
    }
}

impl From<geo_types::Rect<f64>> for BoundingBox {
    fn from(rect: geo_types::Rect<f64>) -> Self {
        let min = rect.min();
        let max = rect.max();

        BoundingBox {
            south: min.y,
            west: min.x,
            north: max.y,
            east: max.x,
        }
    }
}

#[test]
fn center_is_the_midpoint() {
    let bbox: BoundingBox = serde_json::from_str("[-20, -44, -19, -43]").unwrap();
    assert_eq!(bbox.center(), GeoPoint::new(-19.5, -43.5));
}

#[test]
fn inverted_boxes_are_rejected() {
    assert!(BoundingBox::new(-19.0, -44.0, -20.0, -43.0).is_err());
    assert!(serde_json::from_str::<BoundingBox>("[-20, -43, -19, -44]").is_err());
}

#[test]
fn parses_wire_and_field_formats() {
    let wire: GeoPoint = "-19.9191,-43.9386".parse().unwrap();
    let field: GeoPoint = "-19.919100, -43.938600".parse().unwrap();
    assert!(wire.approx_eq(&field));

    assert!("abc, -43.9".parse::<GeoPoint>().is_err());
    assert!("-19.9".parse::<GeoPoint>().is_err());
    assert!("-119.9, -43.9".parse::<GeoPoint>().is_err());
    assert!("".parse::<GeoPoint>().is_err());
}

#[test]
fn displays_six_decimals() {
    let point = GeoPoint::new(-19.5, -43.25);
    assert_eq!(point.to_string(), "-19.500000, -43.250000");
}

#[test]
fn haversine_distance() {
    let a = GeoPoint::new(0.0, 0.0);
    let b = GeoPoint::new(0.0, 1.0);
    let d = a.haversine(&b);
    assert!((d - 111_195.0).abs() < 10.0);
}

#[test]
fn converts_from_geo_types() {
    let rect = geo_types::Rect::new(
        geo_types::coord! { x: -43.0, y: -19.0 },
        geo_types::coord! { x: -44.0, y: -20.0 },
    );
    assert_eq!(
        BoundingBox::from(rect),
        BoundingBox::new(-20.0, -44.0, -19.0, -43.0).unwrap()
    );

    let coord: geo_types::Coord<f64> = GeoPoint::new(-19.5, -43.5).into();
    assert_eq!(GeoPoint::from(coord), GeoPoint::new(-19.5, -43.5));
}
