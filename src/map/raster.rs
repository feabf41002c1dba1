//! Headless map widget. Keeps layers in memory and draws them onto a plain
//! background when a raster is requested; no tiles are fetched.

use std::collections::BTreeMap;
use std::io::Cursor;

use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};

use super::{Layer, LayerId, MapEvent, MapFactory, MapWidget, MarkerRole, Raster, View};
use crate::entities::{BoundingBox, GeoPoint};
use crate::error::{render_error, Error};

const BACKGROUND: Rgba<u8> = Rgba([242, 239, 233, 255]);
const ROUTE: Rgba<u8> = Rgba([0, 0, 255, 255]);
const VERTEX: Rgba<u8> = Rgba([255, 0, 0, 255]);

/// Fraction of the frame added on each side when fitting bounds.
const FIT_PADDING: f64 = 0.05;
const MAX_ZOOM: u8 = 19;

#[derive(Clone, Debug)]
pub struct RasterMapFactory {
    pub width: u32,
    pub height: u32,
}

impl MapFactory for RasterMapFactory {
    fn create(&self, frame: BoundingBox) -> Box<dyn MapWidget> {
        Box::new(RasterMap::new(frame, self.width, self.height))
    }
}

pub struct RasterMap {
    view: View,
    container: (u32, u32),
    /// Zero until the first size recalculation.
    size: (u32, u32),
    next_layer: u64,
    layers: BTreeMap<LayerId, Layer>,
    events: Vec<MapEvent>,
}

impl RasterMap {
    pub fn new(frame: BoundingBox, width: u32, height: u32) -> Self {
        let mut map = Self {
            view: View {
                center: frame.center(),
                zoom: 0,
                bounds: frame,
            },
            container: (width, height),
            size: (0, 0),
            next_layer: 0,
            layers: BTreeMap::new(),
            events: Vec::new(),
        };
        map.frame(frame);
        map
    }

    fn frame(&mut self, bounds: BoundingBox) {
        let lat_pad = (bounds.north - bounds.south) * FIT_PADDING;
        let lng_pad = (bounds.east - bounds.west) * FIT_PADDING;

        let padded = BoundingBox {
            south: (bounds.south - lat_pad).max(-90.0),
            west: (bounds.west - lng_pad).max(-180.0),
            north: (bounds.north + lat_pad).min(90.0),
            east: (bounds.east + lng_pad).min(180.0),
        };

        let span = (padded.east - padded.west).max(padded.north - padded.south);
        let zoom = if span <= 0.0 {
            MAX_ZOOM
        } else {
            ((360.0 / span).log2().floor().max(0.0) as u8).min(MAX_ZOOM)
        };

        self.view = View {
            center: bounds.center(),
            zoom,
            bounds: padded,
        };
    }

    fn project(&self, point: &GeoPoint) -> (f64, f64) {
        let bounds = &self.view.bounds;
        let (width, height) = (self.size.0 as f64, self.size.1 as f64);

        let lng_span = (bounds.east - bounds.west).max(f64::EPSILON);
        let lat_span = (bounds.north - bounds.south).max(f64::EPSILON);

        let x = (point.lng - bounds.west) / lng_span * (width - 1.0);
        let y = (bounds.north - point.lat) / lat_span * (height - 1.0);

        (x, y)
    }
}

impl MapWidget for RasterMap {
    fn view(&self) -> View {
        self.view
    }

    fn set_view(&mut self, center: GeoPoint, zoom: u8) {
        let zoom = zoom.min(MAX_ZOOM);
        let lng_span = 360.0 / 2f64.powi(zoom as i32);
        let aspect = if self.container.0 == 0 {
            1.0
        } else {
            self.container.1 as f64 / self.container.0 as f64
        };
        let lat_span = lng_span * aspect;

        self.view = View {
            center,
            zoom,
            bounds: BoundingBox {
                south: (center.lat - lat_span / 2.0).max(-90.0),
                west: (center.lng - lng_span / 2.0).max(-180.0),
                north: (center.lat + lat_span / 2.0).min(90.0),
                east: (center.lng + lng_span / 2.0).min(180.0),
            },
        };
        self.events.push(MapEvent::ViewSettled);
    }

    fn fit_bounds(&mut self, bounds: BoundingBox) {
        self.frame(bounds);
        self.events.push(MapEvent::ViewSettled);
    }

    fn invalidate_size(&mut self) {
        self.size = self.container;
    }

    fn add_layer(&mut self, layer: Layer) -> LayerId {
        let id = LayerId(self.next_layer);
        self.next_layer += 1;
        self.layers.insert(id, layer);
        id
    }

    fn remove_layer(&mut self, id: LayerId) -> Option<Layer> {
        self.layers.remove(&id)
    }

    fn layers(&self) -> Vec<(LayerId, Layer)> {
        self.layers
            .iter()
            .map(|(id, layer)| (*id, layer.clone()))
            .collect()
    }

    fn take_events(&mut self) -> Vec<MapEvent> {
        std::mem::take(&mut self.events)
    }

    fn render(&self) -> Result<Raster, Error> {
        let (width, height) = self.size;
        if width < 2 || height < 2 {
            return Err(render_error("map has no size yet"));
        }

        let mut canvas = RgbaImage::from_pixel(width, height, BACKGROUND);

        // lines first so markers stay visible on top
        for layer in self.layers.values() {
            if let Layer::Polyline { points } = layer {
                for pair in points.windows(2) {
                    let from = self.project(&pair[0]);
                    let to = self.project(&pair[1]);
                    draw_segment(&mut canvas, from, to, ROUTE);
                }
            }
        }

        for layer in self.layers.values() {
            match layer {
                Layer::VertexGroup { points } => {
                    for point in points {
                        draw_square(&mut canvas, self.project(point), 2, VERTEX);
                    }
                }
                Layer::Marker { point, role } => {
                    draw_square(&mut canvas, self.project(point), 5, marker_color(*role));
                }
                Layer::Polyline { points: _ } => {}
            }
        }

        let mut png = Vec::new();
        DynamicImage::ImageRgba8(canvas).write_to(&mut Cursor::new(&mut png), ImageOutputFormat::Png)?;

        Ok(Raster { png, width, height })
    }
}

fn marker_color(role: MarkerRole) -> Rgba<u8> {
    match role {
        MarkerRole::Origin | MarkerRole::Start => Rgba([0, 160, 0, 255]),
        MarkerRole::Destination | MarkerRole::End => Rgba([200, 0, 0, 255]),
    }
}

fn put(canvas: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < canvas.width() && (y as u32) < canvas.height() {
        canvas.put_pixel(x as u32, y as u32, color);
    }
}

fn draw_segment(canvas: &mut RgbaImage, from: (f64, f64), to: (f64, f64), color: Rgba<u8>) {
    let steps = (to.0 - from.0).abs().max((to.1 - from.1).abs()).ceil().max(1.0) as i64;

    for step in 0..=steps {
        let t = step as f64 / steps as f64;
        let x = from.0 + (to.0 - from.0) * t;
        let y = from.1 + (to.1 - from.1) * t;
        put(canvas, x.round() as i64, y.round() as i64, color);
    }
}

fn draw_square(canvas: &mut RgbaImage, center: (f64, f64), radius: i64, color: Rgba<u8>) {
    let (cx, cy) = (center.0.round() as i64, center.1.round() as i64);

    for dy in -radius..=radius {
        for dx in -radius..=radius {
            put(canvas, cx + dx, cy + dy, color);
        }
    }
}

#[cfg(test)]
fn belo_horizonte() -> BoundingBox {
    BoundingBox::new(-20.0, -44.0, -19.0, -43.0).unwrap()
}

#[test]
fn render_needs_a_size() {
    let mut map = RasterMap::new(belo_horizonte(), 64, 48);
    assert!(map.render().is_err());

    map.invalidate_size();
    let raster = map.render().unwrap();
    assert_eq!((raster.width, raster.height), (64, 48));
    assert_eq!(&raster.png[1..4], b"PNG");
}

#[test]
fn route_pixels_are_drawn() {
    let mut map = RasterMap::new(belo_horizonte(), 100, 100);
    map.invalidate_size();
    map.add_layer(Layer::Polyline {
        points: vec![GeoPoint::new(-19.2, -43.8), GeoPoint::new(-19.8, -43.2)],
    });

    let raster = map.render().unwrap();
    let decoded = image::load_from_memory(&raster.png).unwrap().to_rgba8();
    assert!(decoded.pixels().any(|p| *p == ROUTE));
}

#[test]
fn moving_the_view_raises_settle_events() {
    let mut map = RasterMap::new(belo_horizonte(), 100, 100);
    assert!(map.take_events().is_empty());

    map.set_view(GeoPoint::new(-19.5, -43.5), 16);
    assert_eq!(map.view().zoom, 16);
    assert_eq!(map.take_events(), vec![MapEvent::ViewSettled]);
    assert!(map.take_events().is_empty());
}

#[test]
fn fit_bounds_contains_the_target() {
    let mut map = RasterMap::new(belo_horizonte(), 100, 100);
    let target = BoundingBox::new(-19.95, -43.95, -19.85, -43.80).unwrap();

    map.fit_bounds(target);

    let view = map.view();
    assert!(view.bounds.contains(&GeoPoint::new(target.south, target.west)));
    assert!(view.bounds.contains(&GeoPoint::new(target.north, target.east)));
    assert_eq!(view.center, target.center());
}

#[test]
fn layers_can_be_removed() {
    let mut map = RasterMap::new(belo_horizonte(), 100, 100);
    let marker = map.add_layer(Layer::Marker {
        point: GeoPoint::new(-19.5, -43.5),
        role: MarkerRole::Origin,
    });

    assert_eq!(map.layers().len(), 1);
    assert!(map.remove_layer(marker).is_some());
    assert!(map.remove_layer(marker).is_none());
    assert!(map.layers().is_empty());
}
