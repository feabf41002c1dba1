mod geo;
mod locality;
pub mod page;
mod route;
mod selection;

pub use geo::{BoundingBox, GeoPoint};
pub use locality::{City, State};
pub use page::{Field, Page, SnapshotInfo};
pub use route::{Edge, Extract, Path, RouteResult};
pub use selection::SelectionState;

#[cfg(test)]
pub(crate) use route::chain;
