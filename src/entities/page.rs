use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{City, GeoPoint, State};

pub const STATE_PLACEHOLDER: &str = "Select the state";
pub const STATES_ERROR_PLACEHOLDER: &str = "Error loading states";
pub const CITY_PLACEHOLDER: &str = "Select the city";
pub const CITIES_LOADING_PLACEHOLDER: &str = "Loading...";
pub const CITIES_ERROR_PLACEHOLDER: &str = "Error loading cities";

/// Everything a user can see on the page, kept in one place so the controller
/// can be driven and inspected without a browser.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub states: Vec<State>,
    pub state_placeholder: String,
    pub selected_state: Option<State>,
    pub cities: Vec<City>,
    pub city_selector_enabled: bool,
    pub city_placeholder: String,
    pub selected_city: Option<String>,

    pub origin_field: String,
    pub destination_field: String,
    pub calculate_enabled: bool,

    pub status: String,
    pub instructions: String,
    pub loading: bool,
    pub alert: Option<String>,

    pub viewport_visible: bool,
    pub instructions_visible: bool,

    pub distance_text: Option<String>,
    pub vertex_count: Option<usize>,
    pub edge_count: Option<usize>,

    pub snapshot: Option<SnapshotInfo>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Origin,
    Destination,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotInfo {
    pub caption: String,
    pub taken_at: DateTime<Utc>,
    pub width: u32,
    pub height: u32,
    pub bytes: usize,
}

impl Page {
    pub fn new() -> Self {
        Self {
            state_placeholder: STATE_PLACEHOLDER.into(),
            city_placeholder: CITY_PLACEHOLDER.into(),
            ..Default::default()
        }
    }

    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::Origin => &self.origin_field,
            Field::Destination => &self.destination_field,
        }
    }

    pub fn set_field(&mut self, field: Field, point: Option<GeoPoint>) {
        let text = point.map(|p| p.to_string()).unwrap_or_default();

        match field {
            Field::Origin => self.origin_field = text,
            Field::Destination => self.destination_field = text,
        }
    }

    pub fn clear_route_summary(&mut self) {
        self.distance_text = None;
        self.vertex_count = None;
        self.edge_count = None;
    }
}
