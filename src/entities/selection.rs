use serde::{Deserialize, Serialize};

use crate::entities::GeoPoint;

/// Origin/destination choice of the live session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum SelectionState {
    #[default]
    Empty,
    OriginSet {
        origin: GeoPoint,
    },
    BothSet {
        origin: GeoPoint,
        destination: GeoPoint,
    },
}

impl SelectionState {
    pub fn is_complete(&self) -> bool {
        match self {
            Self::BothSet {
                origin: _,
                destination: _,
            } => true,
            _ => false,
        }
    }
}
