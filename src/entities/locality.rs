use serde::{Deserialize, Serialize};

/// A first-level administrative region (Brazilian state).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub id: u32,
    #[serde(default)]
    pub sigla: String,
    pub nome: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: u32,
    pub nome: String,
}
