use std::env;
use std::net::SocketAddr;

use crate::error::{config_error, Error};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5055";
pub const DEFAULT_IBGE_URL: &str = "https://servicodados.ibge.gov.br";
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";

#[derive(Clone, Debug)]
pub struct Config {
    pub backend_url: String,
    pub ibge_url: String,
    pub geocoder_url: String,
    pub listen_addr: SocketAddr,
    /// Zoom level the view jumps to when an origin is picked.
    pub selection_zoom: u8,
    pub snapshot_width: u32,
    pub snapshot_height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.into(),
            ibge_url: DEFAULT_IBGE_URL.into(),
            geocoder_url: DEFAULT_GEOCODER_URL.into(),
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            selection_zoom: 16,
            snapshot_width: 800,
            snapshot_height: 600,
        }
    }
}

impl Config {
    /// Reads `CAMINHO_*` variables, after loading a `.env` file if one is present.
    pub fn from_env() -> Result<Self, Error> {
        dotenv::dotenv().ok();

        let mut config = Config::default();

        if let Ok(url) = env::var("CAMINHO_BACKEND_URL") {
            config.backend_url = url;
        }
        if let Ok(url) = env::var("CAMINHO_IBGE_URL") {
            config.ibge_url = url;
        }
        if let Ok(url) = env::var("CAMINHO_GEOCODER_URL") {
            config.geocoder_url = url;
        }
        if let Ok(addr) = env::var("CAMINHO_LISTEN_ADDR") {
            config.listen_addr = addr
                .parse()
                .map_err(|_| config_error("CAMINHO_LISTEN_ADDR"))?;
        }
        if let Ok(zoom) = env::var("CAMINHO_SELECTION_ZOOM") {
            config.selection_zoom = zoom
                .parse()
                .map_err(|_| config_error("CAMINHO_SELECTION_ZOOM"))?;
        }
        if let Ok(size) = env::var("CAMINHO_SNAPSHOT_SIZE") {
            let (width, height) =
                parse_size(&size).ok_or_else(|| config_error("CAMINHO_SNAPSHOT_SIZE"))?;
            config.snapshot_width = width;
            config.snapshot_height = height;
        }

        Ok(config)
    }
}

fn parse_size(value: &str) -> Option<(u32, u32)> {
    let (width, height) = value.split_once('x')?;
    let width = width.trim().parse().ok()?;
    let height = height.trim().parse().ok()?;

    if width == 0 || height == 0 {
        return None;
    }

    Some((width, height))
}

#[test]
fn snapshot_size_parsing() {
    assert_eq!(parse_size("800x600"), Some((800, 600)));
    assert_eq!(parse_size(" 1024 x 768 "), Some((1024, 768)));
    assert_eq!(parse_size("0x600"), None);
    assert_eq!(parse_size("800"), None);
}
