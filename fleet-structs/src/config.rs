use serde::{Deserialize, Serialize};

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const DEFAULT_TILE_ATTRIBUTION: &str =
    "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a>";

/// Settings for talking to the optimization service and drawing the map.
///
/// Every field has a default, so a partial json object is a valid config.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    pub api_url: String,
    pub tile_url: String,
    pub tile_attribution: String,
    /// Map centre used while there are no deliveries to show.
    pub fallback_center: GeoPoint,
    pub zoom: u8,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            tile_url: DEFAULT_TILE_URL.to_string(),
            tile_attribution: DEFAULT_TILE_ATTRIBUTION.to_string(),
            fallback_center: GeoPoint {
                latitude: 13.0,
                longitude: 77.6,
            },
            zoom: 12,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}
