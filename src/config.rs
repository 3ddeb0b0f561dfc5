//! Dashboard configuration.
//!
//! Everything has a built-in default, so a missing config file is not an
//! error. A TOML file only needs to name the fields it overrides.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::MarketError;

pub const DEFAULT_SNAPSHOT_PATH: &str = "cleaned_flight_data.parquet";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Snapshot file read once at startup.
    pub snapshot_path: PathBuf,
    pub map: MapConfig,
    pub airports: Vec<AirportConfig>,
    /// Canonical routes as `ORIGIN-DEST` strings.
    pub routes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// `[lat, lon]` of the initial view.
    pub center: [f64; 2],
    pub zoom_start: u8,
    pub min_line_weight: f64,
    pub max_line_weight: f64,
    pub line_opacity: f64,
    pub marker_radius: u32,
    /// Delay before the map recomputes its size inside an iframe.
    pub resize_delay_ms: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AirportConfig {
    pub code: String,
    pub lat: f64,
    pub lon: f64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
            map: MapConfig::default(),
            airports: default_airports(),
            routes: [
                "LAX-LAS", "DEN-JFK", "ORD-DFW", "LAX-SFO", "JFK-MCO", "SFO-SEA",
            ]
            .iter()
            .map(|r| r.to_string())
            .collect(),
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: [39.8283, -98.5795],
            zoom_start: 4,
            min_line_weight: 2.0,
            max_line_weight: 8.0,
            line_opacity: 0.8,
            marker_radius: 7,
            resize_delay_ms: 500,
        }
    }
}

fn default_airports() -> Vec<AirportConfig> {
    [
        ("LAX", 33.9416, -118.4090),
        ("LAS", 36.0800, -115.1522),
        ("DEN", 39.8500, -104.6740),
        ("JFK", 40.6413, -73.7781),
        ("ORD", 41.9742, -87.9073),
        ("DFW", 32.8998, -97.0403),
        ("SFO", 37.6213, -122.3790),
        ("SEA", 47.4502, -122.3088),
        ("MCO", 28.4312, -81.3080),
    ]
    .iter()
    .map(|&(code, lat, lon)| AirportConfig {
        code: code.to_string(),
        lat,
        lon,
    })
    .collect()
}

impl DashboardConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, MarketError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, MarketError> {
        let text = std::fs::read_to_string(path)?;
        log::info!("loading dashboard config from {}", path.display());
        Self::from_toml_str(&text)
    }

    /// Load `path` when given, otherwise fall back to the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, MarketError> {
        match path {
            Some(p) => Self::from_toml_file(p),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<(), MarketError> {
        if self.map.min_line_weight > self.map.max_line_weight {
            return Err(MarketError::Config(format!(
                "min_line_weight ({}) exceeds max_line_weight ({})",
                self.map.min_line_weight, self.map.max_line_weight
            )));
        }
        if self.airports.iter().any(|a| a.code.trim().is_empty()) {
            return Err(MarketError::Config("airport with empty code".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_route_endpoint() {
        let config = DashboardConfig::default();
        assert_eq!(config.routes.len(), 6);
        assert_eq!(config.airports.len(), 9);
        for route in &config.routes {
            for code in route.split('-') {
                assert!(config.airports.iter().any(|a| a.code == code), "{code}");
            }
        }
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = DashboardConfig::from_toml_str(
            r#"
            snapshot_path = "data/market.parquet"

            [map]
            zoom_start = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.snapshot_path, PathBuf::from("data/market.parquet"));
        assert_eq!(config.map.zoom_start, 5);
        assert_eq!(config.map.max_line_weight, 8.0);
        assert_eq!(config.routes.len(), 6);
    }

    #[test]
    fn rejects_inverted_weights() {
        let err = DashboardConfig::from_toml_str(
            r#"
            [map]
            min_line_weight = 9.0
            max_line_weight = 2.0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, MarketError::Config(_)));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            DashboardConfig::from_toml_str("routes = 3"),
            Err(MarketError::Config(_))
        ));
    }
}
