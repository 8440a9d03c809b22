use crate::zones::{Zone, ZoneTable};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub map: MapConfig,
    /// Ordered zone table; the built-in table is used when empty.
    #[serde(default)]
    pub zones: Vec<Zone>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    pub boundaries: PathBuf,
    #[serde(default = "default_district_column")]
    pub district_column: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    pub static_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone, serde::Serialize)]
pub struct MapConfig {
    /// Initial view as `[latitude, longitude]`.
    #[serde(default = "default_center")]
    pub center: [f64; 2],
    #[serde(default = "default_zoom")]
    pub zoom: u8,
}

fn default_district_column() -> String {
    "NAME_1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_center() -> [f64; 2] {
    [39.5, -8.0]
}

fn default_zoom() -> u8 {
    7
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            static_dir: None,
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: default_center(),
            zoom: default_zoom(),
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }

    pub fn zone_table(&self) -> ZoneTable {
        if self.zones.is_empty() {
            ZoneTable::default()
        } else {
            ZoneTable::new(self.zones.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [input]
            boundaries = "data/distritos.shp"
            "#,
        )
        .unwrap();
        assert_eq!(config.input.district_column, "NAME_1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.map.center, [39.5, -8.0]);
        assert_eq!(config.map.zoom, 7);
        assert_eq!(config.zone_table(), ZoneTable::default());
    }

    #[test]
    fn custom_zones_keep_their_order() {
        let config = AppConfig::from_toml(
            r#"
            [input]
            boundaries = "districts.geojson"
            district_column = "DISTRITO"

            [server]
            port = 9000
            static_dir = "web"

            [[zones]]
            name = "Norte"
            districts = ["Porto", "Braga"]

            [[zones]]
            name = "Litoral"
            districts = ["Porto", "Lisboa"]
            "#,
        )
        .unwrap();
        let table = config.zone_table();
        assert_eq!(table.classify("Porto"), "Norte");
        assert_eq!(table.classify("Lisboa"), "Litoral");
        assert_eq!(table.classify("Faro"), "Unknown");
        assert_eq!(config.server.static_dir, Some(PathBuf::from("web")));
    }

    #[test]
    fn missing_input_section_is_rejected() {
        assert!(AppConfig::from_toml("[server]\nport = 1").is_err());
    }
}
