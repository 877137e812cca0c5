use serde::Deserialize;
use std::collections::HashSet;

use super::read_config_file;
use crate::errors::{ConfigError, ConfigResult};

pub const SPIDEV_BUS_TYPE: &str = "spidev";

/// Root structure for loading `[[bus]]` style TOML config
#[derive(Debug, Deserialize)]
pub struct BusConfig {
    #[serde(rename = "bus", default)]
    pub buses: Vec<BusEntry>,
}

/// One SPI bus entry
#[derive(Debug, Deserialize)]
pub struct BusEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub r#type: String, // 'type' is a reserved word in Rust, use raw identifier
    pub path: String,
}

impl BusConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        let mut seen = HashSet::new();
        for bus in &self.buses {
            if bus.r#type != SPIDEV_BUS_TYPE {
                return Err(ConfigError::UnsupportedBus {
                    bus: bus.id.clone(),
                    kind: bus.r#type.clone(),
                });
            }
            if !seen.insert(bus.id.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate bus id '{}'",
                    bus.id
                )));
            }
        }
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.buses.iter().any(|b| b.id == id)
    }
}

pub fn parse_bus_config(content: &str) -> ConfigResult<BusConfig> {
    let parsed: BusConfig = toml::from_str(content)?;
    parsed.validate()?;
    Ok(parsed)
}

/// Load bus config file
pub fn load_bus_config(path: &str) -> ConfigResult<BusConfig> {
    parse_bus_config(&read_config_file(path)?)
}
