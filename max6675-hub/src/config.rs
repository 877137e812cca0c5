pub mod bus_config;
pub mod sensor_config;

pub use bus_config::{load_bus_config, parse_bus_config, BusConfig, BusEntry};
pub use sensor_config::{load_sensor_config, parse_sensor_config, SensorEntry, SensorFile};

use std::fs;

use crate::errors::{ConfigError, ConfigResult};

fn read_config_file(path: &str) -> ConfigResult<String> {
    fs::read_to_string(path).map_err(|source| ConfigError::LoadError {
        path: path.to_string(),
        source,
    })
}

/// Bus and sensor files of one configuration directory
#[derive(Debug)]
pub struct HubConfig {
    pub buses: BusConfig,
    pub sensors: SensorFile,
}

/// Load `buses.toml` and `sensors.toml` from `config_path` and cross-check them.
pub fn load_hub_config(config_path: &str) -> ConfigResult<HubConfig> {
    let buses = load_bus_config(&format!("{}/buses.toml", config_path))?;
    let sensors = load_sensor_config(&format!("{}/sensors.toml", config_path))?;
    sensors.validate(&buses)?;
    Ok(HubConfig { buses, sensors })
}
