use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

use super::{read_config_file, BusConfig};
use crate::bus::{PinId, SpiBusHandle};
use crate::errors::{ConfigError, ConfigResult};
use crate::sensors::{ReadPolicy, SensorConfig, DEFAULT_CHIP_SELECT};

pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 2000;

/// Root configuration struct expecting `[[sensor]]` TOML array format
#[derive(Debug, Deserialize)]
pub struct SensorFile {
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,
    #[serde(rename = "sensor", default)]
    pub sensors: Vec<SensorEntry>,
}

/// One sensor entry, matching each `[[sensor]]` section
#[derive(Debug, Deserialize)]
pub struct SensorEntry {
    pub id: String,
    pub bus: String,
    #[serde(default = "default_chip_select")]
    pub chip_select: PinId,
    #[serde(default = "default_open_detection")]
    pub open_detection: bool,
    #[serde(default)]
    pub legacy_reads: bool,
}

fn default_sample_interval_ms() -> u64 {
    DEFAULT_SAMPLE_INTERVAL_MS
}

fn default_chip_select() -> PinId {
    DEFAULT_CHIP_SELECT
}

fn default_open_detection() -> bool {
    true
}

impl SensorEntry {
    pub fn to_sensor_config(&self, bus: SpiBusHandle) -> SensorConfig {
        SensorConfig {
            bus,
            chip_select: self.chip_select,
            open_detection: self.open_detection,
            label: Some(self.id.clone()),
            read_policy: if self.legacy_reads {
                ReadPolicy::Legacy
            } else {
                ReadPolicy::Strict
            },
        }
    }
}

impl SensorFile {
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    /// Check the file on its own and against the declared buses.
    pub fn validate(&self, buses: &BusConfig) -> ConfigResult<()> {
        if self.sample_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sample_interval_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        let mut ids = HashSet::new();
        let mut selects = HashSet::new();
        for s in &self.sensors {
            if !ids.insert(s.id.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate sensor id '{}'",
                    s.id
                )));
            }
            if !buses.contains(&s.bus) {
                return Err(ConfigError::UnknownBus {
                    sensor: s.id.clone(),
                    bus: s.bus.clone(),
                });
            }
            if !selects.insert((s.bus.as_str(), s.chip_select)) {
                return Err(ConfigError::ValidationError(format!(
                    "sensor '{}' reuses {} on bus '{}'",
                    s.id, s.chip_select, s.bus
                )));
            }
        }
        Ok(())
    }
}

pub fn parse_sensor_config(content: &str) -> ConfigResult<SensorFile> {
    Ok(toml::from_str(content)?)
}

/// Loads config from TOML file
pub fn load_sensor_config(path: &str) -> ConfigResult<SensorFile> {
    parse_sensor_config(&read_config_file(path)?)
}
