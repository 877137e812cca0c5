/// Board-specific constants and configuration for a Raspberry Pi with
/// MAX6675 breakouts on SPI0
///
/// Wiring:
/// - SCK  -> GPIO11 (SCLK)
/// - SO   -> GPIO9  (MISO)
/// - CS   -> any free GPIO, listed per sensor in `sensors.toml`

/// Default configuration directory
pub const CONFIG_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/config");

/// Embedded TOML configurations
pub const BUSES_TOML: &str = include_str!("../config/buses.toml");
pub const SENSORS_TOML: &str = include_str!("../config/sensors.toml");

/// Board name
pub const BOARD_NAME: &str = "RaspberryPi-MAX6675";

/// Get the configuration path (allow override via CONFIG_PATH env var)
pub fn get_config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| CONFIG_DIR.to_string())
}
