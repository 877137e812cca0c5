// Public modules
pub mod bus;
pub mod config;
pub mod errors;
pub mod hal;
pub mod registry;
pub mod scheduler;
pub mod sensors;
pub mod units;
pub mod worker;

// Re-export commonly used types
pub use bus::{PinId, SpiBusHandle, SpiHost, SpiSettings, MAX6675_SPI_SETTINGS};
pub use config::{load_hub_config, BusConfig, HubConfig, SensorFile};
pub use errors::{BusError, ConfigError, RegistryError, SensorError, SensorResult};
pub use registry::{Max6675Registry, SetupReport};
pub use scheduler::{sample_once, spawn_sampling};
pub use sensors::{AbsentReason, Max6675, Max6675Builder, ReadPolicy, Reading, SensorConfig};
pub use units::convert_c_to_f;

#[cfg(feature = "linux-hal")]
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Initialize tracing with default configuration
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();
}

/// Open every configured bus and key the handles by bus id.
#[cfg(feature = "linux-hal")]
pub fn open_buses(
    bus_cfg: &BusConfig,
) -> Result<std::collections::HashMap<String, SpiBusHandle>, RegistryError> {
    let mut bus_map = std::collections::HashMap::new();
    for b in &bus_cfg.buses {
        let host = bus::spidev::open_spidev(&b.id, &b.path).map_err(RegistryError::BusOpenError)?;
        bus_map.insert(b.id.clone(), SpiBusHandle::new(host));
    }
    Ok(bus_map)
}

/// Run the hub with the given configuration path
#[cfg(feature = "linux-hal")]
pub async fn run_hub(config_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    info!("[max6675-hub] starting up...");

    let cfg = load_hub_config(config_path)?;
    info!("[config] loaded {} sensor(s)", cfg.sensors.sensors.len());

    let buses = open_buses(&cfg.buses)?;
    info!("[bus] {} bus(es) opened", buses.len());

    let registry = Max6675Registry::instance();
    registry.register_all(&cfg.sensors, &buses)?;
    let report = registry.setup()?;
    if !report.is_complete() {
        warn!("[registry] continuing without sensor(s) {:?}", report.failed_indices());
    }

    let sampler = spawn_sampling(registry, cfg.sensors.sample_interval());
    info!("[main] sampling launched");

    sampler.await?;
    Ok(())
}
