use thiserror::Error;

use crate::bus::PinId;

/// Errors raised by an SPI host while binding pins or moving bytes
#[derive(Error, Debug)]
pub enum BusError {
    #[error("Bus '{bus}' has no usable pin {pin}")]
    InvalidPin { bus: String, pin: PinId },

    #[error("Bus '{bus}' pin {pin} could not be driven: {reason}")]
    PinWrite { bus: String, pin: PinId, reason: String },

    #[error("Bus '{bus}' transfer failed: {reason}")]
    Transfer { bus: String, reason: String },

    #[error("Bus '{bus}' rejected transaction settings: {reason}")]
    Settings { bus: String, reason: String },

    #[error("Failed to open SPI device '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors for a single MAX6675 sensor unit
#[derive(Error, Debug)]
pub enum SensorError {
    #[error("Bus error: {0}")]
    Bus(#[from] BusError),

    #[error("Sensor '{sensor}' was read before initialize()")]
    NotInitialized { sensor: String },

    #[error("Sensor '{sensor}' is already initialized")]
    AlreadyInitialized { sensor: String },
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from '{path}': {source}")]
    LoadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration format: {0}")]
    FormatError(#[from] toml::de::Error),

    #[error("Sensor '{sensor}' refers to unknown bus '{bus}'")]
    UnknownBus { sensor: String, bus: String },

    #[error("Unsupported bus type '{kind}' for bus '{bus}'")]
    UnsupportedBus { bus: String, kind: String },

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Registry and initialization errors
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Registry setup() has already run")]
    AlreadySetUp,

    #[error("Sensor #{index} was added after setup() and will stay uninitialized")]
    LateRegistration { index: usize },

    #[error("{} sensor(s) failed to initialize: {}", .failures.len(), describe_failures(.failures))]
    PartialInit { failures: Vec<(usize, SensorError)> },

    #[error("No sensor at index {index}")]
    NoSuchSensor { index: usize },

    #[error("Failed to start background worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    #[error("Bus initialization failed: {0}")]
    BusInitError(#[from] ConfigError),

    #[error("Failed to open bus: {0}")]
    BusOpenError(#[source] BusError),
}

fn describe_failures(failures: &[(usize, SensorError)]) -> String {
    failures
        .iter()
        .map(|(index, err)| format!("#{index}: {err}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type aliases for convenience
pub type BusResult<T> = Result<T, BusError>;
pub type SensorResult<T> = Result<T, SensorError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type RegistryResult<T> = Result<T, RegistryError>;
