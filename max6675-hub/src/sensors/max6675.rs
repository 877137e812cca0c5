//! MAX6675 cold-junction-compensated K-type thermocouple converter.
//!
//! The chip is read-only: pulling chip select low and clocking 16 bits out
//! returns one conversion result, MSB first:
//!
//! | bit   | meaning                          |
//! |-------|----------------------------------|
//! | 15    | dummy, always 0                  |
//! | 14..3 | temperature, 0.25 °C per count   |
//! | 2     | thermocouple input open          |
//! | 1..0  | device id and tri-state, ignored |
//!
//! A bus with no chip attached usually reads as all zeros, which decodes to a
//! valid-looking 0.0 °C. The protocol offers no way to tell the two apart.

use tracing::{debug, trace, warn};

use super::{AbsentReason, Reading};
use crate::bus::{PinId, SpiBusHandle, Transaction, MAX6675_SPI_SETTINGS};
use crate::errors::{SensorError, SensorResult};
use crate::units::convert_c_to_f;

/// Default chip select (CE0 on the Raspberry Pi header)
pub const DEFAULT_CHIP_SELECT: PinId = PinId(8);

const OPEN_CIRCUIT_BIT: u16 = 0b100;
const STATUS_BITS: u16 = 3;
const COUNTS_PER_DEGREE: f32 = 4.0;

/// How a sensor behaves when used outside its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadPolicy {
    /// Reads before `initialize()` and repeated initialization are errors.
    #[default]
    Strict,
    /// Reads before `initialize()` yield a zero word (0.0 °C) and
    /// `initialize()` may be repeated.
    Legacy,
}

#[derive(Debug, Clone)]
pub struct SensorConfig {
    pub bus: SpiBusHandle,
    pub chip_select: PinId,
    pub open_detection: bool,
    pub label: Option<String>,
    pub read_policy: ReadPolicy,
}

impl SensorConfig {
    pub fn new(bus: SpiBusHandle) -> Self {
        Self {
            bus,
            chip_select: DEFAULT_CHIP_SELECT,
            open_detection: true,
            label: None,
            read_policy: ReadPolicy::Strict,
        }
    }
}

/// Fluent configuration for a [`Max6675`]; consumed by `build()`.
#[derive(Debug, Clone)]
pub struct Max6675Builder {
    config: SensorConfig,
}

impl Max6675Builder {
    pub fn new(bus: SpiBusHandle) -> Self {
        Self {
            config: SensorConfig::new(bus),
        }
    }

    pub fn with_bus(mut self, bus: SpiBusHandle) -> Self {
        self.config.bus = bus;
        self
    }

    pub fn with_chip_select(mut self, pin: impl Into<PinId>) -> Self {
        self.config.chip_select = pin.into();
        self
    }

    /// Open detection only works when T- is tied to GND. Disable it for
    /// isolated thermocouples, otherwise bit D2 floats.
    pub fn with_open_detection(mut self, enabled: bool) -> Self {
        self.config.open_detection = enabled;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.config.label = Some(label.into());
        self
    }

    pub fn with_read_policy(mut self, policy: ReadPolicy) -> Self {
        self.config.read_policy = policy;
        self
    }

    pub fn config(self) -> SensorConfig {
        self.config
    }

    pub fn build(self) -> Max6675 {
        Max6675::new(self.config)
    }
}

/// One MAX6675 bound to a bus and chip-select pin.
///
/// Call [`initialize`](Max6675::initialize) once before reading.
#[derive(Debug)]
pub struct Max6675 {
    config: SensorConfig,
    label: String,
    initialized: bool,
}

impl Max6675 {
    pub fn new(config: SensorConfig) -> Self {
        let label = config
            .label
            .clone()
            .unwrap_or_else(|| format!("{}:cs{}", config.bus.name(), config.chip_select.0));
        Self {
            config,
            label,
            initialized: false,
        }
    }

    pub fn builder(bus: SpiBusHandle) -> Max6675Builder {
        Max6675Builder::new(bus)
    }

    /// Sensor on `bus` using the default chip select
    pub fn on_bus(bus: SpiBusHandle) -> Self {
        Self::new(SensorConfig::new(bus))
    }

    pub fn with_pin(bus: SpiBusHandle, chip_select: impl Into<PinId>) -> Self {
        Self::builder(bus).with_chip_select(chip_select).build()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn bus(&self) -> &SpiBusHandle {
        &self.config.bus
    }

    pub fn chip_select(&self) -> PinId {
        self.config.chip_select
    }

    pub fn open_detection(&self) -> bool {
        self.config.open_detection
    }

    pub fn read_policy(&self) -> ReadPolicy {
        self.config.read_policy
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Bind the chip select as an output and park it high.
    pub fn initialize(&mut self) -> SensorResult<()> {
        if self.initialized && self.config.read_policy == ReadPolicy::Strict {
            return Err(SensorError::AlreadyInitialized {
                sensor: self.label.clone(),
            });
        }
        self.config.bus.lock().begin(self.config.chip_select)?;
        self.initialized = true;
        debug!(
            "[max6675] {}: initialized on {} {}",
            self.label,
            self.config.bus.name(),
            self.config.chip_select
        );
        Ok(())
    }

    /// One 16-bit conversion result, exactly as clocked out of the chip.
    pub fn read_raw(&self) -> SensorResult<u16> {
        if !self.initialized {
            return match self.config.read_policy {
                ReadPolicy::Strict => Err(SensorError::NotInitialized {
                    sensor: self.label.clone(),
                }),
                ReadPolicy::Legacy => {
                    warn!("[max6675] {}: read before initialize", self.label);
                    Ok(0)
                }
            };
        }

        let mut tx = Transaction::open(
            &self.config.bus,
            self.config.chip_select,
            &MAX6675_SPI_SETTINGS,
        )?;
        let msb = tx.transfer(0x00)?;
        let lsb = tx.transfer(0x00)?;
        drop(tx);

        let raw = u16::from_be_bytes([msb, lsb]);
        trace!("[max6675] {}: raw {:#06x}", self.label, raw);
        Ok(raw)
    }

    /// Temperature in degrees Celsius, 0.0..=1023.75 in 0.25 steps.
    pub fn read_value(&self) -> SensorResult<Reading> {
        let reading = decode(self.read_raw()?, self.config.open_detection);
        if reading.is_absent() {
            debug!("[max6675] {}: thermocouple open", self.label);
        }
        Ok(reading)
    }

    /// Temperature in degrees Fahrenheit, 32.0..=1874.75.
    pub fn read_value_fahrenheit(&self) -> SensorResult<Reading> {
        Ok(self.read_value()?.map(convert_c_to_f))
    }
}

/// Decode a raw conversion word into degrees Celsius.
pub fn decode(raw: u16, open_detection: bool) -> Reading {
    if open_detection && raw & OPEN_CIRCUIT_BIT != 0 {
        return Reading::Absent(AbsentReason::OpenCircuit);
    }
    Reading::Value(f32::from(raw >> STATUS_BITS) / COUNTS_PER_DEGREE)
}
