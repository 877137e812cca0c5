//! SPI transport seam.
//!
//! The driver never talks to hardware directly. Everything it needs from the
//! platform is expressed by [`SpiHost`]: binding a chip-select pin, framing a
//! transaction, clocking single bytes and driving a pin. Hosts are shared
//! between sensors through a cloneable [`SpiBusHandle`].

pub mod embedded;
#[cfg(feature = "linux-hal")]
pub mod spidev;

use std::fmt;
use std::sync::Arc;

use embedded_hal::spi::{Mode, MODE_3};
use parking_lot::{Mutex, MutexGuard};
use serde::Deserialize;
use tracing::warn;

use crate::errors::BusResult;

/// Platform pin number used as a chip select
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct PinId(pub u32);

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GPIO{}", self.0)
    }
}

impl From<u32> for PinId {
    fn from(pin: u32) -> Self {
        PinId(pin)
    }
}

/// Logic level for a GPIO output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinLevel {
    Low,
    High,
}

/// Bit order on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOrder {
    MsbFirst,
    LsbFirst,
}

/// Per-transaction SPI parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiSettings {
    pub clock_hz: u32,
    pub bit_order: BitOrder,
    pub mode: Mode,
}

/// MAX6675 timing: 4 MHz, MSB first, SPI mode 3
pub const MAX6675_SPI_SETTINGS: SpiSettings = SpiSettings {
    clock_hz: 4_000_000,
    bit_order: BitOrder::MsbFirst,
    mode: MODE_3,
};

/// Capabilities the driver consumes from the host platform.
///
/// Implementations must tolerate `write_pin` and `end_transaction` being
/// called after a failed `transfer`.
pub trait SpiHost: Send {
    /// Bus identifier used in logs and errors
    fn name(&self) -> &str;

    /// Bind `cs` as an output and leave it idle-high.
    fn begin(&mut self, cs: PinId) -> BusResult<()>;

    fn begin_transaction(&mut self, settings: &SpiSettings) -> BusResult<()>;

    fn end_transaction(&mut self) -> BusResult<()>;

    /// Clock one byte out and return the byte clocked in.
    fn transfer(&mut self, byte: u8) -> BusResult<u8>;

    fn write_pin(&mut self, pin: PinId, level: PinLevel) -> BusResult<()>;
}

/// Cloneable, shareable handle to one SPI host
#[derive(Clone)]
pub struct SpiBusHandle {
    name: Arc<str>,
    host: Arc<Mutex<Box<dyn SpiHost>>>,
}

impl SpiBusHandle {
    pub fn new<H: SpiHost + 'static>(host: H) -> Self {
        let name: Arc<str> = Arc::from(host.name());
        Self {
            name,
            host: Arc::new(Mutex::new(Box::new(host))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Exclusive access to the host for the duration of the guard.
    pub fn lock(&self) -> MutexGuard<'_, Box<dyn SpiHost>> {
        self.host.lock()
    }

    /// Whether both handles refer to the same host
    pub fn same_bus(&self, other: &SpiBusHandle) -> bool {
        Arc::ptr_eq(&self.host, &other.host)
    }
}

impl fmt::Debug for SpiBusHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpiBusHandle").field("name", &self.name).finish()
    }
}

/// One framed transaction with a chip selected.
///
/// Dropping the value releases chip select and ends the transaction, whatever
/// path the caller leaves by.
pub struct Transaction<'a> {
    host: MutexGuard<'a, Box<dyn SpiHost>>,
    cs: PinId,
}

impl<'a> Transaction<'a> {
    pub fn open(bus: &'a SpiBusHandle, cs: PinId, settings: &SpiSettings) -> BusResult<Self> {
        let mut host = bus.lock();
        host.begin_transaction(settings)?;
        if let Err(e) = host.write_pin(cs, PinLevel::Low) {
            if let Err(end) = host.end_transaction() {
                warn!("[bus] {}: end_transaction after failed select: {}", bus.name(), end);
            }
            return Err(e);
        }
        Ok(Self { host, cs })
    }

    pub fn transfer(&mut self, byte: u8) -> BusResult<u8> {
        self.host.transfer(byte)
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.host.write_pin(self.cs, PinLevel::High) {
            warn!("[bus] {}: failed to release {}: {}", self.host.name(), self.cs, e);
        }
        if let Err(e) = self.host.end_transaction() {
            warn!("[bus] {}: end_transaction failed: {}", self.host.name(), e);
        }
    }
}
