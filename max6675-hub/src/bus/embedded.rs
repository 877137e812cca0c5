//! [`SpiHost`] on top of `embedded-hal` 1.0 traits.
//!
//! Any `SpiBus` implementation plus a set of `OutputPin`s can drive MAX6675
//! sensors. Chip-select pins are either registered up front or produced on
//! demand by a pin factory the first time a sensor binds them.

use std::collections::HashMap;

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use tracing::debug;

use super::{PinId, PinLevel, SpiHost, SpiSettings};
use crate::errors::{BusError, BusResult};

/// Applies per-transaction settings to an SPI peripheral.
///
/// `embedded-hal` leaves clock rate and mode to the concrete HAL, so each
/// backend supplies its own way of reconfiguring.
pub trait ConfigureSpi {
    fn apply_settings(&mut self, settings: &SpiSettings) -> Result<(), String>;
}

pub type PinFactory<P> = Box<dyn FnMut(PinId) -> BusResult<P> + Send>;

pub struct HalHost<SPI, P> {
    name: String,
    spi: SPI,
    pins: HashMap<PinId, P>,
    factory: Option<PinFactory<P>>,
    applied: Option<SpiSettings>,
}

impl<SPI, P> HalHost<SPI, P> {
    pub fn new(name: impl Into<String>, spi: SPI) -> Self {
        Self {
            name: name.into(),
            spi,
            pins: HashMap::new(),
            factory: None,
            applied: None,
        }
    }

    /// Register a pin that is already configured as an output.
    pub fn with_pin(mut self, id: PinId, pin: P) -> Self {
        self.pins.insert(id, pin);
        self
    }

    pub fn with_pin_factory<F>(mut self, factory: F) -> Self
    where
        F: FnMut(PinId) -> BusResult<P> + Send + 'static,
    {
        self.factory = Some(Box::new(factory));
        self
    }

    /// Settings last pushed to the peripheral, if any
    pub fn applied_settings(&self) -> Option<&SpiSettings> {
        self.applied.as_ref()
    }

    pub fn into_inner(self) -> SPI {
        self.spi
    }
}

impl<SPI, P> HalHost<SPI, P>
where
    P: OutputPin,
{
    fn drive(&mut self, id: PinId, level: PinLevel) -> BusResult<()> {
        let pin = self.pins.get_mut(&id).ok_or_else(|| BusError::InvalidPin {
            bus: self.name.clone(),
            pin: id,
        })?;
        let result = match level {
            PinLevel::Low => pin.set_low(),
            PinLevel::High => pin.set_high(),
        };
        result.map_err(|e| BusError::PinWrite {
            bus: self.name.clone(),
            pin: id,
            reason: format!("{e:?}"),
        })
    }
}

impl<SPI, P> SpiHost for HalHost<SPI, P>
where
    SPI: SpiBus<u8> + ConfigureSpi + Send,
    P: OutputPin + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn begin(&mut self, cs: PinId) -> BusResult<()> {
        if !self.pins.contains_key(&cs) {
            let factory = self.factory.as_mut().ok_or_else(|| BusError::InvalidPin {
                bus: self.name.clone(),
                pin: cs,
            })?;
            let pin = factory(cs)?;
            debug!("[bus] {}: bound {}", self.name, cs);
            self.pins.insert(cs, pin);
        }
        self.drive(cs, PinLevel::High)
    }

    fn begin_transaction(&mut self, settings: &SpiSettings) -> BusResult<()> {
        if self.applied.as_ref() != Some(settings) {
            self.spi
                .apply_settings(settings)
                .map_err(|reason| BusError::Settings {
                    bus: self.name.clone(),
                    reason,
                })?;
            self.applied = Some(*settings);
        }
        Ok(())
    }

    fn end_transaction(&mut self) -> BusResult<()> {
        self.spi.flush().map_err(|e| BusError::Transfer {
            bus: self.name.clone(),
            reason: format!("flush: {e:?}"),
        })
    }

    fn transfer(&mut self, byte: u8) -> BusResult<u8> {
        let mut word = [byte];
        self.spi
            .transfer_in_place(&mut word)
            .map_err(|e| BusError::Transfer {
                bus: self.name.clone(),
                reason: format!("{e:?}"),
            })?;
        Ok(word[0])
    }

    fn write_pin(&mut self, pin: PinId, level: PinLevel) -> BusResult<()> {
        self.drive(pin, level)
    }
}
