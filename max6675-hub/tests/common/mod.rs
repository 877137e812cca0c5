//! Simulated SPI bus with MAX6675 chips hanging off individual selects.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use max6675_hub::bus::{PinId, PinLevel, SpiHost, SpiSettings};
use max6675_hub::errors::{BusError, BusResult};
use parking_lot::Mutex;

#[derive(Default)]
pub struct BusState {
    /// Conversion word each chip returns, keyed by its select pin
    pub chips: HashMap<PinId, u16>,
    /// Pins the platform refuses to bind
    pub invalid: HashSet<PinId>,
    pub bound: Vec<PinId>,
    pub selected: Option<PinId>,
    pub byte_index: usize,
    pub transactions: usize,
    pub settings: Vec<SpiSettings>,
    pub idle_high_after: bool,
}

#[derive(Clone)]
pub struct SimulatedBus {
    name: String,
    pub state: Arc<Mutex<BusState>>,
}

impl SimulatedBus {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: Arc::new(Mutex::new(BusState::default())),
        }
    }

    pub fn with_chip(self, cs: u32, word: u16) -> Self {
        self.state.lock().chips.insert(PinId(cs), word);
        self
    }

    pub fn with_invalid_pin(self, cs: u32) -> Self {
        self.state.lock().invalid.insert(PinId(cs));
        self
    }

    pub fn set_word(&self, cs: u32, word: u16) {
        self.state.lock().chips.insert(PinId(cs), word);
    }

    pub fn transactions(&self) -> usize {
        self.state.lock().transactions
    }
}

impl SpiHost for SimulatedBus {
    fn name(&self) -> &str {
        &self.name
    }

    fn begin(&mut self, cs: PinId) -> BusResult<()> {
        let mut state = self.state.lock();
        if state.invalid.contains(&cs) {
            return Err(BusError::InvalidPin {
                bus: self.name.clone(),
                pin: cs,
            });
        }
        state.bound.push(cs);
        Ok(())
    }

    fn begin_transaction(&mut self, settings: &SpiSettings) -> BusResult<()> {
        self.state.lock().settings.push(*settings);
        Ok(())
    }

    fn end_transaction(&mut self) -> BusResult<()> {
        let mut state = self.state.lock();
        state.transactions += 1;
        state.idle_high_after = state.selected.is_none();
        Ok(())
    }

    fn transfer(&mut self, _byte: u8) -> BusResult<u8> {
        let mut state = self.state.lock();
        // An unpopulated select floats low: the bus reads zeros.
        let word = state
            .selected
            .and_then(|cs| state.chips.get(&cs).copied())
            .unwrap_or(0);
        let out = word.to_be_bytes()[state.byte_index % 2];
        state.byte_index += 1;
        Ok(out)
    }

    fn write_pin(&mut self, pin: PinId, level: PinLevel) -> BusResult<()> {
        let mut state = self.state.lock();
        if !state.bound.contains(&pin) {
            return Err(BusError::InvalidPin {
                bus: self.name.clone(),
                pin,
            });
        }
        match level {
            PinLevel::Low => {
                state.selected = Some(pin);
                state.byte_index = 0;
            }
            PinLevel::High => state.selected = None,
        }
        Ok(())
    }
}
