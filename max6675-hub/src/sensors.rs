pub mod max6675;

pub use max6675::{decode, Max6675, Max6675Builder, ReadPolicy, SensorConfig, DEFAULT_CHIP_SELECT};

use crate::units::convert_c_to_f;

/// Why a reading carries no temperature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbsentReason {
    /// Thermocouple input open or missing (chip status bit D2)
    OpenCircuit,
}

/// Outcome of one successful bus read.
///
/// The unit of `Value` depends on the call that produced it. An absent
/// reading is a normal steady state of the hardware, not an error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    Value(f32),
    Absent(AbsentReason),
}

impl Reading {
    pub fn value(&self) -> Option<f32> {
        match self {
            Reading::Value(v) => Some(*v),
            Reading::Absent(_) => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Reading::Absent(_))
    }

    pub fn absent_reason(&self) -> Option<AbsentReason> {
        match self {
            Reading::Value(_) => None,
            Reading::Absent(reason) => Some(*reason),
        }
    }

    pub fn map<F: FnOnce(f32) -> f32>(self, f: F) -> Reading {
        match self {
            Reading::Value(v) => Reading::Value(f(v)),
            absent => absent,
        }
    }

    /// Interpret a Celsius reading in Fahrenheit.
    pub fn to_fahrenheit(self) -> Reading {
        self.map(convert_c_to_f)
    }
}
