//! Sensor readings and the range that makes them usable.

use crate::error::{InvalidReading, ValidationError};
use crate::time::Instant;

/// Latest sample produced by the sampler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    pub value: f32,
    pub valid: bool,
    pub taken_at: Instant,
}

impl SensorReading {
    #[must_use]
    pub fn valid(value: f32, taken_at: Instant) -> Self {
        Self {
            value,
            valid: true,
            taken_at,
        }
    }

    /// A rejected sample. The value is kept for diagnostics only.
    #[must_use]
    pub fn invalid(value: f32, taken_at: Instant) -> Self {
        Self {
            value,
            valid: false,
            taken_at,
        }
    }

    /// The value, if the reading may be used by automation and telemetry.
    #[must_use]
    pub fn usable_value(&self) -> Option<f32> {
        self.valid.then_some(self.value)
    }
}

/// Inclusive range of physically plausible values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidRange {
    min: f32,
    max: f32,
}

impl ValidRange {
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptySensorRange`] unless both bounds are
    /// finite and `min < max`.
    pub fn new(min: f32, max: f32) -> Result<Self, ValidationError> {
        if !(min.is_finite() && max.is_finite() && min < max) {
            return Err(ValidationError::EmptySensorRange { min, max });
        }
        Ok(Self { min, max })
    }

    #[must_use]
    pub fn min(&self) -> f32 {
        self.min
    }

    #[must_use]
    pub fn max(&self) -> f32 {
        self.max
    }

    /// Accept `value` if it is finite and inside the range.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidReading::NotFinite`] for NaN or infinities and
    /// [`InvalidReading::OutOfRange`] for values outside the bounds.
    pub fn check(&self, value: f32) -> Result<f32, InvalidReading> {
        if !value.is_finite() {
            return Err(InvalidReading::NotFinite);
        }
        if value < self.min || value > self.max {
            return Err(InvalidReading::OutOfRange {
                value,
                min: self.min,
                max: self.max,
            });
        }
        Ok(value)
    }
}

impl Default for ValidRange {
    /// Operating range of common digital temperature sensors, in °C.
    fn default() -> Self {
        Self {
            min: -40.0,
            max: 125.0,
        }
    }
}
