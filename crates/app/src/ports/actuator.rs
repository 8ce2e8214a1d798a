//! Actuator pin port — the physical output line driving a relay.

use thermorelay_domain::error::ThermoRelayError;

/// Electrical level of an output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    High,
    Low,
}

/// A single digital output.
pub trait ActuatorPin {
    /// Drive the line to `level`.
    ///
    /// # Errors
    ///
    /// Returns [`ThermoRelayError::Actuator`] when the driver rejects the
    /// change.
    fn set_level(&mut self, level: Level) -> Result<(), ThermoRelayError>;
}

impl<T: ActuatorPin + ?Sized> ActuatorPin for Box<T> {
    fn set_level(&mut self, level: Level) -> Result<(), ThermoRelayError> {
        (**self).set_level(level)
    }
}
