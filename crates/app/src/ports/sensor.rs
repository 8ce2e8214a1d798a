//! Sensor driver port.

use std::future::Future;

use thermorelay_domain::error::ThermoRelayError;

/// Driver for the temperature sensor.
pub trait SensorDriver {
    /// Return the latest reading in °C.
    ///
    /// Drivers may return `f32::NAN` for a failed conversion; the sampler
    /// treats that the same as an error.
    fn read(&mut self) -> impl Future<Output = Result<f32, ThermoRelayError>> + Send;
}
