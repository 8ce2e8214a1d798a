//! Sensor sampler — reads the sensor on a fixed cadence and filters out
//! unusable values.

use std::time::Duration;

use thermorelay_domain::error::{InvalidReading, ThermoRelayError};
use thermorelay_domain::sensor::{SensorReading, ValidRange};
use thermorelay_domain::time::{Instant, deadline_after, is_due};

use crate::ports::SensorDriver;

/// Default sampling cadence.
pub const DEFAULT_SAMPLING_INTERVAL: Duration = Duration::from_secs(10);

pub struct SensorSampler {
    range: ValidRange,
    interval: Duration,
    next_due: Option<Instant>,
    latest: Option<SensorReading>,
}

impl SensorSampler {
    #[must_use]
    pub fn new(range: ValidRange, interval: Duration) -> Self {
        Self {
            range,
            interval,
            next_due: None,
            latest: None,
        }
    }

    /// Whether a sample should be taken at `now`. The first call is always due.
    #[must_use]
    pub fn is_due(&self, now: Instant) -> bool {
        is_due(self.next_due, now)
    }

    /// Most recent reading, valid or not.
    #[must_use]
    pub fn latest(&self) -> Option<&SensorReading> {
        self.latest.as_ref()
    }

    /// Take one reading and schedule the next one.
    ///
    /// Driver errors and implausible values produce an invalid reading rather
    /// than an error: a bad sample skips the cycle, it never stops the loop.
    pub async fn sample<S: SensorDriver>(&mut self, sensor: &mut S, now: Instant) -> SensorReading {
        self.next_due = Some(deadline_after(now, self.interval));

        let reading = match sensor.read().await {
            Ok(raw) => match self.range.check(raw) {
                Ok(value) => {
                    tracing::debug!(value, "sensor sampled");
                    SensorReading::valid(value, now)
                }
                Err(err) => {
                    tracing::warn!(error = %err, raw, "sensor reading rejected");
                    SensorReading::invalid(raw, now)
                }
            },
            Err(err) => {
                let err = match err {
                    ThermoRelayError::InvalidReading(inner) => inner,
                    other => {
                        tracing::debug!(error = %other, "sensor driver failed");
                        InvalidReading::DriverFailure
                    }
                };
                tracing::warn!(error = %err, "sensor reading unavailable");
                SensorReading::invalid(f32::NAN, now)
            }
        };

        self.latest = Some(reading);
        reading
    }
}
