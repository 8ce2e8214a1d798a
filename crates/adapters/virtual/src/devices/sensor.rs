//! Virtual temperature sensor — a deterministic triangle-wave sweep or a
//! scripted sequence of samples.

use std::collections::VecDeque;

use thermorelay_app::ports::SensorDriver;
use thermorelay_domain::error::{InvalidReading, ThermoRelayError};

#[derive(Debug)]
enum Source {
    Sweep {
        min: f32,
        max: f32,
        step: f32,
        current: f32,
        rising: bool,
    },
    Scripted {
        samples: VecDeque<f32>,
        last: Option<f32>,
    },
}

/// A simulated temperature sensor.
#[derive(Debug)]
pub struct VirtualSensor {
    source: Source,
}

impl Default for VirtualSensor {
    /// Sweeps 14 °C ↔ 28 °C by 0.5 °C per read, crossing a typical comfort
    /// band in both directions.
    fn default() -> Self {
        Self::sweep(14.0, 28.0, 0.5)
    }
}

impl VirtualSensor {
    /// Triangle wave starting at `min`, moving by `step` per read and turning
    /// around at each bound.
    #[must_use]
    pub fn sweep(min: f32, max: f32, step: f32) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            source: Source::Sweep {
                min,
                max,
                step: step.abs(),
                current: min,
                rising: true,
            },
        }
    }

    /// Replays `samples` in order, then repeats the last one. NaN entries are
    /// returned as is, simulating a failed conversion.
    #[must_use]
    pub fn scripted(samples: impl IntoIterator<Item = f32>) -> Self {
        Self {
            source: Source::Scripted {
                samples: samples.into_iter().collect(),
                last: None,
            },
        }
    }

    fn next_value(&mut self) -> Option<f32> {
        match &mut self.source {
            Source::Sweep {
                min,
                max,
                step,
                current,
                rising,
            } => {
                let value = *current;
                let next = if *rising {
                    *current + *step
                } else {
                    *current - *step
                };
                if next >= *max {
                    *current = *max;
                    *rising = false;
                } else if next <= *min {
                    *current = *min;
                    *rising = true;
                } else {
                    *current = next;
                }
                Some(value)
            }
            Source::Scripted { samples, last } => {
                if let Some(value) = samples.pop_front() {
                    *last = Some(value);
                }
                *last
            }
        }
    }
}

impl SensorDriver for VirtualSensor {
    async fn read(&mut self) -> Result<f32, ThermoRelayError> {
        self.next_value()
            .ok_or(ThermoRelayError::InvalidReading(InvalidReading::DriverFailure))
    }
}
