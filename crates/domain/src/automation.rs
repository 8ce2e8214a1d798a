//! Automation — threshold rule with hysteresis and a timed economy fallback.
//!
//! The rule watches one quantity (temperature) against a hysteresis band
//! `[low, high]`:
//!
//! | Band | Condition | Actuator |
//! |------|-----------|----------|
//! | [`Band::Below`] | `value <= low` | On |
//! | [`Band::InBand`] | `low < value < high` | unchanged |
//! | [`Band::Above`] | `value >= high` | Off, economy timer armed |
//!
//! Once armed, the economy timer fires exactly once when the quantity has
//! stayed [`Band::Above`] for at least the configured delay. Leaving
//! `Above` disarms it.

use std::fmt;
use std::time::Duration;

use crate::actuator::ActuatorState;
use crate::error::ValidationError;
use crate::time::{Instant, elapsed_between};

/// Static automation configuration, validated once at startup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutomationPolicy {
    low_threshold: f32,
    high_threshold: f32,
    economy_delay: Duration,
}

impl AutomationPolicy {
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyHysteresisBand`] unless both thresholds
    /// are finite and `low < high`.
    pub fn new(
        low_threshold: f32,
        high_threshold: f32,
        economy_delay: Duration,
    ) -> Result<Self, ValidationError> {
        if !(low_threshold.is_finite() && high_threshold.is_finite())
            || low_threshold >= high_threshold
        {
            return Err(ValidationError::EmptyHysteresisBand {
                low: low_threshold,
                high: high_threshold,
            });
        }
        Ok(Self {
            low_threshold,
            high_threshold,
            economy_delay,
        })
    }

    #[must_use]
    pub fn low_threshold(&self) -> f32 {
        self.low_threshold
    }

    #[must_use]
    pub fn high_threshold(&self) -> f32 {
        self.high_threshold
    }

    #[must_use]
    pub fn economy_delay(&self) -> Duration {
        self.economy_delay
    }

    /// Position of `value` relative to the hysteresis band.
    #[must_use]
    pub fn classify(&self, value: f32) -> Band {
        if value <= self.low_threshold {
            Band::Below
        } else if value >= self.high_threshold {
            Band::Above
        } else {
            Band::InBand
        }
    }
}

/// Position of the monitored quantity relative to the band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Below,
    InBand,
    Above,
}

impl Band {
    /// Actuator state this band demands, `None` inside the band.
    #[must_use]
    pub fn demand(self) -> Option<ActuatorState> {
        match self {
            Self::Below => Some(ActuatorState::On),
            Self::InBand => None,
            Self::Above => Some(ActuatorState::Off),
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Below => f.write_str("below"),
            Self::InBand => f.write_str("in_band"),
            Self::Above => f.write_str("above"),
        }
    }
}

/// Economy countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AutomationTimerState {
    pub armed_at: Option<Instant>,
    /// Latched once the economy action ran for the current arming.
    pub fired: bool,
}

impl AutomationTimerState {
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed_at.is_some()
    }

    fn disarm(&mut self) -> bool {
        let was_armed = self.armed_at.is_some();
        *self = Self::default();
        was_armed
    }
}

/// What happened to the economy timer during one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Unchanged,
    Armed,
    Disarmed,
    EconomyFired,
}

/// Result of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub band: Band,
    /// State to drive the actuator to, `None` to leave it as is.
    pub action: Option<ActuatorState>,
    pub timer: TimerEvent,
}

/// Mutable state of the rule between evaluations.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutomationState {
    band: Option<Band>,
    timer: AutomationTimerState,
}

impl AutomationState {
    /// Band seen at the last evaluation, `None` before the first one.
    #[must_use]
    pub fn band(&self) -> Option<Band> {
        self.band
    }

    #[must_use]
    pub fn timer(&self) -> AutomationTimerState {
        self.timer
    }

    /// Evaluate a valid reading taken at `now`.
    pub fn step(&mut self, policy: &AutomationPolicy, value: f32, now: Instant) -> Decision {
        let band = policy.classify(value);
        self.band = Some(band);

        let timer = match band {
            Band::Above => match self.timer.armed_at {
                None => {
                    self.timer.armed_at = Some(now);
                    if policy.economy_delay.is_zero() {
                        self.timer.fired = true;
                        TimerEvent::EconomyFired
                    } else {
                        TimerEvent::Armed
                    }
                }
                Some(armed_at)
                    if !self.timer.fired
                        && elapsed_between(armed_at, now) >= policy.economy_delay =>
                {
                    self.timer.fired = true;
                    TimerEvent::EconomyFired
                }
                Some(_) => TimerEvent::Unchanged,
            },
            Band::Below | Band::InBand => {
                if self.timer.disarm() {
                    TimerEvent::Disarmed
                } else {
                    TimerEvent::Unchanged
                }
            }
        };

        Decision {
            band,
            action: band.demand(),
            timer,
        }
    }
}
