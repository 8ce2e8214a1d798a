//! Actuator driver — translates logical relay state into a line level.
//!
//! Relay boards differ in polarity: many opto-isolated modules energise the
//! coil when their input is pulled low. The driver hides that behind
//! [`Polarity`] and only touches the pin when the logical state changes.

use thermorelay_domain::actuator::{ActuatorState, ChannelId};
use thermorelay_domain::error::ThermoRelayError;

use crate::ports::{ActuatorPin, Level};

/// Which line level energises the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Polarity {
    #[default]
    ActiveHigh,
    ActiveLow,
}

impl Polarity {
    /// Line level that represents `state` under this polarity.
    #[must_use]
    pub fn level_for(self, state: ActuatorState) -> Level {
        match (self, state) {
            (Self::ActiveHigh, ActuatorState::On) | (Self::ActiveLow, ActuatorState::Off) => {
                Level::High
            }
            (Self::ActiveHigh, ActuatorState::Off) | (Self::ActiveLow, ActuatorState::On) => {
                Level::Low
            }
        }
    }
}

/// Drives one relay channel.
pub struct ActuatorDriver<P> {
    channel: ChannelId,
    polarity: Polarity,
    pin: P,
    emitted: Option<ActuatorState>,
}

impl<P: ActuatorPin> ActuatorDriver<P> {
    pub fn new(channel: ChannelId, polarity: Polarity, pin: P) -> Self {
        Self {
            channel,
            polarity,
            pin,
            emitted: None,
        }
    }

    #[must_use]
    pub fn channel(&self) -> &ChannelId {
        &self.channel
    }

    /// Last state successfully written to the pin.
    #[must_use]
    pub fn emitted(&self) -> Option<ActuatorState> {
        self.emitted
    }

    #[must_use]
    pub fn pin(&self) -> &P {
        &self.pin
    }

    pub fn pin_mut(&mut self) -> &mut P {
        &mut self.pin
    }

    /// Emit `state` on the pin unless it is already the emitted state.
    ///
    /// Returns `true` when the pin was written. A failed write leaves the
    /// emitted state untouched so the next call retries.
    ///
    /// # Errors
    ///
    /// Propagates [`ThermoRelayError::Actuator`] from the pin.
    pub fn apply(&mut self, state: ActuatorState) -> Result<bool, ThermoRelayError> {
        if self.emitted == Some(state) {
            return Ok(false);
        }
        let level = self.polarity.level_for(state);
        self.pin.set_level(level)?;
        tracing::debug!(channel = %self.channel, %state, ?level, "relay signal emitted");
        self.emitted = Some(state);
        Ok(true)
    }
}
