//! Virtual relay — an output line that records every level it is driven to.

use thermorelay_app::ports::{ActuatorPin, Level};
use thermorelay_domain::error::ThermoRelayError;

#[derive(Debug, Default)]
pub struct VirtualRelay {
    name: String,
    history: Vec<Level>,
    jammed: bool,
}

impl VirtualRelay {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Current line level, `None` before the first write.
    #[must_use]
    pub fn level(&self) -> Option<Level> {
        self.history.last().copied()
    }

    /// Every level written, oldest first.
    #[must_use]
    pub fn history(&self) -> &[Level] {
        &self.history
    }

    /// Make subsequent writes fail until un-jammed.
    pub fn set_jammed(&mut self, jammed: bool) {
        self.jammed = jammed;
    }
}

impl ActuatorPin for VirtualRelay {
    fn set_level(&mut self, level: Level) -> Result<(), ThermoRelayError> {
        if self.jammed {
            return Err(ThermoRelayError::Actuator(
                format!("virtual relay {} is jammed", self.name).into(),
            ));
        }
        tracing::info!(relay = %self.name, ?level, "virtual relay driven");
        self.history.push(level);
        Ok(())
    }
}
