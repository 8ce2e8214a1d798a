//! Actuator state — the logical ON/OFF intent of every relay channel.
//!
//! The [`ActuatorBank`] is the single owner of actuator state. Two logical
//! writers touch it: remote commands ([`ActuatorBank::command`]) and the
//! automation engine ([`ActuatorBank::automate`]). The bank records which one
//! wrote last so that an automation write can tell when it overrides a remote
//! command issued since the previous evaluation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Logical state of a relay channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActuatorState {
    On,
    #[default]
    Off,
}

impl ActuatorState {
    /// Wire payload for this state, as accepted on control topics.
    #[must_use]
    pub fn as_payload(self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
        }
    }

    #[must_use]
    pub fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

impl fmt::Display for ActuatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
        }
    }
}

/// Name of a relay channel (e.g. `"cooler"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelId(String);

impl ChannelId {
    /// Build a channel id.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyChannelId`] when `name` is blank.
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyChannelId);
        }
        Ok(Self(name))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ChannelId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ChannelId> for String {
    fn from(id: ChannelId) -> Self {
        id.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who wrote a channel's current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteSource {
    /// Power-on default, nobody has written yet.
    Initial,
    /// An explicit remote command.
    Command,
    /// The automation engine.
    Automation,
}

/// Outcome of a single write into the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOutcome {
    pub previous: ActuatorState,
    pub current: ActuatorState,
    /// `true` when an automation write replaced a state set by a remote
    /// command since the previous evaluation.
    pub overrode_command: bool,
}

impl WriteOutcome {
    #[must_use]
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }
}

/// Current state of one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: ChannelId,
    pub state: ActuatorState,
    pub source: WriteSource,
    /// Set by a remote command, cleared by the next automation evaluation.
    pub commanded: bool,
}

/// Owner of every channel's actuator state.
#[derive(Debug, Clone, Default)]
pub struct ActuatorBank {
    channels: Vec<Channel>,
}

impl ActuatorBank {
    /// Create a bank with every channel initially [`ActuatorState::Off`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicateChannel`] when two ids collide.
    pub fn new(ids: impl IntoIterator<Item = ChannelId>) -> Result<Self, ValidationError> {
        let mut channels: Vec<Channel> = Vec::new();
        for id in ids {
            if channels.iter().any(|c| c.id == id) {
                return Err(ValidationError::DuplicateChannel(id.to_string()));
            }
            channels.push(Channel {
                id,
                state: ActuatorState::Off,
                source: WriteSource::Initial,
                commanded: false,
            });
        }
        Ok(Self { channels })
    }

    /// Current state of a channel, `None` if unknown.
    #[must_use]
    pub fn state(&self, id: &ChannelId) -> Option<ActuatorState> {
        self.channel(id).map(|c| c.state)
    }

    #[must_use]
    pub fn channel(&self, id: &ChannelId) -> Option<&Channel> {
        self.channels.iter().find(|c| &c.id == id)
    }

    /// Iterate over channels in declaration order.
    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }

    /// Apply an explicit remote command and mark the channel as commanded.
    ///
    /// Returns `None` if the channel does not exist.
    pub fn command(&mut self, id: &ChannelId, state: ActuatorState) -> Option<WriteOutcome> {
        let channel = self.channel_mut(id)?;
        let previous = channel.state;
        channel.state = state;
        channel.source = WriteSource::Command;
        channel.commanded = true;
        Some(WriteOutcome {
            previous,
            current: state,
            overrode_command: false,
        })
    }

    /// Apply an automation decision.
    ///
    /// Clears the commanded mark; reports whether the decision replaced a
    /// commanded state with a different one.
    pub fn automate(&mut self, id: &ChannelId, state: ActuatorState) -> Option<WriteOutcome> {
        let channel = self.channel_mut(id)?;
        let previous = channel.state;
        let overrode_command = channel.commanded && previous != state;
        channel.state = state;
        channel.source = WriteSource::Automation;
        channel.commanded = false;
        Some(WriteOutcome {
            previous,
            current: state,
            overrode_command,
        })
    }

    /// Mark the end of an automation cycle that left the channel untouched.
    ///
    /// A commanded state survives, but it is no longer "fresh".
    pub fn settle(&mut self, id: &ChannelId) {
        if let Some(channel) = self.channel_mut(id) {
            channel.commanded = false;
        }
    }

    fn channel_mut(&mut self, id: &ChannelId) -> Option<&mut Channel> {
        self.channels.iter_mut().find(|c| &c.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cooler() -> ChannelId {
        ChannelId::new("cooler").unwrap()
    }

    fn bank() -> ActuatorBank {
        ActuatorBank::new([cooler()]).unwrap()
    }

    #[test]
    fn should_default_to_off() {
        assert_eq!(ActuatorState::default(), ActuatorState::Off);
        let bank = bank();
        assert_eq!(bank.state(&cooler()), Some(ActuatorState::Off));
        assert_eq!(bank.channel(&cooler()).unwrap().source, WriteSource::Initial);
    }

    #[test]
    fn should_render_wire_payloads() {
        assert_eq!(ActuatorState::On.as_payload(), "ON");
        assert_eq!(ActuatorState::Off.as_payload(), "OFF");
    }

    #[test]
    fn should_display_lowercase_variant_name() {
        assert_eq!(ActuatorState::On.to_string(), "on");
        assert_eq!(ActuatorState::Off.to_string(), "off");
    }

    #[test]
    fn should_deserialize_uppercase_state() {
        let state: ActuatorState = serde_json::from_str("\"ON\"").unwrap();
        assert_eq!(state, ActuatorState::On);
    }

    #[test]
    fn should_reject_blank_channel_id() {
        assert_eq!(ChannelId::new("  "), Err(ValidationError::EmptyChannelId));
    }

    #[test]
    fn should_reject_blank_channel_id_when_deserializing() {
        let result: Result<ChannelId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn should_reject_duplicate_channels() {
        let result = ActuatorBank::new([cooler(), cooler()]);
        assert_eq!(
            result.unwrap_err(),
            ValidationError::DuplicateChannel("cooler".to_string())
        );
    }

    #[test]
    fn should_mark_channel_commanded_on_command() {
        let mut bank = bank();
        let outcome = bank.command(&cooler(), ActuatorState::On).unwrap();
        assert!(outcome.changed());
        let channel = bank.channel(&cooler()).unwrap();
        assert_eq!(channel.state, ActuatorState::On);
        assert_eq!(channel.source, WriteSource::Command);
        assert!(channel.commanded);
    }

    #[test]
    fn should_be_idempotent_when_same_command_repeats() {
        let mut bank = bank();
        bank.command(&cooler(), ActuatorState::On).unwrap();
        let second = bank.command(&cooler(), ActuatorState::On).unwrap();
        assert!(!second.changed());
        assert_eq!(bank.state(&cooler()), Some(ActuatorState::On));
    }

    #[test]
    fn should_report_override_when_automation_replaces_command() {
        let mut bank = bank();
        bank.command(&cooler(), ActuatorState::On).unwrap();
        let outcome = bank.automate(&cooler(), ActuatorState::Off).unwrap();
        assert!(outcome.overrode_command);
        let channel = bank.channel(&cooler()).unwrap();
        assert_eq!(channel.state, ActuatorState::Off);
        assert!(!channel.commanded);
    }

    #[test]
    fn should_not_report_override_when_automation_agrees_with_command() {
        let mut bank = bank();
        bank.command(&cooler(), ActuatorState::Off).unwrap();
        let outcome = bank.automate(&cooler(), ActuatorState::Off).unwrap();
        assert!(!outcome.overrode_command);
    }

    #[test]
    fn should_keep_commanded_state_when_settled() {
        let mut bank = bank();
        bank.command(&cooler(), ActuatorState::On).unwrap();
        bank.settle(&cooler());
        let channel = bank.channel(&cooler()).unwrap();
        assert_eq!(channel.state, ActuatorState::On);
        assert!(!channel.commanded);
    }

    #[test]
    fn should_ignore_unknown_channel() {
        let mut bank = bank();
        let other = ChannelId::new("heater").unwrap();
        assert!(bank.command(&other, ActuatorState::On).is_none());
        assert!(bank.automate(&other, ActuatorState::On).is_none());
        assert!(bank.state(&other).is_none());
    }
}
