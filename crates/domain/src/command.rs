//! Inbound broker messages and the relay command grammar.

use crate::actuator::ActuatorState;
use crate::error::{UnrecognizedPayload, ValidationError};

/// A message delivered by the broker transport.
///
/// Ephemeral: consumed by the dispatcher as soon as it is drained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl InboundMessage {
    #[must_use]
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// A parsed relay control command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayCommand {
    pub intent: ActuatorState,
}

impl RelayCommand {
    /// Parse a control payload.
    ///
    /// Only the exact, case-sensitive literals `ON` and `OFF` are accepted.
    /// Anything else (lowercase, surrounding whitespace, JSON, empty) is
    /// rejected so that malformed input never moves the relay.
    ///
    /// # Errors
    ///
    /// Returns [`UnrecognizedPayload`] for any other payload.
    pub fn parse(payload: &[u8]) -> Result<Self, UnrecognizedPayload> {
        let intent = match payload {
            b"ON" => ActuatorState::On,
            b"OFF" => ActuatorState::Off,
            other => return Err(UnrecognizedPayload::from_bytes(other)),
        };
        Ok(Self { intent })
    }
}

/// Check that `topic` can be used for exact-match subscription and publishing.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidTopic`] when the topic is empty or
/// contains the `+` / `#` wildcards.
pub fn validate_topic(topic: &str) -> Result<(), ValidationError> {
    if topic.is_empty() || topic.contains(['+', '#']) {
        return Err(ValidationError::InvalidTopic(topic.to_string()));
    }
    Ok(())
}
