//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`ThermoRelayError`] at port boundaries. None of these are fatal to the
//! control loop: connectivity failures are retried, publish failures are
//! superseded by the next cycle, invalid readings skip the cycle and
//! unrecognised payloads are ignored.

/// Boxed source error carried across port boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error type shared by ports and components.
#[derive(Debug, thiserror::Error)]
pub enum ThermoRelayError {
    /// A configuration or domain invariant does not hold.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// Joining the wireless network failed.
    #[error("network join failed")]
    NetworkJoin(#[source] BoxError),

    /// Opening (or keeping) a broker session failed.
    #[error("broker session failed")]
    BrokerSession(#[source] BoxError),

    /// Publishing a message on a topic failed.
    #[error("publish to {topic} failed")]
    Publish {
        /// Topic the message was addressed to.
        topic: String,
        /// Underlying transport error.
        #[source]
        source: BoxError,
    },

    /// The sensor produced a value the core refuses to use.
    #[error("invalid sensor reading")]
    InvalidReading(#[from] InvalidReading),

    /// A command payload did not match the relay grammar.
    #[error("unrecognized command payload")]
    UnrecognizedPayload(#[from] UnrecognizedPayload),

    /// The actuator pin driver rejected a level change.
    #[error("actuator pin error")]
    Actuator(#[source] BoxError),
}

/// Domain invariant violations, detected at construction time.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Thresholds must be finite and `low < high`.
    #[error("low threshold {low} must be strictly below high threshold {high}")]
    EmptyHysteresisBand {
        /// Configured low threshold.
        low: f32,
        /// Configured high threshold.
        high: f32,
    },

    /// Sane-range bounds must be finite and `min < max`.
    #[error("sensor range minimum {min} must be strictly below maximum {max}")]
    EmptySensorRange {
        /// Configured minimum.
        min: f32,
        /// Configured maximum.
        max: f32,
    },

    /// A channel id was empty.
    #[error("channel id must not be empty")]
    EmptyChannelId,

    /// Two channels share the same id.
    #[error("duplicate channel id {0}")]
    DuplicateChannel(String),

    /// A topic was empty or contained wildcard characters.
    #[error("invalid topic {0:?}")]
    InvalidTopic(String),

    /// Two relays listen on the same control topic.
    #[error("control topic {0:?} is used by more than one relay")]
    DuplicateTopic(String),

    /// A reference to a channel that was never declared.
    #[error("unknown channel {0}")]
    UnknownChannel(String),
}

/// Why a sensor value was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidReading {
    /// The driver returned not-a-number or an infinity.
    #[error("sensor returned a non-finite value")]
    NotFinite,

    /// The value lies outside the configured sane range.
    #[error("sensor value {value} outside [{min}, {max}]")]
    OutOfRange {
        /// Rejected value.
        value: f32,
        /// Lower bound of the sane range.
        min: f32,
        /// Upper bound of the sane range.
        max: f32,
    },

    /// The driver itself failed to produce a value.
    #[error("sensor driver failed")]
    DriverFailure,
}

/// A command payload that is neither `ON` nor `OFF`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized payload {preview:?}")]
pub struct UnrecognizedPayload {
    /// Lossy UTF-8 preview of the payload, truncated for logging.
    pub preview: String,
}

impl UnrecognizedPayload {
    const PREVIEW_LEN: usize = 32;

    /// Build from raw payload bytes.
    #[must_use]
    pub fn from_bytes(payload: &[u8]) -> Self {
        let text = String::from_utf8_lossy(payload);
        let preview = text.chars().take(Self::PREVIEW_LEN).collect();
        Self { preview }
    }
}
