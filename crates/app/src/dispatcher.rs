//! Message dispatcher — routes inbound broker messages to handlers by exact
//! topic.
//!
//! Messages on topics without a handler are discarded silently. Handlers are
//! registered before the first broker session; the dispatcher's topic list is
//! what the connectivity manager subscribes to.

use std::collections::HashMap;

use thermorelay_domain::actuator::{ActuatorBank, ChannelId, WriteOutcome};
use thermorelay_domain::command::{InboundMessage, RelayCommand, validate_topic};
use thermorelay_domain::error::{UnrecognizedPayload, ValidationError};

/// What a handler did with a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// A channel's actuator state was written.
    Applied {
        channel: ChannelId,
        write: WriteOutcome,
    },
    /// The payload was not understood and deliberately ignored.
    Rejected(UnrecognizedPayload),
    /// The handler ran but had nothing to change.
    NoEffect,
}

/// Result of dispatching one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No handler for the topic; message discarded.
    Unrouted,
    Handled(HandlerOutcome),
}

/// Reacts to the payload of messages on one topic.
pub trait MessageHandler {
    fn handle(&mut self, payload: &[u8], actuators: &mut ActuatorBank) -> HandlerOutcome;
}

impl<F> MessageHandler for F
where
    F: FnMut(&[u8], &mut ActuatorBank) -> HandlerOutcome,
{
    fn handle(&mut self, payload: &[u8], actuators: &mut ActuatorBank) -> HandlerOutcome {
        self(payload, actuators)
    }
}

/// Applies `ON` / `OFF` commands to one relay channel.
///
/// Any other payload is a no-op: the relay never moves on malformed input.
#[derive(Debug, Clone)]
pub struct RelayCommandHandler {
    channel: ChannelId,
}

impl RelayCommandHandler {
    #[must_use]
    pub fn new(channel: ChannelId) -> Self {
        Self { channel }
    }
}

impl MessageHandler for RelayCommandHandler {
    fn handle(&mut self, payload: &[u8], actuators: &mut ActuatorBank) -> HandlerOutcome {
        let command = match RelayCommand::parse(payload) {
            Ok(command) => command,
            Err(err) => return HandlerOutcome::Rejected(err),
        };
        match actuators.command(&self.channel, command.intent) {
            Some(write) => HandlerOutcome::Applied {
                channel: self.channel.clone(),
                write,
            },
            None => HandlerOutcome::NoEffect,
        }
    }
}

type BoxedHandler = Box<dyn MessageHandler + Send>;

/// Exact-match topic router.
#[derive(Default)]
pub struct MessageDispatcher {
    handlers: HashMap<String, BoxedHandler>,
    order: Vec<String>,
}

impl MessageDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `topic`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTopic`] for empty or wildcard topics.
    pub fn register_handler<H>(
        &mut self,
        topic: impl Into<String>,
        handler: H,
    ) -> Result<(), ValidationError>
    where
        H: MessageHandler + Send + 'static,
    {
        let topic = topic.into();
        validate_topic(&topic)?;
        if self.handlers.insert(topic.clone(), Box::new(handler)).is_some() {
            tracing::debug!(%topic, "replacing message handler");
        } else {
            self.order.push(topic);
        }
        Ok(())
    }

    /// Registered topics, in registration order.
    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Route one message.
    pub fn dispatch(
        &mut self,
        message: &InboundMessage,
        actuators: &mut ActuatorBank,
    ) -> DispatchOutcome {
        let Some(handler) = self.handlers.get_mut(&message.topic) else {
            tracing::trace!(topic = %message.topic, "no handler, message discarded");
            return DispatchOutcome::Unrouted;
        };

        let outcome = handler.handle(&message.payload, actuators);
        match &outcome {
            HandlerOutcome::Applied { channel, write } => {
                tracing::info!(
                    topic = %message.topic,
                    %channel,
                    from = %write.previous,
                    to = %write.current,
                    "remote command applied"
                );
            }
            HandlerOutcome::Rejected(err) => {
                tracing::debug!(topic = %message.topic, %err, "command payload ignored");
            }
            HandlerOutcome::NoEffect => {}
        }
        DispatchOutcome::Handled(outcome)
    }
}
