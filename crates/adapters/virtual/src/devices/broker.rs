//! Virtual broker — an in-process loopback broker.
//!
//! Behaves like a single-client MQTT broker: exact-topic subscriptions,
//! retained messages replayed on subscribe, and publishes echoed back to the
//! client when it is subscribed to the topic. Messages from "other clients"
//! are injected with [`VirtualBroker::inject`]. An outage can be simulated
//! with [`VirtualBroker::set_available`], and a broker that accepts the
//! connection but never answers with [`VirtualBroker::set_unresponsive`].

use std::collections::{HashMap, VecDeque};
use std::task::Poll;

use thermorelay_app::ports::BrokerTransport;
use thermorelay_domain::command::InboundMessage;
use thermorelay_domain::error::ThermoRelayError;

/// A message the client published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub retained: bool,
}

#[derive(Debug)]
pub struct VirtualBroker {
    available: bool,
    unresponsive: bool,
    pending: Option<String>,
    client_id: Option<String>,
    subscriptions: Vec<String>,
    retained: HashMap<String, Vec<u8>>,
    inbound: VecDeque<InboundMessage>,
    published: Vec<PublishedMessage>,
    sessions_opened: u32,
}

impl Default for VirtualBroker {
    fn default() -> Self {
        Self {
            available: true,
            unresponsive: false,
            pending: None,
            client_id: None,
            subscriptions: Vec::new(),
            retained: HashMap::new(),
            inbound: VecDeque::new(),
            published: Vec::new(),
            sessions_opened: 0,
        }
    }
}

impl VirtualBroker {
    /// Take the broker down or bring it back. Going down kills the session.
    pub fn set_available(&mut self, available: bool) {
        if !available && (self.client_id.is_some() || self.pending.is_some()) {
            tracing::info!("virtual broker outage, session dropped");
            self.drop_session();
        }
        self.available = available;
    }

    /// Leave started sessions waiting for an answer until switched back.
    pub fn set_unresponsive(&mut self, unresponsive: bool) {
        self.unresponsive = unresponsive;
    }

    /// Publish from another client. Returns whether it reached our client.
    pub fn inject(&mut self, topic: &str, payload: impl Into<Vec<u8>>) -> bool {
        self.route(InboundMessage::new(topic, payload))
    }

    /// Publish a retained message from another client.
    pub fn inject_retained(&mut self, topic: &str, payload: impl Into<Vec<u8>>) -> bool {
        let payload = payload.into();
        self.retained.insert(topic.to_string(), payload.clone());
        self.route(InboundMessage::new(topic, payload))
    }

    /// Retained payload currently stored for `topic`.
    #[must_use]
    pub fn retained(&self, topic: &str) -> Option<&[u8]> {
        self.retained.get(topic).map(Vec::as_slice)
    }

    /// Everything our client published, in order.
    #[must_use]
    pub fn published(&self) -> &[PublishedMessage] {
        &self.published
    }

    /// Payloads our client published on `topic`, decoded lossily.
    #[must_use]
    pub fn published_on(&self, topic: &str) -> Vec<String> {
        self.published
            .iter()
            .filter(|message| message.topic == topic)
            .map(|message| String::from_utf8_lossy(&message.payload).into_owned())
            .collect()
    }

    #[must_use]
    pub fn subscriptions(&self) -> &[String] {
        &self.subscriptions
    }

    #[must_use]
    pub fn sessions_opened(&self) -> u32 {
        self.sessions_opened
    }

    fn route(&mut self, message: InboundMessage) -> bool {
        if self.client_id.is_none() || !self.subscriptions.contains(&message.topic) {
            return false;
        }
        self.inbound.push_back(message);
        true
    }

    fn drop_session(&mut self) {
        self.pending = None;
        self.client_id = None;
        self.subscriptions.clear();
        self.inbound.clear();
    }

    fn not_connected() -> ThermoRelayError {
        ThermoRelayError::BrokerSession("virtual broker: no session".into())
    }
}

impl BrokerTransport for VirtualBroker {
    fn start_session(&mut self, client_id: &str) -> Result<(), ThermoRelayError> {
        if !self.available {
            return Err(ThermoRelayError::BrokerSession(
                "virtual broker unavailable".into(),
            ));
        }
        self.drop_session();
        self.pending = Some(client_id.to_string());
        self.sessions_opened += 1;
        Ok(())
    }

    fn poll_session(&mut self) -> Poll<Result<(), ThermoRelayError>> {
        if self.pending.is_none() {
            return Poll::Ready(if self.client_id.is_some() {
                Ok(())
            } else {
                Err(Self::not_connected())
            });
        }
        if self.unresponsive {
            return Poll::Pending;
        }
        self.client_id = self.pending.take();
        tracing::debug!(client_id = ?self.client_id, "virtual broker session open");
        Poll::Ready(Ok(()))
    }

    async fn subscribe(&mut self, topic: &str) -> Result<(), ThermoRelayError> {
        if self.client_id.is_none() {
            return Err(Self::not_connected());
        }
        if !self.subscriptions.iter().any(|existing| existing == topic) {
            self.subscriptions.push(topic.to_string());
        }
        if let Some(payload) = self.retained.get(topic) {
            self.inbound
                .push_back(InboundMessage::new(topic, payload.clone()));
        }
        Ok(())
    }

    async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        retained: bool,
    ) -> Result<(), ThermoRelayError> {
        if self.client_id.is_none() {
            return Err(ThermoRelayError::Publish {
                topic: topic.to_string(),
                source: "virtual broker: no session".into(),
            });
        }
        if retained {
            self.retained.insert(topic.to_string(), payload.to_vec());
        }
        self.published.push(PublishedMessage {
            topic: topic.to_string(),
            payload: payload.to_vec(),
            retained,
        });
        self.route(InboundMessage::new(topic, payload));
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.available && self.client_id.is_some()
    }

    fn drain_inbound(&mut self) -> Vec<InboundMessage> {
        self.inbound.drain(..).collect()
    }

    async fn close_session(&mut self) {
        if self.client_id.is_some() {
            tracing::debug!("virtual broker session closed");
        }
        self.drop_session();
    }
}
