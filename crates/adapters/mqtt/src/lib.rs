//! # thermorelay-adapter-mqtt
//!
//! MQTT adapter — implements the `BrokerTransport` port on top of `rumqttc`.
//!
//! ## How it works
//!
//! [`start_session`](BrokerTransport::start_session) spawns a task that
//! connects with a clean session and waits (bounded by
//! `connect_timeout_secs`) for the broker's `CONNACK`, then returns at once.
//! [`poll_session`](BrokerTransport::poll_session) checks the outcome without
//! waiting, so a silent broker never stalls the control loop. After the
//! handshake the same task pumps the rumqttc event loop, pushing inbound
//! `PUBLISH` packets into a bounded queue that the control loop drains once
//! per tick.
//!
//! The pump never reconnects on its own. When the connection drops it marks
//! the session dead and stops, and the connectivity manager notices through
//! [`is_connected`](BrokerTransport::is_connected) and opens a new session on
//! its own schedule.
//!
//! When an availability topic is configured it is registered as the session's
//! last will with a retained `offline` payload.
//!
//! ## Dependency rule
//!
//! Same as other adapters: depends on `thermorelay-app` and
//! `thermorelay-domain`.

mod config;
mod error;
mod session;

pub use config::MqttConfig;
pub use error::MqttError;

use std::task::Poll;

use rumqttc::QoS;
use thermorelay_app::ports::BrokerTransport;
use thermorelay_domain::command::InboundMessage;
use thermorelay_domain::error::ThermoRelayError;

use crate::session::Session;

/// Broker transport backed by a rumqttc client.
pub struct MqttTransport {
    config: MqttConfig,
    session: Option<Session>,
}

impl MqttTransport {
    #[must_use]
    pub fn new(config: MqttConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    fn live_session(&self) -> Result<&Session, MqttError> {
        self.session
            .as_ref()
            .filter(|session| session.is_alive())
            .ok_or(MqttError::NotConnected)
    }
}

impl BrokerTransport for MqttTransport {
    fn start_session(&mut self, client_id: &str) -> Result<(), ThermoRelayError> {
        if let Some(stale) = self.session.take() {
            stale.abort();
        }

        tracing::debug!(
            host = %self.config.broker_host,
            port = self.config.broker_port,
            %client_id,
            "connecting to MQTT broker"
        );
        self.session = Some(Session::start(&self.config, client_id));
        Ok(())
    }

    fn poll_session(&mut self) -> Poll<Result<(), ThermoRelayError>> {
        let Some(session) = self.session.as_mut() else {
            return Poll::Ready(Err(MqttError::NotConnected.into_domain()));
        };
        match session.poll_open() {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(())) => {
                tracing::info!(
                    host = %self.config.broker_host,
                    port = self.config.broker_port,
                    "MQTT session open"
                );
                Poll::Ready(Ok(()))
            }
            Poll::Ready(Err(err)) => {
                if let Some(dead) = self.session.take() {
                    dead.abort();
                }
                Poll::Ready(Err(err.into_domain()))
            }
        }
    }

    async fn subscribe(&mut self, topic: &str) -> Result<(), ThermoRelayError> {
        self.live_session()?
            .client
            .try_subscribe(topic, QoS::AtLeastOnce)
            .map_err(|err| MqttError::Client(err).into_domain())
    }

    async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        retained: bool,
    ) -> Result<(), ThermoRelayError> {
        let session = self
            .live_session()
            .map_err(|err| err.into_publish(topic))?;
        session
            .client
            .try_publish(topic, QoS::AtLeastOnce, retained, payload.to_vec())
            .map_err(|err| MqttError::Client(err).into_publish(topic))
    }

    fn is_connected(&self) -> bool {
        self.live_session().is_ok()
    }

    fn drain_inbound(&mut self) -> Vec<InboundMessage> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        let mut messages = Vec::new();
        while let Ok(message) = session.inbound.try_recv() {
            messages.push(message);
        }
        messages
    }

    async fn close_session(&mut self) {
        if let Some(session) = self.session.take() {
            session.close(self.config.connect_timeout()).await;
            tracing::info!("MQTT session closed by client");
        }
    }
}
