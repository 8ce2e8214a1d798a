//! MQTT adapter error types.

use std::time::Duration;

use rumqttc::ConnectReturnCode;
use thermorelay_domain::error::ThermoRelayError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// No session is open.
    #[error("MQTT client not connected")]
    NotConnected,

    /// The rumqttc client refused a request.
    #[error("MQTT client error")]
    Client(#[source] rumqttc::ClientError),

    /// The connection to the broker failed.
    #[error("MQTT connection error")]
    Connection(#[source] rumqttc::ConnectionError),

    /// The broker answered `CONNACK` with a non-success code.
    #[error("broker refused the connection: {0:?}")]
    Refused(ConnectReturnCode),

    /// No `CONNACK` within the configured timeout.
    #[error("no answer from broker after {0:?}")]
    Timeout(Duration),
}

impl MqttError {
    /// Convert into a [`ThermoRelayError::BrokerSession`] for propagation
    /// across port boundaries.
    pub fn into_domain(self) -> ThermoRelayError {
        ThermoRelayError::BrokerSession(Box::new(self))
    }

    /// Convert a failed publish on `topic` into [`ThermoRelayError::Publish`].
    pub fn into_publish(self, topic: &str) -> ThermoRelayError {
        ThermoRelayError::Publish {
            topic: topic.to_string(),
            source: Box::new(self),
        }
    }
}

impl From<MqttError> for ThermoRelayError {
    fn from(err: MqttError) -> Self {
        err.into_domain()
    }
}
