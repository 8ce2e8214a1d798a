//! MQTT transport configuration.

use std::time::Duration;

use serde::Deserialize;

/// Configuration for the MQTT broker transport, read from `[broker]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// MQTT broker hostname or IP address.
    pub broker_host: String,
    /// MQTT broker port.
    pub broker_port: u16,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
    /// How long to wait for the broker's `CONNACK`, in seconds.
    pub connect_timeout_secs: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Topic the broker publishes `offline` on when the session dies
    /// unexpectedly (MQTT last will).
    pub availability_topic: Option<String>,
    /// Inbound messages buffered between two ticks; extra messages are
    /// dropped.
    pub inbound_capacity: usize,
}

impl MqttConfig {
    #[must_use]
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(u64::from(self.keep_alive_secs))
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.connect_timeout_secs))
    }
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            keep_alive_secs: 30,
            connect_timeout_secs: 5,
            username: None,
            password: None,
            availability_topic: None,
            inbound_capacity: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_have_sensible_defaults() {
        let config = MqttConfig::default();
        assert_eq!(config.broker_host, "localhost");
        assert_eq!(config.broker_port, 1883);
        assert_eq!(config.keep_alive(), Duration::from_secs(30));
        assert_eq!(config.connect_timeout(), Duration::from_secs(5));
        assert!(config.username.is_none());
        assert_eq!(config.inbound_capacity, 64);
    }

    #[test]
    fn should_deserialize_from_toml() {
        let toml = r#"
            broker_host = "mqtt.example.com"
            broker_port = 8883
            keep_alive_secs = 60
            connect_timeout_secs = 2
            username = "relay"
            password = "hunter2"
            availability_topic = "home/relay/availability"
        "#;
        let config: MqttConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.broker_host, "mqtt.example.com");
        assert_eq!(config.broker_port, 8883);
        assert_eq!(config.keep_alive_secs, 60);
        assert_eq!(config.connect_timeout_secs, 2);
        assert_eq!(config.username.as_deref(), Some("relay"));
        assert_eq!(
            config.availability_topic.as_deref(),
            Some("home/relay/availability")
        );
    }

    #[test]
    fn should_use_defaults_for_missing_fields() {
        let toml = r#"broker_host = "192.168.1.100""#;
        let config: MqttConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.broker_host, "192.168.1.100");
        assert_eq!(config.broker_port, 1883);
        assert_eq!(config.keep_alive_secs, 30);
    }
}
