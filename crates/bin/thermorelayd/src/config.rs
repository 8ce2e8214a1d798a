//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `thermorelay.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use serde::Deserialize;
use thermorelay_adapter_mqtt::MqttConfig;
use thermorelay_adapter_virtual::VirtualSensor;
use thermorelay_app::actuator_driver::Polarity;
use thermorelay_app::connectivity::ConnectivitySettings;
use thermorelay_app::control_loop::{AutomationSettings, ControlSettings, Relay};
use thermorelay_domain::actuator::ChannelId;
use thermorelay_domain::automation::AutomationPolicy;
use thermorelay_domain::command::validate_topic;
use thermorelay_domain::connectivity::{NetworkCredentials, RetryPolicy};
use thermorelay_domain::error::ValidationError;
use thermorelay_domain::sensor::ValidRange;

/// Longest delay any setting may ask for.
const MAX_DELAY: Duration = Duration::from_secs(30 * 24 * 3600);

/// Extra time the control loop grants a handshake on top of the transport's
/// own connect timeout, so the transport reports its error first.
const HANDSHAKE_SLACK: Duration = Duration::from_secs(1);

/// Top-level configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Wireless network credentials.
    pub network: NetworkConfig,
    /// Broker selection and connection settings.
    pub broker: BrokerConfig,
    /// Telemetry topic.
    pub telemetry: TelemetryConfig,
    /// Relay channels, in declaration order.
    pub relays: Vec<RelayConfig>,
    /// Threshold rule.
    pub automation: AutomationConfig,
    /// Sensor cadence and plausible range.
    pub sampling: SamplingConfig,
    /// Reconnect backoff.
    pub retry: RetryConfig,
    /// Control loop cadence.
    pub control: ControlConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Simulated devices.
    pub simulation: SimulationConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub ssid: String,
    pub password: String,
}

/// Which broker transport to run against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrokerKind {
    /// A real MQTT broker.
    #[default]
    Mqtt,
    /// The in-process loopback broker.
    Virtual,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub kind: BrokerKind,
    /// MQTT client identifier.
    pub client_id: String,
    /// Retained `online` / `offline` announcements; also the MQTT last will.
    pub availability_topic: Option<String>,
    /// Connection settings, also read from `[broker]`.
    #[serde(flatten)]
    pub mqtt: MqttConfig,
}

impl BrokerConfig {
    /// Settings for the MQTT transport, last will included.
    #[must_use]
    pub fn mqtt_config(&self) -> MqttConfig {
        MqttConfig {
            availability_topic: self.availability_topic.clone(),
            ..self.mqtt.clone()
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub topic: String,
}

/// One relay channel.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    pub id: String,
    pub control_topic: String,
    #[serde(default)]
    pub state_topic: Option<String>,
    /// The relay board energises the coil on a low line.
    #[serde(default)]
    pub active_low: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    pub enabled: bool,
    /// Relay driven by the rule; defaults to the first declared relay.
    pub channel: Option<String>,
    pub low_threshold: f32,
    pub high_threshold: f32,
    pub economy_delay_secs: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub interval_secs: u64,
    pub min_valid: f32,
    pub max_valid: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryKind {
    #[default]
    Fixed,
    Exponential,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub policy: RetryKind,
    /// Fixed delay, or first delay of the exponential policy.
    pub delay_ms: u64,
    /// Upper bound of the exponential policy.
    pub max_delay_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub tick_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Join attempts the virtual network rejects before succeeding.
    pub network_failures: u32,
    pub sensor_min: f32,
    pub sensor_max: f32,
    pub sensor_step: f32,
    /// Scripted samples; when non-empty, replaces the sweep.
    pub sensor_script: Vec<f32>,
}

impl Config {
    /// Load configuration from `thermorelay.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("thermorelay.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("THERMORELAY_BROKER_HOST") {
            self.broker.mqtt.broker_host = val;
        }
        if let Some(val) = var("THERMORELAY_BROKER_PORT")
            && let Ok(port) = val.parse()
        {
            self.broker.mqtt.broker_port = port;
        }
        if let Some(val) = var("THERMORELAY_WIFI_SSID") {
            self.network.ssid = val;
        }
        if let Some(val) = var("THERMORELAY_WIFI_PASSWORD") {
            self.network.password = val;
        }
        if let Some(val) = var("THERMORELAY_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.broker.kind == BrokerKind::Mqtt {
            if self.broker.mqtt.broker_port == 0 {
                return Err(ConfigError::Validation(
                    "broker port must be non-zero".to_string(),
                ));
            }
            if self.broker.mqtt.connect_timeout_secs == 0 {
                return Err(ConfigError::Validation(
                    "broker connect timeout must be non-zero".to_string(),
                ));
            }
        }
        if self.broker.client_id.is_empty() {
            return Err(ConfigError::Validation(
                "broker client id must not be empty".to_string(),
            ));
        }
        if self.control.tick_ms == 0 {
            return Err(ConfigError::Validation(
                "control tick must be non-zero".to_string(),
            ));
        }
        if self.sampling.interval_secs == 0 {
            return Err(ConfigError::Validation(
                "sampling interval must be non-zero".to_string(),
            ));
        }
        if self.retry.delay_ms == 0 {
            return Err(ConfigError::Validation(
                "retry delay must be non-zero".to_string(),
            ));
        }
        if self.retry.policy == RetryKind::Exponential && self.retry.max_delay_ms < self.retry.delay_ms
        {
            return Err(ConfigError::Validation(
                "retry max delay must not be below the initial delay".to_string(),
            ));
        }
        for (name, delay) in [
            ("control tick", self.control.tick()),
            ("sampling interval", Duration::from_secs(self.sampling.interval_secs)),
            ("retry delay", Duration::from_millis(self.retry.delay_ms)),
            ("retry max delay", Duration::from_millis(self.retry.max_delay_ms)),
            (
                "economy delay",
                Duration::from_secs(self.automation.economy_delay_secs),
            ),
        ] {
            if delay > MAX_DELAY {
                return Err(ConfigError::Validation(format!(
                    "{name} must not exceed {} days",
                    MAX_DELAY.as_secs() / (24 * 3600)
                )));
            }
        }
        if self.relays.is_empty() {
            return Err(ConfigError::Validation(
                "at least one relay must be declared".to_string(),
            ));
        }

        let relays = self.relays(|_| ())?;
        for (index, relay) in relays.iter().enumerate() {
            if relays[..index].iter().any(|other| other.id == relay.id) {
                return Err(ValidationError::DuplicateChannel(relay.id.to_string()).into());
            }
            if relays[..index]
                .iter()
                .any(|other| other.control_topic == relay.control_topic)
            {
                return Err(ValidationError::DuplicateTopic(relay.control_topic.clone()).into());
            }
        }

        let settings = self.control_settings()?;
        if let Some(automation) = &settings.automation
            && !relays.iter().any(|relay| relay.id == automation.channel)
        {
            return Err(ValidationError::UnknownChannel(automation.channel.to_string()).into());
        }
        Ok(())
    }

    /// Build the relay list, creating each channel's pin with `pin`.
    ///
    /// # Errors
    ///
    /// Returns an error for empty channel ids or invalid topics.
    pub fn relays<P>(
        &self,
        mut pin: impl FnMut(&RelayConfig) -> P,
    ) -> Result<Vec<Relay<P>>, ConfigError> {
        self.relays
            .iter()
            .map(|relay| -> Result<Relay<P>, ConfigError> {
                validate_topic(&relay.control_topic)?;
                if let Some(topic) = &relay.state_topic {
                    validate_topic(topic)?;
                }
                Ok(Relay {
                    id: ChannelId::new(relay.id.clone())?,
                    control_topic: relay.control_topic.clone(),
                    state_topic: relay.state_topic.clone(),
                    polarity: if relay.active_low {
                        Polarity::ActiveLow
                    } else {
                        Polarity::ActiveHigh
                    },
                    pin: pin(relay),
                })
            })
            .collect()
    }

    /// Translate the configuration into control loop settings.
    ///
    /// # Errors
    ///
    /// Returns an error when a threshold, range or topic is invalid.
    pub fn control_settings(&self) -> Result<ControlSettings, ConfigError> {
        validate_topic(&self.telemetry.topic)?;
        if let Some(topic) = &self.broker.availability_topic {
            validate_topic(topic)?;
        }

        let automation = if self.automation.enabled {
            let channel = match (&self.automation.channel, self.relays.first()) {
                (Some(channel), _) => channel.clone(),
                (None, Some(first)) => first.id.clone(),
                (None, None) => {
                    return Err(ConfigError::Validation(
                        "automation needs a relay to drive".to_string(),
                    ));
                }
            };
            Some(AutomationSettings {
                channel: ChannelId::new(channel)?,
                policy: AutomationPolicy::new(
                    self.automation.low_threshold,
                    self.automation.high_threshold,
                    Duration::from_secs(self.automation.economy_delay_secs),
                )?,
            })
        } else {
            None
        };

        Ok(ControlSettings {
            connectivity: ConnectivitySettings {
                credentials: NetworkCredentials {
                    ssid: self.network.ssid.clone(),
                    password: self.network.password.clone(),
                },
                client_id: self.broker.client_id.clone(),
                retry: self.retry.policy(),
                availability_topic: self.broker.availability_topic.clone(),
                handshake_timeout: self.broker.mqtt.connect_timeout() + HANDSHAKE_SLACK,
            },
            telemetry_topic: self.telemetry.topic.clone(),
            sensor_range: ValidRange::new(self.sampling.min_valid, self.sampling.max_valid)?,
            sampling_interval: Duration::from_secs(self.sampling.interval_secs),
            automation,
        })
    }
}

impl RetryConfig {
    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        let delay = Duration::from_millis(self.delay_ms);
        match self.policy {
            RetryKind::Fixed => RetryPolicy::Fixed(delay),
            RetryKind::Exponential => RetryPolicy::Exponential {
                initial: delay,
                max: Duration::from_millis(self.max_delay_ms),
            },
        }
    }
}

impl ControlConfig {
    #[must_use]
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

impl SimulationConfig {
    /// Build the simulated sensor.
    #[must_use]
    pub fn sensor(&self) -> VirtualSensor {
        if self.sensor_script.is_empty() {
            VirtualSensor::sweep(self.sensor_min, self.sensor_max, self.sensor_step)
        } else {
            VirtualSensor::scripted(self.sensor_script.iter().copied())
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            broker: BrokerConfig::default(),
            telemetry: TelemetryConfig::default(),
            relays: vec![RelayConfig::default()],
            automation: AutomationConfig::default(),
            sampling: SamplingConfig::default(),
            retry: RetryConfig::default(),
            control: ControlConfig::default(),
            logging: LoggingConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            kind: BrokerKind::default(),
            client_id: "thermorelay".to_string(),
            availability_topic: Some("thermorelay/availability".to_string()),
            mqtt: MqttConfig::default(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            topic: "thermorelay/temperature".to_string(),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            id: "relay".to_string(),
            control_topic: "thermorelay/relay/set".to_string(),
            state_topic: Some("thermorelay/relay/state".to_string()),
            active_low: false,
        }
    }
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            channel: None,
            low_threshold: 16.0,
            high_threshold: 24.0,
            economy_delay_secs: 600,
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            min_valid: -40.0,
            max_valid: 125.0,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            policy: RetryKind::Fixed,
            delay_ms: 5_000,
            max_delay_ms: 60_000,
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self { tick_ms: 100 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "thermorelayd=info,thermorelay_app=info,thermorelay_adapter_mqtt=info"
                .to_string(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            network_failures: 0,
            sensor_min: 14.0,
            sensor_max: 28.0,
            sensor_step: 0.5,
            sensor_script: Vec::new(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// A domain invariant does not hold.
    #[error("invalid configuration")]
    Invalid(#[from] ValidationError),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn parse(toml: &str) -> Config {
        toml::from_str(toml).unwrap()
    }

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.broker.kind, BrokerKind::Mqtt);
        assert_eq!(config.broker.mqtt.broker_port, 1883);
        assert_eq!(config.telemetry.topic, "thermorelay/temperature");
        assert_eq!(config.relays.len(), 1);
        assert_eq!(config.control.tick(), Duration::from_millis(100));
        assert_eq!(config.sampling.interval_secs, 10);
        assert_eq!(config.retry.policy(), RetryPolicy::Fixed(Duration::from_secs(5)));
    }

    #[test]
    fn should_accept_default_configuration() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config = parse("");
        assert_eq!(config.relays.len(), 1);
        assert!(config.automation.enabled);
    }

    #[test]
    fn should_parse_full_toml() {
        let config = parse(
            r#"
            [network]
            ssid = "garage"
            password = "hunter2"

            [broker]
            kind = "virtual"
            client_id = "garage-relay"
            broker_host = "10.0.0.2"
            broker_port = 1884
            availability_topic = "garage/availability"

            [telemetry]
            topic = "garage/temperature"

            [[relays]]
            id = "cooler"
            control_topic = "garage/cooler/set"
            state_topic = "garage/cooler/state"
            active_low = true

            [[relays]]
            id = "fan"
            control_topic = "garage/fan/set"

            [automation]
            channel = "cooler"
            low_threshold = 18.5
            high_threshold = 26.0
            economy_delay_secs = 120

            [sampling]
            interval_secs = 5

            [retry]
            policy = "exponential"
            delay_ms = 1000
            max_delay_ms = 30000

            [control]
            tick_ms = 50

            [logging]
            filter = "debug"

            [simulation]
            network_failures = 2
            sensor_script = [25.0, 20.0, 15.0]
            "#,
        );
        assert_eq!(config.network.ssid, "garage");
        assert_eq!(config.broker.kind, BrokerKind::Virtual);
        assert_eq!(config.broker.client_id, "garage-relay");
        assert_eq!(config.broker.mqtt.broker_host, "10.0.0.2");
        assert_eq!(config.broker.mqtt.broker_port, 1884);
        assert_eq!(
            config.broker.mqtt_config().availability_topic.as_deref(),
            Some("garage/availability")
        );
        assert_eq!(config.relays.len(), 2);
        assert!(config.relays[0].active_low);
        assert_eq!(config.relays[1].state_topic, None);
        assert_eq!(config.automation.channel.as_deref(), Some("cooler"));
        assert_eq!(
            config.retry.policy(),
            RetryPolicy::Exponential {
                initial: Duration::from_secs(1),
                max: Duration::from_secs(30),
            }
        );
        assert_eq!(config.control.tick_ms, 50);
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.simulation.network_failures, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_build_control_settings() {
        let config = parse(
            r#"
            [[relays]]
            id = "cooler"
            control_topic = "garage/cooler/set"
            active_low = true
            "#,
        );
        let settings = config.control_settings().unwrap();
        let automation = settings.automation.unwrap();
        assert_eq!(automation.channel.as_str(), "cooler");
        assert!((automation.policy.low_threshold() - 16.0).abs() < f32::EPSILON);
        assert_eq!(settings.sampling_interval, Duration::from_secs(10));
        assert_eq!(
            settings.connectivity.availability_topic.as_deref(),
            Some("thermorelay/availability")
        );

        let relays = config.relays(|_| ()).unwrap();
        assert_eq!(relays[0].polarity, Polarity::ActiveLow);
    }

    #[test]
    fn should_keep_default_availability_topic_with_partial_broker_section() {
        let config = parse("[broker]\nbroker_host = \"10.0.0.2\"");
        assert_eq!(config.broker.mqtt.broker_host, "10.0.0.2");
        assert_eq!(
            config.broker.availability_topic.as_deref(),
            Some("thermorelay/availability")
        );
    }

    #[test]
    fn should_disable_automation() {
        let config = parse("[automation]\nenabled = false");
        assert!(config.control_settings().unwrap().automation.is_none());
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.broker.mqtt.broker_port, 1883);
    }

    #[test]
    fn should_reject_inverted_thresholds() {
        let config = parse("[automation]\nlow_threshold = 25.0\nhigh_threshold = 20.0");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid(ValidationError::EmptyHysteresisBand { .. }))
        ));
    }

    #[test]
    fn should_reject_equal_thresholds() {
        let config = parse("[automation]\nlow_threshold = 20.0\nhigh_threshold = 20.0");
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_ignore_thresholds_when_automation_disabled() {
        let config =
            parse("[automation]\nenabled = false\nlow_threshold = 25.0\nhigh_threshold = 20.0");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_reject_unknown_automation_channel() {
        let config = parse("[automation]\nchannel = \"heater\"");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid(ValidationError::UnknownChannel(_)))
        ));
    }

    #[test]
    fn should_reject_duplicate_control_topics() {
        let config = parse(
            r#"
            [[relays]]
            id = "a"
            control_topic = "home/set"

            [[relays]]
            id = "b"
            control_topic = "home/set"
            "#,
        );
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid(ValidationError::DuplicateTopic(_)))
        ));
    }

    #[test]
    fn should_reject_duplicate_relay_ids() {
        let config = parse(
            r#"
            [[relays]]
            id = "a"
            control_topic = "home/a/set"

            [[relays]]
            id = "a"
            control_topic = "home/b/set"
            "#,
        );
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid(ValidationError::DuplicateChannel(_)))
        ));
    }

    #[test]
    fn should_reject_wildcard_topic() {
        let config = parse("[telemetry]\ntopic = \"home/#\"");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid(ValidationError::InvalidTopic(_)))
        ));
    }

    #[test]
    fn should_reject_empty_relay_list() {
        let config = parse("relays = []");
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_reject_zero_intervals() {
        let mut config = Config::default();
        config.control.tick_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.sampling.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_delays_beyond_a_month() {
        let config = parse("[sampling]\ninterval_secs = 9223372036854775807");
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let config = parse("[retry]\ndelay_ms = 9223372036854775807");
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let config = parse("[automation]\neconomy_delay_secs = 31536000");
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let config = parse("[control]\ntick_ms = 2592000000");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_allow_handshake_beyond_connect_timeout() {
        let config = parse("[broker]\nconnect_timeout_secs = 3");
        let settings = config.control_settings().unwrap();
        assert_eq!(
            settings.connectivity.handshake_timeout,
            Duration::from_secs(4)
        );
    }

    #[test]
    fn should_reject_empty_sensor_range() {
        let config = parse("[sampling]\nmin_valid = 50.0\nmax_valid = 10.0");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid(ValidationError::EmptySensorRange { .. }))
        ));
    }

    #[test]
    fn should_reject_zero_port_for_mqtt_only() {
        let mut config = Config::default();
        config.broker.mqtt.broker_port = 0;
        assert!(config.validate().is_err());

        config.broker.kind = BrokerKind::Virtual;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_apply_environment_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("THERMORELAY_BROKER_HOST", "broker.lan"),
            ("THERMORELAY_BROKER_PORT", "8883"),
            ("THERMORELAY_WIFI_SSID", "attic"),
            ("THERMORELAY_WIFI_PASSWORD", "s3cret"),
            ("THERMORELAY_LOG", "thermorelayd=debug"),
        ]);
        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(ToString::to_string));

        assert_eq!(config.broker.mqtt.broker_host, "broker.lan");
        assert_eq!(config.broker.mqtt.broker_port, 8883);
        assert_eq!(config.network.ssid, "attic");
        assert_eq!(config.network.password, "s3cret");
        assert_eq!(config.logging.filter, "thermorelayd=debug");
    }

    #[test]
    fn should_prefer_rust_log_over_thermorelay_log() {
        let vars: HashMap<&str, &str> =
            HashMap::from([("THERMORELAY_LOG", "info"), ("RUST_LOG", "trace")]);
        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(ToString::to_string));
        assert_eq!(config.logging.filter, "trace");
    }

    #[test]
    fn should_ignore_unparsable_port_override() {
        let mut config = Config::default();
        config.apply_overrides(|key| {
            (key == "THERMORELAY_BROKER_PORT").then(|| "not-a-port".to_string())
        });
        assert_eq!(config.broker.mqtt.broker_port, 1883);
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
