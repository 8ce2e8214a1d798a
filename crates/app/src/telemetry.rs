//! Telemetry publisher — pushes the latest valid reading to the broker.

use thermorelay_domain::actuator::ActuatorState;
use thermorelay_domain::sensor::SensorReading;

use crate::ports::BrokerTransport;

/// Wire format of a telemetry value: decimal, two fractional digits.
#[must_use]
pub fn format_value(value: f32) -> String {
    format!("{value:.2}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryOutcome {
    Published,
    SkippedInvalid,
    SkippedOffline,
    /// The transport refused the publish; logged, not retried.
    Failed,
}

pub struct TelemetryPublisher {
    topic: String,
}

impl TelemetryPublisher {
    #[must_use]
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
        }
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Publish `reading` retained, if it is valid and the broker is ready.
    pub async fn publish<B: BrokerTransport>(
        &self,
        broker: &mut B,
        reading: &SensorReading,
        ready: bool,
    ) -> TelemetryOutcome {
        let Some(value) = reading.usable_value() else {
            return TelemetryOutcome::SkippedInvalid;
        };
        if !ready {
            tracing::trace!(value, "offline, telemetry skipped");
            return TelemetryOutcome::SkippedOffline;
        }

        let payload = format_value(value);
        match broker.publish(&self.topic, payload.as_bytes(), true).await {
            Ok(()) => {
                tracing::debug!(topic = %self.topic, %payload, "telemetry published");
                TelemetryOutcome::Published
            }
            Err(err) => {
                tracing::warn!(error = %err, topic = %self.topic, "failed to publish telemetry");
                TelemetryOutcome::Failed
            }
        }
    }
}

/// Echo a relay's applied state, retained, on its state topic.
///
/// Returns whether the publish went through.
pub async fn publish_relay_state<B: BrokerTransport>(
    broker: &mut B,
    topic: &str,
    state: ActuatorState,
) -> bool {
    match broker.publish(topic, state.as_payload().as_bytes(), true).await {
        Ok(()) => {
            tracing::debug!(%topic, %state, "relay state echoed");
            true
        }
        Err(err) => {
            tracing::warn!(error = %err, %topic, "failed to echo relay state");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBroker;
    use thermorelay_domain::time::now;

    const TOPIC: &str = "home/temperature";

    fn connected() -> FakeBroker {
        FakeBroker {
            connected: true,
            ..FakeBroker::default()
        }
    }

    #[test]
    fn should_format_two_fractional_digits() {
        assert_eq!(format_value(21.5), "21.50");
        assert_eq!(format_value(-3.0), "-3.00");
        assert_eq!(format_value(19.457), "19.46");
    }

    #[tokio::test]
    async fn should_publish_valid_reading_retained() {
        let mut broker = connected();
        let publisher = TelemetryPublisher::new(TOPIC);
        let outcome = publisher
            .publish(&mut broker, &SensorReading::valid(21.5, now()), true)
            .await;

        assert_eq!(outcome, TelemetryOutcome::Published);
        assert_eq!(broker.published_on(TOPIC), vec!["21.50"]);
        assert!(broker.published[0].retained);
    }

    #[tokio::test]
    async fn should_skip_invalid_reading() {
        let mut broker = connected();
        let publisher = TelemetryPublisher::new(TOPIC);
        let outcome = publisher
            .publish(&mut broker, &SensorReading::invalid(f32::NAN, now()), true)
            .await;

        assert_eq!(outcome, TelemetryOutcome::SkippedInvalid);
        assert!(broker.published.is_empty());
    }

    #[tokio::test]
    async fn should_skip_when_not_ready() {
        let mut broker = connected();
        let publisher = TelemetryPublisher::new(TOPIC);
        let outcome = publisher
            .publish(&mut broker, &SensorReading::valid(20.0, now()), false)
            .await;

        assert_eq!(outcome, TelemetryOutcome::SkippedOffline);
        assert!(broker.published.is_empty());
    }

    #[tokio::test]
    async fn should_report_failed_publish() {
        let mut broker = FakeBroker {
            fail_publish: true,
            ..connected()
        };
        let publisher = TelemetryPublisher::new(TOPIC);
        let outcome = publisher
            .publish(&mut broker, &SensorReading::valid(20.0, now()), true)
            .await;
        assert_eq!(outcome, TelemetryOutcome::Failed);
    }

    #[tokio::test]
    async fn should_echo_relay_state_with_command_grammar() {
        let mut broker = connected();
        assert!(publish_relay_state(&mut broker, "home/relay/state", ActuatorState::On).await);
        assert!(publish_relay_state(&mut broker, "home/relay/state", ActuatorState::Off).await);
        assert_eq!(broker.published_on("home/relay/state"), vec!["ON", "OFF"]);
    }
}
