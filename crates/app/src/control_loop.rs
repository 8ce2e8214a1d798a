//! Control loop — owns every component and runs them in a fixed order once
//! per tick.
//!
//! ```text
//! tick(now)
//!   1. connectivity.ensure_ready      (never blocks, at most one stage)
//!   2. dispatch inbound messages      (only when ready)
//!   3. sample → automation → telemetry (only when the cadence is due)
//!   4. emit changed relay signals, echo relay state (echo only when ready)
//! ```
//!
//! Remote commands are applied in step 2 and automation writes in step 3, so
//! within one tick automation has the last word.

use std::time::Duration;

use thermorelay_domain::actuator::{ActuatorBank, ActuatorState, ChannelId};
use thermorelay_domain::automation::AutomationPolicy;
use thermorelay_domain::command::validate_topic;
use thermorelay_domain::error::{ThermoRelayError, ValidationError};
use thermorelay_domain::sensor::{SensorReading, ValidRange};
use thermorelay_domain::time::Instant;

use crate::actuator_driver::{ActuatorDriver, Polarity};
use crate::automation_engine::{AutomationEngine, Evaluation};
use crate::connectivity::{ConnectivityManager, ConnectivitySettings};
use crate::dispatcher::{MessageDispatcher, MessageHandler, RelayCommandHandler};
use crate::ports::{ActuatorPin, BrokerTransport, NetworkInterface, SensorDriver};
use crate::sampler::{DEFAULT_SAMPLING_INTERVAL, SensorSampler};
use crate::telemetry::{TelemetryOutcome, TelemetryPublisher, publish_relay_state};

/// Default period between two ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// One relay channel as wired on the board.
pub struct Relay<P> {
    pub id: ChannelId,
    /// Topic carrying `ON` / `OFF` commands for this channel.
    pub control_topic: String,
    /// Optional topic the applied state is echoed on.
    pub state_topic: Option<String>,
    pub polarity: Polarity,
    pub pin: P,
}

/// Which channel the automation rule drives, and how.
#[derive(Debug, Clone)]
pub struct AutomationSettings {
    pub channel: ChannelId,
    pub policy: AutomationPolicy,
}

#[derive(Debug, Clone)]
pub struct ControlSettings {
    pub connectivity: ConnectivitySettings,
    pub telemetry_topic: String,
    pub sensor_range: ValidRange,
    pub sampling_interval: Duration,
    /// `None` disables automation: relays then only follow remote commands.
    pub automation: Option<AutomationSettings>,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            connectivity: ConnectivitySettings::default(),
            telemetry_topic: "thermorelay/temperature".to_string(),
            sensor_range: ValidRange::default(),
            sampling_interval: DEFAULT_SAMPLING_INTERVAL,
            automation: None,
        }
    }
}

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub ready: bool,
    pub dispatched: usize,
    pub sampled: Option<SensorReading>,
    pub evaluation: Option<Evaluation>,
    pub telemetry: Option<TelemetryOutcome>,
    pub signals_emitted: usize,
    pub echoes_published: usize,
}

struct RelaySlot<P> {
    driver: ActuatorDriver<P>,
    state_topic: Option<String>,
    /// Last state echoed during the current session.
    echoed: Option<ActuatorState>,
}

pub struct ControlLoop<N, B, S, P> {
    network: N,
    broker: B,
    sensor: S,
    connectivity: ConnectivityManager,
    dispatcher: MessageDispatcher,
    actuators: ActuatorBank,
    relays: Vec<RelaySlot<P>>,
    sampler: SensorSampler,
    automation: Option<AutomationEngine>,
    telemetry: TelemetryPublisher,
}

impl<N, B, S, P> ControlLoop<N, B, S, P>
where
    N: NetworkInterface,
    B: BrokerTransport,
    S: SensorDriver,
    P: ActuatorPin,
{
    /// Wire the components together and drive every relay to its initial
    /// `Off` signal.
    ///
    /// # Errors
    ///
    /// Returns [`ThermoRelayError::Validation`] for duplicate channels or
    /// control topics, invalid topics, or an automation channel that no relay
    /// declares.
    pub fn new(
        network: N,
        broker: B,
        sensor: S,
        relays: Vec<Relay<P>>,
        settings: ControlSettings,
    ) -> Result<Self, ThermoRelayError> {
        let actuators = ActuatorBank::new(relays.iter().map(|relay| relay.id.clone()))?;
        validate_topic(&settings.telemetry_topic)?;

        let mut connectivity = ConnectivityManager::new(settings.connectivity);
        let mut dispatcher = MessageDispatcher::new();
        let mut slots = Vec::with_capacity(relays.len());

        for relay in relays {
            if dispatcher.topics().any(|topic| topic == relay.control_topic) {
                return Err(ValidationError::DuplicateTopic(relay.control_topic).into());
            }
            if let Some(topic) = &relay.state_topic {
                validate_topic(topic)?;
            }
            dispatcher.register_handler(
                relay.control_topic.clone(),
                RelayCommandHandler::new(relay.id.clone()),
            )?;
            connectivity.add_subscription(relay.control_topic);
            slots.push(RelaySlot {
                driver: ActuatorDriver::new(relay.id, relay.polarity, relay.pin),
                state_topic: relay.state_topic,
                echoed: None,
            });
        }

        let automation = match settings.automation {
            Some(automation) => {
                if actuators.channel(&automation.channel).is_none() {
                    return Err(
                        ValidationError::UnknownChannel(automation.channel.to_string()).into(),
                    );
                }
                Some(AutomationEngine::new(automation.policy, automation.channel))
            }
            None => None,
        };

        let mut control = Self {
            network,
            broker,
            sensor,
            connectivity,
            dispatcher,
            actuators,
            relays: slots,
            sampler: SensorSampler::new(settings.sensor_range, settings.sampling_interval),
            automation,
            telemetry: TelemetryPublisher::new(settings.telemetry_topic),
        };
        control.emit_signals();

        tracing::info!(
            relays = control.relays.len(),
            automation = control.automation.is_some(),
            "control loop initialised"
        );
        Ok(control)
    }

    /// Route an extra topic to `handler`. It is subscribed from the next
    /// broker session on.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTopic`] for empty or wildcard topics
    /// and [`ValidationError::DuplicateTopic`] for a topic that already has a
    /// handler, relay control topics included.
    pub fn register_handler<H>(
        &mut self,
        topic: impl Into<String>,
        handler: H,
    ) -> Result<(), ValidationError>
    where
        H: MessageHandler + Send + 'static,
    {
        let topic = topic.into();
        if self.dispatcher.topics().any(|existing| existing == topic) {
            return Err(ValidationError::DuplicateTopic(topic));
        }
        self.dispatcher.register_handler(topic.clone(), handler)?;
        self.connectivity.add_subscription(topic);
        Ok(())
    }

    /// Run one iteration. A broker handshake in flight is only polled, so a
    /// silent broker never holds back sampling or automation.
    pub async fn tick(&mut self, now: Instant) -> TickReport {
        let mut report = TickReport::default();

        let was_ready = self.connectivity.is_ready();
        report.ready = self
            .connectivity
            .ensure_ready(&mut self.network, &mut self.broker, now)
            .await;
        if report.ready && !was_ready {
            for slot in &mut self.relays {
                slot.echoed = None;
            }
        }

        if report.ready {
            for message in self.broker.drain_inbound() {
                self.dispatcher.dispatch(&message, &mut self.actuators);
                report.dispatched += 1;
            }
        }

        if self.sampler.is_due(now) {
            let reading = self.sampler.sample(&mut self.sensor, now).await;
            report.sampled = Some(reading);
            if let Some(engine) = &mut self.automation {
                report.evaluation = Some(engine.evaluate(&reading, now, &mut self.actuators));
            }
            report.telemetry = Some(
                self.telemetry
                    .publish(&mut self.broker, &reading, report.ready)
                    .await,
            );
        }

        report.signals_emitted = self.emit_signals();
        if report.ready {
            report.echoes_published = self.echo_states().await;
        }
        report
    }

    /// Announce `offline` and close the broker session.
    pub async fn shutdown(&mut self) {
        self.connectivity.shutdown(&mut self.broker).await;
    }

    fn emit_signals(&mut self) -> usize {
        let mut emitted = 0;
        for slot in &mut self.relays {
            let Some(state) = self.actuators.state(slot.driver.channel()) else {
                continue;
            };
            match slot.driver.apply(state) {
                Ok(true) => emitted += 1,
                Ok(false) => {}
                Err(err) => {
                    tracing::error!(
                        error = %err,
                        channel = %slot.driver.channel(),
                        %state,
                        "failed to drive relay, retrying next tick"
                    );
                }
            }
        }
        emitted
    }

    async fn echo_states(&mut self) -> usize {
        let mut published = 0;
        for slot in &mut self.relays {
            let Some(topic) = slot.state_topic.as_deref() else {
                continue;
            };
            let Some(state) = self.actuators.state(slot.driver.channel()) else {
                continue;
            };
            if slot.echoed == Some(state) {
                continue;
            }
            if publish_relay_state(&mut self.broker, topic, state).await {
                slot.echoed = Some(state);
                published += 1;
            }
        }
        published
    }

    #[must_use]
    pub fn connectivity(&self) -> &ConnectivityManager {
        &self.connectivity
    }

    #[must_use]
    pub fn actuators(&self) -> &ActuatorBank {
        &self.actuators
    }

    #[must_use]
    pub fn sampler(&self) -> &SensorSampler {
        &self.sampler
    }

    #[must_use]
    pub fn automation(&self) -> Option<&AutomationEngine> {
        self.automation.as_ref()
    }

    /// Pin of a relay channel, for inspection.
    #[must_use]
    pub fn relay_pin(&self, id: &ChannelId) -> Option<&P> {
        self.relays
            .iter()
            .find(|slot| slot.driver.channel() == id)
            .map(|slot| slot.driver.pin())
    }

    #[must_use]
    pub fn network(&self) -> &N {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut N {
        &mut self.network
    }

    #[must_use]
    pub fn broker(&self) -> &B {
        &self.broker
    }

    pub fn broker_mut(&mut self) -> &mut B {
        &mut self.broker
    }

    #[must_use]
    pub fn sensor(&self) -> &S {
        &self.sensor
    }
}
