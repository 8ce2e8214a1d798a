//! In-memory fakes of the port traits, shared by the unit tests.

use std::collections::VecDeque;
use std::task::Poll;

use thermorelay_domain::command::InboundMessage;
use thermorelay_domain::connectivity::NetworkCredentials;
use thermorelay_domain::error::{InvalidReading, ThermoRelayError};

use crate::ports::{ActuatorPin, BrokerTransport, Level, NetworkInterface, SensorDriver};

// ── Network ────────────────────────────────────────────────────────

/// Joins succeed unless a scripted failure is queued.
#[derive(Default)]
pub struct FakeNetwork {
    pub failures: VecDeque<()>,
    pub joined: bool,
    pub join_calls: usize,
}

impl FakeNetwork {
    pub fn failing(times: usize) -> Self {
        Self {
            failures: std::iter::repeat_n((), times).collect(),
            ..Self::default()
        }
    }
}

impl NetworkInterface for FakeNetwork {
    async fn join(&mut self, _credentials: &NetworkCredentials) -> Result<(), ThermoRelayError> {
        self.join_calls += 1;
        if self.failures.pop_front().is_some() {
            self.joined = false;
            return Err(ThermoRelayError::NetworkJoin("association rejected".into()));
        }
        self.joined = true;
        Ok(())
    }

    fn is_joined(&self) -> bool {
        self.joined
    }
}

// ── Broker ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub topic: String,
    pub payload: Vec<u8>,
    pub retained: bool,
}

/// Records everything; sessions open unless a failure is queued.
///
/// `hold_handshake` keeps a started session pending, like a broker that
/// accepted the connection but never answers; `refuse_handshake` makes it
/// fail on the next poll.
#[derive(Default)]
pub struct FakeBroker {
    pub open_failures: VecDeque<()>,
    pub hold_handshake: bool,
    pub refuse_handshake: bool,
    pub handshaking: bool,
    pub polls: usize,
    pub fail_subscribe: bool,
    pub fail_publish: bool,
    pub connected: bool,
    pub sessions_opened: usize,
    pub sessions_closed: usize,
    pub subscriptions: Vec<String>,
    pub published: Vec<Published>,
    pub inbound: VecDeque<InboundMessage>,
}

impl FakeBroker {
    pub fn push_inbound(&mut self, topic: &str, payload: &str) {
        self.inbound.push_back(InboundMessage::new(topic, payload));
    }

    pub fn published_on(&self, topic: &str) -> Vec<String> {
        self.published
            .iter()
            .filter(|p| p.topic == topic)
            .map(|p| String::from_utf8_lossy(&p.payload).into_owned())
            .collect()
    }
}

impl BrokerTransport for FakeBroker {
    fn start_session(&mut self, _client_id: &str) -> Result<(), ThermoRelayError> {
        if self.open_failures.pop_front().is_some() {
            return Err(ThermoRelayError::BrokerSession("connection refused".into()));
        }
        self.sessions_opened += 1;
        self.subscriptions.clear();
        self.connected = false;
        self.handshaking = true;
        Ok(())
    }

    fn poll_session(&mut self) -> Poll<Result<(), ThermoRelayError>> {
        self.polls += 1;
        if !self.handshaking {
            return Poll::Ready(Err(ThermoRelayError::BrokerSession(
                "no session started".into(),
            )));
        }
        if self.hold_handshake {
            return Poll::Pending;
        }
        self.handshaking = false;
        if self.refuse_handshake {
            return Poll::Ready(Err(ThermoRelayError::BrokerSession(
                "not authorized".into(),
            )));
        }
        self.connected = true;
        Poll::Ready(Ok(()))
    }

    async fn subscribe(&mut self, topic: &str) -> Result<(), ThermoRelayError> {
        if self.fail_subscribe {
            return Err(ThermoRelayError::BrokerSession("subscribe rejected".into()));
        }
        self.subscriptions.push(topic.to_string());
        Ok(())
    }

    async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        retained: bool,
    ) -> Result<(), ThermoRelayError> {
        if self.fail_publish || !self.connected {
            return Err(ThermoRelayError::Publish {
                topic: topic.to_string(),
                source: "not connected".into(),
            });
        }
        self.published.push(Published {
            topic: topic.to_string(),
            payload: payload.to_vec(),
            retained,
        });
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn drain_inbound(&mut self) -> Vec<InboundMessage> {
        self.inbound.drain(..).collect()
    }

    async fn close_session(&mut self) {
        if self.connected {
            self.sessions_closed += 1;
        }
        self.connected = false;
        self.handshaking = false;
        self.subscriptions.clear();
    }
}

// ── Sensor ─────────────────────────────────────────────────────────

/// Replays scripted samples; `None` entries simulate driver failures.
/// Once exhausted, keeps returning the last scripted value.
#[derive(Default)]
pub struct FakeSensor {
    pub samples: VecDeque<Option<f32>>,
    pub last: Option<f32>,
    pub reads: usize,
}

impl FakeSensor {
    pub fn with(samples: &[Option<f32>]) -> Self {
        Self {
            samples: samples.iter().copied().collect(),
            ..Self::default()
        }
    }
}

impl SensorDriver for FakeSensor {
    async fn read(&mut self) -> Result<f32, ThermoRelayError> {
        self.reads += 1;
        let next = self.samples.pop_front().unwrap_or(self.last);
        self.last = next;
        next.ok_or(ThermoRelayError::InvalidReading(InvalidReading::DriverFailure))
    }
}

// ── Pin ────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakePin {
    pub levels: Vec<Level>,
    pub fail: bool,
}

impl FakePin {
    pub fn last(&self) -> Option<Level> {
        self.levels.last().copied()
    }
}

impl ActuatorPin for FakePin {
    fn set_level(&mut self, level: Level) -> Result<(), ThermoRelayError> {
        if self.fail {
            return Err(ThermoRelayError::Actuator("gpio busy".into()));
        }
        self.levels.push(level);
        Ok(())
    }
}
