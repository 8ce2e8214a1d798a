//! Connectivity manager — keeps the network association and the broker
//! session alive without ever blocking the control loop.
//!
//! Each call to [`ConnectivityManager::ensure_ready`] advances the bring-up by
//! at most one stage:
//!
//! ```text
//! Offline ──join──▶ NetworkJoined ──start──▶ ConnectingBroker ──answer + subscribe──▶ Ready
//!    ▲                    │                         │                                 │
//!    └──── any failure ───┴──── refused/timeout ────┴────── link or session lost ─────┘
//! ```
//!
//! The broker handshake is started in one call and polled on the following
//! ones, so a broker that accepts the connection but never answers costs
//! nothing but a `false` per tick until the handshake timeout elapses.
//! Transports that answer immediately reach `Ready` in the same call that
//! started the session.
//!
//! After a failure the next attempt is gated by the [`RetryPolicy`]; until the
//! gate opens, `ensure_ready` returns `false` immediately so automation and
//! telemetry keep running during outages.

use std::task::Poll;
use std::time::Duration;

use thermorelay_domain::connectivity::{ConnectivityState, NetworkCredentials, RetryPolicy};
use thermorelay_domain::error::ThermoRelayError;
use thermorelay_domain::time::{Instant, deadline_after, is_due};

use crate::ports::{BrokerTransport, NetworkInterface};

/// Payload announced on the availability topic once a session is ready.
pub const AVAILABILITY_ONLINE: &str = "online";
/// Payload announced (and registered as last will) when going away.
pub const AVAILABILITY_OFFLINE: &str = "offline";

/// Default bound on a started broker handshake.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Static connectivity configuration.
#[derive(Debug, Clone)]
pub struct ConnectivitySettings {
    pub credentials: NetworkCredentials,
    pub client_id: String,
    pub retry: RetryPolicy,
    /// Retained `online` / `offline` announcements, if configured.
    pub availability_topic: Option<String>,
    /// How long a started session may stay pending before the attempt is
    /// abandoned.
    pub handshake_timeout: Duration,
}

impl Default for ConnectivitySettings {
    fn default() -> Self {
        Self {
            credentials: NetworkCredentials::default(),
            client_id: String::new(),
            retry: RetryPolicy::default(),
            availability_topic: None,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }
}

/// Owner of [`ConnectivityState`].
pub struct ConnectivityManager {
    settings: ConnectivitySettings,
    state: ConnectivityState,
    subscriptions: Vec<String>,
    failures: u32,
    next_attempt_at: Option<Instant>,
    handshake_deadline: Option<Instant>,
}

impl ConnectivityManager {
    #[must_use]
    pub fn new(settings: ConnectivitySettings) -> Self {
        Self {
            settings,
            state: ConnectivityState::Offline,
            subscriptions: Vec::new(),
            failures: 0,
            next_attempt_at: None,
            handshake_deadline: None,
        }
    }

    /// Add a topic to the list issued on every new broker session.
    ///
    /// Topics added while [`Ready`](ConnectivityState::Ready) take effect on
    /// the next session.
    pub fn add_subscription(&mut self, topic: impl Into<String>) {
        let topic = topic.into();
        if !self.subscriptions.contains(&topic) {
            self.subscriptions.push(topic);
        }
    }

    #[must_use]
    pub fn subscriptions(&self) -> &[String] {
        &self.subscriptions
    }

    #[must_use]
    pub fn state(&self) -> ConnectivityState {
        self.state
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    /// Consecutive failed attempts since the last time the link was ready.
    #[must_use]
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Earliest instant of the next bring-up attempt, if one is gated.
    #[must_use]
    pub fn next_attempt_at(&self) -> Option<Instant> {
        self.next_attempt_at
    }

    /// Verify or advance connectivity. Returns whether the broker is usable
    /// for the rest of this tick.
    ///
    /// Never waits on the broker: a pending handshake is only polled.
    pub async fn ensure_ready<N, B>(
        &mut self,
        network: &mut N,
        broker: &mut B,
        now: Instant,
    ) -> bool
    where
        N: NetworkInterface,
        B: BrokerTransport,
    {
        match self.state {
            ConnectivityState::Ready => {
                if !network.is_joined() {
                    self.fail(broker, now, &ThermoRelayError::NetworkJoin("link lost".into()))
                        .await;
                    return false;
                }
                if !broker.is_connected() {
                    self.fail(
                        broker,
                        now,
                        &ThermoRelayError::BrokerSession("session lost".into()),
                    )
                    .await;
                    return false;
                }
                true
            }
            ConnectivityState::Offline => {
                if !is_due(self.next_attempt_at, now) {
                    return false;
                }
                self.join_network(network, broker, now).await;
                false
            }
            ConnectivityState::NetworkJoined | ConnectivityState::ConnectingBroker => {
                if !network.is_joined() {
                    self.fail(broker, now, &ThermoRelayError::NetworkJoin("link lost".into()))
                        .await;
                    return false;
                }
                if self.state == ConnectivityState::NetworkJoined
                    && !self.start_session(broker, now).await
                {
                    return false;
                }
                self.poll_session(broker, now).await
            }
            // Joining only exists inside a single call. Finding it here means
            // the previous attempt was interrupted.
            ConnectivityState::JoiningNetwork => {
                self.fail(
                    broker,
                    now,
                    &ThermoRelayError::NetworkJoin("attempt interrupted".into()),
                )
                .await;
                false
            }
        }
    }

    /// Announce `offline` and close the session.
    pub async fn shutdown<B: BrokerTransport>(&mut self, broker: &mut B) {
        if self.is_ready() {
            self.announce(broker, AVAILABILITY_OFFLINE).await;
        }
        broker.close_session().await;
        self.state = ConnectivityState::Offline;
        self.handshake_deadline = None;
        tracing::info!("connectivity shut down");
    }

    async fn join_network<N, B>(&mut self, network: &mut N, broker: &mut B, now: Instant)
    where
        N: NetworkInterface,
        B: BrokerTransport,
    {
        self.state = ConnectivityState::JoiningNetwork;
        tracing::debug!(ssid = %self.settings.credentials.ssid, "joining network");
        match network.join(&self.settings.credentials).await {
            Ok(()) => {
                self.state = ConnectivityState::NetworkJoined;
                tracing::info!(ssid = %self.settings.credentials.ssid, "network joined");
            }
            Err(err) => self.fail(broker, now, &err).await,
        }
    }

    /// Kick off the handshake. Returns `false` when it could not be started.
    async fn start_session<B: BrokerTransport>(&mut self, broker: &mut B, now: Instant) -> bool {
        self.state = ConnectivityState::ConnectingBroker;
        tracing::debug!(client_id = %self.settings.client_id, "opening broker session");
        if let Err(err) = broker.start_session(&self.settings.client_id) {
            self.fail(broker, now, &err).await;
            return false;
        }
        self.handshake_deadline = Some(deadline_after(now, self.settings.handshake_timeout));
        true
    }

    async fn poll_session<B: BrokerTransport>(&mut self, broker: &mut B, now: Instant) -> bool {
        match broker.poll_session() {
            Poll::Pending => {
                if is_due(self.handshake_deadline, now) {
                    self.fail(
                        broker,
                        now,
                        &ThermoRelayError::BrokerSession("broker did not answer in time".into()),
                    )
                    .await;
                }
                false
            }
            Poll::Ready(Err(err)) => {
                self.fail(broker, now, &err).await;
                false
            }
            Poll::Ready(Ok(())) => self.subscribe_all(broker, now).await,
        }
    }

    async fn subscribe_all<B: BrokerTransport>(&mut self, broker: &mut B, now: Instant) -> bool {
        let mut subscribed = Ok(());
        for topic in &self.subscriptions {
            subscribed = broker.subscribe(topic).await;
            if subscribed.is_err() {
                break;
            }
            tracing::debug!(%topic, "subscribed");
        }
        if let Err(err) = subscribed {
            self.fail(broker, now, &err).await;
            return false;
        }

        self.state = ConnectivityState::Ready;
        self.failures = 0;
        self.next_attempt_at = None;
        self.handshake_deadline = None;
        tracing::info!(
            subscriptions = self.subscriptions.len(),
            "broker session ready"
        );
        self.announce(broker, AVAILABILITY_ONLINE).await;
        true
    }

    async fn announce<B: BrokerTransport>(&self, broker: &mut B, payload: &str) {
        let Some(topic) = self.settings.availability_topic.as_deref() else {
            return;
        };
        if let Err(err) = broker.publish(topic, payload.as_bytes(), true).await {
            tracing::warn!(error = %err, %topic, "failed to announce availability");
        }
    }

    async fn fail<B: BrokerTransport>(
        &mut self,
        broker: &mut B,
        now: Instant,
        err: &ThermoRelayError,
    ) {
        let stage = self.state;
        if matches!(
            stage,
            ConnectivityState::ConnectingBroker | ConnectivityState::Ready
        ) {
            broker.close_session().await;
        }

        self.state = ConnectivityState::Offline;
        self.handshake_deadline = None;
        self.failures = self.failures.saturating_add(1);
        let delay = self.settings.retry.delay_after(self.failures);
        self.next_attempt_at = Some(deadline_after(now, delay));

        tracing::warn!(
            error = %err,
            %stage,
            failures = self.failures,
            retry_in_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "connectivity lost, retrying later"
        );
    }
}
