//! One broker session: the rumqttc client plus the task driving its event
//! loop.
//!
//! The task first waits for `CONNACK` (bounded by the connect timeout) and
//! reports the outcome on a oneshot channel, then keeps pumping inbound
//! `PUBLISH` packets into the session queue. Nothing here ever blocks the
//! caller: the handshake outcome is checked with [`Session::poll_open`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::Poll;
use std::time::Duration;

use rumqttc::{
    AsyncClient, ConnectReturnCode, Event, EventLoop, LastWill, MqttOptions, Outgoing, Packet,
    QoS,
};
use thermorelay_app::connectivity::AVAILABILITY_OFFLINE;
use thermorelay_domain::command::InboundMessage;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::config::MqttConfig;
use crate::error::MqttError;

/// Capacity of the outgoing request queue between client and event loop.
const REQUEST_CAPACITY: usize = 32;

type Handshake = oneshot::Receiver<Result<(), MqttError>>;

pub(crate) struct Session {
    pub(crate) client: AsyncClient,
    pub(crate) inbound: mpsc::Receiver<InboundMessage>,
    handshake: Option<Handshake>,
    connected: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl Session {
    /// Spawn the connection task and return at once.
    pub(crate) fn start(config: &MqttConfig, client_id: &str) -> Self {
        let (client, eventloop) = AsyncClient::new(options(config, client_id), REQUEST_CAPACITY);
        let (tx, inbound) = mpsc::channel(config.inbound_capacity.max(1));
        let (answer, handshake) = oneshot::channel();
        let connected = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(drive(
            eventloop,
            config.connect_timeout(),
            answer,
            tx,
            Arc::clone(&connected),
        ));

        Self {
            client,
            inbound,
            handshake: Some(handshake),
            connected,
            task,
        }
    }

    /// Outcome of the handshake, without waiting for it.
    pub(crate) fn poll_open(&mut self) -> Poll<Result<(), MqttError>> {
        let Some(handshake) = self.handshake.as_mut() else {
            return Poll::Ready(if self.is_alive() {
                Ok(())
            } else {
                Err(MqttError::NotConnected)
            });
        };
        match handshake.try_recv() {
            Ok(outcome) => {
                self.handshake = None;
                Poll::Ready(outcome)
            }
            Err(oneshot::error::TryRecvError::Empty) => Poll::Pending,
            Err(oneshot::error::TryRecvError::Closed) => {
                self.handshake = None;
                Poll::Ready(Err(MqttError::NotConnected))
            }
        }
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.connected.load(Ordering::Relaxed) && !self.task.is_finished()
    }

    /// Send `DISCONNECT` on a live session and give the task `grace` to
    /// flush it, then stop the task. A session still handshaking is dropped
    /// at once.
    pub(crate) async fn close(mut self, grace: Duration) {
        if self.is_alive() {
            if let Err(err) = self.client.try_disconnect() {
                tracing::debug!(error = %err, "MQTT disconnect request failed");
            }
            if tokio::time::timeout(grace, &mut self.task).await.is_err() {
                tracing::debug!("MQTT event loop did not stop in time");
            }
        }
        self.abort();
    }

    /// Stop the task without saying goodbye to the broker.
    pub(crate) fn abort(self) {
        self.task.abort();
        self.connected.store(false, Ordering::Relaxed);
    }
}

fn options(config: &MqttConfig, client_id: &str) -> MqttOptions {
    let mut options = MqttOptions::new(client_id, config.broker_host.clone(), config.broker_port);
    options.set_keep_alive(config.keep_alive());
    options.set_clean_session(true);
    if let Some(username) = &config.username {
        options.set_credentials(username.clone(), config.password.clone().unwrap_or_default());
    }
    if let Some(topic) = &config.availability_topic {
        options.set_last_will(LastWill::new(
            topic.clone(),
            AVAILABILITY_OFFLINE.as_bytes().to_vec(),
            QoS::AtLeastOnce,
            true,
        ));
    }
    options
}

async fn drive(
    mut eventloop: EventLoop,
    timeout: Duration,
    answer: oneshot::Sender<Result<(), MqttError>>,
    tx: mpsc::Sender<InboundMessage>,
    connected: Arc<AtomicBool>,
) {
    let outcome = match tokio::time::timeout(timeout, wait_for_connack(&mut eventloop)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(MqttError::Timeout(timeout)),
    };
    if let Err(err) = outcome {
        tracing::debug!(error = %err, "MQTT handshake failed");
        // The receiver is gone when the session was dropped meanwhile.
        let _ = answer.send(Err(err));
        return;
    }

    connected.store(true, Ordering::Relaxed);
    if answer.send(Ok(())).is_err() {
        connected.store(false, Ordering::Relaxed);
        return;
    }
    pump(eventloop, tx).await;
    connected.store(false, Ordering::Relaxed);
}

async fn wait_for_connack(eventloop: &mut EventLoop) -> Result<(), MqttError> {
    loop {
        if let Event::Incoming(Packet::ConnAck(ack)) =
            eventloop.poll().await.map_err(MqttError::Connection)?
        {
            if ack.code == ConnectReturnCode::Success {
                return Ok(());
            }
            return Err(MqttError::Refused(ack.code));
        }
    }
}

/// Drive the event loop until the connection ends. A dead session is never
/// revived here; reconnecting is the connectivity manager's job.
async fn pump(mut eventloop: EventLoop, tx: mpsc::Sender<InboundMessage>) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let message = InboundMessage::new(publish.topic, publish.payload.to_vec());
                if let Err(err) = tx.try_send(message) {
                    tracing::warn!(error = %err, "inbound queue full, MQTT message dropped");
                }
            }
            Ok(Event::Incoming(Packet::Disconnect) | Event::Outgoing(Outgoing::Disconnect)) => {
                tracing::info!("MQTT session closed");
                break;
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(error = %err, "MQTT connection lost");
                break;
            }
        }
    }
}
