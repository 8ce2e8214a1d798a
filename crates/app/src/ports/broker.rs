//! Broker transport port — publish/subscribe session with the message broker.

use std::future::Future;
use std::task::Poll;

use thermorelay_domain::command::InboundMessage;
use thermorelay_domain::error::ThermoRelayError;

/// Client side of a publish/subscribe broker session.
///
/// Inbound messages are queued by the transport and handed over through
/// [`drain_inbound`](Self::drain_inbound) so that the control loop decides
/// when they are dispatched.
///
/// Opening a session is split in two non-blocking calls: the handshake is
/// started by [`start_session`](Self::start_session) and its completion is
/// checked on later ticks with [`poll_session`](Self::poll_session).
pub trait BrokerTransport {
    /// Begin a fresh session and return without waiting for the broker.
    /// Any previous session state, subscriptions included, is discarded.
    ///
    /// # Errors
    ///
    /// Returns [`ThermoRelayError::BrokerSession`] when the attempt cannot
    /// even be started.
    fn start_session(&mut self, client_id: &str) -> Result<(), ThermoRelayError>;

    /// Check the handshake started by [`start_session`](Self::start_session).
    ///
    /// `Pending` while the broker has not answered, `Ready(Ok)` once the
    /// session is usable, `Ready(Err)` when the attempt failed or timed out.
    fn poll_session(&mut self) -> Poll<Result<(), ThermoRelayError>>;

    /// Subscribe to an exact topic on the current session.
    fn subscribe(
        &mut self,
        topic: &str,
    ) -> impl Future<Output = Result<(), ThermoRelayError>> + Send;

    /// Publish a payload. Fire-and-forget: no delivery acknowledgement is
    /// awaited.
    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        retained: bool,
    ) -> impl Future<Output = Result<(), ThermoRelayError>> + Send;

    /// Whether the current session is still alive.
    fn is_connected(&self) -> bool;

    /// Take every message received since the last call, in arrival order.
    fn drain_inbound(&mut self) -> Vec<InboundMessage>;

    /// Tear down the current session, if any.
    fn close_session(&mut self) -> impl Future<Output = ()> + Send;
}
