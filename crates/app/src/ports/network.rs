//! Network interface port — joining the wireless network.

use std::future::Future;

use thermorelay_domain::connectivity::NetworkCredentials;
use thermorelay_domain::error::ThermoRelayError;

/// Driver for the wireless network interface.
pub trait NetworkInterface {
    /// Attempt to join the network.
    ///
    /// Implementations bound the attempt with their own timeout; the
    /// connectivity manager never waits beyond a single call.
    fn join(
        &mut self,
        credentials: &NetworkCredentials,
    ) -> impl Future<Output = Result<(), ThermoRelayError>> + Send;

    /// Whether the interface currently holds a network association.
    fn is_joined(&self) -> bool;
}
