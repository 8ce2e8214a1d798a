//! Virtual device implementations — network, broker, sensor, relay.
//!
//! Each one implements a single port from `thermorelay_app::ports` and keeps
//! enough state for tests to inspect what the control loop did with it.

mod broker;
mod network;
mod relay;
mod sensor;

pub use broker::{PublishedMessage, VirtualBroker};
pub use network::VirtualNetwork;
pub use relay::VirtualRelay;
pub use sensor::VirtualSensor;
