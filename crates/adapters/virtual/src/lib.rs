//! # thermorelay-adapter-virtual
//!
//! Virtual/demo adapters that stand in for the board and the broker, for
//! testing and demonstration purposes.
//!
//! ## Provided devices
//!
//! | Device | Port | Behaviour |
//! |--------|------|-----------|
//! | [`VirtualNetwork`] | `NetworkInterface` | Joins, optionally after N scripted failures |
//! | [`VirtualBroker`] | `BrokerTransport` | Loopback broker with retained store and injectable messages |
//! | [`VirtualSensor`] | `SensorDriver` | Triangle-wave sweep or scripted samples |
//! | [`VirtualRelay`] | `ActuatorPin` | Records every line level |
//!
//! ## Dependency rule
//!
//! Depends on `thermorelay-app` (port traits) and `thermorelay-domain` only.

mod devices;

pub use devices::{PublishedMessage, VirtualBroker, VirtualNetwork, VirtualRelay, VirtualSensor};
