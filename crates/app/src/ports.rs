//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the control core and the hardware or
//! network collaborators around it. They are defined here (in `app`) so that
//! both the components and the adapter layer can depend on them without
//! creating circular dependencies.

pub mod actuator;
pub mod broker;
pub mod network;
pub mod sensor;

pub use actuator::{ActuatorPin, Level};
pub use broker::BrokerTransport;
pub use network::NetworkInterface;
pub use sensor::SensorDriver;
