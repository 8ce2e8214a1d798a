//! # thermorelay-app
//!
//! Application layer — control-loop components and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement:
//!   - `NetworkInterface` — join the wireless network
//!   - `BrokerTransport` — broker session, publish, subscribe, inbound queue
//!   - `SensorDriver` — latest temperature sample
//!   - `ActuatorPin` — physical relay line level
//! - Provide the components driven by the control loop:
//!   - `ActuatorDriver` — logical state → line level with polarity
//!   - `ConnectivityManager` — non-blocking network/broker bring-up with retry
//!   - `MessageDispatcher` — exact-topic routing of inbound messages
//!   - `SensorSampler` — cadence-gated sampling and validation
//!   - `AutomationEngine` — threshold rule with hysteresis and economy timer
//!   - `TelemetryPublisher` — retained telemetry and relay state echo
//!   - `ControlLoop` — fixed per-tick ordering of all of the above
//!
//! ## Dependency rule
//! Depends on `thermorelay-domain` only (plus `tracing` for diagnostics).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod actuator_driver;
pub mod automation_engine;
pub mod connectivity;
pub mod control_loop;
pub mod dispatcher;
pub mod ports;
pub mod sampler;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod testing;
