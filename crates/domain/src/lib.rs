//! # thermorelay-domain
//!
//! Pure domain model for the thermorelay control agent.
//!
//! ## Responsibilities
//! - Foundational types: error conventions, monotonic instants
//! - Define **actuator state** per relay channel and the bank that owns it
//! - Define **connectivity state** and the retry policy between attempts
//! - Define **inbound messages** and the relay command payload grammar
//! - Define **sensor readings** and the range that makes them valid
//! - Define the **automation policy** (thresholds, hysteresis band, economy delay)
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod time;

pub mod actuator;
pub mod automation;
pub mod command;
pub mod connectivity;
pub mod sensor;
