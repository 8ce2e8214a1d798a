//! # thermorelayd — thermorelay daemon
//!
//! Composition root that wires the adapters into the control loop and runs it.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Install the `tracing` subscriber
//! - Construct the broker transport (`mqtt` or `virtual`)
//! - Construct the simulated network, sensor and relay pins
//! - Drive the control loop on a fixed tick on a single-threaded runtime
//! - Handle graceful shutdown (SIGINT): announce `offline`, close the session
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::error::Error;

use thermorelay_adapter_mqtt::MqttTransport;
use thermorelay_adapter_virtual::{VirtualBroker, VirtualNetwork, VirtualRelay};
use thermorelay_app::control_loop::ControlLoop;
use thermorelay_app::ports::BrokerTransport;
use tokio::time::MissedTickBehavior;
use tracing_subscriber::EnvFilter;

use crate::config::{BrokerKind, Config};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    tracing::info!(
        broker = ?config.broker.kind,
        relays = config.relays.len(),
        tick_ms = config.control.tick_ms,
        "thermorelayd starting"
    );

    match config.broker.kind {
        BrokerKind::Mqtt => run(&config, MqttTransport::new(config.broker.mqtt_config())).await,
        BrokerKind::Virtual => run(&config, VirtualBroker::default()).await,
    }
}

async fn run<B: BrokerTransport>(config: &Config, broker: B) -> Result<(), Box<dyn Error>> {
    // Host builds have no radio and no GPIO: network, sensor and pins are
    // always the simulated ones.
    let network = VirtualNetwork::with_initial_failures(config.simulation.network_failures);
    let sensor = config.simulation.sensor();
    let relays = config.relays(|relay| VirtualRelay::new(relay.id.clone()))?;

    let mut control = ControlLoop::new(network, broker, sensor, relays, config.control_settings()?)?;

    let mut ticker = tokio::time::interval(config.control.tick());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            instant = ticker.tick() => {
                let report = control.tick(instant.into_std()).await;
                tracing::trace!(?report, "tick");
            }
            result = &mut ctrl_c => {
                result?;
                tracing::info!("shutdown requested");
                break;
            }
        }
    }

    control.shutdown().await;
    tracing::info!("thermorelayd stopped");
    Ok(())
}
