//! Automation engine — applies the threshold rule to one relay channel.
//!
//! The engine is authoritative: whatever it decides on a valid reading is
//! written to the actuator bank, even if a remote command set a different
//! state since the previous evaluation. Inside the hysteresis band it leaves
//! the channel alone, so a command issued there stands.

use thermorelay_domain::actuator::{ActuatorBank, ChannelId, WriteOutcome};
use thermorelay_domain::automation::{AutomationPolicy, AutomationState, Decision, TimerEvent};
use thermorelay_domain::sensor::SensorReading;
use thermorelay_domain::time::Instant;

/// Result of feeding one reading to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// The reading was unusable; nothing changed.
    Skipped,
    Evaluated {
        decision: Decision,
        /// Bank write, if the decision carried an action.
        write: Option<WriteOutcome>,
    },
}

pub struct AutomationEngine {
    policy: AutomationPolicy,
    channel: ChannelId,
    state: AutomationState,
}

impl AutomationEngine {
    #[must_use]
    pub fn new(policy: AutomationPolicy, channel: ChannelId) -> Self {
        Self {
            policy,
            channel,
            state: AutomationState::default(),
        }
    }

    #[must_use]
    pub fn policy(&self) -> &AutomationPolicy {
        &self.policy
    }

    #[must_use]
    pub fn channel(&self) -> &ChannelId {
        &self.channel
    }

    #[must_use]
    pub fn state(&self) -> &AutomationState {
        &self.state
    }

    /// Evaluate `reading` and write the resulting decision into `actuators`.
    pub fn evaluate(
        &mut self,
        reading: &SensorReading,
        now: Instant,
        actuators: &mut ActuatorBank,
    ) -> Evaluation {
        let Some(value) = reading.usable_value() else {
            tracing::debug!(channel = %self.channel, "invalid reading, automation skipped");
            return Evaluation::Skipped;
        };

        let decision = self.state.step(&self.policy, value, now);
        let write = match decision.action {
            Some(state) => actuators.automate(&self.channel, state),
            None => {
                actuators.settle(&self.channel);
                None
            }
        };

        match decision.timer {
            TimerEvent::Armed => {
                tracing::debug!(channel = %self.channel, value, "economy timer armed");
            }
            TimerEvent::Disarmed => {
                tracing::debug!(channel = %self.channel, value, "economy timer disarmed");
            }
            TimerEvent::EconomyFired => {
                tracing::info!(
                    channel = %self.channel,
                    value,
                    delay_secs = self.policy.economy_delay().as_secs(),
                    "economy mode engaged"
                );
            }
            TimerEvent::Unchanged => {}
        }

        if let Some(write) = write {
            if write.overrode_command {
                tracing::info!(
                    channel = %self.channel,
                    value,
                    band = %decision.band,
                    from = %write.previous,
                    to = %write.current,
                    "automation overrode remote command"
                );
            } else if write.changed() {
                tracing::info!(
                    channel = %self.channel,
                    value,
                    band = %decision.band,
                    to = %write.current,
                    "automation switched relay"
                );
            }
        }

        Evaluation::Evaluated { decision, write }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use thermorelay_domain::actuator::ActuatorState;
    use thermorelay_domain::automation::Band;
    use thermorelay_domain::time::now;

    fn cooler() -> ChannelId {
        ChannelId::new("cooler").unwrap()
    }

    fn setup(delay: Duration) -> (AutomationEngine, ActuatorBank) {
        let policy = AutomationPolicy::new(16.0, 24.0, delay).unwrap();
        (
            AutomationEngine::new(policy, cooler()),
            ActuatorBank::new([cooler()]).unwrap(),
        )
    }

    fn reading(value: f32, at: Instant) -> SensorReading {
        SensorReading::valid(value, at)
    }

    #[test]
    fn should_switch_on_below_low_threshold() {
        let (mut engine, mut bank) = setup(Duration::from_secs(600));
        let t0 = now();
        engine.evaluate(&reading(15.0, t0), t0, &mut bank);
        assert_eq!(bank.state(&cooler()), Some(ActuatorState::On));
    }

    #[test]
    fn should_not_chatter_inside_band() {
        let (mut engine, mut bank) = setup(Duration::from_secs(600));
        let t0 = now();
        engine.evaluate(&reading(15.0, t0), t0, &mut bank);

        for value in [17.0, 20.0, 23.9, 18.5, 16.1] {
            let evaluation = engine.evaluate(&reading(value, t0), t0, &mut bank);
            let Evaluation::Evaluated { decision, write } = evaluation else {
                panic!("expected evaluation");
            };
            assert_eq!(decision.band, Band::InBand);
            assert_eq!(write, None);
            assert_eq!(bank.state(&cooler()), Some(ActuatorState::On));
        }
    }

    #[test]
    fn should_skip_invalid_reading() {
        let (mut engine, mut bank) = setup(Duration::from_secs(600));
        let t0 = now();
        engine.evaluate(&reading(25.0, t0), t0, &mut bank);
        let before = *engine.state();

        let invalid = SensorReading::invalid(f32::NAN, t0);
        assert_eq!(engine.evaluate(&invalid, t0, &mut bank), Evaluation::Skipped);
        assert_eq!(engine.state().timer(), before.timer());
        assert_eq!(engine.state().band(), before.band());
        assert_eq!(bank.state(&cooler()), Some(ActuatorState::Off));
    }

    #[test]
    fn should_override_same_cycle_command() {
        let (mut engine, mut bank) = setup(Duration::from_secs(600));
        let t0 = now();
        bank.command(&cooler(), ActuatorState::On);

        let evaluation = engine.evaluate(&reading(25.0, t0), t0, &mut bank);
        let Evaluation::Evaluated { write: Some(write), .. } = evaluation else {
            panic!("expected a write");
        };
        assert!(write.overrode_command);
        assert_eq!(bank.state(&cooler()), Some(ActuatorState::Off));
    }

    #[test]
    fn should_keep_command_inside_band_but_clear_mark() {
        let (mut engine, mut bank) = setup(Duration::from_secs(600));
        let t0 = now();
        bank.command(&cooler(), ActuatorState::On);

        engine.evaluate(&reading(20.0, t0), t0, &mut bank);
        let channel = bank.channel(&cooler()).unwrap();
        assert_eq!(channel.state, ActuatorState::On);
        assert!(!channel.commanded);
    }

    #[test]
    fn should_fire_economy_once_after_delay() {
        let delay = Duration::from_secs(60);
        let (mut engine, mut bank) = setup(delay);
        let t0 = now();

        let mut fired = 0;
        for secs in [0, 30, 59, 60, 90, 300] {
            let at = t0 + Duration::from_secs(secs);
            if let Evaluation::Evaluated { decision, .. } =
                engine.evaluate(&reading(26.0, at), at, &mut bank)
                && decision.timer == TimerEvent::EconomyFired
            {
                fired += 1;
                assert!(secs >= 60);
            }
        }
        assert_eq!(fired, 1);
        assert_eq!(bank.state(&cooler()), Some(ActuatorState::Off));
    }

    #[test]
    fn should_follow_reference_scenario() {
        let (mut engine, mut bank) = setup(Duration::from_secs(600));
        let t0 = now();
        let step = Duration::from_secs(10);

        engine.evaluate(&reading(25.0, t0), t0, &mut bank);
        assert_eq!(bank.state(&cooler()), Some(ActuatorState::Off));
        assert!(engine.state().timer().is_armed());

        engine.evaluate(&reading(20.0, t0 + step), t0 + step, &mut bank);
        assert_eq!(bank.state(&cooler()), Some(ActuatorState::Off));
        assert!(!engine.state().timer().is_armed());

        bank.command(&cooler(), ActuatorState::Off);

        let evaluation = engine.evaluate(&reading(15.0, t0 + step * 2), t0 + step * 2, &mut bank);
        assert_eq!(bank.state(&cooler()), Some(ActuatorState::On));
        let Evaluation::Evaluated { write: Some(write), .. } = evaluation else {
            panic!("expected a write");
        };
        assert!(write.overrode_command);
    }
}
