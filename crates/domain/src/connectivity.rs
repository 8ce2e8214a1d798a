//! Connectivity state machine vocabulary and retry policy.

use std::fmt;
use std::time::Duration;

/// Stage of the network + broker bring-up.
///
/// Advances one stage per successful attempt and falls back to
/// [`Offline`](Self::Offline) on any failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectivityState {
    #[default]
    Offline,
    JoiningNetwork,
    NetworkJoined,
    ConnectingBroker,
    Ready,
}

impl ConnectivityState {
    #[must_use]
    pub fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }
}

impl fmt::Display for ConnectivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Offline => f.write_str("offline"),
            Self::JoiningNetwork => f.write_str("joining_network"),
            Self::NetworkJoined => f.write_str("network_joined"),
            Self::ConnectingBroker => f.write_str("connecting_broker"),
            Self::Ready => f.write_str("ready"),
        }
    }
}

/// Delay between failed connectivity attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Same delay after every failure.
    Fixed(Duration),
    /// `initial * 2^(failures - 1)`, capped at `max`.
    Exponential { initial: Duration, max: Duration },
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::Fixed(Duration::from_secs(5))
    }
}

impl RetryPolicy {
    /// Delay to wait after the `failures`-th consecutive failure (1-based).
    #[must_use]
    pub fn delay_after(&self, failures: u32) -> Duration {
        match *self {
            Self::Fixed(delay) => delay,
            Self::Exponential { initial, max } => {
                let exponent = failures.saturating_sub(1).min(31);
                initial
                    .checked_mul(1u32 << exponent)
                    .map_or(max, |delay| delay.min(max))
            }
        }
    }
}

/// Credentials used to join the wireless network.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct NetworkCredentials {
    pub ssid: String,
    pub password: String,
}

impl fmt::Debug for NetworkCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkCredentials")
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .finish()
    }
}
