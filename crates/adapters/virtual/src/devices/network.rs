//! Virtual network interface — joins succeed after an optional number of
//! scripted failures.

use thermorelay_app::ports::NetworkInterface;
use thermorelay_domain::connectivity::NetworkCredentials;
use thermorelay_domain::error::ThermoRelayError;

#[derive(Debug, Default)]
pub struct VirtualNetwork {
    failures_left: u32,
    joined: bool,
    joins: u32,
}

impl VirtualNetwork {
    /// A network whose first `failures` join attempts are rejected.
    #[must_use]
    pub fn with_initial_failures(failures: u32) -> Self {
        Self {
            failures_left: failures,
            ..Self::default()
        }
    }

    /// Simulate losing the association, as if the access point went away.
    pub fn drop_link(&mut self) {
        if self.joined {
            tracing::info!("virtual network link dropped");
        }
        self.joined = false;
    }

    /// Join attempts so far, successful or not.
    #[must_use]
    pub fn join_attempts(&self) -> u32 {
        self.joins
    }
}

impl NetworkInterface for VirtualNetwork {
    async fn join(&mut self, credentials: &NetworkCredentials) -> Result<(), ThermoRelayError> {
        self.joins += 1;
        if self.failures_left > 0 {
            self.failures_left -= 1;
            self.joined = false;
            return Err(ThermoRelayError::NetworkJoin(
                format!("simulated association failure for {:?}", credentials.ssid).into(),
            ));
        }
        self.joined = true;
        Ok(())
    }

    fn is_joined(&self) -> bool {
        self.joined
    }
}
