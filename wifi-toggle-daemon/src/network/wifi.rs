/*!
 * Wi-Fi radio control
 * Power state and current network through networksetup
 */

use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::error::RadioError;
use crate::system::{CommandRunner, NETWORKSETUP};

/// How long the radio gets to settle before a power change is verified.
pub const SETTLE_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WifiPower {
    On,
    Off,
}

impl WifiPower {
    pub fn is_on(self) -> bool {
        self == WifiPower::On
    }

    pub fn as_arg(self) -> &'static str {
        match self {
            WifiPower::On => "on",
            WifiPower::Off => "off",
        }
    }
}

impl fmt::Display for WifiPower {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_arg())
    }
}

/// `Wi-Fi Power (en0): On`
pub fn parse_power(output: &str) -> Option<WifiPower> {
    let lower = output.to_lowercase();
    if lower.contains(": on") {
        Some(WifiPower::On)
    } else if lower.contains(": off") {
        Some(WifiPower::Off)
    } else {
        None
    }
}

/// `Current Wi-Fi Network: <ssid>`; anything else means not associated.
pub fn parse_ssid(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let ssid = line.trim().strip_prefix("Current Wi-Fi Network:")?.trim();
        (!ssid.is_empty()).then(|| ssid.to_string())
    })
}

pub struct WifiRadio<R> {
    runner: R,
    settle: Duration,
}

impl<R: CommandRunner> WifiRadio<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            settle: SETTLE_DELAY,
        }
    }

    pub fn with_settle_delay(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub async fn power(&self, device: &str) -> Result<WifiPower, RadioError> {
        let out = self
            .runner
            .run(NETWORKSETUP, &["-getairportpower", device])
            .await?;
        parse_power(&out).ok_or(RadioError::UnexpectedOutput(out))
    }

    /// Switches the radio and reads the state back. networksetup exits 0 on
    /// some failures, so the read-back is the only reliable signal.
    pub async fn set_power(&self, device: &str, target: WifiPower) -> Result<(), RadioError> {
        tracing::debug!("networksetup -setairportpower {} {}", device, target);
        self.runner
            .run(NETWORKSETUP, &["-setairportpower", device, target.as_arg()])
            .await?;

        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }

        let actual = self.power(device).await?;
        if actual != target {
            return Err(RadioError::NotApplied {
                requested: target.as_arg(),
                actual: actual.as_arg(),
            });
        }
        Ok(())
    }

    pub async fn current_ssid(&self, device: &str) -> Result<Option<String>, RadioError> {
        let out = self
            .runner
            .run(NETWORKSETUP, &["-getairportnetwork", device])
            .await?;
        Ok(parse_ssid(&out))
    }
}
