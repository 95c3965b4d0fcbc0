use serde::Serialize;
use std::fmt;

use crate::network::WifiPower;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    DisableWifi,
    EnableWifi,
    Nothing,
}

impl Action {
    pub fn target(self) -> Option<WifiPower> {
        match self {
            Action::DisableWifi => Some(WifiPower::Off),
            Action::EnableWifi => Some(WifiPower::On),
            Action::Nothing => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::DisableWifi => "disable Wi-Fi",
            Action::EnableWifi => "enable Wi-Fi",
            Action::Nothing => "nothing",
        })
    }
}

/// Wired beats wireless. Wi-Fi comes back only when no cable is up and, with
/// office gating on, only when the host was last seen on an office network.
pub fn decide(wired_active: bool, wifi: WifiPower, in_office: bool, office_gating: bool) -> Action {
    match (wired_active, wifi) {
        (true, WifiPower::On) => Action::DisableWifi,
        (false, WifiPower::Off) if in_office || !office_gating => Action::EnableWifi,
        _ => Action::Nothing,
    }
}
