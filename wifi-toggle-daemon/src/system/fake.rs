//! Simulated macOS host for tests. Answers the handful of commands the daemon
//! issues with output shaped like the real tools.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{render_command, CommandOutput, CommandRunner};
use super::{IFCONFIG, IPCONFIG, LAUNCHCTL, NETWORKSETUP, OSASCRIPT};
use crate::error::CommandError;

pub const WIRED_PORT: &str = "Thunderbolt Ethernet Slot 1";
pub const WIRED_DEVICE: &str = "en10";

#[derive(Debug, Clone, Default)]
pub struct FakeLink {
    pub active: bool,
    pub ipv4: Option<String>,
}

#[derive(Debug, Default)]
pub struct HostState {
    /// (hardware port name, device)
    pub ports: Vec<(String, String)>,
    pub links: HashMap<String, FakeLink>,
    pub wifi_on: bool,
    /// Network the radio joins while powered.
    pub ssid: Option<String>,
    pub power_query_fails: bool,
    pub set_power_fails: bool,
    pub loaded_agents: Vec<String>,
    pub calls: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeHost {
    state: Arc<Mutex<HostState>>,
}

impl FakeHost {
    /// A laptop with Wi-Fi on en0, a Thunderbolt Ethernet adapter on en10 with
    /// no cable, and the usual Thunderbolt pseudo ports.
    pub fn macbook() -> Self {
        let host = Self::default();
        {
            let mut state = host.state();
            state.ports = vec![
                ("Wi-Fi".to_string(), "en0".to_string()),
                ("Thunderbolt Bridge".to_string(), "bridge0".to_string()),
                ("Thunderbolt 1".to_string(), "en1".to_string()),
                (WIRED_PORT.to_string(), WIRED_DEVICE.to_string()),
            ];
            state.links.insert(
                "en1".to_string(),
                FakeLink {
                    active: true,
                    ipv4: Some("169.254.12.7".to_string()),
                },
            );
            state.links.insert(WIRED_DEVICE.to_string(), FakeLink::default());
            state.wifi_on = true;
        }
        host
    }

    pub fn state(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap()
    }

    pub fn plug_cable(&self) {
        self.state().links.insert(
            WIRED_DEVICE.to_string(),
            FakeLink {
                active: true,
                ipv4: Some("10.20.0.15".to_string()),
            },
        );
    }

    pub fn unplug_cable(&self) {
        self.state()
            .links
            .insert(WIRED_DEVICE.to_string(), FakeLink::default());
    }

    pub fn set_wifi(&self, on: bool) {
        self.state().wifi_on = on;
    }

    pub fn set_ssid(&self, ssid: Option<&str>) {
        self.state().ssid = ssid.map(str::to_string);
    }

    pub fn wifi_on(&self) -> bool {
        self.state().wifi_on
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    /// Target of every `networksetup -setairportpower` invocation, e.g. `off`.
    pub fn toggles(&self) -> Vec<String> {
        let prefix = format!("{NETWORKSETUP} -setairportpower ");
        self.calls()
            .iter()
            .filter_map(|call| call.strip_prefix(&prefix))
            .filter_map(|rest| rest.rsplit(' ').next().map(str::to_string))
            .collect()
    }

    /// AppleScript bodies handed to osascript.
    pub fn notifications(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter_map(|call| call.strip_prefix(&format!("{OSASCRIPT} -e ")))
            .map(str::to_string)
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    fn respond(&self, program: &str, args: &[&str]) -> Result<CommandOutput, CommandError> {
        let mut state = self.state();
        state.calls.push(render_command(program, args));

        match (program, args) {
            (NETWORKSETUP, ["-listallhardwareports"]) => Ok(ok(hardware_ports(&state.ports))),
            (NETWORKSETUP, ["-getairportpower", device]) => {
                if state.power_query_fails {
                    return Ok(failed(
                        10,
                        "** Error: The parameters were not valid.".to_string(),
                    ));
                }
                let power = if state.wifi_on { "On" } else { "Off" };
                Ok(ok(format!("Wi-Fi Power ({device}): {power}")))
            }
            (NETWORKSETUP, ["-setairportpower", _, power]) => {
                if state.set_power_fails {
                    return Ok(failed(1, "Error: -setairportpower failed".to_string()));
                }
                state.wifi_on = *power == "on";
                Ok(ok(String::new()))
            }
            (NETWORKSETUP, ["-getairportnetwork", _]) => match (&state.ssid, state.wifi_on) {
                (Some(ssid), true) => Ok(ok(format!("Current Wi-Fi Network: {ssid}"))),
                _ => Ok(ok(
                    "You are not associated with an AirPort network.".to_string()
                )),
            },
            (IFCONFIG, [device]) => match state.links.get(*device) {
                Some(link) => Ok(ok(ifconfig(device, link))),
                None => Ok(failed(
                    1,
                    format!("ifconfig: interface {device} does not exist"),
                )),
            },
            (IPCONFIG, ["getifaddr", device]) => {
                match state.links.get(*device).and_then(|link| link.ipv4.clone()) {
                    Some(ip) => Ok(ok(ip)),
                    None => Ok(failed(1, String::new())),
                }
            }
            (OSASCRIPT, ["-e", _]) => Ok(ok(String::new())),
            (LAUNCHCTL, ["bootout", target]) => {
                let label = target.rsplit('/').next().unwrap_or_default().to_string();
                let before = state.loaded_agents.len();
                state.loaded_agents.retain(|loaded| *loaded != label);
                if state.loaded_agents.len() == before {
                    Ok(failed(3, "Boot-out failed: 3: No such process".to_string()))
                } else {
                    Ok(ok(String::new()))
                }
            }
            (LAUNCHCTL, ["bootstrap", _, plist]) => {
                let label = std::path::Path::new(plist)
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().to_string())
                    .unwrap_or_default();
                state.loaded_agents.push(label);
                Ok(ok(String::new()))
            }
            _ => Err(CommandError::NotFound {
                program: program.to_string(),
            }),
        }
    }
}

impl CommandRunner for FakeHost {
    async fn output(&self, program: &str, args: &[&str]) -> Result<CommandOutput, CommandError> {
        self.respond(program, args)
    }
}

fn ok(stdout: String) -> CommandOutput {
    CommandOutput {
        status: 0,
        stdout,
        stderr: String::new(),
    }
}

fn failed(status: i32, stderr: String) -> CommandOutput {
    CommandOutput {
        status,
        stdout: String::new(),
        stderr,
    }
}

fn hardware_ports(ports: &[(String, String)]) -> String {
    let mut out = String::new();
    for (index, (name, device)) in ports.iter().enumerate() {
        out.push_str(&format!(
            "Hardware Port: {name}\nDevice: {device}\nEthernet Address: 3c:22:fb:00:00:{index:02x}\n\n"
        ));
    }
    out.push_str("VLAN Configurations\n===================");
    out
}

fn ifconfig(device: &str, link: &FakeLink) -> String {
    let mut out = format!(
        "{device}: flags=8863<UP,BROADCAST,SMART,RUNNING,SIMPLEX,MULTICAST> mtu 1500\n\
         \tether 3c:22:fb:11:22:33\n"
    );
    if let Some(ip) = &link.ipv4 {
        out.push_str(&format!("\tinet {ip} netmask 0xffffff00 broadcast 10.20.0.255\n"));
    }
    out.push_str("\tmedia: autoselect\n");
    out.push_str(if link.active {
        "\tstatus: active"
    } else {
        "\tstatus: inactive"
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn toggles_ignore_quoted_commands() {
        let host = FakeHost::macbook();
        host.run(NETWORKSETUP, &["-setairportpower", "en0", "off"]).await.unwrap();
        host.run(
            OSASCRIPT,
            &["-e", "display notification \"networksetup -setairportpower en0 off\" sound name \"Funk\""],
        )
        .await
        .unwrap();
        assert_eq!(host.toggles(), vec!["off"]);
        assert_eq!(host.notifications().len(), 1);
    }
}
