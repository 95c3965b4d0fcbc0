pub mod ports;
pub mod wifi;
pub mod wired;

pub use ports::{parse_hardware_ports, HardwarePort};
pub use wifi::{WifiPower, WifiRadio};

use crate::config::NetworkConfig;
use crate::error::CommandError;
use crate::system::{CommandRunner, IFCONFIG, IPCONFIG, NETWORKSETUP};

/// Fallback when no port looks like Wi-Fi; it is en0 on every Mac with a radio.
pub const DEFAULT_WIFI_DEVICE: &str = "en0";

/// Reads interface state from the OS. Holds no state between calls: adapters
/// come and go, so every poll starts from a fresh port listing.
pub struct NetworkProbe<R> {
    runner: R,
    config: NetworkConfig,
}

impl<R: CommandRunner> NetworkProbe<R> {
    pub fn new(runner: R, config: NetworkConfig) -> Self {
        Self { runner, config }
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub async fn hardware_ports(&self) -> Result<Vec<HardwarePort>, CommandError> {
        let out = self
            .runner
            .run(NETWORKSETUP, &["-listallhardwareports"])
            .await?;
        let ports = parse_hardware_ports(&out);
        tracing::trace!("found {} hardware ports", ports.len());
        Ok(ports)
    }

    pub fn wifi_device(&self, ports: &[HardwarePort]) -> String {
        if let Some(device) = &self.config.wifi_device {
            return device.clone();
        }
        ports
            .iter()
            .find(|port| port.name == self.config.wifi_port_name)
            .or_else(|| ports.iter().find(|port| ports::is_wifi_port_name(&port.name)))
            .map(|port| port.device.clone())
            .unwrap_or_else(|| DEFAULT_WIFI_DEVICE.to_string())
    }

    pub fn wired_candidates<'a>(&self, ports: &'a [HardwarePort]) -> Vec<&'a HardwarePort> {
        wired::wired_candidates(ports, &self.config)
    }

    /// True when any candidate port has carrier (and a routable IPv4 address
    /// if `require_ipv4` is set). A port whose state cannot be read counts as
    /// down.
    pub async fn wired_link_active(&self, ports: &[HardwarePort]) -> bool {
        for port in self.wired_candidates(ports) {
            match self.port_link_active(port).await {
                Ok(true) => {
                    tracing::trace!("wired link on {} ({})", port.name, port.device);
                    return true;
                }
                Ok(false) => {}
                Err(e) => tracing::debug!("cannot read state of {}: {}", port.device, e),
            }
        }
        false
    }

    async fn port_link_active(&self, port: &HardwarePort) -> Result<bool, CommandError> {
        let ifconfig = self.runner.run(IFCONFIG, &[port.device.as_str()]).await?;
        if !wired::status_active(&ifconfig) {
            return Ok(false);
        }
        if !self.config.require_ipv4 {
            return Ok(true);
        }

        // getifaddr exits 1 when the interface has no address.
        let out = self
            .runner
            .output(IPCONFIG, &["getifaddr", port.device.as_str()])
            .await?;
        Ok(out.success() && wired::usable_ipv4(&out.stdout).is_some())
    }
}
