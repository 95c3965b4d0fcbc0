/*!
 * Wired link detection
 * Which ports count as wired, and whether one of them really carries traffic
 */

use std::net::Ipv4Addr;

use super::ports::{is_wifi_port_name, HardwarePort};
use crate::config::NetworkConfig;

/// Ports that may count as a wired link: never Wi-Fi, never an ignored
/// pseudo interface, and only allow-listed ports when an allow-list is set.
pub fn wired_candidates<'a>(
    ports: &'a [HardwarePort],
    config: &NetworkConfig,
) -> Vec<&'a HardwarePort> {
    ports
        .iter()
        .filter(|port| !config.ignored_port_names.contains(&port.name))
        .filter(|port| port.name != config.wifi_port_name && !is_wifi_port_name(&port.name))
        .filter(|port| Some(&port.device) != config.wifi_device.as_ref())
        .filter(|port| {
            config.wired_port_names.is_empty() || config.wired_port_names.contains(&port.name)
        })
        .collect()
}

/// `ifconfig <dev>` reports `status: active` once the link has carrier.
pub fn status_active(ifconfig_output: &str) -> bool {
    ifconfig_output
        .lines()
        .any(|line| line.trim().eq_ignore_ascii_case("status: active"))
}

/// Address from `ipconfig getifaddr`, ignoring self-assigned (169.254/16)
/// addresses that show up on adapters with no DHCP server behind them.
pub fn usable_ipv4(getifaddr_output: &str) -> Option<Ipv4Addr> {
    let addr: Ipv4Addr = getifaddr_output.trim().parse().ok()?;
    if addr.is_link_local() || addr.is_unspecified() || addr.is_loopback() {
        return None;
    }
    Some(addr)
}
