/*!
 * Hardware port listing
 * Parses `networksetup -listallhardwareports`
 */

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HardwarePort {
    /// Name shown in System Settings, e.g. "Thunderbolt Ethernet Slot 1".
    pub name: String,
    /// BSD device, e.g. "en10".
    pub device: String,
    pub mac_address: Option<String>,
}

/// Output is a series of blocks:
///
/// ```text
/// Hardware Port: Wi-Fi
/// Device: en0
/// Ethernet Address: 3c:22:fb:00:00:01
/// ```
///
/// Blocks without a device (VLAN headers and the like) are dropped.
pub fn parse_hardware_ports(output: &str) -> Vec<HardwarePort> {
    let mut ports = Vec::new();
    let mut name: Option<String> = None;
    let mut device: Option<String> = None;
    let mut mac_address: Option<String> = None;

    let mut flush = |name: &mut Option<String>, device: &mut Option<String>, mac: &mut Option<String>| {
        if let (Some(name), Some(device)) = (name.take(), device.take()) {
            ports.push(HardwarePort {
                name,
                device,
                mac_address: mac.take(),
            });
        }
        *mac = None;
    };

    for line in output.lines() {
        let line = line.trim();

        if let Some(value) = line.strip_prefix("Hardware Port:") {
            flush(&mut name, &mut device, &mut mac_address);
            name = Some(value.trim().to_string());
        } else if let Some(value) = line.strip_prefix("Device:") {
            let value = value.trim();
            if !value.is_empty() {
                device = Some(value.to_string());
            }
        } else if let Some(value) = line.strip_prefix("Ethernet Address:") {
            let value = value.trim();
            if !value.is_empty() && value != "N/A" {
                mac_address = Some(value.to_string());
            }
        }
    }
    flush(&mut name, &mut device, &mut mac_address);

    ports
}

pub fn is_wifi_port_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("wi-fi") || lower.contains("wifi") || lower == "airport"
}
