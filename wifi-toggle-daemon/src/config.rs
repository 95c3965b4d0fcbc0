use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DaemonConfig {
    pub network: NetworkConfig,
    pub office: OfficeConfig,
    pub behavior: BehaviorConfig,
    pub notifications: NotificationConfig,
    pub logging: LoggingConfig,
    pub agent: AgentConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkConfig {
    /// Hardware ports that count as wired. Empty means any non-Wi-Fi port.
    pub wired_port_names: Vec<String>,
    pub ignored_port_names: Vec<String>,
    pub wifi_port_name: String,
    /// Pin the Wi-Fi device instead of looking it up by port name.
    pub wifi_device: Option<String>,
    pub require_ipv4: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct OfficeConfig {
    /// Only turn Wi-Fi back on after it was last seen joined to one of `ssids`.
    pub enabled: bool,
    pub ssids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct BehaviorConfig {
    pub poll_interval_secs: u64,
    pub idle_interval_secs: Option<u64>,
    pub action_cooldown_secs: u64,
    pub grace_after_wifi_on_secs: u64,
    pub debounce_polls: u32,
    pub enforce_on_startup: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotificationConfig {
    pub enabled: bool,
    pub sound: Option<String>,
    pub startup: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    Console,
    File,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    pub targets: Vec<LogTarget>,
    pub file_path: Option<PathBuf>,
    pub max_file_size_mb: u64,
    pub backup_count: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentConfig {
    pub label: String,
    pub keep_alive: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            wired_port_names: vec!["Thunderbolt Ethernet Slot 1".to_string()],
            ignored_port_names: vec![
                "Thunderbolt 1".to_string(),
                "Thunderbolt 2".to_string(),
                "Thunderbolt Bridge".to_string(),
            ],
            wifi_port_name: "Wi-Fi".to_string(),
            wifi_device: None,
            require_ipv4: true,
        }
    }
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            idle_interval_secs: None,
            action_cooldown_secs: 8,
            grace_after_wifi_on_secs: 20,
            debounce_polls: 1,
            enforce_on_startup: true,
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sound: Some("Submarine".to_string()),
            startup: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            targets: vec![LogTarget::Console],
            file_path: None,
            max_file_size_mb: 10,
            backup_count: 3,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            label: "com.wifi-toggle.agent".to_string(),
            keep_alive: true,
        }
    }
}

impl BehaviorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn idle_interval(&self) -> Option<Duration> {
        self.idle_interval_secs.map(Duration::from_secs)
    }

    pub fn action_cooldown(&self) -> Duration {
        Duration::from_secs(self.action_cooldown_secs)
    }

    pub fn grace_after_wifi_on(&self) -> Duration {
        Duration::from_secs(self.grace_after_wifi_on_secs)
    }
}

impl OfficeConfig {
    pub fn is_office_ssid(&self, ssid: &str) -> bool {
        self.ssids.iter().any(|known| known == ssid)
    }
}

impl LoggingConfig {
    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}

impl DaemonConfig {
    pub fn from_toml(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }

    /// Reads, parses and validates the file. Nothing is written on failure:
    /// a missing file is an error, not a cue to create one.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let mut config = Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.logging.file_path = config
            .logging
            .file_path
            .as_deref()
            .map(expand_home)
            .transpose()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.behavior.poll_interval_secs == 0 {
            return invalid("behavior.poll_interval_secs must be at least 1");
        }
        if self.behavior.idle_interval_secs == Some(0) {
            return invalid("behavior.idle_interval_secs must be at least 1");
        }
        if self.behavior.debounce_polls == 0 {
            return invalid("behavior.debounce_polls must be at least 1");
        }
        if self.network.wifi_port_name.trim().is_empty() {
            return invalid("network.wifi_port_name must not be empty");
        }
        if self.office.enabled && self.office.ssids.is_empty() {
            return invalid("office.enabled requires at least one entry in office.ssids");
        }
        if self.logging.level.parse::<tracing::Level>().is_err() {
            return Err(ConfigError::Invalid(format!(
                "logging.level {:?} is not one of trace, debug, info, warn, error",
                self.logging.level
            )));
        }
        if self.logging.targets.is_empty() {
            return invalid("logging.targets must name at least one of \"console\", \"file\"");
        }
        if self.logging.targets.contains(&LogTarget::File) {
            if self.logging.file_path.is_none() {
                return invalid("logging target \"file\" requires logging.file_path");
            }
            if self.logging.max_file_size_mb == 0 {
                return invalid("logging.max_file_size_mb must be at least 1");
            }
        }
        if self.agent.label.trim().is_empty() {
            return invalid("agent.label must not be empty");
        }
        Ok(())
    }
}

/// `~/Library/Application Support/wifi-toggle/config.toml` on macOS.
pub fn default_path() -> Result<PathBuf, ConfigError> {
    let base = dirs::config_dir().ok_or(ConfigError::NoHome)?;
    Ok(base.join("wifi-toggle").join("config.toml"))
}

/// Expands a leading `~/` against the home directory. Other paths pass
/// through untouched.
pub fn expand_home(path: &Path) -> Result<PathBuf, ConfigError> {
    match path.strip_prefix("~") {
        Ok(rest) => Ok(dirs::home_dir().ok_or(ConfigError::NoHome)?.join(rest)),
        Err(_) => Ok(path.to_path_buf()),
    }
}
