use std::fs;
use std::path::PathBuf;

use wifi_toggle::config::{DaemonConfig, LogTarget};
use wifi_toggle::error::ConfigError;

fn write_config(dir: &tempfile::TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn example_config_matches_defaults() {
    let config = DaemonConfig::from_toml(include_str!("../config.example.toml")).unwrap();
    config.validate().unwrap();

    let defaults = DaemonConfig::default();
    assert_eq!(config.network.wired_port_names, defaults.network.wired_port_names);
    assert_eq!(config.network.ignored_port_names, defaults.network.ignored_port_names);
    assert_eq!(config.behavior.poll_interval_secs, defaults.behavior.poll_interval_secs);
    assert_eq!(config.behavior.action_cooldown_secs, defaults.behavior.action_cooldown_secs);
    assert_eq!(config.notifications.sound, defaults.notifications.sound);
    assert_eq!(config.agent.label, defaults.agent.label);
}

#[test]
fn loads_a_full_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"
[network]
wired_port_names = ["USB 10/100/1000 LAN"]
require_ipv4 = false

[office]
enabled = true
ssids = ["Marketing 5.0GHz", "Marketing"]

[behavior]
poll_interval_secs = 2
idle_interval_secs = 30
debounce_polls = 2

[logging]
level = "debug"
targets = ["console", "file"]
file_path = "/tmp/wifi-toggle/wifi-toggle.log"
backup_count = 0
"#,
    );

    let config = DaemonConfig::load(&path).unwrap();
    assert_eq!(config.network.wired_port_names, vec!["USB 10/100/1000 LAN"]);
    assert!(!config.network.require_ipv4);
    assert!(config.office.is_office_ssid("Marketing"));
    assert_eq!(config.behavior.poll_interval_secs, 2);
    assert_eq!(config.behavior.idle_interval_secs, Some(30));
    assert_eq!(config.logging.targets, vec![LogTarget::Console, LogTarget::File]);
    assert_eq!(config.logging.max_file_bytes(), 10 * 1024 * 1024);
    // untouched sections keep their defaults
    assert_eq!(config.behavior.action_cooldown_secs, 8);
    assert_eq!(config.agent.label, "com.wifi-toggle.agent");
}

#[test]
fn missing_file_is_not_created() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let err = DaemonConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { .. }));
    assert!(!path.exists());
}

#[test]
fn malformed_file_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "[behavior\npoll_interval_secs = 5\n");

    let err = DaemonConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("config.toml"));
}

#[test]
fn wrong_type_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "[behavior]\npoll_interval_secs = \"fast\"\n");
    assert!(matches!(
        DaemonConfig::load(&path),
        Err(ConfigError::Parse { .. })
    ));
}

#[test]
fn semantic_errors_surface_from_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "[logging]\ntargets = [\"file\"]\n");
    assert!(matches!(
        DaemonConfig::load(&path),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn log_path_expands_home() {
    let Some(home) = dirs::home_dir() else {
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        "[logging]\ntargets = [\"file\"]\nfile_path = \"~/Library/Logs/wifi-toggle.log\"\n",
    );

    let config = DaemonConfig::load(&path).unwrap();
    assert_eq!(
        config.logging.file_path,
        Some(home.join("Library/Logs/wifi-toggle.log"))
    );
}
