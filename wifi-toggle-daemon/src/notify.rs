/*!
 * Desktop notifications
 * terminal-notifier when installed, AppleScript otherwise
 */

use std::path::PathBuf;

use crate::config::NotificationConfig;
use crate::error::CommandError;
use crate::monitor::LinkMode;
use crate::network::WifiPower;
use crate::system::{self, CommandRunner, OSASCRIPT};

const APP_NAME: &str = "Wi-Fi Auto Toggle";
const ERROR_SOUND: &str = "Funk";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyBackend {
    TerminalNotifier(PathBuf),
    AppleScript,
}

impl NotifyBackend {
    pub fn detect() -> Self {
        match system::find_in_path("terminal-notifier") {
            Some(path) => NotifyBackend::TerminalNotifier(path),
            None => NotifyBackend::AppleScript,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub subtitle: Option<String>,
    pub sound: Option<String>,
}

pub struct Notifier<R> {
    runner: R,
    backend: NotifyBackend,
    config: NotificationConfig,
}

impl<R: CommandRunner> Notifier<R> {
    pub fn new(runner: R, config: NotificationConfig) -> Self {
        let backend = NotifyBackend::detect();
        tracing::debug!("notification backend: {:?}", backend);
        Self::with_backend(runner, config, backend)
    }

    pub fn with_backend(runner: R, config: NotificationConfig, backend: NotifyBackend) -> Self {
        Self {
            runner,
            backend,
            config,
        }
    }

    pub async fn send(&self, notification: &Notification) -> Result<(), CommandError> {
        if !self.config.enabled {
            tracing::trace!("notifications disabled, dropping {:?}", notification.title);
            return Ok(());
        }

        match &self.backend {
            NotifyBackend::TerminalNotifier(path) => {
                let program = path.to_string_lossy();
                let args = terminal_notifier_args(notification);
                let args: Vec<&str> = args.iter().map(String::as_str).collect();
                self.runner.run(&program, &args).await?;
            }
            NotifyBackend::AppleScript => {
                let script = applescript(notification);
                self.runner.run(OSASCRIPT, &["-e", script.as_str()]).await?;
            }
        }
        Ok(())
    }

    pub async fn wifi_changed(&self, power: WifiPower) {
        let notification = match power {
            WifiPower::Off => Notification {
                title: "Wi-Fi turned off".to_string(),
                message: "Wired link is active, Wi-Fi was switched off".to_string(),
                ..Default::default()
            },
            WifiPower::On => Notification {
                title: "Wi-Fi turned on".to_string(),
                message: "Wired link is gone, Wi-Fi was switched back on".to_string(),
                ..Default::default()
            },
        };
        self.deliver(Notification {
            sound: self.config.sound.clone(),
            ..notification
        })
        .await;
    }

    pub async fn startup(&self, mode: LinkMode, wifi: Option<WifiPower>) {
        if !self.config.startup {
            return;
        }
        let wifi = wifi.map_or("unknown".to_string(), |power| power.to_string());
        self.deliver(Notification {
            title: format!("{APP_NAME} started"),
            message: format!("Link: {mode}\nWi-Fi: {wifi}"),
            subtitle: Some("Monitoring active".to_string()),
            sound: None,
        })
        .await;
    }

    pub async fn error(&self, message: &str) {
        self.deliver(Notification {
            title: format!("{APP_NAME}: error"),
            message: message.to_string(),
            subtitle: None,
            sound: Some(ERROR_SOUND.to_string()),
        })
        .await;
    }

    // A lost notification never stops the monitor.
    async fn deliver(&self, notification: Notification) {
        if let Err(e) = self.send(&notification).await {
            tracing::warn!("notification {:?} failed: {}", notification.title, e);
        }
    }
}

fn terminal_notifier_args(notification: &Notification) -> Vec<String> {
    let mut args = vec![
        "-title".to_string(),
        notification.title.clone(),
        "-message".to_string(),
        notification.message.clone(),
        "-group".to_string(),
        APP_NAME.to_string(),
    ];
    if let Some(subtitle) = &notification.subtitle {
        args.push("-subtitle".to_string());
        args.push(subtitle.clone());
    }
    if let Some(sound) = &notification.sound {
        args.push("-sound".to_string());
        args.push(sound.clone());
    }
    args
}

fn applescript(notification: &Notification) -> String {
    let mut script = format!(
        "display notification {} with title {}",
        quote(&notification.message),
        quote(&notification.title)
    );
    if let Some(subtitle) = &notification.subtitle {
        script.push_str(&format!(" subtitle {}", quote(subtitle)));
    }
    if let Some(sound) = &notification.sound {
        script.push_str(&format!(" sound name {}", quote(sound)));
    }
    script
}

/// AppleScript string literal.
fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
