/*!
 * Link Monitor
 * Polls interface state and keeps the Wi-Fi radio in line with the wired link
 */

pub mod decision;

pub use decision::{decide, Action};

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::config::{BehaviorConfig, DaemonConfig, OfficeConfig};
use crate::network::{NetworkProbe, WifiPower, WifiRadio};
use crate::notify::Notifier;
use crate::system::CommandRunner;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkMode {
    Wired,
    Wireless,
    #[default]
    Unknown,
}

impl LinkMode {
    pub fn from_wired(wired: bool) -> Self {
        if wired {
            LinkMode::Wired
        } else {
            LinkMode::Wireless
        }
    }

    pub fn is_wired(self) -> bool {
        self == LinkMode::Wired
    }
}

impl fmt::Display for LinkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LinkMode::Wired => "wired",
            LinkMode::Wireless => "wireless",
            LinkMode::Unknown => "unknown",
        })
    }
}

/// One probe of the host.
#[derive(Debug, Clone, Serialize)]
pub struct Observation {
    pub wifi_device: String,
    /// Devices that were checked for a wired link.
    pub wired_ports: Vec<String>,
    pub wired_active: bool,
    pub wifi_power: WifiPower,
    pub ssid: Option<String>,
    /// `None` when the SSID could not be read (radio off, query failed, or
    /// no office networks configured).
    pub in_office: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    #[serde(flatten)]
    pub observation: Observation,
    pub office_gating: bool,
    pub action: Action,
}

#[derive(Debug, Default)]
struct MonitorState {
    mode: LinkMode,
    wifi_power: Option<WifiPower>,
    /// Sticky: the SSID can only be read while the radio is on.
    in_office: bool,
    /// (candidate wired value, consecutive observations)
    debounce: Option<(bool, u32)>,
    /// Set when startup enforcement is off; cleared by the first link change.
    hold: bool,
    last_toggle: Option<Instant>,
    grace_until: Option<Instant>,
    failing: bool,
}

pub struct Monitor<R> {
    probe: NetworkProbe<R>,
    radio: WifiRadio<R>,
    notifier: Notifier<R>,
    office: OfficeConfig,
    behavior: BehaviorConfig,
    state: MonitorState,
}

impl<R: CommandRunner + Clone> Monitor<R> {
    pub fn new(runner: R, config: &DaemonConfig) -> Self {
        Self::from_parts(
            NetworkProbe::new(runner.clone(), config.network.clone()),
            WifiRadio::new(runner.clone()),
            Notifier::new(runner, config.notifications.clone()),
            config,
        )
    }
}

impl<R: CommandRunner> Monitor<R> {
    pub fn from_parts(
        probe: NetworkProbe<R>,
        radio: WifiRadio<R>,
        notifier: Notifier<R>,
        config: &DaemonConfig,
    ) -> Self {
        Self {
            probe,
            radio,
            notifier,
            office: config.office.clone(),
            behavior: config.behavior.clone(),
            state: MonitorState {
                hold: !config.behavior.enforce_on_startup,
                ..MonitorState::default()
            },
        }
    }

    pub fn mode(&self) -> LinkMode {
        self.state.mode
    }

    /// Polls until `shutdown` resolves. The signal is honoured between ticks,
    /// so a half-finished toggle is never abandoned.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut delay = self.tick(Instant::now()).await;
        self.notifier
            .startup(self.state.mode, self.state.wifi_power)
            .await;

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(delay) => {}
            }
            delay = self.tick(Instant::now()).await;
        }

        info!("monitor stopped (last link state: {})", self.state.mode);
    }

    /// One poll: observe, decide, act. Returns how long to sleep before the
    /// next one. Any failure is logged and retried on the next tick.
    pub async fn tick(&mut self, now: Instant) -> Duration {
        match self.observe().await {
            Ok(observation) => self.apply(&observation, now).await,
            Err(e) => warn!("skipping poll: {:#}", e),
        }
        self.next_delay(now)
    }

    /// Probes the host and reports what the rule would do, without acting.
    pub async fn snapshot(&self) -> Result<Snapshot> {
        let observation = self.observe().await?;
        let action = decide(
            observation.wired_active,
            observation.wifi_power,
            observation.in_office.unwrap_or(false),
            self.office.enabled,
        );
        Ok(Snapshot {
            observation,
            office_gating: self.office.enabled,
            action,
        })
    }

    pub async fn observe(&self) -> Result<Observation> {
        let ports = self
            .probe
            .hardware_ports()
            .await
            .context("cannot list hardware ports")?;

        let wifi_device = self.probe.wifi_device(&ports);
        let wired_ports = self
            .probe
            .wired_candidates(&ports)
            .iter()
            .map(|port| port.device.clone())
            .collect();
        let wired_active = self.probe.wired_link_active(&ports).await;

        let wifi_power = self
            .radio
            .power(&wifi_device)
            .await
            .with_context(|| format!("cannot read Wi-Fi power of {wifi_device}"))?;

        let (ssid, in_office) = if wifi_power.is_on() && !self.office.ssids.is_empty() {
            match self.radio.current_ssid(&wifi_device).await {
                Ok(ssid) => {
                    let in_office = ssid
                        .as_deref()
                        .is_some_and(|ssid| self.office.is_office_ssid(ssid));
                    (ssid, Some(in_office))
                }
                Err(e) => {
                    debug!("cannot read SSID of {}: {}", wifi_device, e);
                    (None, None)
                }
            }
        } else {
            (None, None)
        };

        debug!(
            "wired={} wifi={} ssid={} in_office={:?}",
            wired_active,
            wifi_power,
            ssid.as_deref().unwrap_or("-"),
            in_office
        );

        Ok(Observation {
            wifi_device,
            wired_ports,
            wired_active,
            wifi_power,
            ssid,
            in_office,
        })
    }

    async fn apply(&mut self, observation: &Observation, now: Instant) {
        self.note_wifi_power(observation.wifi_power);
        self.note_office(observation, now);

        let Some(wired) = self.debounced(observation.wired_active) else {
            debug!("link state not settled yet");
            return;
        };
        self.note_mode(LinkMode::from_wired(wired));

        if self.state.hold {
            debug!("startup enforcement off, waiting for the first link change");
            return;
        }

        let action = decide(
            wired,
            observation.wifi_power,
            self.state.in_office,
            self.office.enabled,
        );
        match action {
            Action::Nothing => {
                // the host already matches the rule, so any failure streak is over
                self.state.failing = false;
                if !wired && !observation.wifi_power.is_on() {
                    debug!("not in the office, leaving Wi-Fi off");
                }
            }
            _ => self.perform(action, &observation.wifi_device, now).await,
        }
    }

    async fn perform(&mut self, action: Action, device: &str, now: Instant) {
        let Some(target) = action.target() else {
            return;
        };

        if let Some(last) = self.state.last_toggle {
            let since = now.saturating_duration_since(last);
            if since < self.behavior.action_cooldown() {
                debug!(
                    "holding '{}': last toggle was {}s ago",
                    action,
                    since.as_secs()
                );
                return;
            }
        }

        match self.radio.set_power(device, target).await {
            Ok(()) => {
                info!("Wi-Fi on {} switched {} ({} link)", device, target, self.state.mode);
                self.state.last_toggle = Some(now);
                self.state.wifi_power = Some(target);
                self.state.failing = false;
                if target.is_on() {
                    self.state.grace_until = Some(now + self.behavior.grace_after_wifi_on());
                }
                self.notifier.wifi_changed(target).await;
            }
            Err(e) => {
                error!("failed to turn Wi-Fi {} on {}: {}", target, device, e);
                // One alert per failure streak; the log has the rest.
                if !self.state.failing {
                    self.state.failing = true;
                    self.notifier
                        .error(&format!("Could not turn Wi-Fi {target}: {e}"))
                        .await;
                }
            }
        }
    }

    fn note_wifi_power(&mut self, power: WifiPower) {
        if let Some(previous) = self.state.wifi_power {
            if previous != power {
                info!("Wi-Fi power changed externally: {}", power);
            }
        }
        self.state.wifi_power = Some(power);
    }

    /// A radio that was just switched on may not have joined its network yet;
    /// "not associated" during the grace window says nothing about the office.
    fn note_office(&mut self, observation: &Observation, now: Instant) {
        let Some(in_office) = observation.in_office else {
            return;
        };
        let associating = self.state.grace_until.is_some_and(|until| now < until);
        if observation.ssid.is_none() && associating {
            debug!("Wi-Fi not associated yet, keeping office state");
            return;
        }
        self.state.in_office = in_office;
    }

    fn note_mode(&mut self, mode: LinkMode) {
        let previous = self.state.mode;
        if previous == mode {
            return;
        }

        match previous {
            LinkMode::Unknown => info!("initial link state: {}", mode),
            _ if mode.is_wired() => info!("wired link up"),
            _ => info!("wired link down"),
        }

        if previous != LinkMode::Unknown {
            self.state.hold = false;
        }
        self.state.mode = mode;
    }

    /// The wired reading only counts once it has been seen `debounce_polls`
    /// times in a row; until then the previous trusted state stands.
    fn debounced(&mut self, wired: bool) -> Option<bool> {
        let needed = self.behavior.debounce_polls.max(1);
        let count = match self.state.debounce {
            Some((value, count)) if value == wired => count.saturating_add(1),
            _ => 1,
        };
        self.state.debounce = Some((wired, count));

        if count >= needed {
            Some(wired)
        } else {
            match self.state.mode {
                LinkMode::Unknown => None,
                mode => Some(mode.is_wired()),
            }
        }
    }

    fn next_delay(&self, now: Instant) -> Duration {
        let poll = self.behavior.poll_interval();
        if self.state.grace_until.is_some_and(|until| now < until) {
            return poll;
        }
        match self.behavior.idle_interval() {
            Some(idle) if self.state.mode == LinkMode::Wireless && !self.state.in_office => idle,
            _ => poll,
        }
    }
}
