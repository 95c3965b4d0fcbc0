/*!
 * LaunchAgent management
 * Renders the per-user agent plist and loads it into the gui/<uid> domain
 */

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::system::{CommandRunner, LAUNCHCTL};

#[derive(Debug, Clone)]
pub struct AgentSpec {
    pub label: String,
    pub program: PathBuf,
    pub config_path: PathBuf,
    pub keep_alive: bool,
    /// Where launchd sends the agent's stderr, i.e. the console log.
    pub stderr_path: Option<PathBuf>,
}

/// `~/Library/LaunchAgents`
pub fn agents_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHome)?;
    Ok(home.join("Library").join("LaunchAgents"))
}

pub fn plist_path(agents_dir: &Path, label: &str) -> PathBuf {
    agents_dir.join(format!("{label}.plist"))
}

fn domain() -> String {
    format!("gui/{}", nix::unistd::getuid())
}

pub fn render_plist(spec: &AgentSpec) -> String {
    let mut plist = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n\
         <plist version=\"1.0\">\n\
         <dict>\n",
    );

    plist.push_str(&format!(
        "    <key>Label</key>\n    <string>{}</string>\n",
        escape(&spec.label)
    ));

    plist.push_str("    <key>ProgramArguments</key>\n    <array>\n");
    let program = spec.program.to_string_lossy();
    let config = spec.config_path.to_string_lossy();
    for arg in [&*program, "--config", &*config, "run"] {
        plist.push_str(&format!("        <string>{}</string>\n", escape(arg)));
    }
    plist.push_str("    </array>\n");

    plist.push_str("    <key>RunAtLoad</key>\n    <true/>\n");
    plist.push_str(&format!(
        "    <key>KeepAlive</key>\n    <{}/>\n",
        spec.keep_alive
    ));
    plist.push_str("    <key>ProcessType</key>\n    <string>Background</string>\n");

    if let Some(path) = &spec.stderr_path {
        plist.push_str(&format!(
            "    <key>StandardErrorPath</key>\n    <string>{}</string>\n",
            escape(&path.to_string_lossy())
        ));
    }

    plist.push_str("</dict>\n</plist>\n");
    plist
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Writes the plist and (re)loads the agent. Returns the plist path.
pub async fn install<R: CommandRunner>(
    runner: &R,
    spec: &AgentSpec,
    agents_dir: &Path,
) -> Result<PathBuf> {
    fs::create_dir_all(agents_dir)
        .with_context(|| format!("cannot create {}", agents_dir.display()))?;

    let path = plist_path(agents_dir, &spec.label);
    fs::write(&path, render_plist(spec))
        .with_context(|| format!("cannot write {}", path.display()))?;
    info!("wrote {}", path.display());

    let domain = domain();
    let target = format!("{domain}/{}", spec.label);
    let previous = runner.output(LAUNCHCTL, &["bootout", target.as_str()]).await?;
    if previous.success() {
        debug!("unloaded previous instance of {}", spec.label);
    }

    let plist = path.to_string_lossy();
    runner
        .run(LAUNCHCTL, &["bootstrap", domain.as_str(), &*plist])
        .await
        .with_context(|| format!("cannot load {}", spec.label))?;
    info!("loaded {} into {}", spec.label, domain);
    Ok(path)
}

/// Unloads the agent and removes its plist. Both steps tolerate the agent
/// already being gone. Returns whether a plist was removed.
pub async fn uninstall<R: CommandRunner>(runner: &R, label: &str, agents_dir: &Path) -> Result<bool> {
    let target = format!("{}/{label}", domain());
    let unloaded = runner.output(LAUNCHCTL, &["bootout", target.as_str()]).await?;
    if unloaded.success() {
        info!("unloaded {}", label);
    } else {
        debug!("{} was not loaded: {}", label, unloaded.stderr);
    }

    let path = plist_path(agents_dir, label);
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(&path).with_context(|| format!("cannot remove {}", path.display()))?;
    info!("removed {}", path.display());
    Ok(true)
}
