/*!
 * System integration
 * Every macOS tool the daemon drives goes through a CommandRunner
 */

mod command;
#[cfg(test)]
pub(crate) mod fake;

pub use command::{CommandOutput, CommandRunner, SystemRunner, DEFAULT_TIMEOUT};

use std::env;
use std::path::PathBuf;

pub const NETWORKSETUP: &str = "/usr/sbin/networksetup";
pub const IFCONFIG: &str = "/sbin/ifconfig";
pub const IPCONFIG: &str = "/usr/sbin/ipconfig";
pub const OSASCRIPT: &str = "/usr/bin/osascript";
pub const LAUNCHCTL: &str = "/bin/launchctl";

/// Looks `name` up on `PATH`, the way a shell would.
pub fn find_in_path(name: &str) -> Option<PathBuf> {
    let path = env::var_os("PATH")?;
    env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

pub(crate) fn render_command(program: &str, args: &[&str]) -> String {
    let mut command = program.to_string();
    for arg in args {
        command.push(' ');
        command.push_str(arg);
    }
    command
}
