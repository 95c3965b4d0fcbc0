/*!
 * Wi-Fi Auto Toggle
 * Keeps the Wi-Fi radio off while a wired link is up and back on when it drops
 */

pub mod config;
pub mod error;
pub mod launchd;
pub mod logging;
pub mod monitor;
pub mod network;
pub mod notify;
pub mod system;
