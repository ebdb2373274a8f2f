//! Command-line configuration.

use std::{net::SocketAddr, path::PathBuf, time::Duration};

use clap::Parser;
use cuelight_core::{
    BootstrapConfig, CueConfig,
    config::{CHANNEL_COUNT, FALLBACK_AP_PASSPHRASE, FALLBACK_AP_SSID},
};

/// Cue light controller
#[derive(Debug, Clone, Parser)]
#[command(name = "cuelight-server", version, about)]
pub struct Args {
    /// Address to serve HTTP and WebSocket on
    #[arg(long, default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,

    /// Database file for labels and credentials
    #[arg(long, default_value = "cuelight.redb")]
    pub db_path: PathBuf,

    /// Number of cue channels
    #[arg(long, default_value_t = CHANNEL_COUNT)]
    pub channels: usize,

    /// Button debounce window (ms)
    #[arg(long, default_value_t = 50)]
    pub debounce_ms: u64,

    /// Auto-release window (ms); 0 disables auto-release
    #[arg(long, default_value_t = 1500)]
    pub auto_release_ms: u64,

    /// Button poll interval (ms)
    #[arg(long, default_value_t = 10)]
    pub poll_interval_ms: u64,

    /// Station connect timeout (ms)
    #[arg(long, default_value_t = 10_000)]
    pub connect_timeout_ms: u64,

    /// Fallback access point name
    #[arg(long, default_value = FALLBACK_AP_SSID)]
    pub ap_ssid: String,

    /// Fallback access point passphrase
    #[arg(long, default_value = FALLBACK_AP_PASSPHRASE)]
    pub ap_passphrase: String,

    /// Pretend saved networks never answer, to exercise the fallback
    #[arg(long)]
    pub station_unreachable: bool,
}

impl Args {
    /// Engine settings.
    pub fn cue_config(&self) -> CueConfig {
        CueConfig {
            channel_count: self.channels,
            debounce_window: Duration::from_millis(self.debounce_ms),
            auto_release_window: Duration::from_millis(self.auto_release_ms),
            ..CueConfig::default()
        }
    }

    /// Bootstrap settings.
    pub fn bootstrap_config(&self) -> BootstrapConfig {
        BootstrapConfig {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            ap_ssid: self.ap_ssid.clone(),
            ap_passphrase: self.ap_passphrase.clone(),
            ..BootstrapConfig::default()
        }
    }

    /// Interval between button polls.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_core() {
        let args = Args::parse_from(["cuelight-server"]);
        assert_eq!(args.cue_config(), CueConfig::default());
        assert_eq!(args.bootstrap_config(), BootstrapConfig::default());
        assert_eq!(args.poll_interval(), Duration::from_millis(10));
    }

    #[test]
    fn flags_override() {
        let args = Args::parse_from([
            "cuelight-server",
            "--channels",
            "5",
            "--auto-release-ms",
            "0",
            "--connect-timeout-ms",
            "2500",
            "--ap-ssid",
            "Booth",
        ]);
        let cue = args.cue_config();
        assert_eq!(cue.channel_count, 5);
        assert!(cue.auto_release_window.is_zero());
        assert_eq!(cue.default_text(4), "Cue 5");

        let bootstrap = args.bootstrap_config();
        assert_eq!(bootstrap.connect_timeout, Duration::from_millis(2500));
        assert_eq!(bootstrap.ap_ssid, "Booth");
    }
}
