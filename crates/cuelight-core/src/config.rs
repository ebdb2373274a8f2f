//! Build-time defaults.
//!
//! These are enumerated once at startup into [`CueConfig`] and
//! [`BootstrapConfig`]. The host binary lets each one be overridden from the
//! command line; nothing re-reads them afterwards.

use std::time::Duration;

/// Number of physical cue channels.
pub const CHANNEL_COUNT: usize = 3;

/// Minimum time a button level must be stable before it is committed.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(50);

/// Active cues are released automatically after this long. Zero disables.
pub const AUTO_RELEASE_WINDOW: Duration = Duration::from_millis(1500);

/// Period of the button/auto-release polling loop.
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Upper bound on a station connection attempt.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// How often station link status is checked while connecting.
pub const STATUS_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Fallback access point network name.
pub const FALLBACK_AP_SSID: &str = "CueLight_AP";

/// Fallback access point passphrase.
pub const FALLBACK_AP_PASSPHRASE: &str = "12345678";

/// Hostname announced when joined to a network.
pub const STATION_HOSTNAME: &str = "StageCue";

/// Hostname announced while hosting the access point.
pub const AP_HOSTNAME: &str = "StageCue-AP";

/// Labels shown on channels that were never renamed.
pub const DEFAULT_CUE_TEXTS: [&str; CHANNEL_COUNT] = ["Cue 1", "Cue 2", "Cue 3"];

/// Cue engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueConfig {
    /// Number of channels
    pub channel_count: usize,
    /// Debounce window
    pub debounce_window: Duration,
    /// Auto-release window (zero disables auto-release)
    pub auto_release_window: Duration,
    /// Default labels by index; channels past the end get `Cue <n>`
    pub default_texts: Vec<String>,
}

impl CueConfig {
    /// Built-in label for `index`.
    pub fn default_text(&self, index: usize) -> String {
        self.default_texts
            .get(index)
            .filter(|text| !text.is_empty())
            .cloned()
            .unwrap_or_else(|| format!("Cue {}", index + 1))
    }
}

impl Default for CueConfig {
    fn default() -> Self {
        Self {
            channel_count: CHANNEL_COUNT,
            debounce_window: DEBOUNCE_WINDOW,
            auto_release_window: AUTO_RELEASE_WINDOW,
            default_texts: DEFAULT_CUE_TEXTS.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Network bootstrap configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapConfig {
    /// Upper bound on the station connection attempt
    pub connect_timeout: Duration,
    /// Link status poll interval while connecting
    pub status_poll_interval: Duration,
    /// Fallback access point network name
    pub ap_ssid: String,
    /// Fallback access point passphrase
    pub ap_passphrase: String,
    /// Station hostname
    pub station_hostname: String,
    /// Access point hostname
    pub ap_hostname: String,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            connect_timeout: CONNECT_TIMEOUT,
            status_poll_interval: STATUS_POLL_INTERVAL,
            ap_ssid: FALLBACK_AP_SSID.to_string(),
            ap_passphrase: FALLBACK_AP_PASSPHRASE.to_string(),
            station_hostname: STATION_HOSTNAME.to_string(),
            ap_hostname: AP_HOSTNAME.to_string(),
        }
    }
}
