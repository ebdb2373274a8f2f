//! Network bootstrap state machine.
//!
//! Runs once at startup, before the protocol surface is served.
//!
//! # State Machine
//!
//! ```text
//! ┌──────┐ credentials ┌────────────┐  link up   ┌───────────┐
//! │ Idle │────────────>│ TryStation │───────────>│ Connected │
//! └──────┘             └────────────┘            └───────────┘
//!    │ none                  │ timeout / join error
//!    ↓                       ↓
//! ┌──────────────────────────────┐   started   ┌─────────┐
//! │         HostFallback         │────────────>│ Hosting │
//! └──────────────────────────────┘             └─────────┘
//!                │ failed
//!                ↓
//!           ┌─────────┐
//!           │ Offline │
//!           └─────────┘
//! ```
//!
//! `Connected`, `Hosting` and `Offline` are terminal. The station attempt is
//! bounded by [`BootstrapConfig::connect_timeout`]; link status is checked
//! immediately after joining and then every
//! [`BootstrapConfig::status_poll_interval`], so the fallback begins at the
//! first check at or past the deadline.

mod driver;

use std::{
    net::Ipv4Addr,
    time::{Duration, Instant},
};

use cuelight_proto::{WifiMode, WifiStatus};
pub use driver::run;
use tracing::{info, warn};

use crate::{
    config::BootstrapConfig,
    credentials::WifiCredentials,
    error::{BootstrapError, RadioError},
    hal::{LinkStatus, StationOptions},
};

/// Bootstrap state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapState {
    /// Not started
    Idle,
    /// Joining a saved network
    TryStation {
        /// Network being joined
        ssid: String,
        /// When the join began
        started_at: Instant,
    },
    /// Starting the fallback access point
    HostFallback,
    /// Joined the saved network
    Connected {
        /// Assigned address
        ip: Ipv4Addr,
    },
    /// Hosting the fallback access point
    Hosting {
        /// Access point address
        ip: Ipv4Addr,
    },
    /// Access point failed to start; no network
    Offline,
}

impl BootstrapState {
    fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::TryStation { .. } => "TryStation",
            Self::HostFallback => "HostFallback",
            Self::Connected { .. } => "Connected",
            Self::Hosting { .. } => "Hosting",
            Self::Offline => "Offline",
        }
    }

    /// Whether bootstrap has finished.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Connected { .. } | Self::Hosting { .. } | Self::Offline)
    }
}

/// Actions for the driver to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapAction {
    /// Configure station mode and start joining
    JoinStation {
        /// Network to join
        credentials: WifiCredentials,
        /// Station settings
        options: StationOptions,
    },

    /// Wait, then report link status
    CheckLink {
        /// Delay before checking
        after: Duration,
    },

    /// Start the fallback access point
    HostAccessPoint {
        /// Network name
        ssid: String,
        /// Passphrase
        passphrase: String,
        /// Hostname
        hostname: String,
    },

    /// Bootstrap finished
    Done(NetworkInfo),
}

/// Network outcome handed to the protocol layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkInfo {
    /// Radio mode
    pub mode: WifiMode,
    /// Reachable address (unspecified when offline)
    pub ip: Ipv4Addr,
}

impl NetworkInfo {
    /// No network.
    pub const OFFLINE: Self = Self { mode: WifiMode::Off, ip: Ipv4Addr::UNSPECIFIED };

    /// Status as reported in the `init` message.
    pub fn status(&self) -> WifiStatus {
        WifiStatus { mode: self.mode, ip: self.ip.to_string() }
    }
}

/// Bootstrap state machine.
///
/// Pure: time is passed in, radio work is returned as actions.
#[derive(Debug, Clone)]
pub struct Bootstrap {
    config: BootstrapConfig,
    state: BootstrapState,
}

impl Bootstrap {
    /// Create in [`BootstrapState::Idle`].
    pub fn new(config: BootstrapConfig) -> Self {
        Self { config, state: BootstrapState::Idle }
    }

    /// Current state.
    pub fn state(&self) -> &BootstrapState {
        &self.state
    }

    /// Final network outcome, once terminal.
    pub fn network(&self) -> Option<NetworkInfo> {
        match self.state {
            BootstrapState::Connected { ip } => Some(NetworkInfo { mode: WifiMode::Station, ip }),
            BootstrapState::Hosting { ip } => Some(NetworkInfo { mode: WifiMode::AccessPoint, ip }),
            BootstrapState::Offline => Some(NetworkInfo::OFFLINE),
            _ => None,
        }
    }

    fn invalid(&self, operation: &'static str) -> BootstrapError {
        BootstrapError::InvalidState { state: self.state.name(), operation }
    }

    /// Begin with whatever credentials were loaded at boot.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless in `Idle`.
    pub fn start(
        &mut self,
        credentials: Option<WifiCredentials>,
        now: Instant,
    ) -> Result<Vec<BootstrapAction>, BootstrapError> {
        if self.state != BootstrapState::Idle {
            return Err(self.invalid("start"));
        }

        let Some(credentials) = credentials else {
            info!("no saved credentials");
            return Ok(self.fall_back());
        };

        info!(ssid = %credentials.ssid, "connecting to saved network");
        self.state = BootstrapState::TryStation { ssid: credentials.ssid.clone(), started_at: now };
        let options = StationOptions {
            hostname: self.config.station_hostname.clone(),
            power_save: false,
            auto_reconnect: true,
        };
        Ok(vec![
            BootstrapAction::JoinStation { credentials, options },
            BootstrapAction::CheckLink { after: Duration::ZERO },
        ])
    }

    /// The radio refused to enter station mode.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless in `TryStation`.
    pub fn on_join_failed(
        &mut self,
        error: &RadioError,
    ) -> Result<Vec<BootstrapAction>, BootstrapError> {
        if !matches!(self.state, BootstrapState::TryStation { .. }) {
            return Err(self.invalid("on_join_failed"));
        }
        warn!(%error, "station join failed");
        Ok(self.fall_back())
    }

    /// Feed a link status reading.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless in `TryStation`.
    pub fn on_link_status(
        &mut self,
        status: LinkStatus,
        now: Instant,
    ) -> Result<Vec<BootstrapAction>, BootstrapError> {
        let BootstrapState::TryStation { started_at, .. } = self.state else {
            return Err(self.invalid("on_link_status"));
        };

        if let LinkStatus::Connected(ip) = status {
            info!(%ip, "connected");
            self.state = BootstrapState::Connected { ip };
            return Ok(vec![BootstrapAction::Done(NetworkInfo { mode: WifiMode::Station, ip })]);
        }

        let elapsed = now.saturating_duration_since(started_at);
        if elapsed >= self.config.connect_timeout {
            warn!(?elapsed, "connection timeout");
            return Ok(self.fall_back());
        }

        Ok(vec![BootstrapAction::CheckLink { after: self.config.status_poll_interval }])
    }

    /// Report the outcome of starting the access point.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless in `HostFallback`.
    pub fn on_access_point(
        &mut self,
        result: Result<Ipv4Addr, RadioError>,
    ) -> Result<Vec<BootstrapAction>, BootstrapError> {
        if self.state != BootstrapState::HostFallback {
            return Err(self.invalid("on_access_point"));
        }

        let network = match result {
            Ok(ip) => {
                info!(ssid = %self.config.ap_ssid, %ip, "access point active");
                self.state = BootstrapState::Hosting { ip };
                NetworkInfo { mode: WifiMode::AccessPoint, ip }
            },
            Err(error) => {
                warn!(%error, "failed to start access point, continuing without network");
                self.state = BootstrapState::Offline;
                NetworkInfo::OFFLINE
            },
        };
        Ok(vec![BootstrapAction::Done(network)])
    }

    fn fall_back(&mut self) -> Vec<BootstrapAction> {
        self.state = BootstrapState::HostFallback;
        vec![BootstrapAction::HostAccessPoint {
            ssid: self.config.ap_ssid.clone(),
            passphrase: self.config.ap_passphrase.clone(),
            hostname: self.config.ap_hostname.clone(),
        }]
    }
}
