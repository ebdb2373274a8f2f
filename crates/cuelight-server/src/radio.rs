//! Host radio.
//!
//! The host's own network stack is already up, so "joining" a station just
//! reports the machine's outbound address, and "hosting" the access point
//! reports the conventional soft-AP address. `--station-unreachable`
//! makes every join time out.

use std::net::{Ipv4Addr, UdpSocket};

use async_trait::async_trait;
use cuelight_core::{LinkStatus, Radio, WifiCredentials, error::RadioError, hal::StationOptions};
use tracing::info;

/// Address reported while hosting the fallback access point.
pub const SOFT_AP_ADDRESS: Ipv4Addr = Ipv4Addr::new(192, 168, 4, 1);

/// Radio stand-in over the host network.
#[derive(Debug, Default)]
pub struct HostRadio {
    unreachable: bool,
    joined: bool,
}

impl HostRadio {
    /// `unreachable` makes station joins never complete.
    pub fn new(unreachable: bool) -> Self {
        Self { unreachable, joined: false }
    }
}

#[async_trait]
impl Radio for HostRadio {
    async fn join(
        &mut self,
        credentials: &WifiCredentials,
        options: &StationOptions,
    ) -> Result<(), RadioError> {
        info!(ssid = %credentials.ssid, hostname = %options.hostname, "joining network");
        self.joined = true;
        Ok(())
    }

    async fn link_status(&mut self) -> LinkStatus {
        if !self.joined {
            return LinkStatus::Disconnected;
        }
        if self.unreachable {
            return LinkStatus::Connecting;
        }
        LinkStatus::Connected(local_address().unwrap_or(Ipv4Addr::LOCALHOST))
    }

    async fn host_access_point(
        &mut self,
        ssid: &str,
        _passphrase: &str,
        hostname: &str,
    ) -> Result<Ipv4Addr, RadioError> {
        self.joined = false;
        info!(ssid, hostname, "hosting access point");
        Ok(SOFT_AP_ADDRESS)
    }
}

/// Address of the interface holding the default route. Nothing is sent.
fn local_address() -> Option<Ipv4Addr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    socket.connect((Ipv4Addr::new(192, 0, 2, 1), 9)).ok()?;
    match socket.local_addr().ok()?.ip() {
        std::net::IpAddr::V4(ip) if !ip.is_unspecified() => Some(ip),
        _ => None,
    }
}
