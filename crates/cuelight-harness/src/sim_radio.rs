//! Simulated radio.

use std::{
    net::Ipv4Addr,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use cuelight_core::{
    Environment, LinkStatus, Radio, WifiCredentials, error::RadioError, hal::StationOptions,
};

use crate::SimEnv;

/// Address the simulated access point hands out for itself.
pub const AP_ADDRESS: Ipv4Addr = Ipv4Addr::new(192, 168, 4, 1);

/// What the airwaves look like to the radio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimNetwork {
    /// `ssid` accepts us and gives out `ip` once `delay` has passed after
    /// the join
    Reachable {
        /// Network name that works
        ssid: String,
        /// Address assigned
        ip: Ipv4Addr,
        /// Association time
        delay: Duration,
    },
    /// Nothing answers
    Unreachable,
}

/// Radio driven by the simulated clock.
#[derive(Debug, Clone)]
pub struct SimRadio {
    env: SimEnv,
    network: SimNetwork,
    access_point_fails: bool,
    joined: Option<(String, Instant)>,
    joins: Vec<(String, StationOptions)>,
    status_checks: usize,
    access_point: Option<String>,
}

impl SimRadio {
    /// Radio in a world described by `network`.
    pub fn new(env: SimEnv, network: SimNetwork) -> Self {
        Self {
            env,
            network,
            access_point_fails: false,
            joined: None,
            joins: Vec::new(),
            status_checks: 0,
            access_point: None,
        }
    }

    /// Make the access point refuse to start.
    pub fn with_failing_access_point(mut self) -> Self {
        self.access_point_fails = true;
        self
    }

    /// Station join attempts so far.
    pub fn joins(&self) -> &[(String, StationOptions)] {
        &self.joins
    }

    /// Link status reads so far.
    pub fn status_checks(&self) -> usize {
        self.status_checks
    }

    /// SSID of the hosted access point, if one is up.
    pub fn access_point(&self) -> Option<&str> {
        self.access_point.as_deref()
    }
}

#[async_trait]
impl Radio for SimRadio {
    async fn join(
        &mut self,
        credentials: &WifiCredentials,
        options: &StationOptions,
    ) -> Result<(), RadioError> {
        self.joins.push((credentials.ssid.clone(), options.clone()));
        self.joined = Some((credentials.ssid.clone(), self.env.now()));
        Ok(())
    }

    async fn link_status(&mut self) -> LinkStatus {
        self.status_checks += 1;
        let Some((joined_ssid, joined_at)) = &self.joined else {
            return LinkStatus::Disconnected;
        };
        match &self.network {
            SimNetwork::Reachable { ssid, ip, delay } if ssid == joined_ssid => {
                if self.env.now().saturating_duration_since(*joined_at) >= *delay {
                    LinkStatus::Connected(*ip)
                } else {
                    LinkStatus::Connecting
                }
            },
            _ => LinkStatus::Connecting,
        }
    }

    async fn host_access_point(
        &mut self,
        ssid: &str,
        _passphrase: &str,
        _hostname: &str,
    ) -> Result<Ipv4Addr, RadioError> {
        self.joined = None;
        if self.access_point_fails {
            return Err(RadioError::AccessPoint("simulated failure".to_string()));
        }
        self.access_point = Some(ssid.to_string());
        Ok(AP_ADDRESS)
    }
}
