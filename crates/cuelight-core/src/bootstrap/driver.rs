//! Async driver for the bootstrap state machine.

use std::collections::VecDeque;

use tracing::{info, instrument, warn};

use super::{Bootstrap, BootstrapAction, NetworkInfo};
use crate::{
    config::BootstrapConfig, credentials, env::Environment, error::BootstrapError, hal::Radio,
    store::Store,
};

/// Run bootstrap to completion.
///
/// Loads saved credentials from `store`, tries the station, and falls back
/// to hosting the access point. The only waiting is the bounded link-status
/// polling, so this always returns within the connect timeout plus one poll
/// interval plus the radio's own call latency.
#[instrument(skip_all)]
pub async fn run<E, R>(
    config: BootstrapConfig,
    env: &E,
    radio: &mut R,
    store: &dyn Store,
) -> NetworkInfo
where
    E: Environment,
    R: Radio + ?Sized,
{
    let saved = match credentials::load(store) {
        Ok(saved) => saved,
        Err(error) => {
            warn!(%error, "unable to read saved credentials");
            None
        },
    };

    let mut bootstrap = Bootstrap::new(config);
    let mut pending = match bootstrap.start(saved, env.now()) {
        Ok(actions) => VecDeque::from(actions),
        Err(error) => return abort(&error),
    };

    while let Some(action) = pending.pop_front() {
        let next = match action {
            BootstrapAction::JoinStation { credentials, options } => {
                match radio.join(&credentials, &options).await {
                    Ok(()) => continue,
                    Err(error) => {
                        pending.clear();
                        bootstrap.on_join_failed(&error)
                    },
                }
            },
            BootstrapAction::CheckLink { after } => {
                if !after.is_zero() {
                    env.sleep(after).await;
                }
                let status = radio.link_status().await;
                bootstrap.on_link_status(status, env.now())
            },
            BootstrapAction::HostAccessPoint { ssid, passphrase, hostname } => {
                let result = radio.host_access_point(&ssid, &passphrase, &hostname).await;
                bootstrap.on_access_point(result)
            },
            BootstrapAction::Done(network) => {
                info!(mode = ?network.mode, ip = %network.ip, "bootstrap complete");
                return network;
            },
        };

        match next {
            Ok(actions) => pending.extend(actions),
            Err(error) => return abort(&error),
        }
    }

    NetworkInfo::OFFLINE
}

fn abort(error: &BootstrapError) -> NetworkInfo {
    warn!(%error, "bootstrap aborted");
    NetworkInfo::OFFLINE
}
