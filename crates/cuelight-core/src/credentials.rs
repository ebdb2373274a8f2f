//! Saved Wi-Fi credentials.

use tracing::{info, warn};

use crate::{
    error::{CredentialsError, StoreError},
    store::Store,
};

/// Namespace holding the saved network.
pub const WIFI_NAMESPACE: &str = "wifi";

const SSID_KEY: &str = "ssid";
const PASSWORD_KEY: &str = "pass";

/// Network the controller tries to join at boot.
#[derive(Clone, PartialEq, Eq)]
pub struct WifiCredentials {
    /// Network name, never empty
    pub ssid: String,
    /// Passphrase, may be empty for open networks
    pub password: String,
}

impl std::fmt::Debug for WifiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WifiCredentials").field("ssid", &self.ssid).finish_non_exhaustive()
    }
}

/// Read the saved network.
///
/// Returns `Ok(None)` on first boot, or if a stored SSID is empty.
pub fn load(store: &dyn Store) -> Result<Option<WifiCredentials>, StoreError> {
    let Some(ssid) = store.get(WIFI_NAMESPACE, SSID_KEY)? else {
        return Ok(None);
    };
    if ssid.is_empty() {
        return Ok(None);
    }
    let password = store.get(WIFI_NAMESPACE, PASSWORD_KEY)?.unwrap_or_default();
    Ok(Some(WifiCredentials { ssid, password }))
}

/// Persist a network for the next boot.
///
/// Succeeds only once both values are written through. The SSID is
/// cleared first and written last, so a save that fails part way leaves
/// either the previous network or none, never a new name with an old
/// passphrase.
pub fn save(
    store: &dyn Store,
    ssid: &str,
    password: &str,
) -> Result<WifiCredentials, CredentialsError> {
    if ssid.is_empty() {
        warn!("refusing to save credentials with empty ssid");
        return Err(CredentialsError::EmptySsid);
    }

    store.put(WIFI_NAMESPACE, SSID_KEY, "")?;
    store.put(WIFI_NAMESPACE, PASSWORD_KEY, password)?;
    store.put(WIFI_NAMESPACE, SSID_KEY, ssid)?;
    info!(ssid, "credentials stored");

    Ok(WifiCredentials { ssid: ssid.to_string(), password: password.to_string() })
}
