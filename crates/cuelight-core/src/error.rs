//! Error types for peripherals and persistence.

use thiserror::Error;

/// Persistence adapter failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Store could not be opened; reads behave as empty
    #[error("store unavailable")]
    Unavailable,

    /// Backend reported an error
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Display sink failures. Always non-fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisplayError {
    /// Display for this channel never initialised
    #[error("display {0} not ready")]
    NotReady(usize),

    /// Bus or driver error while drawing
    #[error("display write failed: {0}")]
    Write(String),
}

/// Radio failures during bootstrap.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RadioError {
    /// Station mode could not be configured
    #[error("station setup failed: {0}")]
    Station(String),

    /// Access point did not start
    #[error("access point failed to start: {0}")]
    AccessPoint(String),
}

/// Credential save failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialsError {
    /// SSID was empty
    #[error("ssid cannot be empty")]
    EmptySsid,

    /// Write-through to the store failed
    #[error("unable to persist credentials: {0}")]
    Store(#[from] StoreError),
}

/// Bootstrap driven out of order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BootstrapError {
    /// Event does not apply in the current state
    #[error("invalid bootstrap state for {operation}: {state}")]
    InvalidState {
        /// State name at the time of the call
        state: &'static str,
        /// Operation attempted
        operation: &'static str,
    },
}
