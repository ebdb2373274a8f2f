//! Cue light controller core logic
//!
//! Pure state machine logic for the cue light controller, decoupled from
//! GPIO, displays, radios and sockets.
//!
//! # Architecture
//!
//! Every state machine here takes the current time as a parameter and
//! returns declarative actions instead of touching hardware. A runtime (the
//! host server, or the simulation harness) interprets those actions: it
//! drives lights, draws labels, writes the store and delivers messages to
//! observers.
//!
//! All mutation of cue state goes through one [`Controller`] owned by one
//! task, so commands from different observers are applied strictly in
//! arrival order.
//!
//! # Components
//!
//! - [`cue`]: Cue State Engine (debounce, trigger/release, auto-release)
//! - [`controller`]: Synchronization protocol mediation (observers, acks,
//!   broadcasts)
//! - [`bootstrap`]: Network bootstrap state machine and its driver
//! - [`hal`]: Board, display and radio seams plus the action executor
//! - [`store`]: Persistence adapter contract and in-memory store
//! - [`credentials`]: Saved Wi-Fi credentials
//! - [`mod@env`]: Environment abstraction (time)
//! - [`config`]: Build-time defaults
//! - [`error`]: Error types

pub mod bootstrap;
pub mod config;
pub mod controller;
pub mod credentials;
pub mod cue;
pub mod env;
pub mod error;
pub mod hal;
pub mod store;

pub use bootstrap::{Bootstrap, BootstrapAction, BootstrapState, NetworkInfo};
pub use config::{BootstrapConfig, CueConfig};
pub use controller::{CommandError, Controller, ControllerAction, ObserverId};
pub use credentials::WifiCredentials;
pub use cue::{CueAction, CueEngine, CueSnapshot};
pub use env::Environment;
pub use hal::{Board, Display, LinkStatus, Peripherals, Radio};
pub use store::{MemoryStore, NullStore, Store};
