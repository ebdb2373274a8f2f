//! Deterministic simulation harness for the cue light controller.
//!
//! Virtual-clock [`SimEnv`], scripted board/display/radio peripherals, and
//! a [`Rig`] that wires a real [`cuelight_core::Controller`] to them so
//! scenarios run with exact, reproducible timing.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod rig;
pub mod sim_board;
pub mod sim_env;
pub mod sim_radio;

pub use rig::Rig;
pub use sim_board::{SimBoard, SimDisplay, bounce_burst};
pub use sim_env::SimEnv;
pub use sim_radio::{AP_ADDRESS, SimNetwork, SimRadio};
