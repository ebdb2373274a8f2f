//! Host runtime for the cue light controller.
//!
//! Wires the pure [`cuelight_core`] state machines to real I/O:
//!
//! ```text
//!   HTTP / WebSocket (axum) ──Request──► runtime task ──► Peripherals
//!            ▲                              │   ▲
//!            └────────── outboxes ◄─────────┘   └── poll interval
//! ```
//!
//! A single task owns the [`cuelight_core::Controller`]; everything else
//! talks to it through a [`runtime::Handle`].

#![forbid(unsafe_code)]

pub mod board;
pub mod config;
pub mod env;
pub mod error;
pub mod http;
pub mod radio;
pub mod runtime;
pub mod storage;

pub use config::Args;
pub use env::SystemEnv;
pub use error::ServerError;
pub use http::{AppState, Exit, router};
pub use runtime::{Handle, Runtime};
pub use storage::RedbStore;
