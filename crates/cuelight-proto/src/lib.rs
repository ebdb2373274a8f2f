//! Wire format for the cue light synchronization protocol.
//!
//! Every message is a JSON object with a `type` tag. Observers send
//! [`Command`]s (`trigger`, `release`, `rename`, `ping`) and receive
//! [`ServerMessage`]s (`cue`, `snapshot`, `init`, `ack`).
//!
//! Inbound payloads are decoded exactly once at the boundary into a closed
//! [`Command`] enum. Anything that does not decode (oversized payload, bad
//! JSON, missing or unknown `type`, unsupported frame) becomes a
//! [`ProtocolError`] whose [`ProtocolError::detail`] is reported back to the
//! sender.
//!
//! # Security
//!
//! Payloads larger than [`MAX_MESSAGE_SIZE`] are rejected before the JSON
//! parser sees them.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod command;
pub mod errors;
pub mod frame;
pub mod message;

pub use command::{Command, MAX_MESSAGE_SIZE, decode_command};
pub use errors::{ProtocolError, Result};
pub use frame::{FrameKind, InboundFrame, decode_frame};
pub use message::{
    Ack, CueEvent, CueList, CueSummary, ServerMessage, WifiMode, WifiStatus,
    decode_server_message,
};
