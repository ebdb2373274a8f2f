//! Inbound transport frames.
//!
//! The duplex channel only accepts complete, single-frame text messages.
//! Fragments and binary frames are rejected before payload decoding.

use crate::{
    command::{Command, decode_command},
    errors::{ProtocolError, Result},
};

/// Frame opcode as reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// UTF-8 text frame
    Text,
    /// Binary frame
    Binary,
    /// Continuation of a fragmented message
    Continuation,
}

/// A frame received from an observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundFrame {
    /// Opcode
    pub kind: FrameKind,
    /// Whether this is the final frame of its message
    pub fin: bool,
    /// Raw payload bytes
    pub payload: Vec<u8>,
}

impl InboundFrame {
    /// Complete text frame.
    pub fn text(payload: impl Into<String>) -> Self {
        Self { kind: FrameKind::Text, fin: true, payload: payload.into().into_bytes() }
    }

    /// Complete binary frame.
    pub fn binary(payload: impl Into<Vec<u8>>) -> Self {
        Self { kind: FrameKind::Binary, fin: true, payload: payload.into() }
    }
}

/// Validate the frame shape and decode its command.
///
/// # Errors
///
/// [`ProtocolError::UnsupportedFrame`] for anything but a final text frame,
/// otherwise whatever [`decode_command`] reports.
pub fn decode_frame(frame: &InboundFrame) -> Result<Command> {
    if frame.kind != FrameKind::Text || !frame.fin {
        return Err(ProtocolError::UnsupportedFrame);
    }
    decode_command(&frame.payload)
}
