//! Inbound commands.
//!
//! Commands arrive as `{"type": ..., "cue": N, "text": S}`. Only `type` is
//! required by the decoder; whether `cue` is present and in range is decided
//! by the controller, which knows the channel count.

use serde::{Deserialize, Deserializer};

use crate::errors::{ProtocolError, Result};

/// Largest inbound payload accepted, in bytes.
pub const MAX_MESSAGE_SIZE: usize = 512;

/// Command sent by an observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Light a cue, optionally relabelling it first.
    Trigger {
        /// Raw cue index as sent on the wire.
        cue: Option<i64>,
        /// New label to apply before triggering.
        text: Option<String>,
    },

    /// Turn a cue off.
    Release {
        /// Raw cue index as sent on the wire.
        cue: Option<i64>,
    },

    /// Relabel a cue. A missing or empty text restores the default label.
    Rename {
        /// Raw cue index as sent on the wire.
        cue: Option<i64>,
        /// New label.
        text: Option<String>,
    },

    /// Liveness check.
    Ping,
}

impl Command {
    /// Name echoed in the `action` field of the ack for this command.
    pub fn action(&self) -> &'static str {
        match self {
            Self::Trigger { .. } => "trigger",
            Self::Release { .. } => "release",
            Self::Rename { .. } => "rename",
            Self::Ping => "ping",
        }
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default, deserialize_with = "cue_index")]
    cue: Option<i64>,
    #[serde(default)]
    text: Option<String>,
}

/// Any JSON integer, signed or not.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireIndex {
    Signed(i64),
    Unsigned(u64),
}

/// Indices past `i64::MAX` saturate; they are out of range for every
/// channel count, so the controller still rejects them as invalid.
fn cue_index<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<WireIndex>::deserialize(deserializer)?;
    Ok(raw.map(|index| match index {
        WireIndex::Signed(value) => value,
        WireIndex::Unsigned(value) => i64::try_from(value).unwrap_or(i64::MAX),
    }))
}

/// Decode a command from a raw text payload.
///
/// # Errors
///
/// - [`ProtocolError::PayloadTooLarge`] if `payload` exceeds
///   [`MAX_MESSAGE_SIZE`] (checked before parsing)
/// - [`ProtocolError::Malformed`] if it is not a JSON object of the expected
///   shape
/// - [`ProtocolError::MissingType`] if `type` is absent or null
/// - [`ProtocolError::UnknownType`] for any other `type`
pub fn decode_command(payload: &[u8]) -> Result<Command> {
    if payload.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }

    let envelope: Envelope = serde_json::from_slice(payload)
        .map_err(|e| ProtocolError::Malformed(e.to_string()))?;

    let Some(kind) = envelope.kind else {
        return Err(ProtocolError::MissingType);
    };

    match kind.as_str() {
        "trigger" => Ok(Command::Trigger { cue: envelope.cue, text: envelope.text }),
        "release" => Ok(Command::Release { cue: envelope.cue }),
        "rename" => Ok(Command::Rename { cue: envelope.cue, text: envelope.text }),
        "ping" => Ok(Command::Ping),
        _ => Err(ProtocolError::UnknownType(kind)),
    }
}
