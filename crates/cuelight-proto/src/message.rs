//! Outbound messages.
//!
//! Four message types flow from the controller to observers:
//!
//! | type | when | audience |
//! |---|---|---|
//! | `init` | on connect | new observer |
//! | `cue` | after any state change | all observers |
//! | `snapshot` | on resync request | all observers |
//! | `ack` | after each command | requester only |

use serde::{Deserialize, Serialize};

use crate::errors::{ProtocolError, Result};

/// One cue's state as broadcast after a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CueEvent {
    /// Channel index
    pub index: usize,
    /// Current label
    pub text: String,
    /// Whether the light is on
    pub active: bool,
    /// Milliseconds since controller start at the last on/off transition
    #[serde(rename = "updatedAt")]
    pub updated_at: u64,
}

/// One cue's state without freshness, as sent in `init` and cue listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CueSummary {
    /// Channel index
    pub index: usize,
    /// Current label
    pub text: String,
    /// Whether the light is on
    pub active: bool,
}

impl From<&CueEvent> for CueSummary {
    fn from(event: &CueEvent) -> Self {
        Self { index: event.index, text: event.text.clone(), active: event.active }
    }
}

/// Radio mode reported to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WifiMode {
    /// Joined an existing network
    #[serde(rename = "station")]
    Station,
    /// Hosting the fallback access point
    #[serde(rename = "ap")]
    AccessPoint,
    /// No network
    #[serde(rename = "off")]
    Off,
}

/// Network status included in the `init` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiStatus {
    /// Radio mode
    pub mode: WifiMode,
    /// Address observers can reach the controller on
    pub ip: String,
}

/// Command acknowledgement, addressed only to the requester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    /// Command name, or `parse` when the command could not be decoded
    pub action: String,
    /// Whether the command was applied
    pub ok: bool,
    /// Failure reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Ack {
    /// Successful ack for `action`.
    pub fn ok(action: impl Into<String>) -> Self {
        Self { action: action.into(), ok: true, detail: None }
    }

    /// Failed ack for `action`.
    pub fn error(action: impl Into<String>, detail: impl Into<String>) -> Self {
        Self { action: action.into(), ok: false, detail: Some(detail.into()) }
    }
}

/// Message sent from the controller to observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    /// Single cue changed
    Cue(CueEvent),
    /// Every cue, for resynchronization
    Snapshot {
        /// All channels in index order
        cues: Vec<CueEvent>,
    },
    /// Sent once to each observer on connect
    Init {
        /// All channels in index order
        cues: Vec<CueSummary>,
        /// Network status
        wifi: WifiStatus,
    },
    /// Command acknowledgement
    Ack(Ack),
}

impl ServerMessage {
    /// Serialize to the JSON text sent on the wire.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }
}

/// Decode a message as an observer would.
pub fn decode_server_message(payload: &str) -> Result<ServerMessage> {
    serde_json::from_str(payload).map_err(|e| ProtocolError::Malformed(e.to_string()))
}

/// Response body of the cue listing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CueList {
    /// All channels in index order
    pub cues: Vec<CueSummary>,
    /// Channel count
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;

    fn event() -> CueEvent {
        CueEvent { index: 1, text: "Go".into(), active: true, updated_at: 1234 }
    }

    #[test]
    fn cue_event_wire_format() {
        let json = ServerMessage::Cue(event()).to_json().unwrap();
        assert_snapshot!(json, @r#"{"type":"cue","index":1,"text":"Go","active":true,"updatedAt":1234}"#);
    }

    #[test]
    fn snapshot_wire_format() {
        let json = ServerMessage::Snapshot { cues: vec![event()] }.to_json().unwrap();
        assert_snapshot!(json, @r#"{"type":"snapshot","cues":[{"index":1,"text":"Go","active":true,"updatedAt":1234}]}"#);
    }

    #[test]
    fn init_wire_format() {
        let msg = ServerMessage::Init {
            cues: vec![CueSummary::from(&event())],
            wifi: WifiStatus { mode: WifiMode::AccessPoint, ip: "192.168.4.1".into() },
        };
        assert_snapshot!(msg.to_json().unwrap(), @r#"{"type":"init","cues":[{"index":1,"text":"Go","active":true}],"wifi":{"mode":"ap","ip":"192.168.4.1"}}"#);
    }

    #[test]
    fn ack_omits_empty_detail() {
        let ok = ServerMessage::Ack(Ack::ok("ping")).to_json().unwrap();
        assert_snapshot!(ok, @r#"{"type":"ack","action":"ping","ok":true}"#);

        let err = ServerMessage::Ack(Ack::error("trigger", "invalid cue index")).to_json().unwrap();
        assert_snapshot!(err, @r#"{"type":"ack","action":"trigger","ok":false,"detail":"invalid cue index"}"#);
    }

    #[test]
    fn observer_decodes_cue_event() {
        let msg = ServerMessage::Cue(event());
        let decoded = decode_server_message(&msg.to_json().unwrap()).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn observer_rejects_unknown_message() {
        assert!(decode_server_message(r#"{"type":"bogus"}"#).is_err());
    }
}
