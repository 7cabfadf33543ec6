//! Wire protocol for the relay
//!
//! Events travel as JSON text frames of the form
//! `{"event": "<name>", "data": {...}}`. The outbound shapes are part of
//! the client contract and must stay stable: `match_found` carries
//! `{"peerId": "<uuid>"}` and `left` carries an empty object.

use crate::types::ConnectionId;
use serde::{Deserialize, Serialize};

/// Events a client may send to the relay
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Request to be matched under a given intent category
    ///
    /// The label is kept raw here; the coordinator decides whether it
    /// names a known intent. A missing field behaves like an unknown
    /// label.
    JoinQueue {
        #[serde(default)]
        intent: Option<String>,
    },
    /// Abandon the current pairing (and any queue position)
    Skip,
}

/// Events the relay sends to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// A pairing was established; the payload names the other side
    MatchFound {
        #[serde(rename = "peerId")]
        peer_id: ConnectionId,
    },
    /// A room occupant skipped or disconnected
    Left {},
}

/// Decode a client text frame
///
/// Returns `None` for malformed JSON and unknown event names; the relay
/// drops those silently, so there is no error to report.
pub fn decode_client_message(text: &str) -> Option<ClientMessage> {
    serde_json::from_str(text).ok()
}

/// Encode a server message into a text frame
pub fn encode_server_message(message: &ServerMessage) -> crate::error::Result<String> {
    serde_json::to_string(message)
        .map_err(|e| anyhow::anyhow!("Failed to serialize server message: {}", e))
}
