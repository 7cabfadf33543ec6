//! Common types used throughout the relay service

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a live client connection
///
/// Assigned by the transport when the connection is accepted and valid
/// for the lifetime of that connection only.
pub type ConnectionId = Uuid;

/// Identifier of a broadcast room
///
/// Every connection implicitly owns a room named after its own
/// `ConnectionId` (its self-room). A pairing shares one partner's
/// self-room as the rendezvous point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(Uuid);

impl RoomId {
    /// The self-room a connection owns by virtue of existing
    pub fn self_room(connection: ConnectionId) -> Self {
        RoomId(connection)
    }

    /// Whether this room is the given connection's own self-room
    pub fn is_self_room_of(&self, connection: ConnectionId) -> bool {
        self.0 == connection
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Category a client declares when requesting a match
///
/// The set is closed: labels outside it are not representable and the
/// corresponding join events are silently dropped at the parse boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Hiring,
    LookingForJob,
    ProjectTeammate,
}

impl Intent {
    /// All known intent categories, in a stable order
    pub const ALL: [Intent; 3] = [
        Intent::Hiring,
        Intent::LookingForJob,
        Intent::ProjectTeammate,
    ];

    /// Parse a wire label into an intent; `None` for unrecognized labels
    pub fn parse(label: &str) -> Option<Intent> {
        match label {
            "hiring" => Some(Intent::Hiring),
            "looking_for_job" => Some(Intent::LookingForJob),
            "project_teammate" => Some(Intent::ProjectTeammate),
            _ => None,
        }
    }

    /// The wire label for this intent
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Hiring => "hiring",
            Intent::LookingForJob => "looking_for_job",
            Intent::ProjectTeammate => "project_teammate",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
