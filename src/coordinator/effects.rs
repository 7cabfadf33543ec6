//! Side effects produced by coordinator state transitions
//!
//! Handlers mutate queue and membership state under a lock and describe
//! what should happen on the wire as a sequence of effects. Order is
//! significant: a broadcast placed before a `JoinRoom` deliberately
//! excludes the joining connection.

use crate::protocol::ServerMessage;
use crate::types::{ConnectionId, RoomId};

/// A single transport operation to perform
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Add a connection to a room
    JoinRoom {
        connection: ConnectionId,
        room: RoomId,
    },
    /// Remove a connection from a room
    LeaveRoom {
        connection: ConnectionId,
        room: RoomId,
    },
    /// Deliver a message to one connection
    SendTo {
        connection: ConnectionId,
        message: ServerMessage,
    },
    /// Broadcast a message to a room
    SendToRoom { room: RoomId, message: ServerMessage },
    /// Broadcast to a room, excluding one occupant
    SendToRoomExcept {
        room: RoomId,
        except: ConnectionId,
        message: ServerMessage,
    },
}
