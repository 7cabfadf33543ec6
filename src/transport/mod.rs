//! Group-addressing transport abstraction
//!
//! The coordinator never talks to sockets directly; it emits effects
//! against this trait. Rooms are named groups: joining, leaving, and
//! broadcasting are the only primitives the matchmaking logic needs,
//! which keeps it runnable against an in-memory double in tests.

pub mod ws;

use crate::error::Result;
use crate::protocol::ServerMessage;
use crate::types::{ConnectionId, RoomId};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

// Re-export commonly used types
pub use ws::WsTransport;

/// Bidirectional messaging transport with group addressing
///
/// All delivery is fire-and-forget: sending to a vanished connection or
/// an empty room is a successful no-op, never an error surfaced to the
/// caller.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Add a connection to a room
    async fn join_room(&self, connection: ConnectionId, room: RoomId) -> Result<()>;

    /// Remove a connection from a room
    async fn leave_room(&self, connection: ConnectionId, room: RoomId) -> Result<()>;

    /// Send a message to a single connection
    async fn send_to(&self, connection: ConnectionId, message: ServerMessage) -> Result<()>;

    /// Broadcast a message to every occupant of a room
    async fn send_to_room(&self, room: RoomId, message: ServerMessage) -> Result<()>;

    /// Broadcast to a room, excluding one occupant
    async fn send_to_room_except(
        &self,
        room: RoomId,
        except: ConnectionId,
        message: ServerMessage,
    ) -> Result<()>;

    /// The rooms a connection currently belongs to (self-room included)
    async fn rooms_of(&self, connection: ConnectionId) -> HashSet<RoomId>;
}

/// A single operation observed by the recording transport
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedOp {
    JoinRoom {
        connection: ConnectionId,
        room: RoomId,
    },
    LeaveRoom {
        connection: ConnectionId,
        room: RoomId,
    },
    SendTo {
        connection: ConnectionId,
        message: ServerMessage,
    },
    SendToRoom {
        room: RoomId,
        message: ServerMessage,
    },
}

/// In-memory transport double for tests
///
/// Tracks room membership like a real fanout layer and records every
/// operation, including the per-connection deliveries that room
/// broadcasts expand to.
#[derive(Default)]
pub struct RecordingTransport {
    state: Mutex<RecordingState>,
}

#[derive(Default)]
struct RecordingState {
    rooms: HashMap<RoomId, HashSet<ConnectionId>>,
    ops: Vec<RecordedOp>,
    deliveries: Vec<(ConnectionId, ServerMessage)>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a connection's self-room, as the production transport does
    /// when a socket is accepted
    pub fn register(&self, connection: ConnectionId) {
        if let Ok(mut state) = self.state.lock() {
            state
                .rooms
                .entry(RoomId::self_room(connection))
                .or_default()
                .insert(connection);
        }
    }

    /// All recorded operations, in order
    pub fn ops(&self) -> Vec<RecordedOp> {
        self.state.lock().map(|s| s.ops.clone()).unwrap_or_default()
    }

    /// Messages delivered to a specific connection, in order
    pub fn messages_to(&self, connection: ConnectionId) -> Vec<ServerMessage> {
        self.state
            .lock()
            .map(|s| {
                s.deliveries
                    .iter()
                    .filter(|(to, _)| *to == connection)
                    .map(|(_, msg)| msg.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Current occupants of a room
    pub fn occupants(&self, room: RoomId) -> HashSet<ConnectionId> {
        self.state
            .lock()
            .map(|s| s.rooms.get(&room).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Forget recorded operations and deliveries (membership is kept)
    pub fn clear(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.ops.clear();
            state.deliveries.clear();
        }
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn join_room(&self, connection: ConnectionId, room: RoomId) -> Result<()> {
        if let Ok(mut state) = self.state.lock() {
            state.rooms.entry(room).or_default().insert(connection);
            state.ops.push(RecordedOp::JoinRoom { connection, room });
        }
        Ok(())
    }

    async fn leave_room(&self, connection: ConnectionId, room: RoomId) -> Result<()> {
        if let Ok(mut state) = self.state.lock() {
            if let Some(occupants) = state.rooms.get_mut(&room) {
                occupants.remove(&connection);
                if occupants.is_empty() {
                    state.rooms.remove(&room);
                }
            }
            state.ops.push(RecordedOp::LeaveRoom { connection, room });
        }
        Ok(())
    }

    async fn send_to(&self, connection: ConnectionId, message: ServerMessage) -> Result<()> {
        if let Ok(mut state) = self.state.lock() {
            state.deliveries.push((connection, message.clone()));
            state.ops.push(RecordedOp::SendTo {
                connection,
                message,
            });
        }
        Ok(())
    }

    async fn send_to_room(&self, room: RoomId, message: ServerMessage) -> Result<()> {
        if let Ok(mut state) = self.state.lock() {
            let occupants: Vec<ConnectionId> =
                state.rooms.get(&room).into_iter().flatten().copied().collect();
            for occupant in occupants {
                state.deliveries.push((occupant, message.clone()));
            }
            state.ops.push(RecordedOp::SendToRoom { room, message });
        }
        Ok(())
    }

    async fn send_to_room_except(
        &self,
        room: RoomId,
        except: ConnectionId,
        message: ServerMessage,
    ) -> Result<()> {
        if let Ok(mut state) = self.state.lock() {
            let occupants: Vec<ConnectionId> = state
                .rooms
                .get(&room)
                .into_iter()
                .flatten()
                .copied()
                .filter(|occupant| *occupant != except)
                .collect();
            for occupant in occupants {
                state.deliveries.push((occupant, message.clone()));
            }
            state.ops.push(RecordedOp::SendToRoom { room, message });
        }
        Ok(())
    }

    async fn rooms_of(&self, connection: ConnectionId) -> HashSet<RoomId> {
        self.state
            .lock()
            .map(|s| {
                s.rooms
                    .iter()
                    .filter(|(_, occupants)| occupants.contains(&connection))
                    .map(|(room, _)| *room)
                    .collect()
            })
            .unwrap_or_default()
    }
}
