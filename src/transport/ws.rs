//! WebSocket fanout transport
//!
//! Each accepted socket gets an unbounded outbound channel; the
//! per-connection driver in the service layer forwards it to the
//! actual sink. Room membership lives here as a plain occupants map,
//! so broadcasts are channel sends under a short lock. Delivery to a
//! connection whose receiver is gone is a logged no-op: by the time a
//! notification is on its way the peer may already have disconnected,
//! and that is the transport's problem, not the coordinator's.

use crate::error::{RelayError, Result};
use crate::protocol::ServerMessage;
use crate::types::{ConnectionId, RoomId};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use tokio::sync::mpsc;
use tracing::debug;

use super::Transport;

/// Sender half of a connection's outbound message channel
pub type OutboundSender = mpsc::UnboundedSender<ServerMessage>;

#[derive(Default)]
struct WsTransportInner {
    senders: HashMap<ConnectionId, OutboundSender>,
    rooms: HashMap<RoomId, HashSet<ConnectionId>>,
}

impl WsTransportInner {
    fn deliver(&self, connection: ConnectionId, message: &ServerMessage) {
        match self.senders.get(&connection) {
            Some(sender) => {
                if sender.send(message.clone()).is_err() {
                    debug!("Dropping message for {}: receiver gone", connection);
                }
            }
            None => {
                debug!("Dropping message for {}: not registered", connection);
            }
        }
    }
}

/// Production transport backed by per-connection channels
#[derive(Default)]
pub struct WsTransport {
    inner: RwLock<WsTransportInner>,
}

impl WsTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly accepted connection and seed its self-room
    pub fn register(&self, connection: ConnectionId, sender: OutboundSender) -> Result<()> {
        let mut inner = self.inner.write().map_err(|_| RelayError::Transport {
            message: "Failed to acquire transport lock".to_string(),
        })?;

        inner.senders.insert(connection, sender);
        inner
            .rooms
            .entry(RoomId::self_room(connection))
            .or_default()
            .insert(connection);
        Ok(())
    }

    /// Drop a closed connection and purge it from every room
    pub fn unregister(&self, connection: ConnectionId) -> Result<()> {
        let mut inner = self.inner.write().map_err(|_| RelayError::Transport {
            message: "Failed to acquire transport lock".to_string(),
        })?;

        inner.senders.remove(&connection);
        inner.rooms.retain(|_, occupants| {
            occupants.remove(&connection);
            !occupants.is_empty()
        });
        Ok(())
    }

    /// Number of currently registered connections
    pub fn connection_count(&self) -> usize {
        self.inner.read().map(|inner| inner.senders.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn join_room(&self, connection: ConnectionId, room: RoomId) -> Result<()> {
        let mut inner = self.inner.write().map_err(|_| RelayError::Transport {
            message: "Failed to acquire transport lock".to_string(),
        })?;

        inner.rooms.entry(room).or_default().insert(connection);
        Ok(())
    }

    async fn leave_room(&self, connection: ConnectionId, room: RoomId) -> Result<()> {
        let mut inner = self.inner.write().map_err(|_| RelayError::Transport {
            message: "Failed to acquire transport lock".to_string(),
        })?;

        if let Some(occupants) = inner.rooms.get_mut(&room) {
            occupants.remove(&connection);
            if occupants.is_empty() {
                inner.rooms.remove(&room);
            }
        }
        Ok(())
    }

    async fn send_to(&self, connection: ConnectionId, message: ServerMessage) -> Result<()> {
        let inner = self.inner.read().map_err(|_| RelayError::Transport {
            message: "Failed to acquire transport lock".to_string(),
        })?;

        inner.deliver(connection, &message);
        Ok(())
    }

    async fn send_to_room(&self, room: RoomId, message: ServerMessage) -> Result<()> {
        let inner = self.inner.read().map_err(|_| RelayError::Transport {
            message: "Failed to acquire transport lock".to_string(),
        })?;

        if let Some(occupants) = inner.rooms.get(&room) {
            for occupant in occupants {
                inner.deliver(*occupant, &message);
            }
        }
        Ok(())
    }

    async fn send_to_room_except(
        &self,
        room: RoomId,
        except: ConnectionId,
        message: ServerMessage,
    ) -> Result<()> {
        let inner = self.inner.read().map_err(|_| RelayError::Transport {
            message: "Failed to acquire transport lock".to_string(),
        })?;

        if let Some(occupants) = inner.rooms.get(&room) {
            for occupant in occupants {
                if *occupant != except {
                    inner.deliver(*occupant, &message);
                }
            }
        }
        Ok(())
    }

    async fn rooms_of(&self, connection: ConnectionId) -> HashSet<RoomId> {
        self.inner
            .read()
            .map(|inner| {
                inner
                    .rooms
                    .iter()
                    .filter(|(_, occupants)| occupants.contains(&connection))
                    .map(|(room, _)| *room)
                    .collect()
            })
            .unwrap_or_default()
    }
}
