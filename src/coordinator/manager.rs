//! Match coordinator implementation
//!
//! Owns the intent queue registry and the per-connection pairing state
//! behind a single mutex, so every handler's decision phase is one
//! indivisible critical section: two concurrent joins for the same
//! intent can never both wait when a pairing was available, and cleanup
//! never observes a half-formed pairing. Effects are applied to the
//! transport after the lock is released.

use crate::coordinator::effects::Effect;
use crate::metrics::MetricsCollector;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::queue::IntentQueueRegistry;
use crate::transport::Transport;
use crate::types::{ConnectionId, Intent, RoomId};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Statistics about coordinator operations
#[derive(Debug, Clone, Default, Serialize)]
pub struct CoordinatorStats {
    /// Total connections registered
    pub connections_opened: u64,
    /// Total connections torn down
    pub connections_closed: u64,
    /// Total pairings established
    pub matches_made: u64,
    /// Total skip events processed
    pub skips: u64,
    /// Total join events dropped for an unknown intent
    pub unknown_intents: u64,
    /// Connections currently registered
    pub active_connections: usize,
    /// Connections currently waiting in a queue
    pub waiting_connections: usize,
}

/// Queue and membership state guarded by the coordinator's mutex
struct RelayState {
    registry: IntentQueueRegistry,
    /// Shared pairing rooms per connection. The implicit self-room is
    /// not stored; an entry's presence marks the connection as alive.
    pairings: HashMap<ConnectionId, HashSet<RoomId>>,
    stats: CoordinatorStats,
}

impl RelayState {
    fn new() -> Self {
        Self {
            registry: IntentQueueRegistry::new(),
            pairings: HashMap::new(),
            stats: CoordinatorStats::default(),
        }
    }

    fn connect(&mut self, id: ConnectionId) {
        self.pairings.entry(id).or_default();
        self.stats.connections_opened += 1;
    }

    fn join(&mut self, id: ConnectionId, label: Option<&str>) -> Vec<Effect> {
        let Some(intent) = label.and_then(Intent::parse) else {
            // Unknown or missing intent: dropped event, not an error
            self.stats.unknown_intents += 1;
            return Vec::new();
        };

        if !self.pairings.contains_key(&id) {
            // Stale event for a connection that already went away
            return Vec::new();
        }

        match self.registry.enqueue_or_match(intent, id) {
            Some(partner) => {
                // The waiting partner's self-room is the rendezvous; the
                // waiter's room identity survives later cleanup ordering.
                let room = RoomId::self_room(partner);
                if let Some(shared) = self.pairings.get_mut(&partner) {
                    shared.insert(room);
                }
                if let Some(shared) = self.pairings.get_mut(&id) {
                    shared.insert(room);
                }
                self.stats.matches_made += 1;

                // The room broadcast precedes the join, so only the
                // waiter receives it; the new side is notified directly.
                vec![
                    Effect::SendToRoom {
                        room,
                        message: ServerMessage::MatchFound { peer_id: id },
                    },
                    Effect::JoinRoom {
                        connection: id,
                        room,
                    },
                    Effect::SendTo {
                        connection: id,
                        message: ServerMessage::MatchFound { peer_id: partner },
                    },
                ]
            }
            None => Vec::new(),
        }
    }

    fn skip(&mut self, id: ConnectionId) -> Vec<Effect> {
        self.stats.skips += 1;
        self.release_pairings(id)
    }

    fn disconnect(&mut self, id: ConnectionId) -> Vec<Effect> {
        let effects = self.release_pairings(id);
        if self.pairings.remove(&id).is_some() {
            self.stats.connections_closed += 1;
        }
        effects
    }

    /// Drop `id` from every queue and dissolve every pairing it holds,
    /// notifying the remaining occupants of each shared room.
    ///
    /// Idempotent: a connection with no queue entry and no pairings
    /// produces no effects. The connection's own self-room membership
    /// is never touched.
    fn release_pairings(&mut self, id: ConnectionId) -> Vec<Effect> {
        self.registry.remove(id);

        let rooms: Vec<RoomId> = self
            .pairings
            .get_mut(&id)
            .map(|shared| shared.drain().collect())
            .unwrap_or_default();

        let mut effects = Vec::new();
        for room in rooms {
            effects.push(Effect::SendToRoomExcept {
                room,
                except: id,
                message: ServerMessage::Left {},
            });
            if !room.is_self_room_of(id) {
                effects.push(Effect::LeaveRoom {
                    connection: id,
                    room,
                });
            }

            // The link dies on both sides: the partner falls back to
            // Unpaired and vacates the rendezvous unless it is their
            // own self-room.
            for (other, shared) in self.pairings.iter_mut() {
                if *other != id && shared.remove(&room) && !room.is_self_room_of(*other) {
                    effects.push(Effect::LeaveRoom {
                        connection: *other,
                        room,
                    });
                }
            }
        }
        effects
    }

    fn snapshot_stats(&mut self) -> CoordinatorStats {
        self.stats.active_connections = self.pairings.len();
        self.stats.waiting_connections = self.registry.waiting_count();
        self.stats.clone()
    }

    fn waiting_by_intent(&self) -> [(Intent, usize); 3] {
        [
            (Intent::Hiring, self.registry.waiting_for(Intent::Hiring)),
            (
                Intent::LookingForJob,
                self.registry.waiting_for(Intent::LookingForJob),
            ),
            (
                Intent::ProjectTeammate,
                self.registry.waiting_for(Intent::ProjectTeammate),
            ),
        ]
    }
}

/// The connection lifecycle coordinator
///
/// Handlers are fire-and-forget: they never return an error to the
/// originating event, and transport delivery failures are logged and
/// swallowed.
pub struct MatchCoordinator {
    state: Mutex<RelayState>,
    transport: Arc<dyn Transport>,
    metrics: Arc<MetricsCollector>,
}

impl MatchCoordinator {
    /// Create a coordinator over the given transport
    pub fn new(transport: Arc<dyn Transport>, metrics: Arc<MetricsCollector>) -> Self {
        Self {
            state: Mutex::new(RelayState::new()),
            transport,
            metrics,
        }
    }

    /// Register a freshly accepted connection
    pub async fn handle_connect(&self, id: ConnectionId) {
        if let Ok(mut state) = self.state.lock() {
            state.connect(id);
            self.metrics.connections_total.inc();
            self.metrics
                .active_connections
                .set(state.pairings.len() as i64);
        }
        info!("Client connected: {}", id);
    }

    /// Dispatch a decoded client event
    pub async fn handle_message(&self, id: ConnectionId, message: ClientMessage) {
        match message {
            ClientMessage::JoinQueue { intent } => self.handle_join(id, intent.as_deref()).await,
            ClientMessage::Skip => self.handle_skip(id).await,
        }
    }

    /// Process a join_queue event
    pub async fn handle_join(&self, id: ConnectionId, intent: Option<&str>) {
        let effects = {
            let Ok(mut state) = self.state.lock() else {
                return;
            };
            let effects = state.join(id, intent);
            if effects.is_empty() {
                match intent.and_then(Intent::parse) {
                    Some(parsed) => debug!("Connection {} waiting under {}", id, parsed),
                    None => {
                        debug!("Ignoring join from {} with unknown intent {:?}", id, intent);
                        self.metrics.unknown_intents_total.inc();
                    }
                }
            } else if let Some(parsed) = intent.and_then(Intent::parse) {
                info!("Matched a pair under {} (joiner {})", parsed, id);
                self.metrics.record_match(parsed);
            }
            self.update_waiting_gauges(&state);
            effects
        };

        self.apply(effects).await;
    }

    /// Process a skip event
    pub async fn handle_skip(&self, id: ConnectionId) {
        let effects = {
            let Ok(mut state) = self.state.lock() else {
                return;
            };
            let effects = state.skip(id);
            self.metrics.skips_total.inc();
            self.update_waiting_gauges(&state);
            effects
        };

        debug!("Skip from {}: {} effect(s)", id, effects.len());
        self.apply(effects).await;
    }

    /// Tear down all state for a closed connection
    pub async fn handle_disconnect(&self, id: ConnectionId) {
        let effects = {
            let Ok(mut state) = self.state.lock() else {
                return;
            };
            let effects = state.disconnect(id);
            self.metrics.disconnects_total.inc();
            self.metrics
                .active_connections
                .set(state.pairings.len() as i64);
            self.update_waiting_gauges(&state);
            effects
        };

        info!("Client disconnected: {}", id);
        self.apply(effects).await;
    }

    /// Current coordinator statistics
    pub fn stats(&self) -> CoordinatorStats {
        self.state
            .lock()
            .map(|mut state| state.snapshot_stats())
            .unwrap_or_default()
    }

    fn update_waiting_gauges(&self, state: &RelayState) {
        for (intent, count) in state.waiting_by_intent() {
            self.metrics.set_waiting(intent, count);
        }
    }

    /// Apply a transition's effects through the transport, in order
    ///
    /// Delivery failures must not reach the event source; they are
    /// logged and the remaining effects still run.
    async fn apply(&self, effects: Vec<Effect>) {
        for effect in effects {
            let result = match effect {
                Effect::JoinRoom { connection, room } => {
                    self.transport.join_room(connection, room).await
                }
                Effect::LeaveRoom { connection, room } => {
                    self.transport.leave_room(connection, room).await
                }
                Effect::SendTo {
                    connection,
                    message,
                } => self.transport.send_to(connection, message).await,
                Effect::SendToRoom { room, message } => {
                    self.transport.send_to_room(room, message).await
                }
                Effect::SendToRoomExcept {
                    room,
                    except,
                    message,
                } => {
                    self.transport
                        .send_to_room_except(room, except, message)
                        .await
                }
            };

            if let Err(e) = result {
                // Transport trouble is not the coordinator's to surface
                warn!("Transport effect failed: {}", e);
            }
        }
    }
}
