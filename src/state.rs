//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the two authoritative maps: the room directory (room name -> room)
//! and the connection registry (connection id -> outbound channel plus the
//! claimed identity, if any). Service functions take the write lock for the
//! full mutation, which serializes writers the same way the original
//! single-threaded event loop did.
//!
//! OWNERSHIP
//! =========
//! The room directory exclusively owns `Room` and `Player` records. The
//! registry holds only id/name back-references; it is a weak index for
//! broadcast targeting, never a second source of truth.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::protocol::{Player, RoomSnapshot, ServerMessage};

/// Cap applied to rooms created on first join, unless overridden by
/// `MAX_PLAYERS_PER_ROOM`.
pub const DEFAULT_MAX_PLAYERS: usize = 10;

/// Outbound channel capacity per connection. Broadcasts are fire-and-forget;
/// a client with a full buffer misses frames, it does not stall the room.
pub const OUTBOUND_BUFFER: usize = 256;

// =============================================================================
// ROOM
// =============================================================================

/// A named, capacity-bounded group of players sharing cursor broadcasts.
#[derive(Debug, Clone)]
pub struct Room {
    pub name: String,
    pub max_players: usize,
    /// Insertion order = join order.
    pub players: Vec<Player>,
}

impl Room {
    #[must_use]
    pub fn new(name: impl Into<String>, max_players: usize) -> Self {
        Self { name: name.into(), max_players, players: Vec::new() }
    }

    /// Point-in-time wire view. `playerCount` is recomputed from the live
    /// list here, never cached.
    #[must_use]
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            name: self.name.clone(),
            player_count: self.players.len(),
            max_players: self.max_players,
            players: self.players.clone(),
        }
    }
}

// =============================================================================
// CONNECTION REGISTRY ENTRIES
// =============================================================================

/// The association between a live connection and the room/player it
/// currently represents. Exists only between a successful `JOIN_ROOM` and
/// the connection's leave or disconnect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub player_id: String,
    pub room_name: String,
}

/// One live connection: outbound channel plus its binding, if joined.
#[derive(Debug, Clone)]
pub struct Connection {
    pub tx: mpsc::Sender<ServerMessage>,
    pub binding: Option<Binding>,
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state. Clone is required by Axum; the maps are
/// Arc-wrapped so clones observe the same rooms and connections.
#[derive(Clone)]
pub struct AppState {
    /// Room directory. Rooms are created lazily on first join and are never
    /// pruned when they empty, so this map only grows.
    pub rooms: Arc<RwLock<HashMap<String, Room>>>,
    /// Connection registry: every live socket, joined or not. Unjoined
    /// connections still receive lobby-wide `ROOMS_LIST` fan-out.
    pub connections: Arc<RwLock<HashMap<Uuid, Connection>>>,
    /// Capacity for rooms created on first join.
    pub max_players: usize,
}

impl AppState {
    #[must_use]
    pub fn new(max_players: usize) -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            connections: Arc::new(RwLock::new(HashMap::new())),
            max_players,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PLAYERS)
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
