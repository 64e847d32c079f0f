//! Wire protocol — type-tagged JSON frames.
//!
//! DESIGN
//! ======
//! One JSON object per WebSocket text frame. The `type` field selects the
//! schema; payload fields are camelCase to match the browser client. The
//! inbound and outbound vocabularies are separate enums because the two
//! directions disagree on shape: `CURSOR_UPDATE` inbound omits `username`
//! (the server fills it from the room directory), and `LEAVE_ROOM` inbound
//! carries a bare `playerId` while outbound carries the full player record.

use serde::{Deserialize, Serialize};

// =============================================================================
// SHARED TYPES
// =============================================================================

/// A participant identity plus last-known cursor coordinates.
///
/// `id` is client-generated and trusted verbatim. `x`/`y` are viewport
/// pixels; staleness is acceptable, so no timestamp is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub username: String,
    pub x: f64,
    pub y: f64,
}

/// Point-in-time wire view of a room.
///
/// `player_count` is derived from `players.len()` when the snapshot is
/// taken; it is never an independently authoritative field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub name: String,
    pub player_count: usize,
    pub max_players: usize,
    pub players: Vec<Player>,
}

// =============================================================================
// INBOUND
// =============================================================================

/// Messages a client may send. Unknown `type` tags fail deserialization and
/// are dropped by the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    GetRooms,
    JoinRoom { payload: JoinRoomPayload },
    CursorUpdate { payload: CursorUpdatePayload },
    LeaveRoom { payload: LeaveRoomPayload },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomPayload {
    pub room_name: String,
    pub player: Player,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorUpdatePayload {
    pub room_name: String,
    pub player_id: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRoomPayload {
    pub room_name: String,
    pub player_id: String,
}

// =============================================================================
// OUTBOUND
// =============================================================================

/// Messages the server sends, unicast or fan-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    RoomsList { rooms: Vec<RoomSnapshot> },
    RoomJoined { room: RoomSnapshot },
    CursorUpdate { payload: CursorBroadcast },
    LeaveRoom { payload: LeaveBroadcast },
}

/// Cursor fan-out payload. `username` is filled by the server from the
/// authoritative player record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorBroadcast {
    pub player_id: String,
    pub username: String,
    pub x: f64,
    pub y: f64,
}

/// Departure fan-out payload. Carries the departed player's last-known
/// record so peers can label the leave without a directory lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveBroadcast {
    pub room_name: String,
    pub player: Player,
}

#[cfg(test)]
#[path = "protocol_test.rs"]
mod tests;
