//! Room directory — lazy room creation, membership, cursor positions.
//!
//! DESIGN
//! ======
//! Rooms are created on first join and kept for the process lifetime; an
//! emptied room stays in the directory (the map only grows, a deliberate
//! carry-over from the observed behavior). Membership mutations hold the
//! write lock for their full duration, so `playerCount` derived in a
//! snapshot always reflects a completed mutation.
//!
//! ERROR HANDLING
//! ==============
//! Not-found is domain data here, not a failure: `update_player_position`
//! and `leave_room` return `None` and mutate nothing. A full room makes
//! `join_room` a membership no-op with no rejection signal; callers inspect
//! the returned snapshot to detect exclusion.

use tracing::{debug, info};

use crate::protocol::{Player, RoomSnapshot};
use crate::state::{AppState, Room};

/// Snapshot every room, sorted by name for stable lobby rendering.
pub async fn list_rooms(state: &AppState) -> Vec<RoomSnapshot> {
    let rooms = state.rooms.read().await;
    let mut list: Vec<RoomSnapshot> = rooms.values().map(Room::snapshot).collect();
    list.sort_by(|a, b| a.name.cmp(&b.name));
    list
}

/// Join a room, creating it if the name is unknown.
///
/// Idempotent for a player id already present: no duplicate insert, no
/// position reset. If the room is full the player is not added and the
/// unchanged snapshot is returned.
pub async fn join_room(state: &AppState, room_name: &str, player: Player) -> RoomSnapshot {
    let mut rooms = state.rooms.write().await;
    let room = rooms.entry(room_name.to_owned()).or_insert_with(|| {
        info!(room = %room_name, "created room");
        Room::new(room_name, state.max_players)
    });

    let already_member = room.players.iter().any(|p| p.id == player.id);
    if already_member {
        debug!(room = %room_name, player_id = %player.id, "join is idempotent, already a member");
    } else if room.players.len() < room.max_players {
        info!(room = %room_name, player_id = %player.id, count = room.players.len() + 1, "player joined room");
        room.players.push(player);
    } else {
        // Silent rejection: no membership change, no error signal.
        debug!(room = %room_name, player_id = %player.id, "room full, join ignored");
    }

    room.snapshot()
}

/// Overwrite a player's cursor position, last-write-wins.
///
/// Returns the updated record so the broadcast can carry the username, or
/// `None` (no mutation) when the room or player is unknown.
pub async fn update_player_position(
    state: &AppState,
    room_name: &str,
    player_id: &str,
    x: f64,
    y: f64,
) -> Option<Player> {
    let mut rooms = state.rooms.write().await;
    let room = rooms.get_mut(room_name)?;
    let player = room.players.iter_mut().find(|p| p.id == player_id)?;
    player.x = x;
    player.y = y;
    Some(player.clone())
}

/// Remove a player from a room.
///
/// Returns the removed record (the leave broadcast needs its username), or
/// `None` if the room or player is unknown. The room itself is kept even
/// when it empties.
pub async fn leave_room(state: &AppState, room_name: &str, player_id: &str) -> Option<Player> {
    let mut rooms = state.rooms.write().await;
    let room = rooms.get_mut(room_name)?;
    let index = room.players.iter().position(|p| p.id == player_id)?;
    let player = room.players.remove(index);
    info!(room = %room_name, player_id = %player_id, remaining = room.players.len(), "player left room");
    if room.players.is_empty() {
        info!(room = %room_name, "room is empty, kept in directory");
    }
    Some(player)
}

#[cfg(test)]
#[path = "room_test.rs"]
mod tests;
