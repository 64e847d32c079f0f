//! Connection registry — socket-to-identity bindings and fan-out.
//!
//! DESIGN
//! ======
//! Every accepted socket is registered with its outbound channel so that
//! lobby-wide `ROOMS_LIST` refreshes can reach connections that have not
//! joined any room. A binding is attached on `JOIN_ROOM` and removed on
//! leave or disconnect. Room-scoped broadcasts qualify a connection by
//! exact string equality on the bound room name.
//!
//! Sends are best-effort `try_send`: a client with a full outbound buffer
//! misses frames rather than stalling the sender.

use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use crate::protocol::ServerMessage;
use crate::state::{AppState, Binding, Connection};

// =============================================================================
// LIFECYCLE
// =============================================================================

/// Track a newly accepted connection and its outbound channel.
pub async fn register(state: &AppState, conn_id: Uuid, tx: mpsc::Sender<ServerMessage>) {
    let mut conns = state.connections.write().await;
    conns.insert(conn_id, Connection { tx, binding: None });
    info!(%conn_id, total = conns.len(), "connection registered");
}

/// Forget a closed connection entirely, binding included.
pub async fn deregister(state: &AppState, conn_id: Uuid) {
    let mut conns = state.connections.write().await;
    conns.remove(&conn_id);
    info!(%conn_id, remaining = conns.len(), "connection deregistered");
}

// =============================================================================
// BINDINGS
// =============================================================================

/// Record which player/room a connection represents.
///
/// A connection is in one room at a time: a re-join silently overwrites the
/// prior binding without an implicit leave of the previous room.
pub async fn bind(state: &AppState, conn_id: Uuid, player_id: &str, room_name: &str) {
    let mut conns = state.connections.write().await;
    let Some(conn) = conns.get_mut(&conn_id) else {
        return;
    };
    conn.binding = Some(Binding { player_id: player_id.to_owned(), room_name: room_name.to_owned() });
}

/// Current binding for a connection, if it has joined a room.
pub async fn lookup(state: &AppState, conn_id: Uuid) -> Option<Binding> {
    let conns = state.connections.read().await;
    conns.get(&conn_id)?.binding.clone()
}

/// Remove and return a connection's binding. The connection itself stays
/// registered; it is back in the lobby.
pub async fn unbind(state: &AppState, conn_id: Uuid) -> Option<Binding> {
    let mut conns = state.connections.write().await;
    conns.get_mut(&conn_id)?.binding.take()
}

// =============================================================================
// FAN-OUT
// =============================================================================

/// Broadcast targets for a room: every connection whose binding names it.
pub async fn connections_in_room(
    state: &AppState,
    room_name: &str,
) -> Vec<(Uuid, mpsc::Sender<ServerMessage>)> {
    let conns = state.connections.read().await;
    conns
        .iter()
        .filter(|(_, conn)| {
            conn.binding
                .as_ref()
                .is_some_and(|b| b.room_name == room_name)
        })
        .map(|(id, conn)| (*id, conn.tx.clone()))
        .collect()
}

/// Every live connection, joined or not. Lobby fan-out targets.
pub async fn all_connections(state: &AppState) -> Vec<(Uuid, mpsc::Sender<ServerMessage>)> {
    let conns = state.connections.read().await;
    conns.iter().map(|(id, conn)| (*id, conn.tx.clone())).collect()
}

/// Send a message to every connection bound to a room, sender included.
pub async fn broadcast_room(state: &AppState, room_name: &str, msg: &ServerMessage) {
    for (_, tx) in connections_in_room(state, room_name).await {
        let _ = tx.try_send(msg.clone());
    }
}

/// Send a message to every live connection regardless of binding.
pub async fn broadcast_all(state: &AppState, msg: &ServerMessage) {
    for (_, tx) in all_connections(state).await {
        let _ = tx.try_send(msg.clone());
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
