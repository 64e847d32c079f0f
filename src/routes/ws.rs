//! WebSocket handler — protocol dispatch and fan-out.
//!
//! DESIGN
//! ======
//! On upgrade, each socket gets a connection id and a bounded outbound
//! channel, then enters a `select!` loop:
//! - Incoming text frames -> parse + dispatch by message type
//! - Fan-out frames from peers -> forward to the socket
//!
//! Handlers validate, mutate the directory/registry, and return the frames
//! owed to the sender; broadcasts go through the registry channels. Any
//! frame that fails a precondition degrades to a no-op: the error is
//! logged, nothing is sent back, and the connection stays open.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade -> register connection (phase `Unjoined`)
//! 2. `JOIN_ROOM` -> directory join + registry bind, phase `Joined`
//! 3. `LEAVE_ROOM` or close -> directory leave + unbind, departure fan-out
//! 4. Close -> deregister

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::protocol::{
    ClientMessage, CursorBroadcast, CursorUpdatePayload, JoinRoomPayload, LeaveBroadcast,
    LeaveRoomPayload, Player, ServerMessage,
};
use crate::services;
use crate::state::{AppState, OUTBOUND_BUFFER};

/// Server-side floor on trimmed room names. The client enforces the same
/// bound before sending.
const MIN_ROOM_NAME_LEN: usize = 3;

// =============================================================================
// CONNECTION PHASE
// =============================================================================

/// Explicit per-connection state. A cursor update from an `Unjoined`
/// connection is a variant mismatch, not a runtime null-check.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Unjoined,
    Joined { room_name: String, player_id: String },
}

// =============================================================================
// DISPATCH ERRORS
// =============================================================================

/// Everything that makes the dispatcher drop a frame. None of these close
/// the connection or produce an error frame; the protocol defines no
/// rejection messages.
#[derive(Debug, thiserror::Error)]
enum DispatchError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("room name too short: {0:?}")]
    RoomNameTooShort(String),
    #[error("frame requires a joined connection")]
    NotJoined,
    #[error("cursor update for {requested:?} while bound to {bound:?}")]
    WrongRoom { requested: String, bound: String },
    #[error("no player {player_id:?} in room {room_name:?}")]
    UnknownPlayer { room_name: String, player_id: String },
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let conn_id = Uuid::new_v4();

    // Per-connection channel for frames fanned out by peers.
    let (client_tx, mut client_rx) = mpsc::channel::<ServerMessage>(OUTBOUND_BUFFER);
    services::registry::register(&state, conn_id, client_tx).await;
    info!(%conn_id, "ws: client connected");

    let mut phase = Phase::Unjoined;

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(msg) = msg else { break };
                let Ok(msg) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        for reply in process_inbound_text(&state, &mut phase, conn_id, &text).await {
                            let _ = send_message(&mut socket, &reply).await;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(out) = client_rx.recv() => {
                if send_message(&mut socket, &out).await.is_err() {
                    break;
                }
            }
        }
    }

    disconnect(&state, phase, conn_id).await;
    info!(%conn_id, "ws: client disconnected");
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

/// Parse and process one inbound text frame, returning the frames owed to
/// the sender. Broadcasts are delivered through the registry channels as a
/// side effect.
///
/// Kept free of socket concerns so tests can drive the dispatcher with fake
/// connections end-to-end.
async fn process_inbound_text(
    state: &AppState,
    phase: &mut Phase,
    conn_id: Uuid,
    text: &str,
) -> Vec<ServerMessage> {
    let result = dispatch(state, phase, conn_id, text).await;
    match result {
        Ok(replies) => replies,
        Err(DispatchError::Malformed(e)) => {
            warn!(%conn_id, error = %e, "ws: dropping malformed frame");
            Vec::new()
        }
        Err(e) => {
            debug!(%conn_id, error = %e, "ws: frame ignored");
            Vec::new()
        }
    }
}

async fn dispatch(
    state: &AppState,
    phase: &mut Phase,
    conn_id: Uuid,
    text: &str,
) -> Result<Vec<ServerMessage>, DispatchError> {
    let msg: ClientMessage = serde_json::from_str(text)?;

    match msg {
        ClientMessage::GetRooms => {
            let rooms = services::room::list_rooms(state).await;
            Ok(vec![ServerMessage::RoomsList { rooms }])
        }
        ClientMessage::JoinRoom { payload } => handle_join(state, phase, conn_id, payload).await,
        ClientMessage::CursorUpdate { payload } => handle_cursor(state, phase, payload).await,
        ClientMessage::LeaveRoom { payload } => handle_leave(state, phase, conn_id, payload).await,
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

async fn handle_join(
    state: &AppState,
    phase: &mut Phase,
    conn_id: Uuid,
    payload: JoinRoomPayload,
) -> Result<Vec<ServerMessage>, DispatchError> {
    let JoinRoomPayload { room_name, player } = payload;

    if room_name.trim().chars().count() < MIN_ROOM_NAME_LEN {
        return Err(DispatchError::RoomNameTooShort(room_name));
    }

    let player_id = player.id.clone();
    let room = services::room::join_room(state, &room_name, player).await;

    // Bound even when the room was full: the caller detects exclusion from
    // the snapshot. A prior binding to another room is overwritten with no
    // implicit leave.
    services::registry::bind(state, conn_id, &player_id, &room_name).await;
    *phase = Phase::Joined { room_name, player_id };

    // The lobby is a live view of every room's occupancy, so a membership
    // change anywhere refreshes every connection, not just room members.
    broadcast_rooms_list(state).await;

    Ok(vec![ServerMessage::RoomJoined { room }])
}

async fn handle_cursor(
    state: &AppState,
    phase: &mut Phase,
    payload: CursorUpdatePayload,
) -> Result<Vec<ServerMessage>, DispatchError> {
    let Phase::Joined { room_name: bound, .. } = phase else {
        return Err(DispatchError::NotJoined);
    };
    if *bound != payload.room_name {
        return Err(DispatchError::WrongRoom {
            requested: payload.room_name,
            bound: bound.clone(),
        });
    }

    let Some(player) = services::room::update_player_position(
        state,
        &payload.room_name,
        &payload.player_id,
        payload.x,
        payload.y,
    )
    .await
    else {
        return Err(DispatchError::UnknownPlayer {
            room_name: payload.room_name,
            player_id: payload.player_id,
        });
    };

    // Echo to every room member including the sender; self-filtering is a
    // client concern.
    let msg = ServerMessage::CursorUpdate {
        payload: CursorBroadcast {
            player_id: player.id,
            username: player.username,
            x: player.x,
            y: player.y,
        },
    };
    services::registry::broadcast_room(state, &payload.room_name, &msg).await;

    Ok(Vec::new())
}

async fn handle_leave(
    state: &AppState,
    phase: &mut Phase,
    conn_id: Uuid,
    payload: LeaveRoomPayload,
) -> Result<Vec<ServerMessage>, DispatchError> {
    if *phase == Phase::Unjoined {
        return Err(DispatchError::NotJoined);
    }

    let LeaveRoomPayload { room_name, player_id } = payload;
    let Some(player) = services::room::leave_room(state, &room_name, &player_id).await else {
        return Err(DispatchError::UnknownPlayer { room_name, player_id });
    };

    services::registry::unbind(state, conn_id).await;
    *phase = Phase::Unjoined;

    // Departure fan-out reaches connections still bound to the room; the
    // leaver is already unbound and only sees the lobby refresh.
    let msg = ServerMessage::LeaveRoom {
        payload: LeaveBroadcast { room_name: room_name.clone(), player },
    };
    services::registry::broadcast_room(state, &room_name, &msg).await;
    broadcast_rooms_list(state).await;

    Ok(Vec::new())
}

// =============================================================================
// DISCONNECT
// =============================================================================

/// Transport close is an implicit leave: same directory mutation and same
/// fan-out as `LEAVE_ROOM`, then the connection is forgotten.
async fn disconnect(state: &AppState, phase: Phase, conn_id: Uuid) {
    services::registry::deregister(state, conn_id).await;

    let Phase::Joined { room_name, player_id } = phase else {
        return;
    };

    let removed = services::room::leave_room(state, &room_name, &player_id).await;
    // The directory can lack the record, e.g. after the binding was
    // overwritten by a later join; peers still get a departure frame with a
    // placeholder identity.
    let player = removed.unwrap_or_else(|| Player {
        id: player_id,
        username: String::new(),
        x: 0.0,
        y: 0.0,
    });

    let msg = ServerMessage::LeaveRoom {
        payload: LeaveBroadcast { room_name: room_name.clone(), player },
    };
    services::registry::broadcast_room(state, &room_name, &msg).await;
    broadcast_rooms_list(state).await;
}

// =============================================================================
// HELPERS
// =============================================================================

/// Push a fresh room snapshot list to every live connection.
async fn broadcast_rooms_list(state: &AppState) {
    let rooms = services::room::list_rooms(state).await;
    services::registry::broadcast_all(state, &ServerMessage::RoomsList { rooms }).await;
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<(), ()> {
    let json = match serde_json::to_string(msg) {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize outbound message");
            return Err(());
        }
    };
    socket.send(Message::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
