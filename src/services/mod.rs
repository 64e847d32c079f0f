//! Domain services used by the websocket dispatcher.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the room directory and connection registry mutations
//! so the websocket handler can stay focused on protocol translation and
//! fan-out sequencing.

pub mod registry;
pub mod room;
