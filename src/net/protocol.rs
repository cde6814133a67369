//! Wire-facing message and state types
//!
//! The transport layer (WebSocket framing, handshakes, per-client diffing)
//! lives outside this crate; these types define the seam. Outbound state is
//! a compact flat-array view of each player, diff-friendly for the
//! transport's per-client baselines.

use serde::{Deserialize, Serialize};

use crate::game::state::PlayerId;

/// Messages from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClientMessage {
    /// Request to join the room
    Join { username: Option<String> },
    /// Heading input for the player
    Input(PlayerInput),
    /// Request to leave the room
    Leave,
    /// Ping for latency measurement
    Ping { timestamp: u64 },
}

/// Messages from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ServerMessage {
    /// Join confirmed with the assigned player id
    JoinAccepted { player_id: PlayerId },
    /// Join was rejected
    JoinRejected { reason: String },
    /// Authoritative room state for this tick
    State(GameRoomState),
    /// Pong response with the server timestamp
    Pong {
        client_timestamp: u64,
        server_timestamp: u64,
    },
}

/// Heading input; the only control a player has
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PlayerInput {
    /// Desired heading in radians
    pub angle: f64,
}

/// Flat-encoded view of one player.
///
/// `territory` and `trail` are `[x0, y0, x1, y1, ...]`; the resync flags
/// tell the transport when a flat array was re-encoded rather than carried
/// forward unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: PlayerId,
    pub name: String,
    pub color: String,
    pub x: f64,
    pub y: f64,
    pub angle: f64,
    pub is_dead: bool,
    pub has_won: bool,
    pub score: u64,
    pub territory: Vec<f64>,
    pub trail: Vec<f64>,
    pub territory_resync: bool,
    pub trail_resync: bool,
}

/// Per-tick outbound snapshot of a room, in player insertion order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRoomState {
    pub tick: u64,
    pub players: Vec<PlayerState>,
}

/// Encode a server message for the wire
pub fn encode(message: &ServerMessage) -> Result<Vec<u8>, bincode::error::EncodeError> {
    bincode::serde::encode_to_vec(message, bincode::config::standard())
}

/// Decode a client message from the wire
pub fn decode_client(bytes: &[u8]) -> Result<ClientMessage, bincode::error::DecodeError> {
    let (message, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())?;
    Ok(message)
}
