use std::time::Instant;
use uuid::Uuid;

use crate::game::state::PlayerId;

/// Player connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerConnectionState {
    /// Connected and active
    Connected,
    /// Temporarily disconnected (can reconnect)
    Disconnected,
    /// Left the game
    Left,
}

/// A connected player as the lobby sees them
#[derive(Debug, Clone)]
pub struct LobbyPlayer {
    pub id: PlayerId,
    pub name: String,
    pub connection_state: PlayerConnectionState,
    pub room_id: Option<Uuid>,
    pub joined_at: Instant,
    pub ping_ms: u32,
}

impl LobbyPlayer {
    pub fn new(id: PlayerId, name: String) -> Self {
        Self {
            id,
            name,
            connection_state: PlayerConnectionState::Connected,
            room_id: None,
            joined_at: Instant::now(),
            ping_ms: 0,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection_state == PlayerConnectionState::Connected
    }

    pub fn disconnect(&mut self) {
        self.connection_state = PlayerConnectionState::Disconnected;
    }

    pub fn reconnect(&mut self) {
        self.connection_state = PlayerConnectionState::Connected;
    }

    pub fn leave(&mut self) {
        self.connection_state = PlayerConnectionState::Left;
    }

    pub fn update_ping(&mut self, ping_ms: u32) {
        self.ping_ms = ping_ms;
    }
}
