//! Game room: one arena, one tick driver
//!
//! A room owns its game loop and projector, accepts drop-in joins at any
//! time, and broadcasts projected snapshots to the transport layer over a
//! tokio broadcast channel. Snapshots are value copies; the transport only
//! ever reads them.

use std::sync::Arc;
use std::time::Instant;

use hashbrown::HashMap;
use tokio::sync::{broadcast, watch, RwLock};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use crate::game::constants::sim;
use crate::game::game_loop::{GameLoop, GameLoopConfig, GameLoopEvent};
use crate::game::state::PlayerId;
use crate::health::ServerStats;
use crate::lobby::player::LobbyPlayer;
use crate::net::projection::StateProjector;
use crate::net::protocol::{GameRoomState, PlayerInput};

/// Broadcast channel depth for outbound snapshots; slow subscribers drop
/// old snapshots rather than stalling the room
const SNAPSHOT_CHANNEL_CAPACITY: usize = 8;

/// Room state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomState {
    /// Running its simulation (drop-in joins allowed)
    Open,
    /// Room is closing; joins and inputs are rejected
    Closing,
}

/// Game room containing players and the authoritative simulation
pub struct GameRoom {
    pub id: Uuid,
    pub name: String,
    pub state: RoomState,
    pub max_humans: usize,
    pub created_at: Instant,
    players: HashMap<PlayerId, LobbyPlayer>,
    game_loop: GameLoop,
    projector: StateProjector,
    snapshot_tx: broadcast::Sender<GameRoomState>,
}

impl GameRoom {
    pub fn new(name: String, max_humans: usize) -> Self {
        let (snapshot_tx, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);
        Self {
            id: Uuid::new_v4(),
            name,
            state: RoomState::Open,
            max_humans,
            created_at: Instant::now(),
            players: HashMap::new(),
            game_loop: GameLoop::new(GameLoopConfig::default()),
            projector: StateProjector::new(),
            snapshot_tx,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Connected human count
    pub fn human_count(&self) -> usize {
        self.players.values().filter(|p| p.is_connected()).count()
    }

    pub fn is_full(&self) -> bool {
        self.human_count() >= self.max_humans
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn game_state(&self) -> &crate::game::state::GameState {
        self.game_loop.state()
    }

    /// Add a human player; returns the assigned player id
    pub fn add_player(&mut self, username: Option<String>) -> Result<PlayerId, RoomError> {
        if self.state != RoomState::Open {
            return Err(RoomError::RoomClosing);
        }
        if self.is_full() {
            return Err(RoomError::RoomFull);
        }

        let player_id = self.game_loop.add_human(username);
        let name = self
            .game_loop
            .state()
            .get_player(&player_id)
            .map(|p| p.name.clone())
            .unwrap_or_default();

        let mut lobby_player = LobbyPlayer::new(player_id.clone(), name);
        lobby_player.room_id = Some(self.id);
        self.players.insert(player_id.clone(), lobby_player);

        Ok(player_id)
    }

    /// Remove a player; humans leave the world immediately on disconnect
    pub fn remove_player(&mut self, player_id: &str) -> Option<LobbyPlayer> {
        if let Some(mut player) = self.players.remove(player_id) {
            player.leave();
            self.game_loop.remove_player(player_id);
            Some(player)
        } else {
            None
        }
    }

    pub fn get_player(&self, player_id: &str) -> Option<&LobbyPlayer> {
        self.players.get(player_id)
    }

    /// Queue a player's heading for the next tick
    pub fn process_input(&mut self, player_id: PlayerId, input: PlayerInput) {
        if self.state != RoomState::Open {
            return;
        }
        self.game_loop.queue_input(player_id, input);
    }

    /// Lock-free input sender for connection handlers
    pub fn input_sender(&self) -> crate::game::input_buffer::InputSender {
        self.game_loop.input_sender()
    }

    /// Subscribe to projected snapshots
    pub fn subscribe(&self) -> broadcast::Receiver<GameRoomState> {
        self.snapshot_tx.subscribe()
    }

    /// Run a single tick, project the result, and hand it to the transport
    pub fn tick(&mut self) -> Vec<GameLoopEvent> {
        let events = self.game_loop.tick();
        let snapshot = self.projector.project(self.game_loop.state_mut());
        // No subscribers is fine; the room simulates regardless
        let _ = self.snapshot_tx.send(snapshot);
        events
    }

    /// Drain players and refuse further joins and inputs
    pub fn shutdown(&mut self) {
        self.state = RoomState::Closing;
        let ids: Vec<PlayerId> = self.players.keys().cloned().collect();
        for id in ids {
            self.remove_player(&id);
        }
    }

    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players.keys().cloned().collect()
    }

    pub fn age(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }
}

/// Room errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum RoomError {
    #[error("Room is full")]
    RoomFull,
    #[error("Room is closing")]
    RoomClosing,
    #[error("Player not found")]
    PlayerNotFound,
}

/// Drive a room at the fixed tick rate until shutdown is signalled.
///
/// Missed ticks are skipped rather than bursted; shutdown is honored
/// between ticks, never mid-tick.
pub fn start_room_loop(
    room: Arc<RwLock<GameRoom>>,
    stats: Arc<ServerStats>,
    mut shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_millis(sim::TICK_DURATION_MS));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let room_id = room.read().await.id;
        info!(%room_id, "room loop started at {} Hz", sim::TICK_RATE);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let started = Instant::now();
                    let events = room.write().await.tick();
                    stats.record_tick_time(started.elapsed());
                    for event in &events {
                        if let GameLoopEvent::PlayerKilled { victim_id, killer_id } = event {
                            debug!(%room_id, victim = %victim_id, ?killer_id, "player killed");
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        room.write().await.shutdown();
        info!(%room_id, "room loop stopped");
    })
}
