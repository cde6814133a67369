//! Fixed-timestep tick pipeline
//!
//! One tick runs: drain inputs -> integrate -> drive bots -> capture ->
//! collision -> invariant repair, in that order. All state mutation happens
//! here, on the room's single logical worker. The tick body is guarded at
//! the tick boundary: a panicking tick is logged and skipped, and the room
//! keeps running.

use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::game::constants::{bot, sim, spawn, PLAYER_COLORS};
use crate::game::input_buffer::{InputBuffer, InputSender};
use crate::game::spatial::SegmentGrid;
use crate::game::state::{GameState, PlayerId};
use crate::game::systems::bot::BotManager;
use crate::game::systems::capture::{self, CaptureEvent};
use crate::game::systems::collision::{self, CollisionEvent};
use crate::game::systems::movement;
use crate::net::protocol::PlayerInput;

/// Game loop configuration
#[derive(Debug, Clone)]
pub struct GameLoopConfig {
    /// Bots keep the room populated up to this total while few humans play
    pub target_players: usize,
    /// Bot fill stops once this many humans are present
    pub min_humans_for_bots: usize,
}

impl Default for GameLoopConfig {
    fn default() -> Self {
        Self {
            target_players: bot::TARGET_TOTAL_PLAYERS,
            min_humans_for_bots: bot::MIN_HUMANS_FOR_BOTS,
        }
    }
}

/// Events surfaced by one tick
#[derive(Debug, Clone)]
pub enum GameLoopEvent {
    PlayerExited {
        player_id: PlayerId,
    },
    TerritoryCaptured {
        player_id: PlayerId,
        area: f64,
    },
    CaptureRejected {
        player_id: PlayerId,
    },
    PlayerKilled {
        victim_id: PlayerId,
        killer_id: Option<PlayerId>,
    },
    PlayerWon {
        player_id: PlayerId,
    },
    BotSpawned {
        player_id: PlayerId,
    },
    BotRemoved {
        player_id: PlayerId,
    },
}

impl From<CaptureEvent> for GameLoopEvent {
    fn from(event: CaptureEvent) -> Self {
        match event {
            CaptureEvent::PlayerExited { player_id } => GameLoopEvent::PlayerExited { player_id },
            CaptureEvent::TerritoryCaptured { player_id, area } => {
                GameLoopEvent::TerritoryCaptured { player_id, area }
            }
            CaptureEvent::CaptureRejected { player_id } => {
                GameLoopEvent::CaptureRejected { player_id }
            }
            CaptureEvent::PlayerWon { player_id } => GameLoopEvent::PlayerWon { player_id },
        }
    }
}

impl From<CollisionEvent> for GameLoopEvent {
    fn from(event: CollisionEvent) -> Self {
        match event {
            CollisionEvent::PlayerKilled {
                victim_id,
                killer_id,
            } => GameLoopEvent::PlayerKilled {
                victim_id,
                killer_id,
            },
        }
    }
}

/// Per-room simulation driver; owns the world and every tick-phase system
pub struct GameLoop {
    state: GameState,
    input_buffer: InputBuffer,
    grid: SegmentGrid,
    bots: BotManager,
    config: GameLoopConfig,
    population_timer: f64,
    next_bot_serial: u64,
    color_cursor: usize,
}

impl GameLoop {
    pub fn new(config: GameLoopConfig) -> Self {
        Self {
            state: GameState::new(),
            input_buffer: InputBuffer::default(),
            grid: SegmentGrid::default(),
            bots: BotManager::new(),
            config,
            population_timer: 0.0,
            next_bot_serial: 0,
            color_cursor: 0,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    /// Sender handle for connection handlers
    pub fn input_sender(&self) -> InputSender {
        self.input_buffer.sender()
    }

    /// Queue an input for the next tick; full-buffer drops are silent
    pub fn queue_input(&mut self, player_id: PlayerId, input: PlayerInput) {
        if !self.input_buffer.try_submit(player_id, input) {
            debug!("input buffer full, dropping input");
        }
    }

    /// Create a human player at a fresh spawn point
    pub fn add_human(&mut self, username: Option<String>) -> PlayerId {
        let id = Uuid::new_v4().simple().to_string();
        let name = username
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| id[..6].to_string());
        let color = self.next_color();
        let position = self.state.find_spawn_position();
        info!(player = %id, %name, "player joined");
        self.state.create_player(id.clone(), name, color, position);
        id
    }

    pub fn remove_player(&mut self, player_id: &str) {
        self.bots.unregister(player_id);
        if self.state.remove_player(player_id).is_some() {
            info!(player = %player_id, "player removed");
        }
    }

    /// Run one tick. Never propagates a panic out of the tick boundary.
    pub fn tick(&mut self) -> Vec<GameLoopEvent> {
        let tick = self.state.tick;
        match catch_unwind(AssertUnwindSafe(|| self.run_tick())) {
            Ok(events) => events,
            Err(_) => {
                warn!(tick, "tick panicked, skipping");
                Vec::new()
            }
        }
    }

    fn run_tick(&mut self) -> Vec<GameLoopEvent> {
        self.state.tick += 1;

        // Inputs that arrived strictly before this tick, latest-wins;
        // unknown ids drop silently inside set_input
        for (player_id, input) in self.input_buffer.drain_latest() {
            self.state.set_input(&player_id, input.angle);
        }

        movement::update(&mut self.state, sim::DT);
        self.bots.update(&mut self.state, sim::DT);

        let mut events: Vec<GameLoopEvent> = capture::update(&mut self.state)
            .into_iter()
            .map(GameLoopEvent::from)
            .collect();
        events.extend(
            collision::update(&mut self.state, &mut self.grid)
                .into_iter()
                .map(GameLoopEvent::from),
        );

        self.state.repair_invariants();

        self.population_timer += sim::DT;
        if self.population_timer >= bot::POPULATION_INTERVAL {
            self.population_timer = 0.0;
            self.manage_population(&mut events);
        }

        events
    }

    /// Remove stale dead bots and top the room up to the target population
    fn manage_population(&mut self, events: &mut Vec<GameLoopEvent>) {
        let stale: Vec<PlayerId> = self
            .state
            .players()
            .filter(|p| p.is_bot() && p.is_dead && p.death_timer > spawn::BOT_REMOVAL_DELAY)
            .map(|p| p.id.clone())
            .collect();
        for id in stale {
            self.remove_player(&id);
            events.push(GameLoopEvent::BotRemoved { player_id: id });
        }

        if self.state.human_count() < self.config.min_humans_for_bots {
            while self.state.len() < self.config.target_players {
                let id = self.spawn_bot();
                events.push(GameLoopEvent::BotSpawned { player_id: id });
            }
        }
    }

    fn spawn_bot(&mut self) -> PlayerId {
        self.next_bot_serial += 1;
        let id = format!("{}{}", bot::ID_PREFIX, self.next_bot_serial);
        let name = format!("Bot {}", self.next_bot_serial);
        let color = self.next_color();
        let position = self.state.find_spawn_position();
        debug!(player = %id, "bot spawned");
        self.state.create_player(id.clone(), name, color, position);
        self.bots.register(id.clone());
        id
    }

    fn next_color(&mut self) -> String {
        let color = PLAYER_COLORS[self.color_cursor % PLAYER_COLORS.len()];
        self.color_cursor += 1;
        color.to_string()
    }
}

impl Default for GameLoop {
    fn default() -> Self {
        Self::new(GameLoopConfig::default())
    }
}
