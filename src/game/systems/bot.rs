//! Bot steering controller
//!
//! One brain per bot, throttled to a fixed decision rate by a per-bot
//! accumulator clock rather than a separate task. Bots write their heading
//! through the same input intake as remote clients and get no privileged
//! access to the world.

use hashbrown::HashMap;
use rand::Rng;

use crate::game::constants::{bot, world};
use crate::game::geometry;
use crate::game::state::{GameState, Player, PlayerId, ARENA_CENTER};

/// Steering state for a single bot
#[derive(Debug, Clone)]
pub struct BotBrain {
    /// Time until the next decision
    decision_timer: f64,
    /// Time until the next random wander turn
    steer_cooldown: f64,
    /// Heading home after a long excursion
    returning: bool,
}

impl BotBrain {
    pub fn new() -> Self {
        Self {
            decision_timer: 0.0,
            steer_cooldown: 0.0,
            returning: false,
        }
    }

    /// Advance the accumulator; produces a new target heading when a
    /// decision fires
    fn update(&mut self, player: &Player, dt: f64) -> Option<f64> {
        self.decision_timer -= dt;
        self.steer_cooldown -= dt;
        if self.decision_timer > 0.0 {
            return None;
        }
        self.decision_timer = bot::DECISION_INTERVAL;
        self.decide(player)
    }

    fn decide(&mut self, player: &Player) -> Option<f64> {
        // Boundary avoidance overrides everything
        let from_center = player.position.distance_to(ARENA_CENTER);
        if from_center > world::ARENA_RADIUS - bot::BOUNDARY_AVOID_MARGIN {
            return Some((ARENA_CENTER - player.position).angle());
        }

        if player.is_outside && player.trail.len() > bot::RETURN_TRAIL_POINTS {
            self.returning = true;
        }
        if !player.is_outside {
            self.returning = false;
        }

        if self.returning {
            let home = geometry::polygon_centroid(&player.territory);
            return Some((home - player.position).angle());
        }

        if self.steer_cooldown <= 0.0 {
            let mut rng = rand::thread_rng();
            self.steer_cooldown = rng.gen_range(bot::COOLDOWN_MIN..bot::COOLDOWN_MAX);
            let turn = rng.gen_range(-bot::TURN_RANGE..bot::TURN_RANGE);
            return Some(player.angle + turn);
        }

        None
    }
}

impl Default for BotBrain {
    fn default() -> Self {
        Self::new()
    }
}

/// Brains for all bots in a room
pub struct BotManager {
    brains: HashMap<PlayerId, BotBrain>,
}

impl BotManager {
    pub fn new() -> Self {
        Self {
            brains: HashMap::new(),
        }
    }

    pub fn register(&mut self, player_id: PlayerId) {
        self.brains.insert(player_id, BotBrain::new());
    }

    pub fn unregister(&mut self, player_id: &str) {
        self.brains.remove(player_id);
    }

    pub fn len(&self) -> usize {
        self.brains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.brains.is_empty()
    }

    /// Drive every registered bot; decisions land as regular inputs
    pub fn update(&mut self, state: &mut GameState, dt: f64) {
        for id in state.player_ids() {
            let Some(brain) = self.brains.get_mut(&id) else {
                continue;
            };
            let Some(player) = state.get_player(&id) else {
                continue;
            };
            if player.is_dead {
                continue;
            }
            if let Some(target_angle) = brain.update(player, dt) {
                state.set_input(&id, target_angle);
            }
        }
    }
}

impl Default for BotManager {
    fn default() -> Self {
        Self::new()
    }
}
